// ==========================================
// 订单生命周期集成测试
// ==========================================
// 覆盖: 草稿保存 → 发送 → 追加（rajout） → 吸收 → 截单只读 → 归档
// 供应商 moulin: 周二/周四交货，截单为交货前一天 12:00
// ==========================================


use bakery_orders::api::{ApiError, Clock};
use bakery_orders::domain::{
    Department, OrderKey, OrderStatus, ProductRecord, Selection, SelectionEntry, UrgencyStage,
};
use bakery_orders::repository::OrderStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use test_helpers::*;

fn totals(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

async fn stored_totals(env: &TestEnv, order_id: &str) -> BTreeMap<String, u32> {
    let lines = env.state.store.fetch_lines(order_id).await.unwrap();
    lines.into_iter().map(|l| (l.product_id, l.qty)).collect()
}

/// 周一上午建草稿并发送: BAG 10 / ECL 6 / JUS 2
async fn send_standard_order(env: &TestEnv) -> String {
    let now = at(2026, 10, 19, 9, 0);
    let lifecycle = env.lifecycle();
    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 10, now).unwrap();
    session.set_qty("ECL", 6, now).unwrap();
    session.set_qty("JUS", 2, now).unwrap();
    let outcome = lifecycle.send(&mut session, now).await.unwrap();
    outcome.order.order_id
}

// ==========================================
// 草稿
// ==========================================

#[tokio::test]
async fn test_draft_save_and_reopen() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let now = at(2026, 10, 19, 9, 0);

    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert_eq!(session.status(), OrderStatus::Draft);
    assert!(session.order().is_none());
    assert!(session.selection().is_empty());

    session.set_qty("BAG", 10, now).unwrap();
    session.set_qty("ECL", 6, now).unwrap();
    let receipt = lifecycle.save(&mut session, now).await.unwrap();
    assert_eq!(receipt.written, 2);
    let order = receipt.order.expect("保存后应已创建订单");
    assert_eq!(order.status, OrderStatus::Draft);

    // 草稿写入是全量替换
    session.set_qty("ECL", 0, now).unwrap();
    lifecycle.save(&mut session, now).await.unwrap();
    assert_eq!(stored_totals(&env, &order.order_id).await, totals(&[("BAG", 10)]));

    let reopened = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert_eq!(reopened.order().map(|o| o.order_id.clone()), Some(order.order_id));
    assert_eq!(reopened.selection().desired_totals(), totals(&[("BAG", 10)]));
    assert!(reopened.baseline().is_none());
    assert!(reopened.delta().is_empty());
}

#[tokio::test]
async fn test_save_empty_selection_creates_nothing() {
    let env = setup_env().await.expect("创建测试环境失败");
    let now = at(2026, 10, 19, 9, 0);

    let mut session = env.lifecycle().open(&thursday_key(), now).await.unwrap();
    let receipt = env.lifecycle().save(&mut session, now).await.unwrap();
    assert!(receipt.order.is_none());
    assert_eq!(receipt.written, 0);
    assert!(env.state.store.fetch_open_order(&thursday_key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_rejects_blank_supplier() {
    let env = setup_env().await.expect("创建测试环境失败");
    let key = OrderKey::new("  ", date(2026, 10, 22));
    let result = env.lifecycle().open(&key, at(2026, 10, 19, 9, 0)).await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
}

// ==========================================
// 发送
// ==========================================

#[tokio::test]
async fn test_send_without_selection_is_rejected() {
    let env = setup_env().await.expect("创建测试环境失败");
    let now = at(2026, 10, 19, 9, 0);

    let mut session = env.lifecycle().open(&thursday_key(), now).await.unwrap();
    let result = env.lifecycle().send(&mut session, now).await;
    assert!(matches!(result, Err(ApiError::NothingToSend(_))));

    // 仅有未勾选商品也不能发送
    session.check("BAG", now).unwrap();
    session.uncheck("BAG", now).unwrap();
    let result = env.lifecycle().send(&mut session, now).await;
    assert!(matches!(result, Err(ApiError::NothingToSend(_))));
}

#[tokio::test]
async fn test_send_marks_order_and_builds_message() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let now = at(2026, 10, 19, 9, 0);

    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 10, now).unwrap();
    session.set_qty("ECL", 6, now).unwrap();
    session.set_qty("JUS", 2, now).unwrap();
    let outcome = lifecycle.send(&mut session, now).await.unwrap();

    assert_eq!(outcome.order.status, OrderStatus::Sent);
    assert_eq!(outcome.order.sent_at, Some(now));
    assert_eq!(outcome.order.cutoff_at, Some(at(2026, 10, 21, 12, 0)));
    assert_eq!(
        outcome.baseline.quantities(),
        totals(&[("BAG", 10), ("ECL", 6), ("JUS", 2)])
    );

    let expected = [
        "Commande Moulin Dupont",
        "Livraison : jeudi 22/10/2026",
        "",
        "Vente",
        "2 × Jus d'orange",
        "",
        "Pâtisserie",
        "6 × Éclair café",
        "",
        "Boulangerie",
        "10 × Baguette tradition",
    ]
    .join("\n");
    assert_eq!(outcome.message, expected);

    assert_eq!(session.status(), OrderStatus::Sent);
    assert!(session.baseline().is_some());
    assert!(!session.has_rajout());
}

#[tokio::test]
async fn test_second_send_is_invalid_transition() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let now = at(2026, 10, 19, 9, 0);

    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 10, now).unwrap();
    lifecycle.send(&mut session, now).await.unwrap();

    let again = lifecycle.send(&mut session, now).await;
    assert!(matches!(again, Err(ApiError::InvalidStateTransition { .. })));

    // 发送前打开的旧会话也不能再次发送
    let stale_now = at(2026, 10, 19, 10, 0);
    let mut fresh = lifecycle.open(&thursday_key(), stale_now).await.unwrap();
    assert_eq!(fresh.status(), OrderStatus::Sent);
    let again = lifecycle.send(&mut fresh, stale_now).await;
    assert!(matches!(again, Err(ApiError::InvalidStateTransition { .. })));
}

// ==========================================
// 追加与基线
// ==========================================

#[tokio::test]
async fn test_rajout_message_and_absorb() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let order_id = send_standard_order(&env).await;
    let now = at(2026, 10, 20, 10, 0);

    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert!(matches!(
        lifecycle.rajout_message(&session).await,
        Err(ApiError::NoRajout(_))
    ));

    session.set_qty("BAG", 15, now).unwrap();
    session.check("CRO", now).unwrap();
    assert!(session.has_rajout());

    let message = lifecycle.rajout_message(&session).await.unwrap();
    let expected = [
        "Rajout commande Moulin Dupont",
        "Livraison : jeudi 22/10/2026",
        "",
        "Pâtisserie",
        "1 × Croissant",
        "",
        "Boulangerie",
        "5 × Baguette tradition",
    ]
    .join("\n");
    assert_eq!(message, expected);

    let baseline = lifecycle.absorb_rajout(&mut session, now).await.unwrap();
    let absorbed = totals(&[("BAG", 15), ("CRO", 1), ("ECL", 6), ("JUS", 2)]);
    assert_eq!(baseline.quantities(), absorbed);
    assert_eq!(stored_totals(&env, &order_id).await, absorbed);
    assert!(session.delta().is_empty());
    assert!(matches!(
        lifecycle.absorb_rajout(&mut session, now).await,
        Err(ApiError::NoRajout(_))
    ));

    // 重新打开后基线仍是吸收后的版本
    let reopened = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert_eq!(reopened.baseline_quantities(), absorbed);
    assert!(!reopened.has_rajout());
}

#[tokio::test]
async fn test_rajout_requires_sent_order() {
    let env = setup_env().await.expect("创建测试环境失败");
    let now = at(2026, 10, 19, 9, 0);
    let mut session = env.lifecycle().open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 3, now).unwrap();

    assert!(session.delta().is_empty());
    assert!(matches!(
        env.lifecycle().rajout_message(&session).await,
        Err(ApiError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_sent_quantities_never_decrease() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let order_id = send_standard_order(&env).await;
    let now = at(2026, 10, 20, 8, 0);

    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert!(session.is_locked_product("BAG"));
    assert!(!session.is_locked_product("CRO"));
    assert_eq!(session.set_qty("BAG", 3, now).unwrap(), 10);
    assert_eq!(session.uncheck("ECL", now).unwrap(), 6);
    assert_eq!(session.set_qty("JUS", 0, now).unwrap(), 2);
    assert!(session.delta().is_empty());

    lifecycle.save(&mut session, now).await.unwrap();
    assert_eq!(
        stored_totals(&env, &order_id).await,
        totals(&[("BAG", 10), ("ECL", 6), ("JUS", 2)])
    );
}

#[tokio::test]
async fn test_concurrent_devices_converge_to_highest_quantity() {
    let env = setup_env().await.expect("创建测试环境失败");
    let order_id = send_standard_order(&env).await;
    let now = at(2026, 10, 20, 8, 0);

    let (_local_b, device_b) = second_device(&env).expect("创建第二台设备失败");
    let mut session_b = device_b.lifecycle.open(&thursday_key(), now).await.unwrap();
    // 新设备没有本地基线，以当前明细初始化
    assert_eq!(
        session_b.baseline_quantities(),
        totals(&[("BAG", 10), ("ECL", 6), ("JUS", 2)])
    );

    let mut session_a = env.lifecycle().open(&thursday_key(), now).await.unwrap();
    session_a.set_qty("BAG", 14, now).unwrap();
    env.lifecycle().save(&mut session_a, now).await.unwrap();

    session_b.set_qty("BAG", 12, now).unwrap();
    device_b.lifecycle.save(&mut session_b, now).await.unwrap();

    let stored = stored_totals(&env, &order_id).await;
    assert_eq!(stored.get("BAG"), Some(&14));

    // B 重新打开后看到更高的服务端数量
    let reopened = device_b.lifecycle.open(&thursday_key(), now).await.unwrap();
    assert_eq!(reopened.selection().get("BAG").map(|e| e.qty), Some(14));
}

#[tokio::test]
async fn test_draft_session_opened_before_send_keeps_sent_lines() {
    let env = setup_env().await.expect("创建测试环境失败");
    let now = at(2026, 10, 19, 9, 0);
    let (_local_b, device_b) = second_device(&env).expect("创建第二台设备失败");

    let mut session_a = env.lifecycle().open(&thursday_key(), now).await.unwrap();
    session_a.set_qty("BAG", 3, now).unwrap();
    env.lifecycle().save(&mut session_a, now).await.unwrap();

    // B 在 A 发送之前打开草稿
    let mut session_b = device_b.lifecycle.open(&thursday_key(), now).await.unwrap();
    assert_eq!(session_b.status(), OrderStatus::Draft);

    let outcome = env.lifecycle().send(&mut session_a, now).await.unwrap();

    // B 仍以草稿身份编辑: 取消 BAG，加 ECL
    assert_eq!(session_b.uncheck("BAG", now).unwrap(), 0);
    session_b.set_qty("ECL", 1, now).unwrap();
    let receipt = device_b.lifecycle.save(&mut session_b, now).await.unwrap();

    assert_eq!(receipt.order.map(|o| o.status), Some(OrderStatus::Sent));
    assert_eq!(
        stored_totals(&env, &outcome.order.order_id).await,
        totals(&[("BAG", 3), ("ECL", 1)])
    );

    // B 接收了发送后的状态: BAG 回到基线并被锁定
    assert_eq!(session_b.status(), OrderStatus::Sent);
    assert_eq!(session_b.baseline_quantities(), totals(&[("BAG", 3)]));
    assert_eq!(session_b.selection().get("BAG"), Some(&SelectionEntry::checked(3)));
    assert!(session_b.is_locked_product("BAG"));
    assert_eq!(session_b.set_qty("BAG", 1, now).unwrap(), 3);
}

#[tokio::test]
async fn test_autosave_after_send_converges_instead_of_replacing() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let now = at(2026, 10, 19, 9, 0);

    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 3, now).unwrap();
    lifecycle.save(&mut session, now).await.unwrap();

    // 自动保存持有的是发送前的草稿订单
    let clock: Clock = Arc::new(move || now);
    let autosave = lifecycle.autosave_for(&session, clock).await.unwrap();
    assert_eq!(autosave.order().map(|o| o.status), Some(OrderStatus::Draft));

    let outcome = lifecycle.send(&mut session, now).await.unwrap();

    let mut late = Selection::new();
    late.insert("ECL", SelectionEntry::checked(2));
    autosave.schedule(late);
    let receipt = autosave
        .flush_now()
        .await
        .expect("应有挂起内容")
        .expect("写入应成功");

    assert_eq!(receipt.order.map(|o| o.status), Some(OrderStatus::Sent));
    assert_eq!(autosave.order().map(|o| o.status), Some(OrderStatus::Sent));
    assert_eq!(
        stored_totals(&env, &outcome.order.order_id).await,
        totals(&[("BAG", 3), ("ECL", 2)])
    );
}

#[tokio::test]
async fn test_unsaved_edits_survive_restart() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    send_standard_order(&env).await;
    let now = at(2026, 10, 20, 9, 0);

    // 编辑镜像进本地缓存，但未写入订单库
    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 12, now).unwrap();
    session.check("CRO", now).unwrap();
    drop(session);

    let recovered = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert_eq!(
        recovered.selection().desired_totals(),
        totals(&[("BAG", 12), ("CRO", 1), ("ECL", 6), ("JUS", 2)])
    );
    assert_eq!(recovered.delta().len(), 2);
}

// ==========================================
// 截单与归档
// ==========================================

#[tokio::test]
async fn test_read_only_after_cutoff() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    send_standard_order(&env).await;

    // 截单时刻本身仍可修改
    let at_cutoff = at(2026, 10, 21, 12, 0);
    let mut session = lifecycle.open(&thursday_key(), at_cutoff).await.unwrap();
    assert!(!session.is_read_only());
    assert_eq!(session.set_qty("BAG", 11, at_cutoff).unwrap(), 11);

    let after = at_cutoff + chrono::Duration::seconds(1);
    assert!(matches!(
        session.set_qty("BAG", 12, after),
        Err(ApiError::OrderLocked(_))
    ));
    assert!(matches!(
        lifecycle.save(&mut session, after).await,
        Err(ApiError::OrderLocked(_))
    ));
    // 只读一旦锁存，时间回退也不解除
    assert!(session.set_qty("BAG", 12, at_cutoff).is_err());

    let late = lifecycle.open(&thursday_key(), after).await.unwrap();
    assert!(late.is_read_only());
}

#[tokio::test]
async fn test_archive_is_final() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();
    let now = at(2026, 10, 22, 8, 0);

    let mut draft = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert!(matches!(
        lifecycle.archive(&mut draft).await,
        Err(ApiError::InvalidStateTransition { .. })
    ));

    send_standard_order(&env).await;
    let mut session = lifecycle.open(&thursday_key(), now).await.unwrap();
    let archived = lifecycle.archive(&mut session).await.unwrap();
    assert_eq!(archived.status, OrderStatus::Archived);
    assert!(session.is_read_only());
    assert!(matches!(
        lifecycle.archive(&mut session).await,
        Err(ApiError::InvalidStateTransition { .. })
    ));

    // 归档订单不再作为打开的订单返回，同一自然键也不能重新写入
    let mut reopened = lifecycle.open(&thursday_key(), now).await.unwrap();
    assert!(reopened.order().is_none());
    reopened.set_qty("BAG", 1, now).unwrap();
    assert!(matches!(
        lifecycle.save(&mut reopened, now).await,
        Err(ApiError::OrderLocked(_))
    ));
    assert!(matches!(
        lifecycle.send(&mut reopened, now).await,
        Err(ApiError::InvalidStateTransition { .. })
    ));
}

// ==========================================
// 商品目录与日历
// ==========================================

#[tokio::test]
async fn test_catalog_is_normalized() {
    let env = setup_env().await.expect("创建测试环境失败");
    let products = env.lifecycle().list_products(SUPPLIER).await.unwrap();
    let departments: BTreeMap<String, Department> = products
        .iter()
        .map(|p| (p.product_id.clone(), p.department))
        .collect();

    assert_eq!(departments.get("BAG"), Some(&Department::Boulanger));
    assert_eq!(departments.get("ECL"), Some(&Department::Patiss));
    assert_eq!(departments.get("CRO"), Some(&Department::Patiss));
    assert_eq!(departments.get("JUS"), Some(&Department::Vente));

    let bag = products.iter().find(|p| p.product_id == "BAG").unwrap();
    assert_eq!(bag.name, "Baguette tradition");
    assert!(env.lifecycle().list_products("autre").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upsert_product_validation() {
    let env = setup_env().await.expect("创建测试环境失败");

    let nameless = ProductRecord {
        product_id: "X1".to_string(),
        supplier_key: SUPPLIER.to_string(),
        name: Some("  ".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        env.lifecycle().upsert_product(&nameless).await,
        Err(ApiError::ValidationError(_))
    ));

    let negative = ProductRecord {
        product_id: "X2".to_string(),
        supplier_key: SUPPLIER.to_string(),
        name: Some("Sel fin".to_string()),
        unit_price: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        env.lifecycle().upsert_product(&negative).await,
        Err(ApiError::ValidationError(_))
    ));

    let uncategorized = ProductRecord {
        product_id: "X3".to_string(),
        supplier_key: SUPPLIER.to_string(),
        name: Some("Sel fin".to_string()),
        unit_price: 0.5,
        ..Default::default()
    };
    let product = env.lifecycle().upsert_product(&uncategorized).await.unwrap();
    assert_eq!(product.department, Department::Uncat);
    assert_eq!(env.lifecycle().list_products(SUPPLIER).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_next_delivery_date_and_stage() {
    let env = setup_env().await.expect("创建测试环境失败");
    let lifecycle = env.lifecycle();

    // 2026-10-19 周一 → 周二 2026-10-20；周三 → 周四
    assert_eq!(
        lifecycle.next_delivery_date(SUPPLIER, date(2026, 10, 19)).await.unwrap(),
        date(2026, 10, 20)
    );
    assert_eq!(
        lifecycle.next_delivery_date(SUPPLIER, date(2026, 10, 21)).await.unwrap(),
        date(2026, 10, 22)
    );
    assert_eq!(
        lifecycle.next_delivery_date(SUPPLIER, date(2026, 10, 22)).await.unwrap(),
        date(2026, 10, 22)
    );

    let key = thursday_key();
    let cases = [
        (at(2026, 10, 18, 23, 59), UrgencyStage::Calm),
        (at(2026, 10, 19, 0, 0), UrgencyStage::Finalize),
        (at(2026, 10, 20, 12, 0), UrgencyStage::Finalize),
        (at(2026, 10, 20, 12, 1), UrgencyStage::LastCall),
        (at(2026, 10, 21, 12, 0), UrgencyStage::LastCall),
        (at(2026, 10, 21, 12, 1), UrgencyStage::Locked),
    ];
    for (now, expected) in cases {
        assert_eq!(lifecycle.urgency_stage(&key, now).await.unwrap(), expected, "now={}", now);
    }
}
