// ==========================================
// 配置管理集成测试
// ==========================================
// 测试目标: 验证 ConfigManager 在文件数据库上的读写与回退行为
// ==========================================


use bakery_orders::config::{config_keys, ConfigManager, SupplierConfigReader, DEFAULT_AUTOSAVE_QUIET_MS, GLOBAL_SCOPE};
use bakery_orders::domain::{SupplierConfig, WeekdaySet};
use test_helpers::*;

#[tokio::test]
async fn test_supplier_config_persists_across_instances() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");

    {
        let manager = ConfigManager::new(&db_path).expect("创建ConfigManager失败");
        let config = SupplierConfig::new("fournil", WeekdaySet::from_days(&[1, 3, 5]))
            .with_label("Fournil du Marché")
            .with_cutoff(18, 30);
        manager.save_supplier_config(&config).expect("写入配置失败");
    }

    // 新实例重新读取
    let manager = ConfigManager::new(&db_path).expect("创建ConfigManager失败");
    let config = manager.get_supplier_config("fournil").await.unwrap();
    assert_eq!(config.label, "Fournil du Marché");
    assert_eq!(config.allowed_weekdays.days(), vec![1, 3, 5]);
    assert_eq!((config.cutoff_hour, config.cutoff_minute), (18, 30));

    let snapshot = manager.get_scope_snapshot("fournil").unwrap();
    assert_eq!(snapshot.get(config_keys::DELIVERY_WEEKDAYS).map(String::as_str), Some("1,3,5"));
    assert_eq!(snapshot.len(), 4);
}

#[tokio::test]
async fn test_unknown_supplier_uses_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let manager = ConfigManager::new(&db_path).expect("创建ConfigManager失败");

    let config = manager.get_supplier_config("inconnu").await.unwrap();
    assert_eq!(config.label, "inconnu");
    assert!(config.allowed_weekdays.is_empty());
    assert_eq!((config.cutoff_hour, config.cutoff_minute), (12, 0));
}

#[tokio::test]
async fn test_invalid_values_fall_back() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let manager = ConfigManager::new(&db_path).expect("创建ConfigManager失败");

    manager.set_config_value("moulin", config_keys::CUTOFF_HOUR, "25").unwrap();
    manager.set_config_value("moulin", config_keys::CUTOFF_MINUTE, "x").unwrap();
    manager.set_config_value("moulin", config_keys::SUPPLIER_LABEL, "   ").unwrap();
    manager.set_config_value("moulin", config_keys::DELIVERY_WEEKDAYS, "4").unwrap();
    manager.set_config_value(GLOBAL_SCOPE, config_keys::AUTOSAVE_QUIET_MS, "bientôt").unwrap();
    manager.set_config_value(GLOBAL_SCOPE, config_keys::MESSAGE_LOCALE, "de").unwrap();

    let config = manager.get_supplier_config("moulin").await.unwrap();
    assert_eq!((config.cutoff_hour, config.cutoff_minute), (12, 0));
    assert_eq!(config.label, "moulin");
    assert_eq!(config.allowed_weekdays.days(), vec![4]);

    assert_eq!(manager.get_autosave_quiet_ms().await.unwrap(), DEFAULT_AUTOSAVE_QUIET_MS);
    assert_eq!(manager.get_message_locale().await.unwrap(), "fr");
}

#[tokio::test]
async fn test_global_values_override_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let manager = ConfigManager::new(&db_path).expect("创建ConfigManager失败");

    manager.set_config_value(GLOBAL_SCOPE, config_keys::AUTOSAVE_QUIET_MS, "1500").unwrap();
    manager.set_config_value(GLOBAL_SCOPE, config_keys::MESSAGE_LOCALE, " EN ").unwrap();

    assert_eq!(manager.get_autosave_quiet_ms().await.unwrap(), 1500);
    assert_eq!(manager.get_message_locale().await.unwrap(), "en");

    // 覆盖写入
    manager.set_config_value(GLOBAL_SCOPE, config_keys::AUTOSAVE_QUIET_MS, "800").unwrap();
    assert_eq!(manager.get_autosave_quiet_ms().await.unwrap(), 800);
}

#[tokio::test]
async fn test_english_locale_changes_outgoing_message() {
    let env = setup_env().await.expect("创建测试环境失败");
    env.state
        .config
        .set_config_value(GLOBAL_SCOPE, config_keys::MESSAGE_LOCALE, "en")
        .unwrap();

    let now = at(2026, 10, 19, 9, 0);
    let mut session = env.lifecycle().open(&thursday_key(), now).await.unwrap();
    session.set_qty("BAG", 3, now).unwrap();
    let outcome = env.lifecycle().send(&mut session, now).await.unwrap();

    assert!(outcome.message.starts_with("Order Moulin Dupont\nDelivery: Thursday 22/10/2026"));
    assert!(outcome.message.ends_with("Bread\n3 × Baguette tradition"));
}
