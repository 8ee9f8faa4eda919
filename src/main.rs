// ==========================================
// 面包店订货系统 - 命令行入口
// ==========================================
// 用法:
//   bakery-orders preview <supplier> [YYYY-MM-DD]
//   bakery-orders send    <supplier> <YYYY-MM-DD>
//   bakery-orders stage   <supplier> [YYYY-MM-DD]
//
// 未给出日期时取供应商下一个可交货日期
// 数据库路径: BAKERY_ORDERS_DB_PATH / BAKERY_ORDERS_LOCAL_DB_PATH
// ==========================================

use anyhow::{anyhow, bail, Context};
use bakery_orders::api::{ApiError, OrderLifecycle};
use bakery_orders::app::{get_default_db_path, get_default_local_db_path, AppState};
use bakery_orders::config::SupplierConfigReader;
use bakery_orders::domain::OrderKey;
use bakery_orders::engine::MessageLine;
use bakery_orders::{logging, OrderStatus};
use chrono::{NaiveDate, NaiveDateTime};

const USAGE: &str = "usage: bakery-orders <preview|send|stage> <supplier> [YYYY-MM-DD]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("BAKERY_ORDERS_LOG_JSON").is_ok() {
        logging::init_json();
    } else {
        logging::init();
    }

    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let supplier = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!(USAGE))?;
    let date = args
        .next()
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .transpose()
        .context("日期格式应为 YYYY-MM-DD")?;

    let state = AppState::new(get_default_db_path(), get_default_local_db_path())
        .context("无法初始化数据库")?;
    bakery_orders::i18n::set_locale(&state.config.get_message_locale().await?);
    let lifecycle = state.lifecycle.as_ref();
    let now = chrono::Local::now().naive_local();

    let delivery_date = match date {
        Some(d) => d,
        None if command == "send" => bail!(USAGE),
        None => lifecycle.next_delivery_date(&supplier, now.date()).await?,
    };
    let key = OrderKey::new(supplier, delivery_date);

    let result = match command.as_str() {
        "preview" => preview(lifecycle, &key, now).await,
        "send" => send(lifecycle, &key, now).await,
        "stage" => stage(lifecycle, &key, now).await,
        _ => bail!(USAGE),
    };

    // 业务错误以本地化说明输出，不打印内部细节
    result.map_err(|e| anyhow!(e.user_message()))
}

async fn preview(lifecycle: &OrderLifecycle, key: &OrderKey, now: NaiveDateTime) -> Result<(), ApiError> {
    let mut session = lifecycle.open(key, now).await?;
    let summary = session.summary();
    let stage = lifecycle.urgency_stage(key, now).await?;

    println!("order      {}", key);
    println!("status     {}", session.status());
    println!("stage      {}", stage);
    println!("modifiable {}", session.can_modify(now));
    println!(
        "summary    {} lines, {} items, {:.2}",
        summary.line_count, summary.total_qty, summary.total_amount
    );

    let formatter = lifecycle.message_formatter().await?;
    let config = lifecycle.supplier_config(&key.supplier_key).await?;
    let text = if session.status() == OrderStatus::Sent {
        if !session.has_rajout() {
            println!("no pending rajout");
            return Ok(());
        }
        lifecycle.rajout_message(&session).await?
    } else {
        formatter.format_order(
            &config.label,
            key.delivery_date,
            &MessageLine::from_totals(&session.selection().desired_totals(), session.products()),
        )
    };
    println!();
    println!("{}", text);
    Ok(())
}

async fn send(lifecycle: &OrderLifecycle, key: &OrderKey, now: NaiveDateTime) -> Result<(), ApiError> {
    let mut session = lifecycle.open(key, now).await?;
    let outcome = lifecycle.send(&mut session, now).await?;
    tracing::info!(order_id = %outcome.order.order_id, "发送完成");
    println!("{}", outcome.message);
    Ok(())
}

async fn stage(lifecycle: &OrderLifecycle, key: &OrderKey, now: NaiveDateTime) -> Result<(), ApiError> {
    let stage = lifecycle.urgency_stage(key, now).await?;
    println!("{} {}", key, stage);
    Ok(())
}
