// ==========================================
// 面包店订货系统 - 订单写入器
// ==========================================
// 职责: 把选择集写回远端订单存储
// 模式（按订单状态选择）:
// - DRAFT: 单事务整体替换明细（写入的是总量，不是增量）
// - SENT:  按商品收敛到总量，持久化数量 = max(原数量, 目标数量)
// - ARCHIVED: 只读，拒绝写入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::{LineDraft, Order, OrderKey};
use crate::domain::product::ProductIndex;
use crate::domain::selection::Selection;
use crate::domain::types::OrderStatus;
use crate::engine::cutoff::CutoffGate;
use crate::repository::order_store::OrderStore;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// 一次写入的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    /// 写入后的订单；选择集为空且订单尚未创建时为 None
    pub order: Option<Order>,
    /// 写入的明细行数
    pub written: usize,
    /// 本次写入明细的内容哈希
    pub content_hash: String,
}

/// 由选择集构建待写明细（仅勾选且 qty>0，按 product_id 升序）
///
/// 名称与单价在写入时从商品目录反规范化；目录缺失时名称取 product_id、单价为 0
pub fn build_lines(selection: &Selection, products: &ProductIndex) -> Vec<LineDraft> {
    selection
        .desired_totals()
        .into_iter()
        .map(|(product_id, qty)| {
            let (product_name, unit_price) = match products.get(&product_id) {
                Some(p) => (p.name.clone(), p.unit_price),
                None => (product_id.clone(), 0.0),
            };
            LineDraft {
                product_id,
                product_name,
                unit_price,
                qty,
            }
        })
        .collect()
}

/// 明细内容哈希: SHA-256 over 排序后的 (product_id, qty)
pub fn content_hash(lines: &[LineDraft]) -> String {
    let mut pairs: Vec<(&str, u32)> = lines
        .iter()
        .filter(|l| l.qty > 0)
        .map(|l| (l.product_id.as_str(), l.qty))
        .collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for (product_id, qty) in pairs {
        hasher.update(product_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(qty.to_be_bytes());
    }
    format!("{:x}", hasher.finalize())
}

// ==========================================
// OrderPersister
// ==========================================
pub struct OrderPersister {
    store: Arc<dyn OrderStore>,
    gate: CutoffGate,
}

impl OrderPersister {
    pub fn new(store: Arc<dyn OrderStore>, gate: CutoffGate) -> Self {
        Self { store, gate }
    }

    /// 写入选择集
    ///
    /// # 参数
    /// - key: 订单自然键（订单不存在时以此隐式创建草稿）
    /// - order: 调用方已知的订单（仅用于定位，状态以存储为准）
    /// - selection: 工作选择集
    /// - products: 商品目录索引
    /// - now: 当前时刻（用于截单判定）
    ///
    /// # 返回
    /// - Err(OrderLocked): 已过截单或已归档
    /// - Err(PersistenceError): 存储失败（调用方保留内存中的选择集）
    #[tracing::instrument(skip(self, key, order, selection, products), fields(order_key = %key))]
    pub async fn persist(
        &self,
        key: &OrderKey,
        order: Option<&Order>,
        selection: &Selection,
        products: &ProductIndex,
        now: NaiveDateTime,
    ) -> ApiResult<SaveReceipt> {
        let lines = build_lines(selection, products);
        let hash = content_hash(&lines);

        // 写入模式以存储中的当前状态为准，调用方持有的订单可能已过期
        let known = match order {
            Some(o) => self.store.find_order(&o.order_id).await?,
            None if lines.is_empty() => {
                // 没有任何需求时不为写入而建单
                return Ok(SaveReceipt {
                    order: None,
                    written: 0,
                    content_hash: hash,
                });
            }
            None => None,
        };
        // upsert 命中已有订单时返回其当前状态
        let order = match known {
            Some(current) => current,
            None => self.store.upsert_order(key, now).await?,
        };

        if !self.gate.can_modify(Some(&order), now) {
            return Err(ApiError::OrderLocked(key.to_string()));
        }

        let written = match order.status {
            OrderStatus::Draft => self.store.replace_lines(&order.order_id, &lines).await?,
            OrderStatus::Sent => self.store.converge_lines(&order.order_id, &lines).await?,
            OrderStatus::Archived => return Err(ApiError::OrderLocked(order.order_id)),
        };

        tracing::info!(
            order_id = %order.order_id,
            status = %order.status,
            written,
            "选择集已写入"
        );
        Ok(SaveReceipt {
            order: Some(order),
            written,
            content_hash: hash,
        })
    }
}
