// ==========================================
// 面包店订货系统 - 基线快照
// ==========================================
// 基线 = 订单首次发送时实际告知供应商的数量
// 只能通过"吸收增量"(absorb) 整体覆盖
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineItem {
    pub product_id: String,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub order_id: String,
    pub items: Vec<BaselineItem>,
    pub captured_at: NaiveDateTime,
}

impl Baseline {
    /// 由按商品聚合的数量构建（items 按 product_id 升序，qty=0 的商品丢弃）
    pub fn from_totals(
        order_id: impl Into<String>,
        totals: &BTreeMap<String, u32>,
        captured_at: NaiveDateTime,
    ) -> Self {
        let items = totals
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(product_id, qty)| BaselineItem {
                product_id: product_id.clone(),
                qty: *qty,
            })
            .collect();
        Self {
            order_id: order_id.into(),
            items,
            captured_at,
        }
    }

    /// 商品 → 基线数量
    pub fn quantities(&self) -> BTreeMap<String, u32> {
        let mut map = BTreeMap::new();
        for item in &self.items {
            *map.entry(item.product_id.clone()).or_insert(0) += item.qty;
        }
        map
    }

    /// 单个商品的基线数量（不存在为 0）
    pub fn qty_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.qty)
            .sum()
    }
}
