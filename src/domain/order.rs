// ==========================================
// 面包店订货系统 - 订单领域模型
// ==========================================
// 自然键: (supplier_key, delivery_date)
// 代理键: order_id (创建时分配, UUID)
// ==========================================

use crate::domain::types::OrderStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// OrderKey - 订单自然键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderKey {
    pub supplier_key: String,     // 供应商标识
    pub delivery_date: NaiveDate, // 交货日期
}

impl OrderKey {
    pub fn new(supplier_key: impl Into<String>, delivery_date: NaiveDate) -> Self {
        Self {
            supplier_key: supplier_key.into(),
            delivery_date,
        }
    }

    /// 本地缓存键: "{supplier_key}|{YYYY-MM-DD}"
    pub fn cache_key(&self) -> String {
        format!("{}|{}", self.supplier_key, self.delivery_date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.supplier_key, self.delivery_date)
    }
}

// ==========================================
// Order - 订货单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,                  // 订单ID
    pub supplier_key: String,              // 供应商标识
    pub delivery_date: NaiveDate,          // 交货日期
    pub status: OrderStatus,               // 状态
    pub sent_at: Option<NaiveDateTime>,    // 发送时间
    pub cutoff_at: Option<NaiveDateTime>,  // 截单时刻（发送时写入）
    pub created_at: NaiveDateTime,         // 创建时间
}

impl Order {
    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.supplier_key.clone(), self.delivery_date)
    }

    pub fn is_draft(&self) -> bool {
        self.status == OrderStatus::Draft
    }

    pub fn is_archived(&self) -> bool {
        self.status == OrderStatus::Archived
    }
}

// ==========================================
// OrderLine - 订单明细
// ==========================================
// qty 表示当前总需求量（不是增量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,     // 关联订单
    pub product_id: String,   // 商品ID
    pub product_name: String, // 商品名称（冗余，用于展示/历史）
    pub unit_price: f64,      // 单价（写入时冗余）
    pub qty: u32,             // 数量
}

/// 待写入的明细行（写入前尚无 order_id）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDraft {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: f64,
    pub qty: u32,
}

/// 按商品聚合明细数量
///
/// 同一商品出现多行时求和（兼容历史上的追加式明细）
pub fn line_totals(lines: &[OrderLine]) -> BTreeMap<String, u32> {
    let mut totals: BTreeMap<String, u32> = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product_id.clone()).or_insert(0) += line.qty;
    }
    totals
}
