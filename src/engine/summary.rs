// ==========================================
// 面包店订货系统 - 订单汇总
// ==========================================
// 由选择集实时推导，不缓存
// ==========================================

use crate::domain::product::ProductIndex;
use crate::domain::selection::Selection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderSummary {
    pub line_count: usize, // 有效商品数
    pub total_qty: u32,    // 总件数
    pub total_amount: f64, // 总金额（未知商品单价按 0 计）
}

impl OrderSummary {
    pub fn of(selection: &Selection, products: &ProductIndex) -> Self {
        selection
            .iter()
            .filter(|(_, e)| e.is_active())
            .fold(Self::default(), |mut acc, (product_id, entry)| {
                let price = products.get(product_id).map(|p| p.unit_price).unwrap_or(0.0);
                acc.line_count += 1;
                acc.total_qty += entry.qty;
                acc.total_amount += price * entry.qty as f64;
                acc
            })
    }
}
