// ==========================================
// 面包店订货系统 - 截单闸门
// ==========================================
// 职责: 编辑权限判定 + 基线最小数量锁
// 红线: 已发送订单在截单前只能加量，不能低于基线
// 红线: 截单后（now > cutoff_at）订单只读
// ==========================================

use crate::domain::order::Order;
use crate::domain::types::OrderStatus;
use crate::engine::calendar::CalendarRules;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

// ==========================================
// CutoffGate - 截单闸门
// ==========================================
// 订单为 None 表示尚未落库的草稿
#[derive(Debug, Clone, Copy, Default)]
pub struct CutoffGate {
    calendar: CalendarRules,
}

impl CutoffGate {
    pub fn new(calendar: CalendarRules) -> Self {
        Self { calendar }
    }

    /// 是否已发送（状态不是 DRAFT）
    pub fn is_sent(&self, order: Option<&Order>) -> bool {
        order.map(|o| o.status != OrderStatus::Draft).unwrap_or(false)
    }

    /// 订单的截单时刻
    ///
    /// 发送时已写入 cutoff_at 则以其为准，否则按交货日期推算
    pub fn cutoff_of(&self, order: &Order) -> NaiveDateTime {
        order
            .cutoff_at
            .unwrap_or_else(|| self.calendar.cutoff_instant(order.delivery_date))
    }

    /// 是否允许修改
    ///
    /// - 草稿: 总是允许
    /// - 已发送: now <= cutoff_at
    /// - 已归档: 不允许
    pub fn can_modify(&self, order: Option<&Order>, now: NaiveDateTime) -> bool {
        match order {
            None => true,
            Some(o) => match o.status {
                OrderStatus::Draft => true,
                OrderStatus::Sent => now <= self.cutoff_of(o),
                OrderStatus::Archived => false,
            },
        }
    }

    /// 商品的最小允许数量
    ///
    /// 未发送或商品不在基线中 → 0；否则为基线数量
    pub fn minimum_qty(
        &self,
        product_id: &str,
        order: Option<&Order>,
        baseline: &BTreeMap<String, u32>,
    ) -> u32 {
        if !self.is_sent(order) {
            return 0;
        }
        baseline.get(product_id).copied().unwrap_or(0)
    }

    /// 商品是否被基线锁定
    pub fn locked_product(
        &self,
        product_id: &str,
        order: Option<&Order>,
        baseline: &BTreeMap<String, u32>,
    ) -> bool {
        self.is_sent(order) && self.minimum_qty(product_id, order, baseline) > 0
    }

    /// 将请求数量夹到最小允许数量以上
    pub fn clamp_qty(
        &self,
        product_id: &str,
        order: Option<&Order>,
        baseline: &BTreeMap<String, u32>,
        requested: u32,
    ) -> u32 {
        requested.max(self.minimum_qty(product_id, order, baseline))
    }
}
