// ==========================================
// 面包店订货系统 - 订单会话
// ==========================================
// 职责: 持有单个订单的工作状态（订单/基线/选择集/商品目录）
// 约束:
// - 选择集是唯一可变数据源，增量与汇总每次读取时推导
// - 所有改量入口都经过 CutoffGate 的最小数量约束
// - 一旦观察到不可修改，本会话永久只读
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::baseline::Baseline;
use crate::domain::order::{Order, OrderKey};
use crate::domain::product::ProductIndex;
use crate::domain::selection::{Selection, SelectionEntry};
use crate::domain::types::OrderStatus;
use crate::engine::cutoff::CutoffGate;
use crate::engine::delta::{DeltaCalculator, DeltaLine};
use crate::engine::summary::OrderSummary;
use crate::repository::selection_cache::SelectionCache;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct OrderSession {
    key: OrderKey,
    order: Option<Order>,
    baseline: Option<Baseline>,
    selection: Selection,
    products: Arc<ProductIndex>,
    gate: CutoffGate,
    read_only: bool,
    cache: Option<Arc<SelectionCache>>,
}

impl OrderSession {
    pub fn new(
        key: OrderKey,
        order: Option<Order>,
        baseline: Option<Baseline>,
        selection: Selection,
        products: Arc<ProductIndex>,
        gate: CutoffGate,
    ) -> Self {
        let read_only = order.as_ref().map(|o| o.is_archived()).unwrap_or(false);
        Self {
            key,
            order,
            baseline,
            selection,
            products,
            gate,
            read_only,
            cache: None,
        }
    }

    /// 挂接崩溃恢复缓存（每次编辑后镜像选择集）
    pub fn with_cache(mut self, cache: Arc<SelectionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    // ===== 只读视图 =====

    pub fn key(&self) -> &OrderKey {
        &self.key
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn status(&self) -> OrderStatus {
        self.order.as_ref().map(|o| o.status).unwrap_or(OrderStatus::Draft)
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn products(&self) -> &Arc<ProductIndex> {
        &self.products
    }

    pub fn gate(&self) -> &CutoffGate {
        &self.gate
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// 基线数量（无基线为空）
    pub fn baseline_quantities(&self) -> BTreeMap<String, u32> {
        self.baseline
            .as_ref()
            .map(|b| b.quantities())
            .unwrap_or_default()
    }

    /// 当前增量（每次调用重新计算）
    pub fn delta(&self) -> Vec<DeltaLine> {
        if !self.gate.is_sent(self.order.as_ref()) {
            return Vec::new();
        }
        DeltaCalculator::new().compute(&self.baseline_quantities(), &self.selection, &self.products)
    }

    pub fn has_rajout(&self) -> bool {
        self.gate.is_sent(self.order.as_ref())
            && DeltaCalculator::new().has_rajout(&self.baseline_quantities(), &self.selection)
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary::of(&self.selection, &self.products)
    }

    pub fn minimum_qty(&self, product_id: &str) -> u32 {
        self.gate
            .minimum_qty(product_id, self.order.as_ref(), &self.baseline_quantities())
    }

    pub fn is_locked_product(&self, product_id: &str) -> bool {
        self.gate
            .locked_product(product_id, self.order.as_ref(), &self.baseline_quantities())
    }

    /// 是否允许修改；观察到 false 后锁存为只读
    pub fn can_modify(&mut self, now: NaiveDateTime) -> bool {
        if self.read_only {
            return false;
        }
        if !self.gate.can_modify(self.order.as_ref(), now) {
            tracing::info!(order_key = %self.key, "订单已过截单时刻，会话转为只读");
            self.read_only = true;
        }
        !self.read_only
    }

    // ===== 改量入口 =====

    /// 设置数量（低于基线时夹回基线；结果为 0 时移除该商品）
    pub fn set_qty(&mut self, product_id: &str, qty: u32, now: NaiveDateTime) -> ApiResult<u32> {
        self.ensure_modifiable(now)?;
        let qty = self.clamp(product_id, qty);
        if qty == 0 {
            self.selection.remove(product_id);
        } else {
            self.selection.insert(product_id, SelectionEntry::checked(qty));
        }
        self.mirror();
        Ok(qty)
    }

    /// 勾选商品（数量至少为 1，且不低于基线）
    pub fn check(&mut self, product_id: &str, now: NaiveDateTime) -> ApiResult<u32> {
        self.ensure_modifiable(now)?;
        let current = self.selection.get(product_id).map(|e| e.qty).unwrap_or(0);
        let qty = self.clamp(product_id, current.max(1));
        self.selection.insert(product_id, SelectionEntry::checked(qty));
        self.mirror();
        Ok(qty)
    }

    /// 取消勾选
    ///
    /// 被基线锁定的商品回退到基线数量并保持勾选，而不是归零
    pub fn uncheck(&mut self, product_id: &str, now: NaiveDateTime) -> ApiResult<u32> {
        self.ensure_modifiable(now)?;
        let minimum = self.minimum_qty(product_id);
        if minimum > 0 {
            self.selection.insert(product_id, SelectionEntry::checked(minimum));
        } else if let Some(entry) = self.selection.get(product_id).copied() {
            self.selection.insert(
                product_id,
                SelectionEntry {
                    checked: false,
                    qty: entry.qty,
                },
            );
        }
        self.mirror();
        Ok(minimum)
    }

    /// 切换勾选状态
    pub fn toggle(&mut self, product_id: &str, now: NaiveDateTime) -> ApiResult<u32> {
        let active = self
            .selection
            .get(product_id)
            .map(|e| e.is_active())
            .unwrap_or(false);
        if active {
            self.uncheck(product_id, now)
        } else {
            self.check(product_id, now)
        }
    }

    // ===== 生命周期回写 =====

    pub(crate) fn set_order(&mut self, order: Option<Order>) {
        if order.as_ref().map(|o| o.is_archived()).unwrap_or(false) {
            self.read_only = true;
        }
        self.order = order;
    }

    pub(crate) fn set_baseline(&mut self, baseline: Option<Baseline>) {
        self.baseline = baseline;
    }

    /// 接收已被发送的订单（可能由其他设备发送）
    ///
    /// 基线内的商品数量提升到基线值并保持勾选
    pub(crate) fn adopt_sent(&mut self, order: Order, baseline: Baseline) {
        self.set_order(Some(order));
        self.baseline = Some(baseline);
        if self.raise_to_baseline() > 0 {
            self.mirror();
        }
    }

    /// 把低于基线或未勾选的基线商品恢复为基线数量，返回调整的条目数
    pub(crate) fn raise_to_baseline(&mut self) -> usize {
        let mut raised = 0;
        for (product_id, base) in self.baseline_quantities() {
            let active = self
                .selection
                .get(&product_id)
                .filter(|e| e.is_active())
                .map(|e| e.qty)
                .unwrap_or(0);
            if base > active {
                self.selection.insert(&product_id, SelectionEntry::checked(base));
                raised += 1;
            }
        }
        raised
    }

    fn ensure_modifiable(&mut self, now: NaiveDateTime) -> ApiResult<()> {
        if self.can_modify(now) {
            Ok(())
        } else {
            Err(ApiError::OrderLocked(self.key.to_string()))
        }
    }

    fn clamp(&self, product_id: &str, qty: u32) -> u32 {
        self.gate
            .clamp_qty(product_id, self.order.as_ref(), &self.baseline_quantities(), qty)
    }

    fn mirror(&self) {
        if let Some(cache) = &self.cache {
            cache.store(&self.key, &self.selection);
        }
    }
}
