// ==========================================
// 面包店订货系统 - 选择集合并器
// ==========================================
// 输入: 服务端明细总量（权威） + 本地缓存选择集（可能过期）
// 输出: 合并后的工作选择集
// 红线: 单调合并: 不丢弃未落盘的加量，也不复活被服务端减掉的数量
// ==========================================

use crate::domain::selection::{Selection, SelectionEntry};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// SelectionMerger - 选择集合并器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionMerger;

impl SelectionMerger {
    pub fn new() -> Self {
        Self
    }

    /// 合并服务端总量与本地缓存
    ///
    /// 对两侧出现的每个商品:
    /// - qty = max(server_qty, cached_qty)
    /// - 缓存中有该商品 → checked = 缓存 checked 且缓存 qty>0
    /// - 缓存中没有 → 服务端明细视为已勾选
    /// - 仅保留 checked 且 qty>0 的商品
    pub fn merge(
        &self,
        server_totals: &BTreeMap<String, u32>,
        cached: Option<&Selection>,
    ) -> Selection {
        let empty = Selection::new();
        let cached = cached.unwrap_or(&empty);

        let product_ids: BTreeSet<&String> = server_totals
            .keys()
            .chain(cached.iter().map(|(id, _)| id))
            .collect();

        let mut merged = Selection::new();
        for product_id in product_ids {
            let server_qty = server_totals.get(product_id).copied().unwrap_or(0);
            let cached_entry = cached.get(product_id).copied();

            // 缓存中有该商品时以其勾选状态为准
            let checked = match cached_entry {
                Some(entry) => entry.checked && entry.qty > 0,
                None => server_qty > 0,
            };
            let qty = server_qty.max(cached_entry.map(|e| e.qty).unwrap_or(0));

            if checked && qty > 0 {
                merged.insert(product_id.clone(), SelectionEntry { checked, qty });
            }
        }

        tracing::debug!(
            server_products = server_totals.len(),
            cached_products = cached.len(),
            merged_products = merged.len(),
            "选择集合并完成"
        );
        merged
    }

    /// 将选择集自身视为服务端总量再合并（用于幂等校验）
    pub fn merge_selections(&self, server: &Selection, cached: &Selection) -> Selection {
        self.merge(&server.desired_totals(), Some(cached))
    }
}
