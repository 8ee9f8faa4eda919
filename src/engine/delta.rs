// ==========================================
// 面包店订货系统 - 增量（rajout）计算
// ==========================================
// 输入: 基线数量 + 工作选择集
// 输出: delta = desired - base > 0 的商品列表
// 排序: 部门 → 商品名称 → product_id（保证确定性）
// 红线: 纯投影，无副作用；选择集等于基线时输出为空
// ==========================================

use crate::domain::product::ProductIndex;
use crate::domain::selection::Selection;
use crate::domain::types::Department;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个商品的增量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaLine {
    pub product_id: String,
    pub product_name: String,
    pub department: Department,
    pub base: u32,
    pub desired: u32,
    pub delta: u32,
}

// ==========================================
// DeltaCalculator - 增量计算器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaCalculator;

impl DeltaCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 计算增量列表
    ///
    /// 未在商品索引中的商品: 名称取 product_id，部门为 Uncat
    pub fn compute(
        &self,
        baseline: &BTreeMap<String, u32>,
        selection: &Selection,
        products: &ProductIndex,
    ) -> Vec<DeltaLine> {
        let mut lines: Vec<DeltaLine> = selection
            .iter()
            .filter(|(_, entry)| entry.checked)
            .filter_map(|(product_id, entry)| {
                let base = baseline.get(product_id).copied().unwrap_or(0);
                let desired = entry.qty;
                if desired <= base {
                    return None;
                }
                let (product_name, department) = match products.get(product_id) {
                    Some(p) => (p.name.clone(), p.department),
                    None => (product_id.clone(), Department::Uncat),
                };
                Some(DeltaLine {
                    product_id: product_id.clone(),
                    product_name,
                    department,
                    base,
                    desired,
                    delta: desired - base,
                })
            })
            .collect();

        lines.sort_by(|a, b| {
            a.department
                .cmp(&b.department)
                .then_with(|| a.product_name.cmp(&b.product_name))
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        lines
    }

    /// 是否存在待发送的增量
    pub fn has_rajout(
        &self,
        baseline: &BTreeMap<String, u32>,
        selection: &Selection,
    ) -> bool {
        selection.iter().any(|(product_id, entry)| {
            entry.checked && entry.qty > baseline.get(product_id).copied().unwrap_or(0)
        })
    }
}
