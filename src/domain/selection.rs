// ==========================================
// 面包店订货系统 - 工作选择集
// ==========================================
// 客户端本地的可变状态: product_id → {checked, qty}
// 不直接持久化，仅镜像到本地缓存用于崩溃恢复
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub checked: bool,
    pub qty: u32,
}

impl SelectionEntry {
    pub fn checked(qty: u32) -> Self {
        Self { checked: true, qty }
    }

    /// 勾选且数量 > 0 才算有效需求
    pub fn is_active(&self) -> bool {
        self.checked && self.qty > 0
    }
}

/// 工作选择集
///
/// 使用 BTreeMap 保证遍历顺序确定（哈希、消息输出都依赖此顺序）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    entries: BTreeMap<String, SelectionEntry>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由服务端总量构建（每个 qty>0 的商品视为已勾选）
    pub fn from_totals(totals: &BTreeMap<String, u32>) -> Self {
        let entries = totals
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(id, qty)| (id.clone(), SelectionEntry::checked(*qty)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, product_id: &str) -> Option<&SelectionEntry> {
        self.entries.get(product_id)
    }

    pub fn insert(&mut self, product_id: impl Into<String>, entry: SelectionEntry) {
        self.entries.insert(product_id.into(), entry);
    }

    pub fn remove(&mut self, product_id: &str) -> Option<SelectionEntry> {
        self.entries.remove(product_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SelectionEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 有效需求: 勾选且 qty>0 的商品 → 数量
    pub fn desired_totals(&self) -> BTreeMap<String, u32> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_active())
            .map(|(id, e)| (id.clone(), e.qty))
            .collect()
    }

    /// 是否存在至少一条有效需求
    pub fn has_active(&self) -> bool {
        self.entries.values().any(|e| e.is_active())
    }
}

impl FromIterator<(String, SelectionEntry)> for Selection {
    fn from_iter<T: IntoIterator<Item = (String, SelectionEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
