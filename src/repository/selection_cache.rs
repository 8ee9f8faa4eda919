// ==========================================
// 面包店订货系统 - 选择集崩溃恢复缓存
// ==========================================
// 存储: 本地快照库 namespace = "selection", key = "{supplier}|{date}"
// 仅作崩溃恢复辅助，不具权威性
// ==========================================

use crate::domain::order::OrderKey;
use crate::domain::selection::Selection;
use crate::repository::snapshot_store::SnapshotStore;
use std::sync::Arc;

const SELECTION_NAMESPACE: &str = "selection";

pub struct SelectionCache {
    snapshots: Arc<dyn SnapshotStore>,
}

impl SelectionCache {
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { snapshots }
    }

    /// 读取缓存的选择集；缺失或损坏返回 None
    pub fn load(&self, key: &OrderKey) -> Option<Selection> {
        let value = self.snapshots.get(SELECTION_NAMESPACE, &key.cache_key())?;
        serde_json::from_value(value)
            .map_err(|e| tracing::debug!(order_key = %key, error = %e, "选择缓存无法解析，忽略"))
            .ok()
    }

    /// 镜像选择集到缓存（失败静默）
    pub fn store(&self, key: &OrderKey, selection: &Selection) {
        match serde_json::to_value(selection) {
            Ok(value) => {
                if !self.snapshots.set(SELECTION_NAMESPACE, &key.cache_key(), &value) {
                    tracing::debug!(order_key = %key, "选择缓存写入失败");
                }
            }
            Err(e) => tracing::debug!(order_key = %key, error = %e, "选择缓存序列化失败"),
        }
    }

    pub fn clear(&self, key: &OrderKey) {
        self.snapshots.remove(SELECTION_NAMESPACE, &key.cache_key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::selection::SelectionEntry;
    use crate::repository::snapshot_store::MemorySnapshotStore;
    use chrono::NaiveDate;

    fn key(day: u32) -> OrderKey {
        OrderKey::new("moulin", NaiveDate::from_ymd_opt(2026, 10, day).unwrap())
    }

    #[test]
    fn test_store_and_load_per_key() {
        let cache = SelectionCache::new(Arc::new(MemorySnapshotStore::new()));
        let mut selection = Selection::new();
        selection.insert("A", SelectionEntry::checked(4));
        selection.insert("B", SelectionEntry { checked: false, qty: 2 });

        cache.store(&key(22), &selection);
        assert_eq!(cache.load(&key(22)), Some(selection));
        assert!(cache.load(&key(29)).is_none());

        cache.clear(&key(22));
        assert!(cache.load(&key(22)).is_none());
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let snapshots = Arc::new(MemorySnapshotStore::new());
        snapshots.put_raw(SELECTION_NAMESPACE, &key(22).cache_key(), r#"{"A":{"checked":"yes"}}"#);
        let cache = SelectionCache::new(snapshots);
        assert!(cache.load(&key(22)).is_none());
    }
}
