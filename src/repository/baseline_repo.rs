// ==========================================
// 面包店订货系统 - 基线快照仓储
// ==========================================
// 存储: 本地快照库 namespace = "baseline", key = order_id
// 约束: 快照缺失不是错误，读取失败视为缺失
// ==========================================

use crate::domain::baseline::Baseline;
use crate::domain::order::{line_totals, OrderLine};
use crate::repository::snapshot_store::SnapshotStore;
use chrono::NaiveDateTime;
use std::sync::Arc;

const BASELINE_NAMESPACE: &str = "baseline";

// ==========================================
// BaselineStore
// ==========================================
pub struct BaselineStore {
    snapshots: Arc<dyn SnapshotStore>,
}

impl BaselineStore {
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { snapshots }
    }

    /// 以当前明细（按商品聚合）作为订单基线
    ///
    /// 由 draft → sent 转换自动调用；写入失败只记日志，返回内存中的基线
    pub fn capture(&self, order_id: &str, lines: &[OrderLine], now: NaiveDateTime) -> Baseline {
        let baseline = Baseline::from_totals(order_id, &line_totals(lines), now);
        self.write(&baseline);
        tracing::info!(order_id, items = baseline.items.len(), "基线已捕获");
        baseline
    }

    /// 读取基线；不存在或损坏返回 None
    pub fn read(&self, order_id: &str) -> Option<Baseline> {
        let value = self.snapshots.get(BASELINE_NAMESPACE, order_id)?;
        match serde_json::from_value::<Baseline>(value) {
            Ok(baseline) => Some(baseline),
            Err(e) => {
                tracing::warn!(order_id, error = %e, "基线快照结构无效，视为缺失");
                None
            }
        }
    }

    /// 基线缺失时以当前明细初始化（"当前即基线"回退）
    pub fn ensure(&self, order_id: &str, current: &[OrderLine], now: NaiveDateTime) -> Baseline {
        match self.read(order_id) {
            Some(baseline) => baseline,
            None => {
                tracing::info!(order_id, "本设备无基线，按当前明细初始化");
                self.capture(order_id, current, now)
            }
        }
    }

    /// 吸收追加: 以当前总量覆盖基线
    pub fn absorb(&self, order_id: &str, current: &[OrderLine], now: NaiveDateTime) -> Baseline {
        let baseline = Baseline::from_totals(order_id, &line_totals(current), now);
        self.write(&baseline);
        tracing::info!(order_id, items = baseline.items.len(), "追加已吸收进基线");
        baseline
    }

    fn write(&self, baseline: &Baseline) {
        match serde_json::to_value(baseline) {
            Ok(value) => {
                if !self.snapshots.set(BASELINE_NAMESPACE, &baseline.order_id, &value) {
                    tracing::warn!(order_id = %baseline.order_id, "基线未能写入本地快照");
                }
            }
            Err(e) => tracing::warn!(order_id = %baseline.order_id, error = %e, "基线序列化失败"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::snapshot_store::MemorySnapshotStore;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn line(product_id: &str, qty: u32) -> OrderLine {
        OrderLine {
            order_id: "o1".to_string(),
            product_id: product_id.to_string(),
            product_name: product_id.to_string(),
            unit_price: 1.0,
            qty,
        }
    }

    #[test]
    fn test_read_absent_is_none() {
        let store = BaselineStore::new(Arc::new(MemorySnapshotStore::new()));
        assert!(store.read("o1").is_none());
    }

    #[test]
    fn test_capture_aggregates_per_product() {
        let store = BaselineStore::new(Arc::new(MemorySnapshotStore::new()));
        store.capture("o1", &[line("A", 2), line("A", 1), line("B", 4)], now());

        let baseline = store.read("o1").unwrap();
        assert_eq!(baseline.qty_of("A"), 3);
        assert_eq!(baseline.qty_of("B"), 4);
        assert_eq!(baseline.captured_at, now());
    }

    #[test]
    fn test_ensure_keeps_existing_baseline() {
        let store = BaselineStore::new(Arc::new(MemorySnapshotStore::new()));
        store.capture("o1", &[line("A", 3)], now());

        let ensured = store.ensure("o1", &[line("A", 5)], now());
        assert_eq!(ensured.qty_of("A"), 3);
    }

    #[test]
    fn test_ensure_initializes_from_current() {
        let store = BaselineStore::new(Arc::new(MemorySnapshotStore::new()));
        let ensured = store.ensure("o1", &[line("A", 5)], now());
        assert_eq!(ensured.qty_of("A"), 5);
        assert_eq!(store.read("o1").unwrap().qty_of("A"), 5);
    }

    #[test]
    fn test_absorb_overwrites() {
        let store = BaselineStore::new(Arc::new(MemorySnapshotStore::new()));
        store.capture("o1", &[line("A", 3)], now());
        store.absorb("o1", &[line("A", 5), line("C", 1)], now());

        let baseline = store.read("o1").unwrap();
        assert_eq!(baseline.qty_of("A"), 5);
        assert_eq!(baseline.qty_of("C"), 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_absent() {
        let snapshots = Arc::new(MemorySnapshotStore::new());
        snapshots.put_raw(BASELINE_NAMESPACE, "o1", r#"{"items":"nope"}"#);
        let store = BaselineStore::new(snapshots);
        assert!(store.read("o1").is_none());
    }
}
