// ==========================================
// 面包店订货系统 - 引擎层
// ==========================================
// 职责: 实现订单规则（分类/日历/合并/增量/截单/消息）
// 红线: Engine 不拼 SQL, 全部为纯函数或无状态结构
// ==========================================

pub mod calendar;
pub mod cutoff;
pub mod delta;
pub mod department;
pub mod merge;
pub mod message;
pub mod summary;

// 重导出核心引擎
pub use calendar::{CalendarRules, DATE_SCAN_LIMIT_DAYS};
pub use cutoff::CutoffGate;
pub use delta::{DeltaCalculator, DeltaLine};
pub use department::{normalize_label, DepartmentClassifier};
pub use merge::SelectionMerger;
pub use message::{MessageFormatter, MessageLine};
pub use summary::OrderSummary;
