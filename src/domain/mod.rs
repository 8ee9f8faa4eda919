// ==========================================
// 面包店订货系统 - 领域模型层
// ==========================================
// 职责: 定义订单、明细、基线、选择集、商品、供应商配置
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod baseline;
pub mod order;
pub mod product;
pub mod selection;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use baseline::{Baseline, BaselineItem};
pub use order::{line_totals, LineDraft, Order, OrderKey, OrderLine};
pub use product::{index_products, Product, ProductIndex, ProductRecord};
pub use selection::{Selection, SelectionEntry};
pub use supplier::{SupplierConfig, WeekdaySet, DEFAULT_CUTOFF_HOUR, DEFAULT_CUTOFF_MINUTE};
pub use types::{Department, OrderStatus, UrgencyStage};
