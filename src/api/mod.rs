// ==========================================
// 面包店订货系统 - API 层
// ==========================================
// 职责: 订单会话、写入、防抖保存与生命周期编排
// ==========================================

pub mod autosave;
pub mod error;
pub mod lifecycle;
pub mod persister;
pub mod session;
pub mod validator;

// 重导出核心类型
pub use autosave::{system_clock, AutosaveSession, Clock, SaveStatus};
pub use error::{ApiError, ApiResult, PersistenceKind};
pub use lifecycle::{OrderLifecycle, SendOutcome};
pub use persister::{build_lines, content_hash, OrderPersister, SaveReceipt};
pub use session::OrderSession;
pub use validator::{validate_order_id, validate_order_key, validate_product_record};
