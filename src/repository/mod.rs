// ==========================================
// 面包店订货系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 远端订单存储 + 本地快照存储，屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod baseline_repo;
pub mod error;
pub mod order_repo;
pub mod order_store;
pub mod selection_cache;
pub mod snapshot_store;

// 重导出核心仓储
pub use baseline_repo::BaselineStore;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::SqliteOrderStore;
pub use order_store::OrderStore;
pub use selection_cache::SelectionCache;
pub use snapshot_store::{MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
