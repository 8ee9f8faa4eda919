// ==========================================
// 面包店订货系统 - 应用层
// ==========================================
// 职责: 组装仓储/配置/生命周期，供命令行与上层界面使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, get_default_local_db_path, AppState};
