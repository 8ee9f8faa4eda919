// ==========================================
// 面包店订货系统 - 配置层
// ==========================================
// 职责: 供应商配置与全局配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod supplier_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_AUTOSAVE_QUIET_MS, GLOBAL_SCOPE};
pub use supplier_config_trait::SupplierConfigReader;
