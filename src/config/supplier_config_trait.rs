// ==========================================
// 面包店订货系统 - 供应商配置读取 Trait
// ==========================================
// 职责: 定义订单流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::supplier::SupplierConfig;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// SupplierConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SupplierConfigReader: Send + Sync {
    /// 获取供应商配置（scope_id = supplier_key）
    ///
    /// # 默认值
    /// - label: supplier_key
    /// - delivery_weekdays: 空集合
    /// - cutoff: 12:00
    async fn get_supplier_config(&self, supplier_key: &str) -> RepositoryResult<SupplierConfig>;

    /// 获取自动保存静默期（毫秒）
    ///
    /// # 默认值
    /// - 600
    async fn get_autosave_quiet_ms(&self) -> RepositoryResult<u64>;

    /// 获取消息语言
    ///
    /// # 默认值
    /// - "fr"
    async fn get_message_locale(&self) -> RepositoryResult<String>;
}
