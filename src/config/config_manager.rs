// ==========================================
// 面包店订货系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// scope: 'global' 或 供应商标识
// ==========================================

use crate::config::supplier_config_trait::SupplierConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::supplier::{
    SupplierConfig, WeekdaySet, DEFAULT_CUTOFF_HOUR, DEFAULT_CUTOFF_MINUTE,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 全局配置作用域
pub const GLOBAL_SCOPE: &str = "global";

/// 自动保存静默期默认值（毫秒）
pub const DEFAULT_AUTOSAVE_QUIET_MS: u64 = 600;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, scope_id: &str, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope_id, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, scope_id: &str, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![scope_id, key, value],
        )?;
        tracing::debug!(scope_id, key, value, "配置已写入");
        Ok(())
    }

    /// 读取某作用域下的全部配置
    pub fn get_scope_snapshot(&self, scope_id: &str) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![scope_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 写入供应商配置（一次性写入全部键）
    pub fn save_supplier_config(&self, config: &SupplierConfig) -> RepositoryResult<()> {
        let weekdays = config
            .allowed_weekdays
            .days()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let scope = config.supplier_key.as_str();
        self.set_config_value(scope, config_keys::SUPPLIER_LABEL, &config.label)?;
        self.set_config_value(scope, config_keys::DELIVERY_WEEKDAYS, &weekdays)?;
        self.set_config_value(scope, config_keys::CUTOFF_HOUR, &config.cutoff_hour.to_string())?;
        self.set_config_value(scope, config_keys::CUTOFF_MINUTE, &config.cutoff_minute.to_string())?;
        Ok(())
    }

    /// 解析整数配置，格式错误或越界时回退默认值
    fn parse_bounded(scope_id: &str, key: &str, raw: Option<String>, max: u32, default: u32) -> u32 {
        let Some(raw) = raw else {
            return default;
        };
        match raw.trim().parse::<u32>() {
            Ok(v) if v <= max => v,
            _ => {
                tracing::warn!(scope_id, config_key = key, raw_value = %raw, default, "配置值无效，使用默认值");
                default
            }
        }
    }
}

// ==========================================
// SupplierConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SupplierConfigReader for ConfigManager {
    async fn get_supplier_config(&self, supplier_key: &str) -> RepositoryResult<SupplierConfig> {
        let values = self.get_scope_snapshot(supplier_key)?;

        let weekdays = match values.get(config_keys::DELIVERY_WEEKDAYS) {
            Some(raw) => {
                let set = WeekdaySet::parse(raw);
                if set.is_empty() && !raw.trim().is_empty() {
                    tracing::warn!(supplier_key, raw_value = %raw, "交货星期配置无法解析，按空集合处理");
                }
                set
            }
            None => WeekdaySet::empty(),
        };

        let cutoff_hour = Self::parse_bounded(
            supplier_key,
            config_keys::CUTOFF_HOUR,
            values.get(config_keys::CUTOFF_HOUR).cloned(),
            23,
            DEFAULT_CUTOFF_HOUR,
        );
        let cutoff_minute = Self::parse_bounded(
            supplier_key,
            config_keys::CUTOFF_MINUTE,
            values.get(config_keys::CUTOFF_MINUTE).cloned(),
            59,
            DEFAULT_CUTOFF_MINUTE,
        );

        let mut config = SupplierConfig::new(supplier_key, weekdays).with_cutoff(cutoff_hour, cutoff_minute);
        if let Some(label) = values
            .get(config_keys::SUPPLIER_LABEL)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            config = config.with_label(label);
        }
        Ok(config)
    }

    async fn get_autosave_quiet_ms(&self) -> RepositoryResult<u64> {
        let value = self.get_config_value(GLOBAL_SCOPE, config_keys::AUTOSAVE_QUIET_MS)?;
        Ok(match value {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(
                    config_key = config_keys::AUTOSAVE_QUIET_MS,
                    raw_value = %raw,
                    "自动保存静默期配置格式错误，使用默认值"
                );
                DEFAULT_AUTOSAVE_QUIET_MS
            }),
            None => DEFAULT_AUTOSAVE_QUIET_MS,
        })
    }

    async fn get_message_locale(&self) -> RepositoryResult<String> {
        let value = self.get_config_value(GLOBAL_SCOPE, config_keys::MESSAGE_LOCALE)?;
        Ok(match value.map(|s| s.trim().to_lowercase()) {
            Some(locale) if crate::i18n::is_supported_locale(&locale) => locale,
            Some(other) => {
                tracing::warn!(raw_value = %other, "不支持的消息语言，使用默认语言");
                crate::i18n::DEFAULT_LOCALE.to_string()
            }
            None => crate::i18n::DEFAULT_LOCALE.to_string(),
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 供应商作用域
    pub const SUPPLIER_LABEL: &str = "supplier_label";
    pub const DELIVERY_WEEKDAYS: &str = "delivery_weekdays"; // "1,4"（0=周日）
    pub const CUTOFF_HOUR: &str = "cutoff_hour";
    pub const CUTOFF_MINUTE: &str = "cutoff_minute";

    // 全局作用域
    pub const AUTOSAVE_QUIET_MS: &str = "autosave_quiet_ms";
    pub const MESSAGE_LOCALE: &str = "message_locale";
}
