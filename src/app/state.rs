// ==========================================
// 面包店订货系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// - 订单库: 远端权威存储（订单/明细/商品/配置）
// - 本地库: 设备本地快照（基线/选择缓存）
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::OrderLifecycle;
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    BaselineStore, RepositoryResult, SelectionCache, SnapshotStore, SqliteOrderStore,
    SqliteSnapshotStore,
};

/// 订单库路径环境变量
pub const DB_PATH_ENV: &str = "BAKERY_ORDERS_DB_PATH";
/// 本地快照库路径环境变量
pub const LOCAL_DB_PATH_ENV: &str = "BAKERY_ORDERS_LOCAL_DB_PATH";

/// 应用状态
pub struct AppState {
    /// 订单库路径
    pub db_path: String,

    /// 本地快照库路径
    pub local_db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 订单存储
    pub store: Arc<SqliteOrderStore>,

    /// 订单生命周期
    pub lifecycle: Arc<OrderLifecycle>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 订单库文件路径
    /// - local_db_path: 本地快照库文件路径
    pub fn new(db_path: String, local_db_path: String) -> RepositoryResult<Self> {
        tracing::info!(%db_path, %local_db_path, "初始化AppState");

        // 订单库共享连接，建表幂等
        let conn = open_sqlite_connection(&db_path)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let store = Arc::new(SqliteOrderStore::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn)?);

        let snapshots: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::new(&local_db_path)?);
        Ok(Self::assemble(db_path, local_db_path, store, config, snapshots))
    }

    /// 以内存数据库创建（演示/测试）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        crate::db::configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let store = Arc::new(SqliteOrderStore::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn)?);
        let local = Arc::new(Mutex::new(Connection::open_in_memory()?));
        let snapshots: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::from_connection(local)?);

        Ok(Self::assemble(
            ":memory:".to_string(),
            ":memory:".to_string(),
            store,
            config,
            snapshots,
        ))
    }

    fn assemble(
        db_path: String,
        local_db_path: String,
        store: Arc<SqliteOrderStore>,
        config: Arc<ConfigManager>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        let baselines = Arc::new(BaselineStore::new(Arc::clone(&snapshots)));
        let cache = Arc::new(SelectionCache::new(snapshots));
        let lifecycle = Arc::new(OrderLifecycle::new(
            store.clone(),
            config.clone(),
            baselines,
            cache,
        ));

        tracing::info!("AppState初始化完成");
        Self {
            db_path,
            local_db_path,
            config,
            store,
            lifecycle,
        }
    }
}

/// 获取默认订单库路径
///
/// 优先 BAKERY_ORDERS_DB_PATH，否则放在用户数据目录
pub fn get_default_db_path() -> String {
    resolve_path(DB_PATH_ENV, "bakery_orders.db")
}

/// 获取默认本地快照库路径
///
/// 优先 BAKERY_ORDERS_LOCAL_DB_PATH，否则放在用户数据目录
pub fn get_default_local_db_path() -> String {
    resolve_path(LOCAL_DB_PATH_ENV, "bakery_orders_local.db")
}

fn resolve_path(env_key: &str, file_name: &str) -> String {
    // 允许通过环境变量显式指定路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(env_key) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(format!("./{}", file_name));
    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("bakery-orders-dev");
        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("bakery-orders");

        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(file_name);
        }
    }

    path.to_string_lossy().to_string()
}
