// ==========================================
// 面包店订货系统 - 本地快照存储
// ==========================================
// 职责: 设备本地的键值快照（基线 / 选择缓存）
// 约束: 尽力而为，读写失败只记日志，不向上抛错
// ==========================================

use crate::db::{init_snapshot_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 本地快照存储接口（同步，可能失败但不报错）
pub trait SnapshotStore: Send + Sync {
    /// 读取快照；不存在、损坏或读取失败均返回 None
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    /// 写入快照；返回是否成功
    fn set(&self, namespace: &str, key: &str, value: &Value) -> bool;

    /// 删除快照；返回是否成功
    fn remove(&self, namespace: &str, key: &str) -> bool;
}

// ==========================================
// SqliteSnapshotStore
// ==========================================
pub struct SqliteSnapshotStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotStore {
    /// 打开本地快照库（自动建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_snapshot_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（自动建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_snapshot_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn try_get(&self, namespace: &str, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM snapshot_kv WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(raw)
    }

    fn try_set(&self, namespace: &str, key: &str, value: &Value) -> RepositoryResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO snapshot_kv (namespace, key, value_json, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(namespace, key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at
            "#,
            params![namespace, key, json],
        )?;
        Ok(())
    }

    fn try_remove(&self, namespace: &str, key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM snapshot_kv WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(())
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let raw = match self.try_get(namespace, key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "本地快照读取失败");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "本地快照已损坏，视为不存在");
                None
            }
        }
    }

    fn set(&self, namespace: &str, key: &str, value: &Value) -> bool {
        match self.try_set(namespace, key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "本地快照写入失败");
                false
            }
        }
    }

    fn remove(&self, namespace: &str, key: &str) -> bool {
        match self.try_remove(namespace, key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "本地快照删除失败");
                false
            }
        }
    }
}

// ==========================================
// MemorySnapshotStore - 内存实现（测试/无本地库时使用）
// ==========================================
#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入原始文本（用于模拟损坏数据）
    pub fn put_raw(&self, namespace: &str, key: &str, raw: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert((namespace.to_string(), key.to_string()), raw.to_string());
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let entries = self.entries.lock().ok()?;
        let raw = entries.get(&(namespace.to_string(), key.to_string()))?;
        serde_json::from_str(raw).ok()
    }

    fn set(&self, namespace: &str, key: &str, value: &Value) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert((namespace.to_string(), key.to_string()), value.to_string());
                true
            }
            Err(_) => false,
        }
    }

    fn remove(&self, namespace: &str, key: &str) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(&(namespace.to_string(), key.to_string()));
                true
            }
            Err(_) => false,
        }
    }
}
