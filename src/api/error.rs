// ==========================================
// 面包店订货系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 约束: 持久化失败不回滚内存中的选择集，由用户重新触发保存
// ==========================================

use crate::i18n;
use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

// ==========================================
// PersistenceKind - 持久化失败类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceKind {
    PermissionDenied, // 权限/授权被拒
    MissingSchema,    // 表或字段缺失
    DuplicateKey,     // 唯一键冲突
    Connection,       // 连接/锁/事务
    Query,            // 其他查询失败
}

impl fmt::Display for PersistenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PersistenceKind::PermissionDenied => "permission_denied",
            PersistenceKind::MissingSchema => "missing_schema",
            PersistenceKind::DuplicateKey => "duplicate_key",
            PersistenceKind::Connection => "connection",
            PersistenceKind::Query => "query",
        };
        write!(f, "{}", s)
    }
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误（不触达存储）
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 订单规则错误
    // ==========================================
    #[error("订单已过截单时刻，不可修改: {0}")]
    OrderLocked(String),

    #[error("没有勾选的商品，无法发送: {0}")]
    NothingToSend(String),

    #[error("没有待发送的追加: {0}")]
    NoRajout(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("持久化失败({kind}): {detail}")]
    PersistenceError { kind: PersistenceKind, detail: String },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向用户的简短说明（当前语言）
    pub fn user_message(&self) -> String {
        self.user_message_in(&i18n::current_locale())
    }

    /// 面向用户的简短说明（指定语言）
    pub fn user_message_in(&self, locale: &str) -> String {
        match self {
            ApiError::ValidationError(detail) => {
                i18n::t_in(locale, "errors.validation", &[("detail", detail)])
            }
            ApiError::OrderLocked(_) => i18n::t_in(locale, "errors.order_locked", &[]),
            ApiError::NothingToSend(_) => i18n::t_in(locale, "errors.nothing_to_send", &[]),
            ApiError::NoRajout(_) => i18n::t_in(locale, "errors.no_rajout", &[]),
            ApiError::InvalidStateTransition { from, .. } => {
                i18n::t_in(locale, "errors.invalid_transition", &[("from", from)])
            }
            ApiError::NotFound(detail) => {
                i18n::t_in(locale, "errors.not_found", &[("detail", detail)])
            }
            ApiError::PersistenceError { kind, detail } => match kind {
                PersistenceKind::PermissionDenied => {
                    i18n::t_in(locale, "errors.permission_denied", &[])
                }
                PersistenceKind::MissingSchema => i18n::t_in(locale, "errors.missing_schema", &[]),
                PersistenceKind::DuplicateKey => i18n::t_in(locale, "errors.duplicate_key", &[]),
                PersistenceKind::Connection | PersistenceKind::Query => {
                    i18n::t_in(locale, "errors.persistence", &[("detail", detail)])
                }
            },
            ApiError::InternalError(detail) => {
                i18n::t_in(locale, "errors.internal", &[("detail", detail)])
            }
            ApiError::Other(err) => {
                i18n::t_in(locale, "errors.internal", &[("detail", &err.to_string())])
            }
        }
    }

    /// 是否为持久化失败（调用方据此展示可关闭的非阻塞提示）
    pub fn is_persistence(&self) -> bool {
        matches!(self, ApiError::PersistenceError { .. })
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let persistence = |kind: PersistenceKind, detail: String| ApiError::PersistenceError { kind, detail };
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg) => {
                persistence(PersistenceKind::Connection, msg)
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::ForeignKeyViolation(msg) => persistence(PersistenceKind::Query, msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                persistence(PersistenceKind::DuplicateKey, msg)
            }
            RepositoryError::MissingSchema(msg) => persistence(PersistenceKind::MissingSchema, msg),
            RepositoryError::PermissionDenied(msg) => {
                persistence(PersistenceKind::PermissionDenied, msg)
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
