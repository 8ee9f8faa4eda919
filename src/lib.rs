// ==========================================
// 面包店订货系统 - 核心库
// ==========================================
// 订单生命周期 + 基线/增量（rajout）核对引擎
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "fr");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 远端订单存储 / 本地快照
pub mod repository;

// 引擎层 - 订单规则
pub mod engine;

// 配置层 - 供应商配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 会话与生命周期
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Department, OrderStatus, UrgencyStage};

// 领域实体
pub use domain::{
    Baseline, Order, OrderKey, OrderLine, Product, ProductRecord, Selection, SelectionEntry,
    SupplierConfig, WeekdaySet,
};

// 引擎
pub use engine::{
    CalendarRules, CutoffGate, DeltaCalculator, DeltaLine, DepartmentClassifier,
    MessageFormatter, OrderSummary, SelectionMerger,
};

// API
pub use api::{ApiError, ApiResult, AutosaveSession, OrderLifecycle, OrderSession, SaveStatus};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "面包店订货系统";
