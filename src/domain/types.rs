// ==========================================
// 面包店订货系统 - 领域类型定义
// ==========================================
// 订单状态 / 部门标签 / 临近交货阶段
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// 状态机: DRAFT → SENT → ARCHIVED (不可回退)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,    // 草稿
    Sent,     // 已发送
    Archived, // 已归档（核对到货后，只读）
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OrderStatus {
    /// 数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Sent => "SENT",
            OrderStatus::Archived => "ARCHIVED",
        }
    }

    /// 从字符串解析状态（未知值视为 DRAFT）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SENT" => OrderStatus::Sent,
            "ARCHIVED" => OrderStatus::Archived,
            _ => OrderStatus::Draft,
        }
    }

    /// 是否仍处于可编辑状态集合 {DRAFT, SENT}
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Sent)
    }
}

// ==========================================
// 部门标签 (Department)
// ==========================================
// 顺序即展示/分组顺序: Vente < Patiss < Boulanger < Uncat
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Vente,     // 销售/转售
    Patiss,    // 甜点
    Boulanger, // 面包
    Uncat,     // 未分类
}

impl Department {
    /// 全部部门（按分组顺序）
    pub const ALL: [Department; 4] = [
        Department::Vente,
        Department::Patiss,
        Department::Boulanger,
        Department::Uncat,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            Department::Vente => "vente",
            Department::Patiss => "patiss",
            Department::Boulanger => "boulanger",
            Department::Uncat => "uncat",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

// ==========================================
// 临近交货阶段 (Urgency Stage)
// ==========================================
// 交货日前 9 天划分为 4 个互不重叠的窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrgencyStage {
    Calm,     // D-6 ~ D-4（以及更早）
    Finalize, // D-3 00:00 ~ D-2 截单时刻
    LastCall, // D-2 截单后 ~ D-1 截单时刻
    Locked,   // D-1 截单后
}

impl fmt::Display for UrgencyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyStage::Calm => write!(f, "calm"),
            UrgencyStage::Finalize => write!(f, "finalize"),
            UrgencyStage::LastCall => write!(f, "last-call"),
            UrgencyStage::Locked => write!(f, "locked"),
        }
    }
}
