// ==========================================
// 面包店订货系统 - 交货日历规则
// ==========================================
// 职责: 可交货日期扫描 / 截单时刻 / 临近交货阶段
// 红线: 日期扫描必须有界，空星期集合也必须终止
// ==========================================

use crate::domain::supplier::{SupplierConfig, DEFAULT_CUTOFF_HOUR, DEFAULT_CUTOFF_MINUTE};
use crate::domain::supplier::WeekdaySet;
use crate::domain::types::UrgencyStage;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// 日期扫描上界（最大间隔 7 天的两倍）
pub const DATE_SCAN_LIMIT_DAYS: i64 = 14;

// ==========================================
// CalendarRules - 日历规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRules {
    cutoff_hour: u32,
    cutoff_minute: u32,
}

impl Default for CalendarRules {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF_HOUR, DEFAULT_CUTOFF_MINUTE)
    }
}

impl CalendarRules {
    /// 非法时分回退到 12:00
    pub fn new(cutoff_hour: u32, cutoff_minute: u32) -> Self {
        if cutoff_hour > 23 || cutoff_minute > 59 {
            tracing::warn!(cutoff_hour, cutoff_minute, "截单时刻非法，回退到默认值");
            return Self {
                cutoff_hour: DEFAULT_CUTOFF_HOUR,
                cutoff_minute: DEFAULT_CUTOFF_MINUTE,
            };
        }
        Self {
            cutoff_hour,
            cutoff_minute,
        }
    }

    pub fn for_supplier(config: &SupplierConfig) -> Self {
        Self::new(config.cutoff_hour, config.cutoff_minute)
    }

    /// 从 `from`（含）向后扫描，返回首个可交货日期
    ///
    /// 星期集合为空时在扫描上界处终止并返回边界日期 `from + 14`
    pub fn next_allowed_date(&self, from: NaiveDate, allowed: WeekdaySet) -> NaiveDate {
        let mut date = from;
        for _ in 0..DATE_SCAN_LIMIT_DAYS {
            if allowed.contains(date) {
                return date;
            }
            date += Duration::days(1);
        }
        date
    }

    /// 从 `from`（不含）向前扫描，返回上一个可交货日期
    ///
    /// 星期集合为空时返回边界日期 `from - 14`
    pub fn previous_allowed_date(&self, from: NaiveDate, allowed: WeekdaySet) -> NaiveDate {
        let mut date = from;
        for _ in 0..DATE_SCAN_LIMIT_DAYS {
            date -= Duration::days(1);
            if allowed.contains(date) {
                return date;
            }
        }
        date
    }

    /// 截单时刻: 交货日前一天的 cutoff_hour:cutoff_minute
    pub fn cutoff_instant(&self, delivery_date: NaiveDate) -> NaiveDateTime {
        let day_before = delivery_date - Duration::days(1);
        day_before.and_time(self.cutoff_time())
    }

    /// 临近交货阶段
    ///
    /// - calm:      D-6 ~ D-4（更早也算 calm）
    /// - finalize:  D-3 00:00 ~ D-2 截单时刻（含）
    /// - last-call: D-2 截单时刻之后 ~ D-1 截单时刻（含）
    /// - locked:    D-1 截单时刻之后
    pub fn urgency_stage(&self, delivery_date: NaiveDate, now: NaiveDateTime) -> UrgencyStage {
        let cutoff = self.cutoff_time();
        let locked_from = (delivery_date - Duration::days(1)).and_time(cutoff);
        let last_call_from = (delivery_date - Duration::days(2)).and_time(cutoff);
        let finalize_from = (delivery_date - Duration::days(3)).and_time(NaiveTime::MIN);

        if now > locked_from {
            UrgencyStage::Locked
        } else if now > last_call_from {
            UrgencyStage::LastCall
        } else if now >= finalize_from {
            UrgencyStage::Finalize
        } else {
            UrgencyStage::Calm
        }
    }

    fn cutoff_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.cutoff_hour, self.cutoff_minute, 0).unwrap_or(NaiveTime::MIN)
    }
}
