// ==========================================
// 面包店订货系统 - 供应商配置
// ==========================================
// 参数化 CalendarRules 与 CutoffGate
// 星期编号: 0=周日 ... 6=周六
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 默认截单时刻（交货前一天 12:00）
pub const DEFAULT_CUTOFF_HOUR: u32 = 12;
pub const DEFAULT_CUTOFF_MINUTE: u32 = 0;

// ==========================================
// WeekdaySet - 可交货星期集合
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// 由星期编号构建（超出 0..6 的值忽略）
    pub fn from_days(days: &[u32]) -> Self {
        let mut bits = 0u8;
        for &d in days {
            if d <= 6 {
                bits |= 1 << d;
            }
        }
        Self(bits)
    }

    /// 解析 "1,4" 形式的配置值
    pub fn parse(value: &str) -> Self {
        let days: Vec<u32> = value
            .split(',')
            .filter_map(|s| s.trim().parse::<u32>().ok())
            .collect();
        Self::from_days(&days)
    }

    pub fn contains_day(&self, day: u32) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.contains_day(date.weekday().num_days_from_sunday())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn days(&self) -> Vec<u32> {
        (0..=6).filter(|d| self.contains_day(*d)).collect()
    }
}

// ==========================================
// SupplierConfig - 供应商配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub supplier_key: String,
    pub label: String,               // 消息中显示的供应商名称
    pub allowed_weekdays: WeekdaySet,
    pub cutoff_hour: u32,
    pub cutoff_minute: u32,
}

impl SupplierConfig {
    pub fn new(supplier_key: impl Into<String>, allowed_weekdays: WeekdaySet) -> Self {
        let supplier_key = supplier_key.into();
        Self {
            label: supplier_key.clone(),
            supplier_key,
            allowed_weekdays,
            cutoff_hour: DEFAULT_CUTOFF_HOUR,
            cutoff_minute: DEFAULT_CUTOFF_MINUTE,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_cutoff(mut self, hour: u32, minute: u32) -> Self {
        self.cutoff_hour = hour;
        self.cutoff_minute = minute;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_set_parse() {
        let set = WeekdaySet::parse("1, 4,9,x");
        assert_eq!(set.days(), vec![1, 4]);
        assert!(!set.is_empty());
        assert!(WeekdaySet::parse("").is_empty());
    }

    #[test]
    fn test_weekday_set_contains_date() {
        // 2026-10-22 是周四
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        assert!(WeekdaySet::from_days(&[4]).contains(thursday));
        assert!(!WeekdaySet::from_days(&[5]).contains(thursday));
    }
}
