// ==========================================
// 面包店订货系统 - 外发消息格式化
// ==========================================
// 输入: 供应商名称 + 交货日期 + 明细（首次发送为全量，rajout 为增量）
// 输出: 按部门分组的纯文本，由外部通道（聊天应用深链接）发送
// 红线: 分组顺序与行格式 `qty × 商品名` 必须稳定
// ==========================================

use crate::domain::product::ProductIndex;
use crate::domain::types::Department;
use crate::engine::delta::DeltaLine;
use crate::i18n::{t_in, DEFAULT_LOCALE};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// 消息中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLine {
    pub department: Department,
    pub product_name: String,
    pub qty: u32,
}

impl MessageLine {
    /// 由总量构建（首次发送）
    pub fn from_totals(totals: &BTreeMap<String, u32>, products: &ProductIndex) -> Vec<MessageLine> {
        totals
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(product_id, qty)| {
                let (product_name, department) = match products.get(product_id) {
                    Some(p) => (p.name.clone(), p.department),
                    None => (product_id.clone(), Department::Uncat),
                };
                MessageLine {
                    department,
                    product_name,
                    qty: *qty,
                }
            })
            .collect()
    }

    /// 由增量构建（rajout）
    pub fn from_delta(delta: &[DeltaLine]) -> Vec<MessageLine> {
        delta
            .iter()
            .map(|d| MessageLine {
                department: d.department,
                product_name: d.product_name.clone(),
                qty: d.delta,
            })
            .collect()
    }
}

// ==========================================
// MessageFormatter - 消息格式化器
// ==========================================
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    locale: String,
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl MessageFormatter {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// 首次发送消息（全量）
    pub fn format_order(&self, supplier_label: &str, delivery_date: NaiveDate, lines: &[MessageLine]) -> String {
        self.format("message.order_title", supplier_label, delivery_date, lines)
    }

    /// 追加消息（仅增量）
    pub fn format_rajout(&self, supplier_label: &str, delivery_date: NaiveDate, lines: &[MessageLine]) -> String {
        self.format("message.rajout_title", supplier_label, delivery_date, lines)
    }

    /// 交货日期展示: "jeudi 22/10/2026"
    pub fn format_date(&self, date: NaiveDate) -> String {
        let weekday_key = format!("weekday.{}", date.weekday().num_days_from_sunday());
        format!("{} {}", t_in(&self.locale, &weekday_key, &[]), date.format("%d/%m/%Y"))
    }

    fn format(
        &self,
        title_key: &str,
        supplier_label: &str,
        delivery_date: NaiveDate,
        lines: &[MessageLine],
    ) -> String {
        let mut out = Vec::new();
        out.push(t_in(&self.locale, title_key, &[("supplier", supplier_label)]));
        out.push(t_in(
            &self.locale,
            "message.delivery",
            &[("date", &self.format_date(delivery_date))],
        ));

        // 部门 → 行（部门内按名称排序）
        let mut groups: BTreeMap<Department, Vec<&MessageLine>> = BTreeMap::new();
        for line in lines.iter().filter(|l| l.qty > 0) {
            groups.entry(line.department).or_default().push(line);
        }

        if groups.is_empty() {
            out.push(String::new());
            out.push(t_in(&self.locale, "message.empty", &[]));
            return out.join("\n");
        }

        for (department, mut group) in groups {
            group.sort_by(|a, b| a.product_name.cmp(&b.product_name).then(a.qty.cmp(&b.qty)));
            out.push(String::new());
            out.push(t_in(&self.locale, &format!("department.{}", department.as_tag()), &[]));
            for line in group {
                out.push(format!("{} × {}", line.qty, line.product_name));
            }
        }
        out.join("\n")
    }
}
