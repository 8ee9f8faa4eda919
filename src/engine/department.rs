// ==========================================
// 面包店订货系统 - 部门分类器
// ==========================================
// 输入: 商品原始记录（分类字段来源不一，大小写/重音不一）
// 输出: Vente / Patiss / Boulanger / Uncat
// 红线: 纯函数，永不失败
// ==========================================

use crate::domain::product::{Product, ProductRecord};
use crate::domain::types::Department;
use once_cell::sync::Lazy;
use regex::Regex;

// 正则族按顺序匹配，命中即返回
static DEPARTMENT_PATTERNS: Lazy<Vec<(Department, Regex)>> = Lazy::new(|| {
    [
        (
            Department::Vente,
            r"vente|revente|sale|boutique|epicerie|boisson|snack|traiteur",
        ),
        (
            Department::Patiss,
            r"patis|viennois|pastry|gateau|dessert|entremet|tarte|confiser",
        ),
        (
            Department::Boulanger,
            r"boulang|pain|bread|baguette|farine|levain|bakery",
        ),
    ]
    .into_iter()
    .filter_map(|(dept, pattern)| Regex::new(pattern).ok().map(|re| (dept, re)))
    .collect()
});

// ==========================================
// DepartmentClassifier - 部门分类器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DepartmentClassifier;

impl DepartmentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 对商品原始记录分类
    ///
    /// 取首个非空分类字段（优先级见 `ProductRecord::category_candidates`），
    /// 小写化、去重音后按正则族匹配；无字段或无命中 → Uncat
    pub fn classify(&self, record: &ProductRecord) -> Department {
        let raw = record
            .category_candidates()
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty());

        match raw {
            Some(value) => self.classify_label(value),
            None => Department::Uncat,
        }
    }

    /// 对单个分类文本分类
    pub fn classify_label(&self, label: &str) -> Department {
        let normalized = normalize_label(label);
        DEPARTMENT_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(&normalized))
            .map(|(dept, _)| *dept)
            .unwrap_or(Department::Uncat)
    }

    /// 原始记录 → 规整后的商品
    pub fn normalize(&self, record: &ProductRecord) -> Product {
        Product {
            product_id: record.product_id.clone(),
            supplier_key: record.supplier_key.clone(),
            name: record.display_name(),
            unit_price: record.unit_price,
            department: self.classify(record),
        }
    }
}

/// 小写 + 去除拉丁重音
///
/// 覆盖 Latin-1 补充与 Latin Extended-A 的字母，以及分解形式的组合附加符号；
/// 其他文字原样保留
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.to_lowercase().chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => out.push('a'),
            'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => out.push('c'),
            'ď' | 'đ' | 'ð' => out.push('d'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => out.push('e'),
            'ĝ' | 'ğ' | 'ġ' | 'ģ' => out.push('g'),
            'ĥ' | 'ħ' => out.push('h'),
            'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => out.push('i'),
            'ĵ' => out.push('j'),
            'ķ' => out.push('k'),
            'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => out.push('l'),
            'ñ' | 'ń' | 'ņ' | 'ň' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => out.push('o'),
            'ŕ' | 'ŗ' | 'ř' => out.push('r'),
            'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => out.push('s'),
            'ţ' | 'ť' | 'ŧ' | 'ț' => out.push('t'),
            'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => out.push('u'),
            'ŵ' => out.push('w'),
            'ý' | 'ÿ' | 'ŷ' => out.push('y'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            'ß' => out.push_str("ss"),
            'þ' => out.push_str("th"),
            'ĳ' => out.push_str("ij"),
            // 组合附加符号（如 "é" 以 e + U+0301 输入）
            '\u{0300}'..='\u{036f}' => {}
            _ => out.push(c),
        }
    }
    out
}
