// ==========================================
// 面包店订货系统 - 商品模型
// ==========================================
// ProductRecord: 目录原始记录（分类/名称字段来源不一，可能为空）
// Product: 规整后的商品（名称与部门已确定）
// ==========================================

use crate::domain::types::Department;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 商品索引: product_id → Product
pub type ProductIndex = HashMap<String, Product>;

/// 由商品列表构建索引
pub fn index_products(products: impl IntoIterator<Item = Product>) -> ProductIndex {
    products
        .into_iter()
        .map(|p| (p.product_id.clone(), p))
        .collect()
}

// ==========================================
// ProductRecord - 目录原始记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub supplier_key: String,
    #[serde(default)]
    pub unit_price: f64,

    // ===== 名称候选字段 =====
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub libelle: Option<String>,
    #[serde(default)]
    pub label: Option<String>,

    // ===== 分类候选字段 =====
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub famille: Option<String>,
    #[serde(default)]
    pub rayon: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ProductRecord {
    /// 名称字段优先级: name → libelle → label → product_id
    pub fn display_name(&self) -> String {
        [&self.name, &self.libelle, &self.label]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.product_id.clone())
    }

    /// 分类字段优先级（首个非空者生效）:
    /// department → dept → category → categorie → famille → rayon → type
    pub fn category_candidates(&self) -> [Option<&str>; 7] {
        [
            self.department.as_deref(),
            self.dept.as_deref(),
            self.category.as_deref(),
            self.categorie.as_deref(),
            self.famille.as_deref(),
            self.rayon.as_deref(),
            self.kind.as_deref(),
        ]
    }
}

// ==========================================
// Product - 规整后的商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub supplier_key: String,
    pub name: String,
    pub unit_price: f64,
    pub department: Department,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut record = ProductRecord {
            product_id: "P1".to_string(),
            ..Default::default()
        };
        assert_eq!(record.display_name(), "P1");

        record.label = Some("Baguette tradition".to_string());
        record.name = Some("   ".to_string());
        assert_eq!(record.display_name(), "Baguette tradition");
    }

    #[test]
    fn test_deserialize_type_field() {
        let record: ProductRecord = serde_json::from_str(
            r#"{"product_id":"P2","supplier_key":"moulin","type":"Pâtisserie"}"#,
        )
        .unwrap();
        assert_eq!(record.kind.as_deref(), Some("Pâtisserie"));
        assert_eq!(record.unit_price, 0.0);
    }
}
