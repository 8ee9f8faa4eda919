// ==========================================
// 面包店订货系统 - 输入校验
// ==========================================
// 职责: 在触达存储之前拒绝无效输入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::OrderKey;
use crate::domain::product::ProductRecord;
use uuid::Uuid;

/// 校验订单ID（必须为 UUID 字符串）
pub fn validate_order_id(order_id: &str) -> ApiResult<()> {
    let trimmed = order_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError("订单ID为空".to_string()));
    }
    Uuid::parse_str(trimmed)
        .map(|_| ())
        .map_err(|_| ApiError::ValidationError(format!("订单ID格式无效: {}", order_id)))
}

/// 校验订单自然键
pub fn validate_order_key(key: &OrderKey) -> ApiResult<()> {
    if key.supplier_key.trim().is_empty() {
        return Err(ApiError::ValidationError("供应商标识为空".to_string()));
    }
    Ok(())
}

/// 校验新建/更新的商品记录
///
/// 商品ID与供应商不可为空；名称字段（name/libelle/label）至少一个非空
pub fn validate_product_record(record: &ProductRecord) -> ApiResult<()> {
    if record.product_id.trim().is_empty() {
        return Err(ApiError::ValidationError("商品ID为空".to_string()));
    }
    if record.supplier_key.trim().is_empty() {
        return Err(ApiError::ValidationError(format!(
            "商品 {} 缺少供应商",
            record.product_id
        )));
    }
    let has_name = [&record.name, &record.libelle, &record.label]
        .into_iter()
        .flatten()
        .any(|s| !s.trim().is_empty());
    if !has_name {
        return Err(ApiError::ValidationError(format!(
            "商品 {} 名称为空",
            record.product_id
        )));
    }
    if !record.unit_price.is_finite() || record.unit_price < 0.0 {
        return Err(ApiError::ValidationError(format!(
            "商品 {} 单价无效: {}",
            record.product_id, record.unit_price
        )));
    }
    Ok(())
}
