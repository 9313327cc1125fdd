//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (`validator` derive)：身份字段非空、比例在 (0, 1) 内、阈值 > 0
//! - 跨字段约束：min_price <= max_price
//!
//! 步骤选择指令中的阶段名由编排器在启动前校验。

use contracts::{ContractError, PipelineConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 PipelineConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &PipelineConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| first_error(&errors, ""))?;
    validate_price_range(config)?;
    Ok(())
}

/// 校验价格区间
fn validate_price_range(config: &PipelineConfig) -> Result<(), ContractError> {
    let etl = &config.etl;
    let (min, max) = etl.price_bounds();
    if min > max {
        return Err(ContractError::config_validation(
            "etl.min_price / etl.max_price",
            format!(
                "min_price ({}) must be <= max_price ({})",
                etl.min_price, etl.max_price
            ),
        ));
    }
    Ok(())
}

/// 将嵌套的 `ValidationErrors` 展平为第一个 (按字段路径排序) 错误
fn first_error(errors: &ValidationErrors, prefix: &str) -> ContractError {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by_key(|(field, _)| field.to_string());

    for (field, kind) in entries {
        let path = format!("{prefix}{field}");
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| describe(error));
                    return ContractError::config_validation(path, message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                return first_error(nested, &format!("{path}."));
            }
            ValidationErrorsKind::List(items) => {
                if let Some((idx, nested)) = items.iter().next() {
                    return first_error(nested, &format!("{path}[{idx}]."));
                }
            }
        }
    }

    ContractError::config_validation(prefix.trim_end_matches('.'), "invalid value")
}

fn describe(error: &validator::ValidationError) -> String {
    let mut bounds: Vec<_> = error
        .params
        .iter()
        .filter(|(key, _)| *key != "value")
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    bounds.sort();

    match error.params.get("value") {
        Some(value) if bounds.is_empty() => format!("failed '{}' check, got {value}", error.code),
        Some(value) => format!(
            "failed '{}' check ({}), got {value}",
            error.code,
            bounds.join(", ")
        ),
        None => format!("failed '{}' check", error.code),
    }
}
