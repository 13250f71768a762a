use crate::utils::error::{CardError, Result};
use chrono::format::{Item, StrftimeItems};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 必填欄位檢查，缺少時回傳呼叫端指定的錯誤
pub fn validate_required_field<T>(value: &Option<T>, missing: CardError) -> Result<&T> {
    value.as_ref().ok_or(missing)
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_strftime(field_name: &str, pattern: &str) -> Result<()> {
    validate_non_empty_string(field_name, pattern)?;

    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(CardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: pattern.to_string(),
            reason: "Invalid strftime pattern".to_string(),
        });
    }
    Ok(())
}
