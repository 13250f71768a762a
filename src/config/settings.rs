use crate::core::format::LONG_DATE_TIME;
use crate::utils::error::{CardError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_strftime, Validate};
use serde::Deserialize;
use std::path::Path;

/// Presentation settings shared by the cards of one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CardSettings {
    /// strftime pattern of the time container text
    pub datetime_format: String,
    pub date_input_format: String,
    pub time_input_format: String,
    pub change_button_label: String,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            datetime_format: LONG_DATE_TIME.to_string(),
            date_input_format: "%Y-%m-%d".to_string(),
            time_input_format: "%H:%M".to_string(),
            change_button_label: "Change timezone".to_string(),
        }
    }
}

impl CardSettings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CardError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定，未提供的欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CardError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

impl Validate for CardSettings {
    fn validate(&self) -> Result<()> {
        validate_strftime("datetime_format", &self.datetime_format)?;
        validate_strftime("date_input_format", &self.date_input_format)?;
        validate_strftime("time_input_format", &self.time_input_format)?;
        validate_non_empty_string("change_button_label", &self.change_button_label)?;
        Ok(())
    }
}
