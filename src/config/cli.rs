use crate::utils::error::{CardError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tzcard")]
#[command(about = "Render a timezone card and print its markup")]
pub struct CliConfig {
    #[arg(long, default_value = "GMT", help = "IANA timezone id")]
    pub timezone: String,

    #[arg(long, help = "RFC 3339 instant to render (defaults to now)")]
    pub time: Option<String>,

    #[arg(long, help = "TOML file with card settings")]
    pub settings: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn instant(&self) -> Result<DateTime<Utc>> {
        match &self.time {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| CardError::InvalidConfigValueError {
                    field: "time".to_string(),
                    value: raw.clone(),
                    reason: format!("Invalid RFC 3339 timestamp: {}", e),
                }),
            None => Ok(Utc::now()),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("timezone", &self.timezone)?;
        self.instant()?;
        Ok(())
    }
}
