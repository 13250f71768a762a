use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Missing target element")]
    MissingTargetElement,

    #[error("Target element is not a DOM element")]
    NotDomElement,

    #[error("Missing time broadcast service")]
    MissingTimeBroadcastService,

    #[error("Time broadcast service is not a TimeBroadcast instance")]
    WrongServiceInstance,

    #[error("Missing time")]
    MissingTime,

    #[error("Missing timezone")]
    MissingTimezone,

    #[error("Unknown timezone: {timezone}")]
    UnknownTimezone { timezone: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl CardError {
    /// 給使用者的修正建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CardError::MissingTargetElement | CardError::NotDomElement => {
                "Mount the card into a live element of the dashboard document"
            }
            CardError::MissingTimeBroadcastService | CardError::WrongServiceInstance => {
                "Pass the dashboard's shared TimeBroadcast service"
            }
            CardError::MissingTime => "Provide the current time as the initial value",
            CardError::MissingTimezone | CardError::UnknownTimezone { .. } => {
                "Use an IANA timezone id such as Europe/Warsaw or GMT"
            }
            CardError::IoError(_) => "Check that the settings file exists and is readable",
            CardError::ConfigError { .. } | CardError::InvalidConfigValueError { .. } => {
                "Fix the settings file and try again"
            }
        }
    }

    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            CardError::MissingTargetElement
                | CardError::NotDomElement
                | CardError::MissingTimeBroadcastService
                | CardError::WrongServiceInstance
                | CardError::MissingTime
                | CardError::MissingTimezone
                | CardError::UnknownTimezone { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CardError>;
