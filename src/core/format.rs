use crate::utils::error::{CardError, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Long localized date-time: date and time without seconds, e.g. `Jan 1, 2020 12:00 PM`.
pub const LONG_DATE_TIME: &str = "%b %-d, %Y %-I:%M %p";

pub fn resolve_timezone(id: &str) -> Result<Tz> {
    id.trim()
        .parse::<Tz>()
        .map_err(|_| CardError::UnknownTimezone {
            timezone: id.to_string(),
        })
}

pub fn format_in_zone(instant: DateTime<Utc>, zone: Tz, pattern: &str) -> String {
    instant.with_timezone(&zone).format(pattern).to_string()
}
