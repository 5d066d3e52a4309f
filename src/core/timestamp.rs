//! Timestamp formatting for text sinks

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the console and rolling file sinks
///
/// # Examples
///
/// ```
/// use rust_sink_logger::core::TimestampFormat;
/// use chrono::{Local, TimeZone};
///
/// let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(TimestampFormat::Standard.format(&at), "2024/03/09 14:05:07");
/// assert_eq!(TimestampFormat::Custom("%H:%M".to_string()).format(&at), "14:05");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Local date and time: `2024/03/09 14:05:07`
    #[default]
    Standard,

    /// ISO 8601 in UTC with milliseconds: `2024-03-09T13:05:07.123Z`
    Iso8601,

    /// RFC 3339 with the local offset: `2024-03-09T14:05:07+01:00`
    Rfc3339,

    /// Unix timestamp in milliseconds
    UnixMillis,

    /// Custom strftime format, evaluated in local time
    Custom(String),

    /// No timestamp at all
    None,
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Standard => datetime.format("%Y/%m/%d %H:%M:%S").to_string(),
            TimestampFormat::Iso8601 => datetime
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
            TimestampFormat::None => String::new(),
        }
    }

    /// Format the current local time
    #[must_use]
    pub fn now(&self) -> String {
        self.format(&Local::now())
    }
}
