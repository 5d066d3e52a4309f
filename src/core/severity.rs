//! Severity level definitions

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Ordered log severity. Filtering everywhere is `level >= minimum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    /// Normal service lifecycle events and events worth auditing
    #[default]
    Info = 2,
    /// Unexpected but tolerable events that may need investigation
    Warning = 3,
    /// Errors that should be investigated
    Error = 4,
    /// Errors that terminated the service
    Fatal = 5,
}

impl Severity {
    /// Every severity, lowest first
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parse a severity name, ignoring case.
    ///
    /// Unrecognised input falls back to [`Severity::Info`]; this never fails.
    ///
    /// ```
    /// use rust_sink_logger::Severity;
    ///
    /// assert_eq!(Severity::parse("warning"), Severity::Warning);
    /// assert_eq!(Severity::parse("Error"), Severity::Error);
    /// assert_eq!(Severity::parse("verbose"), Severity::Info);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Severity::Trace,
            "DEBUG" => Severity::Debug,
            "INFO" => Severity::Info,
            "WARNING" => Severity::Warning,
            "ERROR" => Severity::Error,
            "FATAL" => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    #[cfg(feature = "console")]
    pub fn color(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Severity::Trace => BrightBlack,
            Severity::Debug => Blue,
            Severity::Info => Green,
            Severity::Warning => Yellow,
            Severity::Error => Red,
            Severity::Fatal => BrightRed,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Severity::parse(s))
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepts any value: names go through [`Severity::parse`], everything else
/// (null, numbers, booleans) is Info.
struct SeverityVisitor;

impl<'de> Visitor<'de> for SeverityVisitor {
    type Value = Severity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a severity name")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Severity, E> {
        Ok(Severity::parse(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Severity, E> {
        Ok(Severity::Info)
    }

    fn visit_none<E: de::Error>(self) -> Result<Severity, E> {
        Ok(Severity::Info)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Severity, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Severity, E> {
        Ok(Severity::Info)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Severity, E> {
        Ok(Severity::Info)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Severity, E> {
        Ok(Severity::Info)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Severity, E> {
        Ok(Severity::Info)
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SeverityVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        for level in Severity::ALL {
            assert_eq!(Severity::parse(level.as_str()), level);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("trace"), Severity::Trace);
        assert_eq!(Severity::parse("DeBuG"), Severity::Debug);
        assert_eq!(Severity::parse("Warning"), Severity::Warning);
        assert_eq!(Severity::parse("fatal"), Severity::Fatal);
    }

    #[test]
    fn test_parse_unknown_defaults_to_info() {
        assert_eq!(Severity::parse(""), Severity::Info);
        assert_eq!(Severity::parse("WARN"), Severity::Info);
        assert_eq!(Severity::parse(" ERROR "), Severity::Info);
        assert_eq!("nonsense".parse::<Severity>(), Ok(Severity::Info));
    }

    #[test]
    fn test_ordering() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");

        let parsed: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, Severity::Error);

        let fallback: Severity = serde_json::from_str("\"loud\"").unwrap();
        assert_eq!(fallback, Severity::Info);
    }

    #[test]
    fn test_non_string_values_fall_back_to_info() {
        for json in ["null", "3", "-1", "2.5", "true"] {
            let parsed: Severity = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, Severity::Info, "{}", json);
        }
    }
}
