//! Single-line text layout shared by the console and rolling file sinks
//!
//! A record looks like:
//!
//! ```text
//! ERROR: 2024/03/09 14:05:07 payment declined (u1, a@b.com), card expired: issuer said no
//! ```
//!
//! The user property suffix and the error suffix are only present when there
//! is something to show.

use super::sink::EventError;
use std::error::Error;

/// Replace line breaks and tabs so a message cannot forge extra records
pub fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Render an error followed by its `source()` chain, separated by `": "`
pub fn describe_error(error: &(dyn Error + 'static)) -> String {
    let mut description = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}

/// Message with its optional user property and error decorations
pub fn render_body(message: &str, error: EventError<'_>, user_properties: Option<&str>) -> String {
    let mut body = sanitize_message(message);

    if let Some(properties) = user_properties {
        body.push_str(" (");
        body.push_str(&sanitize_message(properties));
        body.push(')');
    }

    if let Some(err) = error {
        body.push_str(", ");
        body.push_str(&sanitize_message(&describe_error(err)));
    }

    body
}

/// Full record: `"{label}: {timestamp} {body}"`, without a trailing newline
pub fn render_line(label: &str, timestamp: &str, body: &str) -> String {
    if timestamp.is_empty() {
        format!("{}: {}", label, body)
    } else {
        format!("{}: {} {}", label, timestamp, body)
    }
}
