//! Process-wide sink set
//!
//! The global set exists from first use with a single console sink at
//! `Info`, so events emitted before [`init`] still reach stderr. Sinks are
//! meant to be added during start-up, before other threads start logging.
//!
//! ```no_run
//! use rust_sink_logger::config::{Backends, LoggingConfig};
//! use rust_sink_logger::{global, Severity, DEFAULT_SHUTDOWN_TIMEOUT};
//!
//! let config = LoggingConfig::default().with_minimum_level(Severity::Debug);
//! global::init(&config, Backends::none()).unwrap();
//!
//! global::emit(Severity::Info, "service started", None, None);
//!
//! global::shutdown(DEFAULT_SHUTDOWN_TIMEOUT).unwrap();
//! ```

use crate::config::{Backends, LoggingConfig};
use crate::core::{EventError, RequestContext, Result, Severity, Sink, SinkSet, UserProperty};
use crate::sinks::RollingFileSink;
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static GLOBAL: LazyLock<SinkSet> = LazyLock::new(|| SinkSet::new(Severity::Info));

/// The process-wide set
pub fn global() -> &'static SinkSet {
    &GLOBAL
}

/// Add the sinks described by `config` and apply its policy
///
/// # Errors
///
/// Returns the first sink construction error. No sink is added in that case.
pub fn init(config: &LoggingConfig, backends: Backends<'_>) -> Result<()> {
    config.apply(global(), backends)
}

/// Add a rolling file sink with 500 MB files, 3 backups and 28 days retention
pub fn setup_file<P: AsRef<Path>>(path: P, minimum_level: Severity) -> Result<()> {
    let sink = RollingFileSink::with_defaults(path, minimum_level)?;
    add(Arc::new(sink));
    Ok(())
}

/// Close every sink. The set stays usable but closed sinks drop events.
pub fn shutdown(timeout: Duration) -> Result<()> {
    close(timeout)
}

pub fn add(sink: Arc<dyn Sink>) {
    global().add(sink);
}

pub fn add_optional(sink: Option<Arc<dyn Sink>>) {
    global().add_optional(sink);
}

/// Applies to sinks registered now; later sinks keep their own level
pub fn set_minimum_level(level: Severity) {
    global().set_minimum_level(level);
}

pub fn minimum_level() -> Severity {
    global().minimum_level()
}

pub fn set_allowed_user_properties(properties: Vec<UserProperty>) {
    global().set_allowed_user_properties(properties);
}

pub fn emit(
    level: Severity,
    message: &str,
    error: EventError<'_>,
    context: Option<&RequestContext>,
) {
    global().emit(level, message, error, context);
}

pub fn emit_fmt(
    level: Severity,
    error: EventError<'_>,
    context: Option<&RequestContext>,
    args: fmt::Arguments<'_>,
) {
    global().emit_fmt(level, error, context, args);
}

pub fn emit_reader<R: Read>(level: Severity, reader: R) {
    global().emit_reader(level, reader);
}

pub fn emit_json<T: Serialize + ?Sized>(level: Severity, value: &T) {
    global().emit_json(level, value);
}

pub fn close(timeout: Duration) -> Result<()> {
    global().close(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_starts_with_console() {
        // Other tests may add sinks to the shared set, so only check the head
        assert_eq!(global().sink_names().first().map(String::as_str), Some("console"));
        assert!(!global().is_empty());
    }

    #[test]
    fn test_free_functions_reach_same_set() {
        assert!(std::ptr::eq(global(), global()));
        emit(Severity::Trace, "below the default level", None, None);
        emit_fmt(Severity::Trace, None, None, format_args!("value {}", 1));
    }
}
