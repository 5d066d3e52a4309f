//! Sink trait for log output destinations

use super::{
    context::RequestContext, error::Result, severity::Severity, user_properties::UserProperty,
};
use parking_lot::RwLock;
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Borrowed error value attached to a log event
pub type EventError<'a> = Option<&'a (dyn Error + 'static)>;

/// A log backend that a [`SinkSet`](super::sink_set::SinkSet) fans events out to.
///
/// Implementations filter by their own minimum level, decorate with the user
/// properties they are allowed to surface, and translate the event to their
/// backend. `emit` never returns an error: delivery failures are reported on
/// stderr and swallowed, since a fan-out to several sinks cannot be undone.
pub trait Sink: Send + Sync {
    fn emit(
        &self,
        level: Severity,
        message: &str,
        error: EventError<'_>,
        context: Option<&RequestContext>,
    );

    /// Format and emit, skipping the formatting work when `level` is filtered out
    fn emit_fmt(
        &self,
        level: Severity,
        error: EventError<'_>,
        context: Option<&RequestContext>,
        args: fmt::Arguments<'_>,
    ) {
        if self.is_enabled(level) {
            self.emit(level, &args.to_string(), error, context);
        }
    }

    fn set_minimum_level(&self, level: Severity);

    fn minimum_level(&self) -> Severity;

    fn set_allowed_user_properties(&self, properties: Vec<UserProperty>);

    fn allowed_user_properties(&self) -> Vec<UserProperty>;

    fn is_enabled(&self, level: Severity) -> bool {
        level >= self.minimum_level()
    }

    /// Flush and release resources, waiting at most about `timeout`.
    ///
    /// Calling `close` twice must be harmless.
    fn close(&self, timeout: Duration) -> Result<()>;

    fn name(&self) -> &str;
}

/// Minimum level and user property allow-list shared by every sink
#[derive(Debug)]
pub struct SinkPolicy {
    minimum_level: RwLock<Severity>,
    allowed: RwLock<Vec<UserProperty>>,
}

impl SinkPolicy {
    pub fn new(minimum_level: Severity) -> Self {
        Self {
            minimum_level: RwLock::new(minimum_level),
            allowed: RwLock::new(Vec::new()),
        }
    }

    pub fn with_allowed(self, properties: Vec<UserProperty>) -> Self {
        *self.allowed.write() = properties;
        self
    }

    pub fn minimum_level(&self) -> Severity {
        *self.minimum_level.read()
    }

    pub fn set_minimum_level(&self, level: Severity) {
        *self.minimum_level.write() = level;
    }

    pub fn allowed(&self) -> Vec<UserProperty> {
        self.allowed.read().clone()
    }

    pub fn set_allowed(&self, properties: Vec<UserProperty>) {
        *self.allowed.write() = properties;
    }

    pub fn is_enabled(&self, level: Severity) -> bool {
        level >= self.minimum_level()
    }

    /// Comma-joined allowed user properties present in `context`
    pub fn user_properties(&self, context: Option<&RequestContext>) -> Option<String> {
        super::user_properties::format(context, &self.allowed.read())
    }
}

impl Default for SinkPolicy {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}
