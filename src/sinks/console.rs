//! Console sink implementation

use crate::core::record::{render_body, render_line};
use crate::core::{
    EventError, RequestContext, Result, Severity, Sink, SinkPolicy, TimestampFormat, UserProperty,
};
use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

/// Writes one line per event to stderr, synchronously on the caller's thread
///
/// ```text
/// ERROR: 2024/03/09 14:05:07 payment declined (a@b.com), card expired
/// ```
pub struct ConsoleSink {
    policy: SinkPolicy,
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
    timestamp_format: TimestampFormat,
}

impl ConsoleSink {
    pub fn new(minimum_level: Severity) -> Self {
        Self {
            policy: SinkPolicy::new(minimum_level),
            writer: Mutex::new(Box::new(io::stderr())),
            use_colors: cfg!(feature = "console") && io::stderr().is_terminal(),
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Write to `writer` instead of stderr. Colors are turned off.
    pub fn with_writer<W: Write + Send + 'static>(minimum_level: Severity, writer: W) -> Self {
        Self {
            policy: SinkPolicy::new(minimum_level),
            writer: Mutex::new(Box::new(writer)),
            use_colors: false,
            timestamp_format: TimestampFormat::default(),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set the timestamp format for this sink
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_sink_logger::sinks::ConsoleSink;
    /// use rust_sink_logger::{Severity, TimestampFormat};
    ///
    /// let sink = ConsoleSink::new(Severity::Info)
    ///     .with_timestamp_format(TimestampFormat::Iso8601);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_allowed_user_properties(self, properties: Vec<UserProperty>) -> Self {
        self.policy.set_allowed(properties);
        self
    }

    #[cfg(feature = "console")]
    fn label(&self, level: Severity) -> String {
        use colored::Colorize;

        if self.use_colors {
            level.as_str().color(level.color()).to_string()
        } else {
            level.as_str().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn label(&self, level: Severity) -> String {
        level.as_str().to_string()
    }
}

impl Sink for ConsoleSink {
    fn emit(
        &self,
        level: Severity,
        message: &str,
        error: EventError<'_>,
        context: Option<&RequestContext>,
    ) {
        if !self.policy.is_enabled(level) {
            return;
        }

        let user_properties = self.policy.user_properties(context);
        let body = render_body(message, error, user_properties.as_deref());
        let line = render_line(&self.label(level), &self.timestamp_format.now(), &body);

        // stderr is the fallback channel itself, so a failed write is dropped
        let _ = writeln!(self.writer.lock(), "{}", line);
    }

    fn set_minimum_level(&self, level: Severity) {
        self.policy.set_minimum_level(level);
    }

    fn minimum_level(&self) -> Severity {
        self.policy.minimum_level()
    }

    fn set_allowed_user_properties(&self, properties: Vec<UserProperty>) {
        self.policy.set_allowed(properties);
    }

    fn allowed_user_properties(&self) -> Vec<UserProperty> {
        self.policy.allowed()
    }

    fn close(&self, _timeout: Duration) -> Result<()> {
        let _ = self.writer.lock().flush();
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::user_properties::UserProperties;
    use std::sync::Arc;

    /// Cloneable in-memory writer so tests can read what the sink wrote
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sink(level: Severity) -> (ConsoleSink, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer(level, buffer.clone())
            .with_timestamp_format(TimestampFormat::None);
        (sink, buffer)
    }

    #[test]
    fn test_emits_at_and_above_minimum() {
        let (sink, buffer) = sink(Severity::Warning);

        sink.emit(Severity::Info, "skipped", None, None);
        sink.emit(Severity::Warning, "boundary", None, None);
        sink.emit(Severity::Fatal, "above", None, None);

        assert_eq!(buffer.contents(), "WARNING: boundary\nFATAL: above\n");
    }

    #[test]
    fn test_user_properties_and_error_suffix() {
        let (sink, buffer) = sink(Severity::Info);
        sink.set_allowed_user_properties(vec![UserProperty::Email]);

        let ctx = RequestContext::new().with_user_properties(
            UserProperties::new()
                .with(UserProperty::Id, "u1")
                .with(UserProperty::Email, "a@b.com"),
        );
        let err = io::Error::new(io::ErrorKind::Other, "connection reset");

        sink.emit(Severity::Error, "request failed", Some(&err), Some(&ctx));

        assert_eq!(
            buffer.contents(),
            "ERROR: request failed (a@b.com), connection reset\n"
        );
    }

    #[test]
    fn test_standard_timestamp_layout() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer(Severity::Info, buffer.clone());

        sink.emit(Severity::Info, "ready", None, None);

        let line = buffer.contents();
        assert!(line.starts_with("INFO: "));
        assert!(line.ends_with(" ready\n"));
        // "INFO: " + "YYYY/MM/DD HH:MM:SS" + " ready\n"
        assert_eq!(line.len(), 6 + 19 + 7);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (sink, _) = sink(Severity::Info);
        assert!(sink.close(Duration::from_millis(10)).is_ok());
        assert!(sink.close(Duration::from_millis(10)).is_ok());
    }
}
