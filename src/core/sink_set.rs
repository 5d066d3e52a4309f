//! Fan-out of log events to an ordered set of sinks

use super::{
    context::RequestContext,
    error::{LoggerError, Result},
    sink::{EventError, Sink},
    severity::Severity,
    user_properties::UserProperty,
};
use crate::sinks::ConsoleSink;
use crossbeam_channel::{bounded, RecvTimeoutError};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default timeout used by [`SinkSet::close`] callers that have no better value
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra time `close` waits past its timeout before giving up on slow sinks
pub const CLOSE_GRACE: Duration = Duration::from_millis(100);

/// An ordered, append-only set of sinks that receive every event
///
/// A new set always contains a [`ConsoleSink`], so logging works before any
/// configuration has been read.
///
/// # Example
///
/// ```
/// use rust_sink_logger::prelude::*;
/// use std::time::Duration;
///
/// let sinks = SinkSet::new(Severity::Info);
/// sinks.set_minimum_level(Severity::Warning);
/// sinks.emit(Severity::Error, "disk failure", None, None);
/// sinks.close(Duration::from_secs(1)).unwrap();
/// ```
pub struct SinkSet {
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    minimum_level: RwLock<Severity>,
    allowed: RwLock<Vec<UserProperty>>,
}

impl SinkSet {
    /// Create a set holding only a console sink at `minimum_level`
    #[must_use]
    pub fn new(minimum_level: Severity) -> Self {
        Self::with_sink(Arc::new(ConsoleSink::new(minimum_level)), minimum_level)
    }

    /// Create a set whose default sink is `sink` instead of the stderr console
    #[must_use]
    pub fn with_sink(sink: Arc<dyn Sink>, minimum_level: Severity) -> Self {
        Self {
            sinks: RwLock::new(vec![sink]),
            minimum_level: RwLock::new(minimum_level),
            allowed: RwLock::new(Vec::new()),
        }
    }

    /// Append a sink. Fan-out follows insertion order.
    ///
    /// Meant for the single-threaded setup phase; the sink keeps its own
    /// level and allow-list rather than inheriting the set's current policy.
    pub fn add(&self, sink: Arc<dyn Sink>) {
        self.sinks.write().push(sink);
    }

    /// Append `sink` if present, otherwise do nothing
    pub fn add_optional(&self, sink: Option<Arc<dyn Sink>>) {
        if let Some(sink) = sink {
            self.add(sink);
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Names of the registered sinks, in fan-out order
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks
            .read()
            .iter()
            .map(|sink| sink.name().to_string())
            .collect()
    }

    /// Set the minimum level of every sink registered right now
    pub fn set_minimum_level(&self, level: Severity) {
        for sink in self.sinks.read().iter() {
            sink.set_minimum_level(level);
        }
        *self.minimum_level.write() = level;
    }

    /// Level given to the most recent `set_minimum_level` call.
    ///
    /// Sinks added after that call may use a different level.
    pub fn minimum_level(&self) -> Severity {
        *self.minimum_level.read()
    }

    /// Set the user property allow-list of every sink registered right now
    pub fn set_allowed_user_properties(&self, properties: Vec<UserProperty>) {
        for sink in self.sinks.read().iter() {
            sink.set_allowed_user_properties(properties.clone());
        }
        *self.allowed.write() = properties;
    }

    /// Allow-list given to the most recent `set_allowed_user_properties` call
    pub fn allowed_user_properties(&self) -> Vec<UserProperty> {
        self.allowed.read().clone()
    }

    /// Deliver one event to every sink, in registration order.
    ///
    /// A panicking sink is reported on stderr and skipped; later sinks still
    /// receive the event.
    pub fn emit(
        &self,
        level: Severity,
        message: &str,
        error: EventError<'_>,
        context: Option<&RequestContext>,
    ) {
        let sinks = self.sinks.read();
        for (idx, sink) in sinks.iter().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                sink.emit(level, message, error, context)
            }));

            if let Err(panic_info) = result {
                eprintln!(
                    "[LOGGER CRITICAL] Sink #{} ({}) panicked: {}. \
                     Other sinks continue to function.",
                    idx,
                    sink.name(),
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }

    /// Format once and deliver to every sink
    pub fn emit_fmt(
        &self,
        level: Severity,
        error: EventError<'_>,
        context: Option<&RequestContext>,
        args: fmt::Arguments<'_>,
    ) {
        let enabled = self.sinks.read().iter().any(|sink| sink.is_enabled(level));
        if enabled {
            self.emit(level, &args.to_string(), error, context);
        }
    }

    /// Emit the full contents of `reader` as one event
    pub fn emit_reader<R: Read>(&self, level: Severity, mut reader: R) {
        let mut buffer = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buffer) {
            self.emit(
                Severity::Error,
                "failed to read log contents",
                Some(&e),
                None,
            );
            return;
        }
        self.emit(level, &String::from_utf8_lossy(&buffer), None, None);
    }

    /// Emit `value` serialised as JSON
    pub fn emit_json<T: Serialize + ?Sized>(&self, level: Severity, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.emit(level, &json, None, None),
            Err(e) => {
                let err = LoggerError::from(e);
                self.emit(Severity::Error, "failed to serialise log value", Some(&err), None);
            }
        }
    }

    #[inline]
    pub fn trace(&self, message: &str) {
        self.emit(Severity::Trace, message, None, None);
    }

    #[inline]
    pub fn debug(&self, message: &str) {
        self.emit(Severity::Debug, message, None, None);
    }

    #[inline]
    pub fn info(&self, message: &str) {
        self.emit(Severity::Info, message, None, None);
    }

    #[inline]
    pub fn warning(&self, message: &str) {
        self.emit(Severity::Warning, message, None, None);
    }

    #[inline]
    pub fn error(&self, message: &str, error: EventError<'_>) {
        self.emit(Severity::Error, message, error, None);
    }

    #[inline]
    pub fn fatal(&self, message: &str, error: EventError<'_>) {
        self.emit(Severity::Fatal, message, error, None);
    }

    /// Close every sink concurrently and report the first failure.
    ///
    /// Each sink gets its own thread and the same `timeout`. The returned
    /// error is the first one in registration order, not the first to
    /// arrive. Sinks still running `CLOSE_GRACE` after the timeout are left
    /// to finish on their own and count as [`LoggerError::CloseTimeout`].
    pub fn close(&self, timeout: Duration) -> Result<()> {
        let sinks: Vec<Arc<dyn Sink>> = self.sinks.read().clone();
        let (sender, receiver) = bounded(sinks.len());

        for (idx, sink) in sinks.iter().enumerate() {
            let sink = Arc::clone(sink);
            let tx = sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("sink-close-{}", idx))
                .spawn(move || {
                    let result = catch_unwind(AssertUnwindSafe(|| sink.close(timeout)))
                        .unwrap_or_else(|panic_info| {
                            Err(LoggerError::sink_panicked(
                                sink.name(),
                                panic_message(panic_info.as_ref()),
                            ))
                        });
                    // The receiver may be gone if the caller stopped waiting
                    let _ = tx.send((idx, result));
                });

            if let Err(e) = spawned {
                let _ = sender.send((
                    idx,
                    Err(LoggerError::io_operation(
                        "closing sink",
                        format!("failed to spawn close thread for '{}'", sinks[idx].name()),
                        e,
                    )),
                ));
            }
        }
        drop(sender);

        let mut results: Vec<Option<Result<()>>> = sinks.iter().map(|_| None).collect();
        // A timeout too large to represent as an instant means no deadline
        let deadline = timeout
            .checked_add(CLOSE_GRACE)
            .and_then(|wait| Instant::now().checked_add(wait));
        let mut pending = sinks.len();

        while pending > 0 {
            let received = match deadline {
                Some(deadline) => receiver.recv_deadline(deadline),
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((idx, result)) => {
                    results[idx] = Some(result);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    eprintln!(
                        "[LOGGER WARNING] {} sink(s) did not close within {:?}. \
                         Some logs may be lost.",
                        pending, timeout
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for (idx, slot) in results.into_iter().enumerate() {
            match slot {
                Some(Ok(())) => {}
                Some(Err(e)) => return Err(e),
                None => return Err(LoggerError::close_timeout(sinks[idx].name(), timeout)),
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn builder() -> SinkSetBuilder {
        SinkSetBuilder::new()
    }
}

impl Default for SinkSet {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.sink_names())
            .field("minimum_level", &self.minimum_level())
            .field("allowed", &self.allowed_user_properties())
            .finish()
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for constructing a SinkSet with a fluent API
///
/// Policy set on the builder applies to every sink passed to it, including
/// the default console sink.
///
/// # Example
/// ```
/// use rust_sink_logger::prelude::*;
/// use std::sync::Arc;
///
/// let sinks = SinkSet::builder()
///     .minimum_level(Severity::Debug)
///     .allowed_user_properties(vec![UserProperty::Email])
///     .sink(Arc::new(ConsoleSink::new(Severity::Debug)))
///     .build();
///
/// assert_eq!(sinks.len(), 2);
/// ```
pub struct SinkSetBuilder {
    minimum_level: Severity,
    allowed: Option<Vec<UserProperty>>,
    default_sink: Option<Arc<dyn Sink>>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl SinkSetBuilder {
    pub fn new() -> Self {
        Self {
            minimum_level: Severity::Info,
            allowed: None,
            default_sink: None,
            sinks: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn minimum_level(mut self, level: Severity) -> Self {
        self.minimum_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn allowed_user_properties(mut self, properties: Vec<UserProperty>) -> Self {
        self.allowed = Some(properties);
        self
    }

    /// Replace the stderr console sink that every set starts with
    #[must_use = "builder methods return a new value"]
    pub fn default_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.default_sink = Some(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn build(self) -> SinkSet {
        let set = match self.default_sink {
            Some(sink) => SinkSet::with_sink(sink, self.minimum_level),
            None => SinkSet::new(self.minimum_level),
        };

        for sink in self.sinks {
            set.add(sink);
        }

        set.set_minimum_level(self.minimum_level);
        if let Some(allowed) = self.allowed {
            set.set_allowed_user_properties(allowed);
        }

        set
    }
}

impl Default for SinkSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingSink {
        policy: crate::core::SinkPolicy,
        events: Mutex<Vec<(Severity, String)>>,
    }

    impl RecordingSink {
        fn new(level: Severity) -> Arc<Self> {
            Arc::new(Self {
                policy: crate::core::SinkPolicy::new(level),
                events: Mutex::new(Vec::new()),
            })
        }
    }

    impl Sink for RecordingSink {
        fn emit(&self, level: Severity, message: &str, _: EventError<'_>, _: Option<&RequestContext>) {
            if self.policy.is_enabled(level) {
                self.events.lock().push((level, message.to_string()));
            }
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
        fn close(&self, _: Duration) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "recording"
        }
    }

    struct PanickingSink;

    impl Sink for PanickingSink {
        fn emit(&self, _: Severity, _: &str, _: EventError<'_>, _: Option<&RequestContext>) {
            panic!("sink exploded");
        }
        fn set_minimum_level(&self, _: Severity) {}
        fn minimum_level(&self) -> Severity {
            Severity::Trace
        }
        fn set_allowed_user_properties(&self, _: Vec<UserProperty>) {}
        fn allowed_user_properties(&self) -> Vec<UserProperty> {
            Vec::new()
        }
        fn close(&self, _: Duration) -> Result<()> {
            panic!("close exploded");
        }
        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn quiet_set() -> SinkSet {
        SinkSet::with_sink(RecordingSink::new(Severity::Info), Severity::Info)
    }

    #[test]
    fn test_new_set_is_never_empty() {
        let set = SinkSet::new(Severity::Info);
        assert_eq!(set.len(), 1);
        assert_eq!(set.sink_names(), vec!["console".to_string()]);
    }

    #[test]
    fn test_add_optional_none_is_noop() {
        let set = quiet_set();
        set.add_optional(None);
        assert_eq!(set.len(), 1);

        set.add_optional(Some(RecordingSink::new(Severity::Info)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_set_minimum_level_not_applied_to_later_sinks() {
        let set = quiet_set();
        set.set_minimum_level(Severity::Error);

        let late = RecordingSink::new(Severity::Debug);
        set.add(late.clone());

        assert_eq!(set.minimum_level(), Severity::Error);
        assert_eq!(late.minimum_level(), Severity::Debug);
    }

    #[test]
    fn test_set_allowed_user_properties_propagates() {
        let early = RecordingSink::new(Severity::Info);
        let set = SinkSet::with_sink(early.clone(), Severity::Info);
        set.set_allowed_user_properties(vec![UserProperty::Email]);

        let late = RecordingSink::new(Severity::Info);
        set.add(late.clone());

        assert_eq!(early.allowed_user_properties(), vec![UserProperty::Email]);
        assert!(late.allowed_user_properties().is_empty());
        assert_eq!(set.allowed_user_properties(), vec![UserProperty::Email]);
    }

    #[test]
    fn test_emit_survives_panicking_sink() {
        let first = RecordingSink::new(Severity::Info);
        let last = RecordingSink::new(Severity::Info);
        let set = SinkSet::with_sink(first.clone(), Severity::Info);
        set.add(Arc::new(PanickingSink));
        set.add(last.clone());

        set.info("still delivered");

        assert_eq!(first.events.lock().len(), 1);
        assert_eq!(last.events.lock()[0].1, "still delivered");
    }

    #[test]
    fn test_emit_fmt_skips_when_nothing_enabled() {
        let sink = RecordingSink::new(Severity::Error);
        let set = SinkSet::with_sink(sink.clone(), Severity::Error);

        set.emit_fmt(Severity::Info, None, None, format_args!("n={}", 1));
        set.emit_fmt(Severity::Error, None, None, format_args!("n={}", 2));

        assert_eq!(*sink.events.lock(), vec![(Severity::Error, "n=2".to_string())]);
    }

    #[test]
    fn test_emit_reader_and_json() {
        let sink = RecordingSink::new(Severity::Debug);
        let set = SinkSet::with_sink(sink.clone(), Severity::Debug);

        set.emit_reader(Severity::Debug, "body text".as_bytes());
        set.emit_json(Severity::Info, &serde_json::json!({"status": 200}));

        let events = sink.events.lock();
        assert_eq!(events[0], (Severity::Debug, "body text".to_string()));
        assert_eq!(events[1], (Severity::Info, r#"{"status":200}"#.to_string()));
    }

    #[test]
    fn test_close_reports_panicking_sink() {
        let set = quiet_set();
        set.add(Arc::new(PanickingSink));

        let err = set.close(Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, LoggerError::SinkPanicked { .. }));
    }

    #[test]
    fn test_close_with_unbounded_timeout() {
        let set = quiet_set();
        set.add(RecordingSink::new(Severity::Debug));

        assert!(set.close(Duration::MAX).is_ok());
    }

    #[test]
    fn test_close_with_unbounded_timeout_still_reports_errors() {
        let set = quiet_set();
        set.add(Arc::new(PanickingSink));

        let err = set.close(Duration::MAX).unwrap_err();
        assert!(matches!(err, LoggerError::SinkPanicked { .. }));
    }

    #[test]
    fn test_builder_applies_policy() {
        let extra = RecordingSink::new(Severity::Trace);
        let set = SinkSet::builder()
            .default_sink(RecordingSink::new(Severity::Info))
            .minimum_level(Severity::Warning)
            .allowed_user_properties(vec![UserProperty::Id])
            .sink(extra.clone())
            .build();

        assert_eq!(set.len(), 2);
        assert_eq!(extra.minimum_level(), Severity::Warning);
        assert_eq!(extra.allowed_user_properties(), vec![UserProperty::Id]);
    }
}
