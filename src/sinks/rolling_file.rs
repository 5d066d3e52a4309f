//! Rolling file sink
//!
//! Same line layout as the console sink, written to a size-rotated file.

use crate::core::record::{render_body, render_line};
use crate::core::{
    EventError, RequestContext, Result, Severity, Sink, SinkPolicy, TimestampFormat, UserProperty,
};
use crate::rolling::{RollingFile, RollingPolicy};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Writes leveled text records to a [`RollingFile`]
///
/// # Examples
///
/// ```no_run
/// use rust_sink_logger::rolling::RollingPolicy;
/// use rust_sink_logger::sinks::RollingFileSink;
/// use rust_sink_logger::Severity;
///
/// let policy = RollingPolicy::new()
///     .with_max_size_megabytes(100)
///     .with_max_backups(5)
///     .with_max_age_days(7);
/// let sink = RollingFileSink::new("/var/log/app.log", Severity::Info, policy).unwrap();
/// ```
pub struct RollingFileSink {
    policy: SinkPolicy,
    file: Mutex<RollingFile>,
    path: PathBuf,
    timestamp_format: TimestampFormat,
}

impl RollingFileSink {
    /// # Errors
    ///
    /// Returns error if the log file or its directory cannot be created
    pub fn new<P: AsRef<Path>>(path: P, minimum_level: Severity, rolling: RollingPolicy) -> Result<Self> {
        let file = RollingFile::open(path.as_ref(), rolling)?;
        Ok(Self {
            policy: SinkPolicy::new(minimum_level),
            path: file.path().to_path_buf(),
            file: Mutex::new(file),
            timestamp_format: TimestampFormat::default(),
        })
    }

    /// 500 MB per file, 3 backups, 28 days retention
    pub fn with_defaults<P: AsRef<Path>>(path: P, minimum_level: Severity) -> Result<Self> {
        Self::new(path, minimum_level, RollingPolicy::default())
    }

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

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Push buffered records to disk without closing the file
    pub fn flush(&self) -> Result<()> {
        self.file.lock().flush()
    }
}

impl Sink for RollingFileSink {
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
        let mut line = render_line(level.as_str(), &self.timestamp_format.now(), &body);
        line.push('\n');

        if let Err(e) = self.file.lock().write_record(line.as_bytes()) {
            eprintln!("[LOGGER ERROR] Rolling file sink failed: {}", e);
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

    /// The file close cannot be cancelled; `timeout` is accepted for uniformity
    fn close(&self, _timeout: Duration) -> Result<()> {
        self.file.lock().close()
    }

    fn name(&self) -> &str {
        "rolling-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::user_properties::UserProperties;
    use std::fs;
    use tempfile::tempdir;

    fn sink_at(dir: &Path, level: Severity) -> RollingFileSink {
        RollingFileSink::with_defaults(dir.join("app.log"), level)
            .unwrap()
            .with_timestamp_format(TimestampFormat::None)
    }

    #[test]
    fn test_filters_and_formats_like_console() {
        let dir = tempdir().unwrap();
        let sink = sink_at(dir.path(), Severity::Info);
        sink.set_allowed_user_properties(vec![UserProperty::Id, UserProperty::Name]);

        let ctx = RequestContext::new().with_user_properties(
            UserProperties::new()
                .with(UserProperty::Id, "u1")
                .with(UserProperty::Name, "ada"),
        );

        sink.emit(Severity::Debug, "hidden", None, None);
        sink.emit(Severity::Info, "signed in", None, Some(&ctx));
        sink.close(Duration::from_secs(1)).unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "INFO: signed in (u1, ada)\n");
    }

    #[test]
    fn test_injection_stays_on_one_line() {
        let dir = tempdir().unwrap();
        let sink = sink_at(dir.path(), Severity::Info);

        sink.emit(Severity::Info, "login\nERROR: forged entry", None, None);
        sink.flush().unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\\n"));
    }

    #[test]
    fn test_rotates_through_collaborator() {
        let dir = tempdir().unwrap();
        let rolling = RollingPolicy::new().with_max_size_bytes(64).with_max_backups(1);
        let sink = RollingFileSink::new(dir.path().join("small.log"), Severity::Info, rolling)
            .unwrap()
            .with_timestamp_format(TimestampFormat::None);

        for i in 0..10 {
            sink.emit(Severity::Warning, &format!("event {}", i), None, None);
        }
        sink.close(Duration::from_secs(1)).unwrap();

        assert!(dir.path().join("small.log.1").exists());
        assert!(!dir.path().join("small.log.2").exists());
    }

    #[test]
    fn test_close_twice() {
        let dir = tempdir().unwrap();
        let sink = sink_at(dir.path(), Severity::Info);

        assert!(sink.close(Duration::from_millis(10)).is_ok());
        assert!(sink.close(Duration::from_millis(10)).is_ok());
    }
}
