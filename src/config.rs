//! Logging configuration
//!
//! [`LoggingConfig`] is plain data: the crate never reads files itself. The
//! caller loads the document however it likes and hands over either the
//! parsed struct or its JSON text.
//!
//! ```
//! use rust_sink_logger::config::LoggingConfig;
//! use rust_sink_logger::{Severity, UserProperty};
//!
//! let config = LoggingConfig::from_json_str(r#"{
//!     "minimumLevel": "warning",
//!     "userPropertiesToLog": ["email"],
//!     "file": { "path": "/var/log/api.log", "maxBackups": 5 }
//! }"#).unwrap();
//!
//! assert_eq!(config.minimum_level, Severity::Warning);
//! assert_eq!(config.user_properties_to_log, vec![UserProperty::Email]);
//! assert_eq!(config.file.unwrap().max_size_megabytes, 500);
//! ```

use crate::core::{LoggerError, Result, Severity, Sink, SinkSet, UserProperty};
use crate::rolling::RollingPolicy;
use crate::sinks::{
    CloudLogBackend, CloudLogOptions, CloudLogSink, ErrorTrackingBackend, ErrorTrackingOptions,
    RemoteErrorTrackingSink, RollingFileSink,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Settings for the rolling file sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSinkConfig {
    pub path: PathBuf,
    pub max_size_megabytes: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            max_size_megabytes: 500,
            max_backups: 3,
            max_age_days: 28,
            compress: false,
        }
    }
}

impl FileSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn rolling_policy(&self) -> RollingPolicy {
        RollingPolicy::new()
            .with_max_size_megabytes(self.max_size_megabytes)
            .with_max_backups(self.max_backups)
            .with_max_age_days(self.max_age_days)
            .with_compression(self.compress)
    }
}

/// Complete logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    pub minimum_level: Severity,
    pub user_properties_to_log: Vec<UserProperty>,
    pub file: Option<FileSinkConfig>,
    pub error_tracking: Option<ErrorTrackingOptions>,
    pub cloud: Option<CloudLogOptions>,
}

/// Client factories for the remote sinks
///
/// A remote section in the configuration without a matching backend is a
/// configuration error.
#[derive(Clone, Copy, Default)]
pub struct Backends<'a> {
    pub error_tracking: Option<&'a dyn ErrorTrackingBackend>,
    pub cloud: Option<&'a dyn CloudLogBackend>,
}

impl<'a> Backends<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_error_tracking(mut self, backend: &'a dyn ErrorTrackingBackend) -> Self {
        self.error_tracking = Some(backend);
        self
    }

    #[must_use]
    pub fn with_cloud(mut self, backend: &'a dyn CloudLogBackend) -> Self {
        self.cloud = Some(backend);
        self
    }
}

impl LoggingConfig {
    /// # Errors
    ///
    /// Returns `JsonError` if `json` is not a valid configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_minimum_level(mut self, level: Severity) -> Self {
        self.minimum_level = level;
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: FileSinkConfig) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use]
    pub fn with_error_tracking(mut self, options: ErrorTrackingOptions) -> Self {
        self.error_tracking = Some(options);
        self
    }

    #[must_use]
    pub fn with_cloud(mut self, options: CloudLogOptions) -> Self {
        self.cloud = Some(options);
        self
    }

    /// Construct every configured sink, in file, error tracking, cloud order.
    ///
    /// Nothing is returned unless every sink could be constructed.
    pub fn build_sinks(&self, backends: Backends<'_>) -> Result<Vec<Arc<dyn Sink>>> {
        let level = self.minimum_level;
        let allowed = self.user_properties_to_log.clone();
        let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();

        if let Some(file) = &self.file {
            if file.path.as_os_str().is_empty() {
                return Err(LoggerError::config("file", "path not configured"));
            }
            let sink = RollingFileSink::new(&file.path, level, file.rolling_policy())?
                .with_allowed_user_properties(allowed.clone());
            sinks.push(Arc::new(sink));
        }

        if let Some(options) = &self.error_tracking {
            let backend = backends.error_tracking.ok_or_else(|| {
                LoggerError::config("errorTracking", "no error-tracking backend supplied")
            })?;
            let sink = RemoteErrorTrackingSink::new(options.clone(), level, backend)?
                .with_allowed_user_properties(allowed.clone());
            sinks.push(Arc::new(sink));
        }

        if let Some(options) = &self.cloud {
            let backend = backends
                .cloud
                .ok_or_else(|| LoggerError::config("cloud", "no cloud log backend supplied"))?;
            let sink = CloudLogSink::new(options, level, backend)?
                .with_allowed_user_properties(allowed);
            sinks.push(Arc::new(sink));
        }

        Ok(sinks)
    }

    /// Add the configured sinks to `set` and apply the level and
    /// user-property policy to everything it now holds.
    pub fn apply(&self, set: &SinkSet, backends: Backends<'_>) -> Result<()> {
        for sink in self.build_sinks(backends)? {
            set.add(sink);
        }
        set.set_minimum_level(self.minimum_level);
        set.set_allowed_user_properties(self.user_properties_to_log.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::error_tracking::Breadcrumb;
    use crate::sinks::{CloudLogClient, CloudLogEntry, ErrorTrackingClient, TrackedEvent};
    use std::time::Duration;
    use tempfile::tempdir;

    struct NullTracker;

    impl ErrorTrackingClient for NullTracker {
        fn add_breadcrumb(&self, _breadcrumb: Breadcrumb) {}
        fn capture_event(&self, _event: TrackedEvent) {}
        fn flush(&self, _timeout: Duration) -> bool {
            true
        }
    }

    struct NullCloud;

    impl CloudLogClient for NullCloud {
        fn log(&mut self, _log_name: &str, _entry: CloudLogEntry) {}
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn tracker(_: &ErrorTrackingOptions) -> Result<Arc<dyn ErrorTrackingClient>> {
        Ok(Arc::new(NullTracker))
    }

    fn cloud(_: &str) -> Result<Box<dyn CloudLogClient>> {
        Ok(Box::new(NullCloud))
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = LoggingConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.minimum_level, Severity::Info);
        assert!(config.build_sinks(Backends::none()).unwrap().is_empty());
    }

    #[test]
    fn test_full_document() {
        let config = LoggingConfig::from_json_str(
            r#"{
                "minimumLevel": "ERROR",
                "userPropertiesToLog": ["userId", "email", "userName"],
                "file": { "path": "app.log", "maxSizeMegabytes": 10, "compress": true },
                "errorTracking": {
                    "dsn": "https://key@errors.example.com/42",
                    "environment": "staging",
                    "tags": { "service": "acme api" }
                },
                "cloud": { "logName": "api", "projectId": "acme", "configName": "prod" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.minimum_level, Severity::Error);
        assert_eq!(config.user_properties_to_log, UserProperty::ALL.to_vec());

        let file = config.file.as_ref().unwrap();
        assert_eq!(file.max_size_megabytes, 10);
        assert_eq!(file.max_backups, 3);
        assert_eq!(file.max_age_days, 28);
        assert!(file.compress);

        let tracking = config.error_tracking.as_ref().unwrap();
        assert_eq!(tracking.environment.as_deref(), Some("staging"));
        assert!(tracking.attach_stacktrace);

        let cloud = config.cloud.as_ref().unwrap();
        assert_eq!(cloud.full_log_name(), "api-prod");
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let config = LoggingConfig::from_json_str(r#"{ "minimumLevel": "verbose" }"#).unwrap();
        assert_eq!(config.minimum_level, Severity::Info);
    }

    #[test]
    fn test_null_or_numeric_level_falls_back_to_info() {
        for json in [r#"{ "minimumLevel": null }"#, r#"{ "minimumLevel": 4 }"#] {
            let config = LoggingConfig::from_json_str(json).unwrap();
            assert_eq!(config.minimum_level, Severity::Info);
        }
    }

    #[test]
    fn test_malformed_document_is_json_error() {
        let err = LoggingConfig::from_json_str("{ minimumLevel: ").unwrap_err();
        assert!(matches!(err, LoggerError::JsonError(_)));
    }

    #[test]
    fn test_remote_section_without_backend_is_rejected() {
        let config = LoggingConfig::default()
            .with_cloud(CloudLogOptions::new("api", "acme"));

        let result = config.build_sinks(Backends::none());
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_apply_adds_sinks_in_order() {
        let dir = tempdir().unwrap();
        let config = LoggingConfig::default()
            .with_minimum_level(Severity::Debug)
            .with_file(FileSinkConfig::new(dir.path().join("api.log")))
            .with_error_tracking(ErrorTrackingOptions::new("https://key@errors.example.com/42"))
            .with_cloud(CloudLogOptions::new("api", "acme"));

        let set = SinkSet::new(Severity::Info);
        let backends = Backends::none()
            .with_error_tracking(&tracker)
            .with_cloud(&cloud);
        config.apply(&set, backends).unwrap();

        assert_eq!(
            set.sink_names(),
            vec!["console", "rolling-file", "error-tracking", "cloud-log"]
        );
        assert_eq!(set.minimum_level(), Severity::Debug);
        set.close(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_oversized_file_limits_do_not_panic() {
        let dir = tempdir().unwrap();
        let json = format!(
            r#"{{ "file": {{ "path": {}, "maxSizeMegabytes": 18446744073709551615, "maxAgeDays": 4294967296 }} }}"#,
            serde_json::to_string(&dir.path().join("api.log")).unwrap()
        );
        let config = LoggingConfig::from_json_str(&json).unwrap();

        let policy = config.file.as_ref().unwrap().rolling_policy();
        assert_eq!(policy.max_size_bytes, u64::MAX);
        assert_eq!(policy.max_age, Duration::from_secs(4_294_967_296 * 86_400));

        let sinks = config.build_sinks(Backends::none()).unwrap();
        assert_eq!(sinks.len(), 1);
    }

    #[test]
    fn test_file_without_path_is_rejected() {
        let config = LoggingConfig::default().with_file(FileSinkConfig::default());
        assert!(config.build_sinks(Backends::none()).is_err());
    }
}
