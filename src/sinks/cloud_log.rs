//! Cloud log-aggregation sink
//!
//! Translates events into the aggregation service's severity scale and hands
//! them to a [`CloudLogClient`], which buffers entries until flushed. All
//! access to the client is serialised by one mutex, so entries reach the
//! client in a total order.

use crate::core::record::describe_error;
use crate::core::{
    EventError, LoggerError, RequestContext, Result, Severity, Sink, SinkPolicy, UserProperty,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

/// Severity scale of the aggregation service
///
/// `Drop` sits below every real level and is never transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudSeverity {
    Drop = -1,
    Default = 0,
    Debug = 100,
    Info = 200,
    Notice = 300,
    Warning = 400,
    Error = 500,
    Critical = 600,
    Alert = 700,
    Emergency = 800,
}

impl From<Severity> for CloudSeverity {
    fn from(level: Severity) -> Self {
        match level {
            Severity::Trace => CloudSeverity::Drop,
            Severity::Debug => CloudSeverity::Debug,
            Severity::Info => CloudSeverity::Info,
            Severity::Warning => CloudSeverity::Warning,
            Severity::Error => CloudSeverity::Error,
            Severity::Fatal => CloudSeverity::Critical,
        }
    }
}

impl CloudSeverity {
    /// Severity named by a `"LEVEL:"` prefix at the start of `text`
    fn from_prefix(text: &str) -> Option<Self> {
        let (prefix, _) = text.split_once(':')?;
        let level = Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == prefix)?;
        Some(level.into())
    }
}

/// One buffered entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudLogEntry {
    pub severity: CloudSeverity,
    pub payload: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// Buffered connection to the aggregation service
pub trait CloudLogClient: Send {
    /// Buffer an entry for `log_name`
    fn log(&mut self, log_name: &str, entry: CloudLogEntry);

    fn flush(&mut self) -> Result<()>;

    /// Flush remaining entries and release the connection
    fn close(&mut self) -> Result<()>;
}

/// Opens a client for a project
pub trait CloudLogBackend {
    fn connect(&self, project_id: &str) -> Result<Box<dyn CloudLogClient>>;
}

impl<F> CloudLogBackend for F
where
    F: Fn(&str) -> Result<Box<dyn CloudLogClient>>,
{
    fn connect(&self, project_id: &str) -> Result<Box<dyn CloudLogClient>> {
        self(project_id)
    }
}

/// Identifiers for [`CloudLogSink`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudLogOptions {
    pub log_name: String,
    pub project_id: String,
    /// Appended to the log name as `"{log_name}-{config_name}"`
    pub config_name: Option<String>,
}

impl CloudLogOptions {
    pub fn new(log_name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            log_name: log_name.into(),
            project_id: project_id.into(),
            config_name: None,
        }
    }

    #[must_use]
    pub fn with_config_name(mut self, config_name: impl Into<String>) -> Self {
        self.config_name = Some(config_name.into());
        self
    }

    /// Log name the entries are written under
    pub fn full_log_name(&self) -> String {
        match self.config_name.as_deref().filter(|name| !name.is_empty()) {
            Some(config_name) => format!("{}-{}", self.log_name, config_name),
            None => self.log_name.clone(),
        }
    }
}

/// Sends events to a cloud log-aggregation service
pub struct CloudLogSink {
    policy: SinkPolicy,
    log_name: String,
    client: Mutex<Option<Box<dyn CloudLogClient>>>,
}

impl CloudLogSink {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the log name or project id is
    /// empty, and the backend's error if it cannot connect.
    pub fn new(
        options: &CloudLogOptions,
        minimum_level: Severity,
        backend: &dyn CloudLogBackend,
    ) -> Result<Self> {
        if options.log_name.is_empty() {
            return Err(LoggerError::config("CloudLogSink", "log name not configured"));
        }
        if options.project_id.is_empty() {
            return Err(LoggerError::config("CloudLogSink", "project id not configured"));
        }

        let client = backend.connect(&options.project_id)?;

        Ok(Self {
            policy: SinkPolicy::new(minimum_level),
            log_name: options.full_log_name(),
            client: Mutex::new(Some(client)),
        })
    }

    #[must_use]
    pub fn with_allowed_user_properties(self, properties: Vec<UserProperty>) -> Self {
        self.policy.set_allowed(properties);
        self
    }

    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    pub fn is_closed(&self) -> bool {
        self.client.lock().is_none()
    }

    /// Push buffered entries to the service now
    pub fn flush(&self) -> Result<()> {
        match self.client.lock().as_mut() {
            Some(client) => client.flush(),
            None => Ok(()),
        }
    }

    fn labels(&self, context: Option<&RequestContext>) -> BTreeMap<String, String> {
        let allowed = self.policy.allowed();
        crate::core::user_properties::extract(context)
            .map(|properties| {
                properties
                    .allowed(&allowed)
                    .map(|(property, value)| (property.key().to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn send(&self, entry: CloudLogEntry) {
        if entry.severity <= CloudSeverity::Drop {
            return;
        }

        // Entries after close are dropped; the lock does not reopen the client
        if let Some(client) = self.client.lock().as_mut() {
            client.log(&self.log_name, entry);
        }
    }
}

impl Sink for CloudLogSink {
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

        let payload = match error {
            Some(err) => format!("{}, {}", message, describe_error(err)),
            None => message.to_string(),
        };

        self.send(CloudLogEntry {
            severity: level.into(),
            payload,
            labels: self.labels(context),
            timestamp: Utc::now(),
        });
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

    /// Flushes and releases the client. The client call cannot be
    /// interrupted, so `timeout` is advisory.
    fn close(&self, _timeout: Duration) -> Result<()> {
        let mut guard = self.client.lock();
        match guard.take() {
            Some(mut client) => client.close().map_err(|e| {
                LoggerError::flush_failed(self.name(), e.to_string())
            }),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "cloud-log"
    }
}

/// Raw text writer mode: a leading `"LEVEL:"` picks the severity.
///
/// Text without a recognised prefix is sent at `CloudSeverity::Default`;
/// `"TRACE:"` text is dropped. The sink's minimum level does not apply.
impl io::Write for &CloudLogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let severity = CloudSeverity::from_prefix(&text).unwrap_or(CloudSeverity::Default);

        self.send(CloudLogEntry {
            severity,
            payload: text.trim_end_matches('\n').to_string(),
            labels: BTreeMap::new(),
            timestamp: Utc::now(),
        });
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        CloudLogSink::flush(*self).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
