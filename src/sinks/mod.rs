//! Sink implementations

pub mod cloud_log;
pub mod console;
pub mod error_tracking;
pub mod rolling_file;

pub use cloud_log::{
    CloudLogBackend, CloudLogClient, CloudLogEntry, CloudLogOptions, CloudLogSink, CloudSeverity,
};
pub use console::ConsoleSink;
pub use error_tracking::{
    ErrorTrackingBackend, ErrorTrackingClient, ErrorTrackingOptions, Hub, RemoteErrorTrackingSink,
    TrackedEvent,
};
pub use rolling_file::RollingFileSink;

pub use crate::core::Sink;
