//! Core logging types and traits

pub mod context;
pub mod error;
pub mod record;
pub mod severity;
pub mod sink;
pub mod sink_set;
pub mod timestamp;
pub mod user_properties;

pub use context::RequestContext;
pub use error::{LoggerError, Result};
pub use severity::Severity;
pub use sink::{EventError, Sink, SinkPolicy};
pub use sink_set::{SinkSet, SinkSetBuilder, CLOSE_GRACE, DEFAULT_SHUTDOWN_TIMEOUT};
pub use timestamp::TimestampFormat;
pub use user_properties::{UserProperties, UserProperty};
