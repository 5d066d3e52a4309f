//! # Rust Sink Logger
//!
//! A multi-sink structured logging facility. Leveled events are fanned out to
//! an ordered set of independently configured sinks, each with its own
//! minimum severity and its own way of talking to its backend.
//!
//! ## Features
//!
//! - **Multiple Sinks**: console, rolling file, error tracking and cloud log
//!   aggregation behind one [`Sink`] trait
//! - **Request Enrichment**: caller identity pulled from a [`RequestContext`]
//!   and surfaced only where allowed
//! - **Bounded Shutdown**: sinks close concurrently under a shared timeout
//! - **Thread Safe**: emit from any thread through `&SinkSet` or the global set
//!
//! ## Example
//!
//! ```
//! use rust_sink_logger::prelude::*;
//! use std::time::Duration;
//!
//! let sinks = SinkSet::builder()
//!     .minimum_level(Severity::Warning)
//!     .allowed_user_properties(vec![UserProperty::Email])
//!     .build();
//!
//! let ctx = RequestContext::new()
//!     .with_user_properties(UserProperties::new().with(UserProperty::Email, "a@b.com"));
//! sinks.emit(Severity::Error, "payment declined", None, Some(&ctx));
//!
//! sinks.close(Duration::from_secs(1)).unwrap();
//! ```

pub mod config;
pub mod core;
pub mod global;
pub mod macros;
pub mod rolling;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{Backends, FileSinkConfig, LoggingConfig};
    pub use crate::core::{
        EventError, LoggerError, RequestContext, Result, Severity, Sink, SinkPolicy, SinkSet,
        SinkSetBuilder, TimestampFormat, UserProperties, UserProperty, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::rolling::RollingPolicy;
    pub use crate::sinks::{CloudLogSink, ConsoleSink, Hub, RemoteErrorTrackingSink, RollingFileSink};
}

pub use crate::core::{
    EventError, LoggerError, RequestContext, Result, Severity, Sink, SinkPolicy, SinkSet,
    SinkSetBuilder, TimestampFormat, UserProperties, UserProperty, CLOSE_GRACE,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use sinks::{CloudLogSink, ConsoleSink, RemoteErrorTrackingSink, RollingFileSink};
