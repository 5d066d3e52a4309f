//! Formatting macros for sink sets.
//!
//! Every macro takes the [`SinkSet`](crate::SinkSet) first, followed by an
//! optional `err = <error>` and `ctx = <context>` pair, then `format!`-style
//! arguments. The message is only formatted if some sink accepts the level.
//!
//! # Examples
//!
//! ```
//! use rust_sink_logger::prelude::*;
//! use rust_sink_logger::{error, info};
//!
//! let sinks = SinkSet::new(Severity::Info);
//!
//! info!(sinks, "Server started");
//!
//! let port = 8080;
//! info!(sinks, "Server listening on port {}", port);
//!
//! let err = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
//! let ctx = RequestContext::new()
//!     .with_user_properties(UserProperties::new().with(UserProperty::Id, "u1"));
//! error!(sinks, err = &err, ctx = &ctx, "request {} failed", 17);
//! ```

/// Log at an explicit severity.
///
/// ```
/// # use rust_sink_logger::prelude::*;
/// # let sinks = SinkSet::new(Severity::Info);
/// use rust_sink_logger::log;
/// log!(sinks, Severity::Info, "Simple message");
/// log!(sinks, Severity::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($sinks:expr, $level:expr, err = $err:expr, ctx = $ctx:expr, $($arg:tt)+) => {
        $sinks.emit_fmt(
            $level,
            ::core::option::Option::Some($err),
            ::core::option::Option::Some($ctx),
            format_args!($($arg)+),
        )
    };
    ($sinks:expr, $level:expr, err = $err:expr, $($arg:tt)+) => {
        $sinks.emit_fmt(
            $level,
            ::core::option::Option::Some($err),
            ::core::option::Option::None,
            format_args!($($arg)+),
        )
    };
    ($sinks:expr, $level:expr, ctx = $ctx:expr, $($arg:tt)+) => {
        $sinks.emit_fmt(
            $level,
            ::core::option::Option::None,
            ::core::option::Option::Some($ctx),
            format_args!($($arg)+),
        )
    };
    ($sinks:expr, $level:expr, $($arg:tt)+) => {
        $sinks.emit_fmt(
            $level,
            ::core::option::Option::None,
            ::core::option::Option::None,
            format_args!($($arg)+),
        )
    };
}

/// Log a trace-level message.
///
/// ```
/// # use rust_sink_logger::prelude::*;
/// # let sinks = SinkSet::new(Severity::Trace);
/// use rust_sink_logger::trace;
/// trace!(sinks, "Entering function: calculate()");
/// ```
#[macro_export]
macro_rules! trace {
    ($sinks:expr, $($arg:tt)+) => {
        $crate::log!($sinks, $crate::Severity::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($sinks:expr, $($arg:tt)+) => {
        $crate::log!($sinks, $crate::Severity::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($sinks:expr, $($arg:tt)+) => {
        $crate::log!($sinks, $crate::Severity::Info, $($arg)+)
    };
}

/// Log a warning.
///
/// ```
/// # use rust_sink_logger::prelude::*;
/// # let sinks = SinkSet::new(Severity::Info);
/// use rust_sink_logger::warn;
/// warn!(sinks, "Retry {} of {}", 1, 3);
/// ```
#[macro_export]
macro_rules! warn {
    ($sinks:expr, $($arg:tt)+) => {
        $crate::log!($sinks, $crate::Severity::Warning, $($arg)+)
    };
}

/// Log an error, usually with `err = &e`.
#[macro_export]
macro_rules! error {
    ($sinks:expr, $($arg:tt)+) => {
        $crate::log!($sinks, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a fatal error. This does not terminate the process.
#[macro_export]
macro_rules! fatal {
    ($sinks:expr, $($arg:tt)+) => {
        $crate::log!($sinks, $crate::Severity::Fatal, $($arg)+)
    };
}
