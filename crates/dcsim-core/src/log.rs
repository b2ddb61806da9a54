//! Logging facilities.
//!
//! All macros produce one line per record: the simulated time, a colored
//! level tag, the emitting component's name and the message. Records go
//! through the `log` facade, so any logger implementation works.

use atty::Stream;
use colored::{ColoredString, Colorize};
use log::error;
use serde_json::json;
use serde_type_name::type_name;

use crate::event::Payload;
use crate::Id;

/// Colors a level tag for console output; plain when the log does not go to
/// a console.
pub fn paint(label: &str) -> ColoredString {
    if !atty::is(Stream::Stderr) {
        return label.normal();
    }
    match label {
        "ERROR" => label.red(),
        "WARN" => label.yellow(),
        "INFO" => label.green(),
        "DEBUG" => label.blue(),
        "TRACE" => label.cyan(),
        _ => label.bright_black(),
    }
}

/// Logs a message at the info level, stamped with the context's time and name.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => (
        log::info!(
            target: $ctx.name(),
            "{:.3} {} {}  {}",
            $ctx.time(), $crate::log::paint("INFO"), $ctx.name(), format_args!($($arg)+)
        )
    );
}

/// Logs a message at the debug level, stamped with the context's time and name.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => (
        log::debug!(
            target: $ctx.name(),
            "{:.3} {} {}  {}",
            $ctx.time(), $crate::log::paint("DEBUG"), $ctx.name(), format_args!($($arg)+)
        )
    );
}

/// Logs a message at the trace level, stamped with the context's time and name.
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => (
        log::trace!(
            target: $ctx.name(),
            "{:.3} {} {}  {}",
            $ctx.time(), $crate::log::paint("TRACE"), $ctx.name(), format_args!($($arg)+)
        )
    );
}

/// Logs a message at the warn level, stamped with the context's time and name.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => (
        log::warn!(
            target: $ctx.name(),
            "{:.3} {} {}  {}",
            $ctx.time(), $crate::log::paint("WARN"), $ctx.name(), format_args!($($arg)+)
        )
    );
}

/// Logs a message at the error level, stamped with the context's time and name.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => (
        log::error!(
            target: $ctx.name(),
            "{:.3} {} {}  {}",
            $ctx.time(), $crate::log::paint("ERROR"), $ctx.name(), format_args!($($arg)+)
        )
    );
}

/// Reports an event that could not be delivered, either because no handler
/// is registered for its target (`"undelivered"`) or because the receiving
/// handler routed none of its arms to the payload type (`"unrouted"`).
pub fn log_dropped_event(reason: &str, time: f64, source: Id, target: Id, payload: &dyn Payload) {
    error!(
        target: "simulation",
        "{:.3} {} simulation  {} event: {}",
        time,
        paint("ERROR"),
        reason,
        json!({
            "type": type_name(&payload).unwrap_or("?"),
            "payload": payload,
            "source": source,
            "target": target,
        })
    );
}
