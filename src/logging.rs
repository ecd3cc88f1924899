//! Logging macros that set target to "alloydb_connector" for all log calls.
//!
//! Host applications embedding the connector filter logs by target name.
//! Without an explicit target, tracing uses the full module path
//! (e.g., "alloydb_connector::control_plane"), creating overly verbose
//! logger names. These macros ensure all logs from this crate use a single
//! "alloydb_connector" target.

#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!(target: "alloydb_connector", $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!(target: "alloydb_connector", $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { ::tracing::info!(target: "alloydb_connector", $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { ::tracing::warn!(target: "alloydb_connector", $($arg)*) };
}

#[allow(unused_macros)]
macro_rules! error {
    ($($arg:tt)*) => { ::tracing::error!(target: "alloydb_connector", $($arg)*) };
}
