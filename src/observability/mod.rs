//! Observability for the gateway.
//!
//! The crate emits `tracing` events: dispatch and settlement at debug,
//! subscription at trace. [`LoggingConfig`] installs a subscriber for
//! binaries and tests that want to see them.

mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
