//! Logging and diagnostics.

pub mod logging;

pub use logging::{LogFormat, effective_directive, init_logging};
