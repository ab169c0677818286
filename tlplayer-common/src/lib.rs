//! Shared plumbing for the tlplayer crates.
//!
//! Right now this is only the [`observability`] module, which every binary and
//! integration test uses to install the same `tracing` sinks.
pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat};
