#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Telemetry primitives shared across the Good Work workspace.
//!
//! Layout:
//! - `init.rs`: subscriber installation and log format selection
//! - `context.rs`: command-level spans
//! - `error.rs`: error type for telemetry setup

pub mod context;
pub mod error;
pub mod init;

pub use context::command_span;
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
