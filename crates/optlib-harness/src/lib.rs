//! Diagnostics harness for optlib.
//!
//! This crate provides:
//! - Probe reports: load a library table and record what was found as JSON
//! - Logging setup: the `tracing` subscriber the CLI installs
//! - Error type shared by the `harness` binary

#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod report;

pub use error::HarnessError;
pub use logging::LogFormat;
pub use report::{LibraryReport, LookupReport, ProbeReport};
