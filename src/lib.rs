//! Retrieve the publication history of Go modules from the module index.
//!
//! - [`index`]: concurrent, cached fetch of the index in time windows
//! - [`report`]: filtering, sorting and printing of the fetched records
//! - [`config`]: fetch settings and constants
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod index;
pub mod logging;
pub mod report;
