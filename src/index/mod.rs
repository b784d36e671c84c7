//! Time-windowed fetch of the Go module index
//!
//! The index history is split into fixed-size windows that are fetched
//! concurrently and merged into a single record stream.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Orchestrator │────▶│WindowFetcher │────▶│  PageCache   │
//! │  (fan-out)   │     │ (per window) │     │ (JSON files) │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                    │
//!        ▼                    ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ mpsc channel │     │   Backoff    │────▶│ IndexSource  │
//! │  (fan-in)    │     │   (retry)    │     │ (HTTP+repair)│
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`orchestrator`]: Window partitioning, task group, first-error cancellation
//! - [`window`]: Paging through one window, cache read-through and write-back
//! - [`cache`]: Atomic on-disk storage of completed windows
//! - [`source`]: Page source trait
//! - [`client`]: HTTP implementation of the page source
//! - [`repair`]: Fix-up of the index's concatenated JSON body
//! - [`retry`]: Exponential backoff
//! - [`error`]: Error types for fetch and cache operations
//! - [`types`]: `ModuleVersion` and `TimeWindow`

pub mod cache;
pub mod client;
pub mod error;
pub mod orchestrator;
pub mod repair;
pub mod retry;
pub mod source;
pub mod types;
pub mod window;

pub use client::IndexClient;
pub use error::{CacheError, FetchError};
pub use orchestrator::Orchestrator;
pub use types::{ModuleVersion, TimeWindow};

