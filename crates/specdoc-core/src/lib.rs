//! # specdoc-core
//!
//! Core functionality for specdoc - inferred end-user documentation from RSpec suites.
//!
//! This crate collects spec files, packs them into size-bounded batches, sends each
//! batch to a text-generation backend, and appends the results to one Markdown
//! document as they arrive.
//!
//! ## Architecture
//!
//! - **Collection**: recursive discovery of `*_spec.rb` files in a stable order
//! - **Batching**: greedy packing under a file-count and a character budget
//! - **Backend**: structured-response calls with a chat-completion fallback
//! - **Assembly**: header plus one section per batch, flushed incrementally
//! - **Error Handling**: categorized errors with recovery hints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use specdoc_core::{Settings, generate, preflight};
//!
//! # async fn run() -> specdoc_core::Result<()> {
//! let ready = preflight(Settings {
//!     path: Some("spec".to_string()),
//!     api_key: std::env::var("OPENAI_API_KEY").ok(),
//!     ..Settings::default()
//! })?;
//!
//! let summary = generate(ready, None::<fn(usize, usize)>).await?;
//! println!("{} sections written to {}", summary.recorded, summary.output.display());
//! # Ok(())
//! # }
//! ```

/// Output document writer
pub mod assembler;
/// Backend abstraction and the OpenAI-compatible client
pub mod backend;
/// Batch building under file and character limits
pub mod batch;
/// Input discovery and reading
pub mod collect;
/// Settings, validation and run configuration
pub mod config;
/// Error types and result aliases
pub mod error;
/// Run orchestration
pub mod generator;
/// System prompt
pub mod prompt;

pub use assembler::{BatchResult, DocumentAssembler, HeaderMeta};
pub use backend::openai::{ApiMode, BackendSettings, OpenAiClient};
pub use backend::{Backend, Invoker, Protocol, StructuredResponses};
pub use batch::{Batch, BatchBuilder, BatchLimits, BatchSummary, InputFile};
pub use collect::FilePattern;
pub use config::{ConfigError, GeneratorConfig, Ready, Settings, preflight};
pub use error::{Error, Result};
pub use generator::{Generator, RunSummary, generate, plan};
