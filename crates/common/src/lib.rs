//! Canto Common Library
//!
//! Shared code for the Canto search service including:
//! - Corpus model, loading, and registry
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod corpus;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use corpus::{Corpus, CorpusRegistry, Section};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
