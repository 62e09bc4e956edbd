//! Vitae Mentions - news mentions pipeline
//!
//! Searches the GDELT document index with identity-derived queries, scores
//! every article against the researcher's identity signals and merges the
//! survivors into the previous snapshot.
//!
//! # Example
//!
//! ```ignore
//! use vitae_mentions::{Config, Outcome, persist, run};
//!
//! let path = std::path::Path::new("data/mentions.json");
//! let previous = vitae_core::read_snapshot(path)?;
//! let progress = vitae_core::ProgressContext::new();
//!
//! let (outcome, summary) = run(&Config::default(), &identity, previous.as_ref(), &progress)?;
//! if persist(path, &outcome)? {
//!     println!("{} mentions", summary.total);
//! }
//! ```

pub mod config;
pub mod gdelt;
pub mod runner;
pub mod schema;
pub mod scoring;

// Re-exports
pub use config::Config;
pub use gdelt::GdeltArticle;
pub use runner::{GdeltSearch, NewsSearch, Outcome, PreserveReason, Summary, build, persist, run};
pub use schema::{Mention, MentionsData};
pub use scoring::{Score, Scorer};
