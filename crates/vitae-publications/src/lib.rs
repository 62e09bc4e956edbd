//! Vitae Publications - publication list pipeline
//!
//! Reads the researcher's works from ORCID, enriches DOIs through Crossref,
//! folds in PubMed search results and writes one deduplicated list.
//!
//! # Example
//!
//! ```ignore
//! use vitae_publications::{Config, run};
//!
//! let identity = vitae_core::Identity {
//!     orcid: "0000-0002-1825-0097".into(),
//!     ..Default::default()
//! };
//! let progress = vitae_core::ProgressContext::new();
//!
//! let (data, summary) = run(&Config::default(), &identity, &progress)?;
//! vitae_core::write_snapshot("data/publications.json".as_ref(), &data)?;
//! println!("{} publications", summary.publications);
//! ```

pub mod config;
pub mod normalize;
pub mod resolver;
pub mod runner;
pub mod schema;
pub mod source;

// Re-exports
pub use config::Config;
pub use resolver::{Resolution, Resolver};
pub use runner::{Bibliography, RemoteBibliography, Summary, build, run};
pub use schema::{Publication, PublicationsData, Source};
pub use source::{CrossrefWork, OrcidWork, PubmedArticle, SourceRecord};
