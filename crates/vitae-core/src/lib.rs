//! Vitae Core - shared infrastructure for the portfolio data pipelines
//!
//! HTTP access with timeouts and retry, logging, progress lines, atomic
//! snapshot files and the identity configuration consumed by both the
//! publications and the mentions pipelines.

pub mod error;
pub mod http;
pub mod identity;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod snapshot;

// Re-exports for convenience
pub use error::FetchError;
pub use http::{HttpConfig, get_json, get_text, http_config, set_http_config};
pub use identity::{AffiliationSignal, Identity, LocationSignal, MentionSignals, PubmedQuery};
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use progress::{ProgressContext, SharedProgress};
pub use snapshot::{read_snapshot, write_snapshot};
