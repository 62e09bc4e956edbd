//! Mentions pipeline configuration

use std::time::Duration;

/// Runtime configuration for the mentions pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// GDELT DOC 2.0 API endpoint
    pub gdelt_base_url: String,
    /// `maxrecords` per query
    pub max_records: u32,
    /// Pause between consecutive queries
    pub query_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gdelt_base_url: "https://api.gdeltproject.org/api/v2/doc/doc".to_string(),
            max_records: 50,
            query_delay: Duration::from_millis(1000),
        }
    }
}
