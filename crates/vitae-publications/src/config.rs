//! Publications pipeline configuration

use std::time::Duration;

/// Runtime configuration for the publications pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// ORCID public API, works are at `{base}/{orcid}/works`
    pub orcid_base_url: String,
    /// Crossref REST API, works are at `{base}/works/{doi}`
    pub crossref_base_url: String,
    /// NCBI E-utilities base (esearch.fcgi / esummary.fcgi live below it)
    pub eutils_base_url: String,
    /// Maximum PMIDs requested from esearch
    pub pubmed_retmax: u32,
    /// Pause before each Crossref lookup
    pub crossref_delay: Duration,
    /// Pause between esearch and esummary (3 req/s without an API key)
    pub pubmed_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orcid_base_url: "https://pub.orcid.org/v3.0".to_string(),
            crossref_base_url: "https://api.crossref.org".to_string(),
            eutils_base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            pubmed_retmax: 200,
            crossref_delay: Duration::from_millis(200),
            pubmed_delay: Duration::from_millis(400),
        }
    }
}
