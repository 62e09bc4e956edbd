//! GDELT DOC 2.0 article search

use serde::Deserialize;
use vitae_core::{FetchError, get_json};

/// One row of an `ArtList` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GdeltArticle {
    pub url: String,
    pub title: String,
    /// e.g. `20240115T120000Z`
    pub seendate: String,
    pub domain: String,
    pub language: Option<String>,
    pub socialimage: Option<String>,
    pub sourcecountry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ArtListResponse {
    /// Absent when nothing matched
    #[serde(default)]
    articles: Option<Vec<GdeltArticle>>,
}

impl ArtListResponse {
    pub(crate) fn into_articles(self) -> Vec<GdeltArticle> {
        self.articles
            .unwrap_or_default()
            .into_iter()
            .filter(|a| !a.url.is_empty())
            .collect()
    }
}

/// Request parameters for one query, newest first.
pub fn query_params(query: &str, max_records: u32) -> Vec<(&'static str, String)> {
    vec![
        ("query", query.to_string()),
        ("mode", "ArtList".to_string()),
        ("maxrecords", max_records.to_string()),
        ("format", "json".to_string()),
        ("sort", "DateDesc".to_string()),
    ]
}

/// Run one query against the DOC API.
pub fn search(base_url: &str, query: &str, max_records: u32) -> Result<Vec<GdeltArticle>, FetchError> {
    let response: ArtListResponse =
        get_json("GDELT search", base_url, &query_params(query, max_records))?;
    Ok(response.into_articles())
}
