//! Publications snapshot schema
//!
//! Field names match what the website reads from `publications.json`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Adapter that contributed to a publication.
///
/// Declaration order is the serialization order inside `sources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Orcid,
    Crossref,
    Pubmed,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orcid => "orcid",
            Self::Crossref => "crossref",
            Self::Pubmed => "pubmed",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One canonical publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    /// `doi:<doi>`, `pmid:<pmid>` or `hash:<hex>`
    pub id: String,
    pub title: String,
    /// "Family I" display names, in author order
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub date: Option<String>,
    pub journal: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub orcid_put_code: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub url: Option<String>,
    pub sources: BTreeSet<Source>,
}

/// Year descending (unknown counts as 0), then title ascending.
pub fn compare_publications(a: &Publication, b: &Publication) -> Ordering {
    b.year
        .unwrap_or(0)
        .cmp(&a.year.unwrap_or(0))
        .then_with(|| a.title.cmp(&b.title))
}

/// Key used in `yearIndex`
pub fn year_key(year: Option<i32>) -> String {
    year.map_or_else(|| "unknown".to_string(), |y| y.to_string())
}

/// Contents of `publications.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationsData {
    pub last_updated: DateTime<Utc>,
    pub count: usize,
    pub publications: Vec<Publication>,
    /// Year (or `unknown`) -> positions in `publications`
    pub year_index: BTreeMap<String, Vec<usize>>,
}

impl PublicationsData {
    /// Sort the publications and build the year index.
    pub fn new(mut publications: Vec<Publication>, last_updated: DateTime<Utc>) -> Self {
        publications.sort_by(compare_publications);

        let mut year_index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, publication) in publications.iter().enumerate() {
            year_index
                .entry(year_key(publication.year))
                .or_default()
                .push(i);
        }

        Self {
            last_updated,
            count: publications.len(),
            publications,
            year_index,
        }
    }
}
