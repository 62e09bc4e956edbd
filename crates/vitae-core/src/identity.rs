//! Identity of the researcher the pipelines collect data for.
//!
//! Lives under `[identity]` in `vitae.toml`. Every field has a default so a
//! partial file still loads; the pipelines check what they actually need.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub full_name: String,
    /// Public ORCID iD, e.g. `0000-0002-1825-0097`
    pub orcid: String,
    pub name_variants: Vec<String>,
    /// Institutions as they appear in news text
    pub affiliations: Vec<String>,
    /// Research themes, matched against news text
    pub keywords: Vec<String>,
    pub pubmed: PubmedQuery,
    pub mentions: MentionSignals,
}

/// Query fragments combined into one E-utilities search term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PubmedQuery {
    /// e.g. `Mercadal-Orfila G[Author]`
    pub author_query: String,
    /// e.g. `Menorca[Affiliation]`
    pub affiliation_query: String,
}

impl PubmedQuery {
    /// `<author> AND <affiliation>`, or whichever half is configured.
    pub fn term(&self) -> Option<String> {
        let author = self.author_query.trim();
        let affiliation = self.affiliation_query.trim();
        match (author.is_empty(), affiliation.is_empty()) {
            (true, true) => None,
            (false, true) => Some(author.to_string()),
            (true, false) => Some(affiliation.to_string()),
            (false, false) => Some(format!("{author} AND {affiliation}")),
        }
    }
}

/// Signal weights and patterns for scoring news mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionSignals {
    /// Minimum score for an article to be kept
    pub score_threshold: i32,
    /// Explicit search strings; derived from the identity when empty
    pub queries: Vec<String>,
    /// Surname as written in queries, e.g. `Mercadal-Orfila`
    pub surname: String,
    /// Case-insensitive regex for the surname; derived from `surname` when empty
    pub surname_pattern: String,
    pub given_names: Vec<String>,
    pub initials: Vec<String>,
    pub affiliations: Vec<AffiliationSignal>,
    pub location: LocationSignal,
    pub coauthors: Vec<String>,
    pub full_name_weight: i32,
    pub coauthor_weight: i32,
    pub keyword_weight: i32,
    /// Negative: surname seen with nothing corroborating it
    pub surname_only_penalty: i32,
}

impl Default for MentionSignals {
    fn default() -> Self {
        Self {
            score_threshold: 4,
            queries: Vec::new(),
            surname: String::new(),
            surname_pattern: String::new(),
            given_names: Vec::new(),
            initials: Vec::new(),
            affiliations: Vec::new(),
            location: LocationSignal::default(),
            coauthors: Vec::new(),
            full_name_weight: 4,
            coauthor_weight: 2,
            keyword_weight: 1,
            surname_only_penalty: -5,
        }
    }
}

/// One institution: fires when any of its patterns appears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliationSignal {
    /// Name recorded in `signalsActivated`
    pub signal: String,
    #[serde(default = "default_affiliation_weight")]
    pub weight: i32,
    pub patterns: Vec<String>,
}

fn default_affiliation_weight() -> i32 {
    4
}

/// Location term co-occurring with a domain-context term.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSignal {
    pub weight: i32,
    pub patterns: Vec<String>,
    pub context_patterns: Vec<String>,
}

impl Default for LocationSignal {
    fn default() -> Self {
        Self {
            weight: 3,
            patterns: Vec::new(),
            context_patterns: Vec::new(),
        }
    }
}
