//! Mentions snapshot schema

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One news article that passed the score threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    /// First 24 characters of the base64-encoded URL
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub domain: String,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub language: Option<String>,
    /// Always null for now
    pub snippet: Option<String>,
    pub score: i32,
    pub signals_activated: Vec<String>,
    pub image_url: Option<String>,
}

/// Newest first, undated last; then higher score, then URL.
pub fn compare_mentions(a: &Mention, b: &Mention) -> Ordering {
    let by_date = match (&a.date, &b.date) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.url.cmp(&b.url))
}

/// Contents of `mentions.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionsData {
    pub last_updated: DateTime<Utc>,
    pub count: usize,
    pub score_threshold: i32,
    pub mentions: Vec<Mention>,
}
