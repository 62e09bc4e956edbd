//! Main runner for the mentions pipeline

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, Utc};
use indicatif::ProgressBar;
use rustc_hash::{FxHashMap, FxHashSet};
use vitae_core::{FetchError, Identity, ProgressContext, write_snapshot};

use crate::config::Config;
use crate::gdelt::{self, GdeltArticle};
use crate::schema::{Mention, MentionsData, compare_mentions};
use crate::scoring::Scorer;

const ID_LEN: usize = 24;

/// News search backend.
pub trait NewsSearch {
    fn search(&mut self, query: &str) -> Result<Vec<GdeltArticle>, FetchError>;
}

/// GDELT over HTTP, pausing between queries.
pub struct GdeltSearch<'a> {
    config: &'a Config,
    queried: bool,
}

impl<'a> GdeltSearch<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            queried: false,
        }
    }
}

impl NewsSearch for GdeltSearch<'_> {
    fn search(&mut self, query: &str) -> Result<Vec<GdeltArticle>, FetchError> {
        if self.queried {
            std::thread::sleep(self.config.query_delay);
        }
        self.queried = true;
        gdelt::search(&self.config.gdelt_base_url, query, self.config.max_records)
    }
}

/// Why a run left the snapshot alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreserveReason {
    AllQueriesFailed,
    NoArticles,
}

impl std::fmt::Display for PreserveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllQueriesFailed => f.write_str("every query failed"),
            Self::NoArticles => f.write_str("no articles returned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Keep the previous snapshot as it is
    Preserved(PreserveReason),
    /// Merged dataset to write
    Updated(MentionsData),
}

/// Pipeline execution summary
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub queries: usize,
    pub failed_queries: usize,
    /// Unique articles across all queries
    pub articles: usize,
    pub kept: usize,
    pub below_threshold: usize,
    pub previous: usize,
    /// Mentions in the merged dataset
    pub total: usize,
    pub elapsed: Duration,
}

/// Explicit queries, or the derived set: quoted surname, quoted name
/// variants, quoted affiliations, then the surname next to each location.
pub fn derive_queries(identity: &Identity) -> Vec<String> {
    let signals = &identity.mentions;
    let explicit: Vec<String> = signals
        .queries
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if !explicit.is_empty() {
        return explicit;
    }

    let mut queries = Vec::new();
    let surname = match signals.surname.trim() {
        "" => identity.full_name.trim(),
        s => s,
    };
    if !surname.is_empty() {
        queries.push(format!("\"{surname}\""));
    }
    for variant in &identity.name_variants {
        let query = format!("\"{}\"", variant.trim());
        if variant.trim().is_empty() || queries.contains(&query) {
            continue;
        }
        queries.push(query);
    }
    for affiliation in &identity.affiliations {
        let affiliation = affiliation.trim();
        if !affiliation.is_empty() {
            queries.push(format!("\"{affiliation}\""));
        }
    }
    if !surname.is_empty() {
        for location in &signals.location.patterns {
            let location = location.trim();
            if !location.is_empty() {
                queries.push(format!("\"{surname}\" {location}"));
            }
        }
    }
    queries
}

/// `20240115T120000Z` -> `2024-01-15`
pub fn parse_seendate(seendate: &str) -> Option<String> {
    let day = seendate.get(..8)?;
    NaiveDate::parse_from_str(day, "%Y%m%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Leading characters of the standard base64 form of the URL.
pub fn mention_id(url: &str) -> String {
    STANDARD.encode(url).chars().take(ID_LEN).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn to_mention(article: GdeltArticle, score: i32, signals: Vec<String>) -> Mention {
    Mention {
        id: mention_id(&article.url),
        date: parse_seendate(&article.seendate),
        source: article.domain.clone(),
        domain: article.domain,
        title: article.title,
        url: article.url,
        language: non_empty(article.language),
        snippet: None,
        score,
        signals_activated: signals,
        image_url: non_empty(article.socialimage),
    }
}

/// Run every query once, deduplicating by URL in first-seen order.
/// Returns the articles and how many queries failed.
fn collect<S: NewsSearch + ?Sized>(
    search: &mut S,
    queries: &[String],
    pb: &ProgressBar,
) -> (Vec<GdeltArticle>, usize) {
    let mut seen = FxHashSet::default();
    let mut articles = Vec::new();
    let mut failed = 0;

    for (i, query) in queries.iter().enumerate() {
        pb.set_message(format!("{}/{}: {query}", i + 1, queries.len()));
        match search.search(query) {
            Ok(results) => {
                log::info!("GDELT {query}: {} results", results.len());
                for article in results {
                    if seen.insert(article.url.clone()) {
                        articles.push(article);
                    }
                }
            }
            Err(e) => {
                log::warn!("GDELT query {query} failed: {e}");
                failed += 1;
            }
        }
    }
    (articles, failed)
}

/// Search, score and merge with `previous`.
pub fn build<S: NewsSearch + ?Sized>(
    search: &mut S,
    identity: &Identity,
    previous: Option<&MentionsData>,
    now: DateTime<Utc>,
    pb: &ProgressBar,
) -> Result<(Outcome, Summary)> {
    let scorer = Scorer::new(identity)?;
    let queries = derive_queries(identity);
    if queries.is_empty() {
        anyhow::bail!("no mention queries: set identity.mentions.queries or a surname");
    }

    let mut summary = Summary {
        queries: queries.len(),
        previous: previous.map_or(0, |p| p.mentions.len()),
        ..Summary::default()
    };

    let (articles, failed) = collect(search, &queries, pb);
    summary.failed_queries = failed;
    summary.articles = articles.len();

    if failed == queries.len() {
        return Ok((Outcome::Preserved(PreserveReason::AllQueriesFailed), summary));
    }
    if articles.is_empty() {
        return Ok((Outcome::Preserved(PreserveReason::NoArticles), summary));
    }

    let threshold = scorer.threshold();
    let mut merged: FxHashMap<String, Mention> = previous
        .map(|p| {
            p.mentions
                .iter()
                .map(|m| (m.url.clone(), m.clone()))
                .collect()
        })
        .unwrap_or_default();

    for article in articles {
        let score = scorer.score(&article.title, &article.url, &article.domain);
        if score.value < threshold {
            log::debug!("{} scored {} {:?}", article.url, score.value, score.signals);
            summary.below_threshold += 1;
            continue;
        }
        summary.kept += 1;
        let mention = to_mention(article, score.value, score.signals);
        merged.insert(mention.url.clone(), mention);
    }

    let mut mentions: Vec<Mention> = merged.into_values().collect();
    mentions.sort_by(compare_mentions);
    summary.total = mentions.len();

    let data = MentionsData {
        last_updated: now,
        count: mentions.len(),
        score_threshold: threshold,
        mentions,
    };
    Ok((Outcome::Updated(data), summary))
}

/// Run the mentions pipeline against GDELT.
///
/// `previous` is the last written snapshot, if any.
pub fn run(
    config: &Config,
    identity: &Identity,
    previous: Option<&MentionsData>,
    progress: &ProgressContext,
) -> Result<(Outcome, Summary)> {
    let start = Instant::now();
    let mut search = GdeltSearch::new(config);

    let pb = progress.stage_line("mentions");
    let result = build(&mut search, identity, previous, Utc::now(), &pb);
    pb.finish_and_clear();
    let (outcome, mut summary) = result?;
    summary.elapsed = start.elapsed();

    log::info!("=== Mentions Summary ===");
    log::info!(
        "Queries: {} ({} failed), {} unique articles",
        summary.queries,
        summary.failed_queries,
        summary.articles
    );
    match &outcome {
        Outcome::Preserved(reason) => {
            log::warn!("Keeping previous mentions: {reason}");
        }
        Outcome::Updated(data) => {
            log::info!(
                "Kept {} (score >= {}), dropped {}",
                summary.kept,
                data.score_threshold,
                summary.below_threshold
            );
            log::info!("Mentions: {} ({} before)", summary.total, summary.previous);
        }
    }
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok((outcome, summary))
}

/// Write the snapshot for an updated outcome. Returns whether it wrote.
pub fn persist(path: &Path, outcome: &Outcome) -> Result<bool> {
    match outcome {
        Outcome::Preserved(_) => Ok(false),
        Outcome::Updated(data) => {
            write_snapshot(path, data)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use vitae_core::MentionSignals;

    use super::*;

    #[test]
    fn seendate_to_iso_day() {
        assert_eq!(
            parse_seendate("20240115T120000Z").as_deref(),
            Some("2024-01-15")
        );
        assert_eq!(parse_seendate("20241301T000000Z"), None);
        assert_eq!(parse_seendate("2024"), None);
        assert_eq!(parse_seendate(""), None);
    }

    #[test]
    fn id_is_base64_prefix() {
        let url = "https://www.menorca.info/news/hospital-pharmacy.html";
        let id = mention_id(url);
        assert_eq!(id.len(), 24);
        assert_eq!(id, "aHR0cHM6Ly93d3cubWVub3Jj");
        assert_eq!(mention_id("https://a"), "aHR0cHM6Ly9h");
    }

    #[test]
    fn derived_queries() {
        let identity = Identity {
            affiliations: vec!["Hospital Mateu Orfila".into()],
            mentions: MentionSignals {
                surname: "Mercadal-Orfila".into(),
                location: vitae_core::LocationSignal {
                    patterns: vec!["Menorca".into()],
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            derive_queries(&identity),
            [
                "\"Mercadal-Orfila\"",
                "\"Hospital Mateu Orfila\"",
                "\"Mercadal-Orfila\" Menorca"
            ]
        );
    }

    #[test]
    fn name_variants_are_queried() {
        let identity = Identity {
            full_name: "Gabriel Mercadal-Orfila".into(),
            name_variants: vec![
                "G. Mercadal-Orfila".into(),
                "Mercadal-Orfila".into(),
                " ".into(),
            ],
            mentions: MentionSignals {
                surname: "Mercadal-Orfila".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            derive_queries(&identity),
            ["\"Mercadal-Orfila\"", "\"G. Mercadal-Orfila\""]
        );
    }

    #[test]
    fn explicit_queries_win() {
        let identity = Identity {
            mentions: MentionSignals {
                surname: "Doe".into(),
                queries: vec!["\"Doe\" pharmacy".into(), "  ".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(derive_queries(&identity), ["\"Doe\" pharmacy"]);
    }

    #[test]
    fn empty_fields_become_null() {
        let m = to_mention(
            GdeltArticle {
                url: "https://x".into(),
                title: "T".into(),
                seendate: "garbage".into(),
                domain: "x".into(),
                language: Some(String::new()),
                socialimage: Some(String::new()),
                sourcecountry: None,
            },
            5,
            vec!["a".into()],
        );
        assert_eq!(m.date, None);
        assert_eq!(m.language, None);
        assert_eq!(m.image_url, None);
        assert_eq!(m.source, "x");
        assert_eq!(m.snippet, None);
    }
}
