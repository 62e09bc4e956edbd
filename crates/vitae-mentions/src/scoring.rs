//! Identity scoring for news articles
//!
//! An article's text is `"<title> <url> <domain>"`, lower-cased. Each
//! configured signal that fires adds its weight and its name. A bare
//! surname hit with nothing else around it is penalized.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use vitae_core::{Identity, MentionSignals};

pub const FULL_NAME_SIGNAL: &str = "fullNameWithInitial";
pub const LOCATION_SIGNAL: &str = "locationScientific";
pub const SURNAME_ONLY_SIGNAL: &str = "surnameOnlyPenalty";

/// Result of scoring one article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    pub value: i32,
    pub signals: Vec<String>,
}

impl Score {
    fn add(&mut self, weight: i32, signal: impl Into<String>) {
        self.value += weight;
        self.signals.push(signal.into());
    }
}

struct Affiliation {
    signal: String,
    weight: i32,
    patterns: Vec<String>,
}

/// Compiled identity signals.
pub struct Scorer {
    signals: MentionSignals,
    surname: Option<Regex>,
    initials: Vec<Regex>,
    given_names: Vec<String>,
    affiliations: Vec<Affiliation>,
    locations: Vec<String>,
    contexts: Vec<String>,
    /// (as configured, lower-cased)
    coauthors: Vec<(String, String)>,
    keywords: Vec<(String, String)>,
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn paired(items: &[String]) -> Vec<(String, String)> {
    items
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| (s.clone(), s.trim().to_lowercase()))
        .collect()
}

fn contains_any(text: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| text.contains(p.as_str()))
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("invalid pattern {pattern:?}"))
}

/// `Doe-Smith` -> `doe[- ]smith`: hyphen and space are interchangeable.
pub fn surname_regex(surname: &str) -> String {
    surname
        .trim()
        .to_lowercase()
        .split(['-', ' '])
        .filter(|part| !part.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[- ]")
}

impl Scorer {
    pub fn new(identity: &Identity) -> Result<Self> {
        let signals = identity.mentions.clone();

        let surname_pattern = if signals.surname_pattern.trim().is_empty() {
            surname_regex(&signals.surname)
        } else {
            signals.surname_pattern.clone()
        };
        let surname = if surname_pattern.is_empty() {
            None
        } else {
            Some(case_insensitive(&surname_pattern).context("mentions.surname_pattern")?)
        };

        let initials = lowered(&signals.initials)
            .iter()
            .map(|i| case_insensitive(&format!(r"\b{}\.?\s", regex::escape(i))))
            .collect::<Result<Vec<_>>>()
            .context("mentions.initials")?;

        let affiliations = signals
            .affiliations
            .iter()
            .map(|a| Affiliation {
                signal: a.signal.clone(),
                weight: a.weight,
                patterns: lowered(&a.patterns),
            })
            .collect();

        Ok(Self {
            surname,
            initials,
            given_names: lowered(&signals.given_names),
            affiliations,
            locations: lowered(&signals.location.patterns),
            contexts: lowered(&signals.location.context_patterns),
            coauthors: paired(&signals.coauthors),
            keywords: paired(&identity.keywords),
            signals,
        })
    }

    pub fn threshold(&self) -> i32 {
        self.signals.score_threshold
    }

    pub fn score(&self, title: &str, url: &str, domain: &str) -> Score {
        let text = format!("{title} {url} {domain}").to_lowercase();
        let mut score = Score::default();

        for affiliation in &self.affiliations {
            if contains_any(&text, &affiliation.patterns) {
                score.add(affiliation.weight, affiliation.signal.as_str());
            }
        }

        let surname_hit = self.surname.as_ref().is_some_and(|re| re.is_match(&text));
        let initial_hit = self.initials.iter().any(|re| re.is_match(&text));
        if surname_hit && (initial_hit || contains_any(&text, &self.given_names)) {
            score.add(self.signals.full_name_weight, FULL_NAME_SIGNAL);
        }

        let has_context = contains_any(&text, &self.contexts);
        if has_context && contains_any(&text, &self.locations) {
            score.add(self.signals.location.weight, LOCATION_SIGNAL);
        }

        if let Some((name, _)) = self
            .coauthors
            .iter()
            .find(|(_, lower)| text.contains(lower.as_str()))
        {
            score.add(self.signals.coauthor_weight, format!("coauthor:{name}"));
        }

        let matched: Vec<&str> = self
            .keywords
            .iter()
            .filter(|(_, lower)| text.contains(lower.as_str()))
            .map(|(kw, _)| kw.as_str())
            .collect();
        if !matched.is_empty() {
            score.add(
                self.signals.keyword_weight,
                format!("keywords:{}", matched.join(",")),
            );
        }

        if surname_hit && !has_context && score.signals.is_empty() {
            score.add(self.signals.surname_only_penalty, SURNAME_ONLY_SIGNAL);
        }

        score
    }
}
