//! Mentions runs over a scripted search backend.

use chrono::{TimeZone, Utc};
use indicatif::ProgressBar;
use vitae_core::{
    AffiliationSignal, FetchError, Identity, LocationSignal, MentionSignals, read_snapshot,
    write_snapshot,
};
use vitae_mentions::{
    GdeltArticle, MentionsData, NewsSearch, Outcome, PreserveReason, build, persist,
};

/// Answers queries in order; `None` entries fail.
struct Scripted {
    answers: Vec<Option<Vec<GdeltArticle>>>,
    asked: Vec<String>,
}

impl Scripted {
    fn new(answers: Vec<Option<Vec<GdeltArticle>>>) -> Self {
        Self {
            answers,
            asked: Vec::new(),
        }
    }
}

impl NewsSearch for Scripted {
    fn search(&mut self, query: &str) -> Result<Vec<GdeltArticle>, FetchError> {
        let answer = self.answers.get(self.asked.len()).cloned().flatten();
        self.asked.push(query.to_string());
        answer.ok_or(FetchError::Http {
            status: Some(429),
            message: "rate limited".into(),
        })
    }
}

fn identity() -> Identity {
    Identity {
        keywords: vec!["pharmacy".into()],
        mentions: MentionSignals {
            score_threshold: 4,
            queries: vec!["\"Doe-Smith\"".into(), "\"General Hospital\"".into()],
            surname: "Doe-Smith".into(),
            initials: vec!["j".into()],
            affiliations: vec![AffiliationSignal {
                signal: "affiliationHospital".into(),
                weight: 4,
                patterns: vec!["general hospital".into()],
            }],
            location: LocationSignal {
                weight: 3,
                patterns: vec!["springfield".into()],
                context_patterns: vec!["clinic".into()],
            },
            ..MentionSignals::default()
        },
        ..Identity::default()
    }
}

fn article(url: &str, title: &str, seendate: &str) -> GdeltArticle {
    GdeltArticle {
        url: url.into(),
        title: title.into(),
        seendate: seendate.into(),
        domain: "news.example".into(),
        language: Some("English".into()),
        socialimage: None,
        sourcecountry: None,
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn updated(outcome: Outcome) -> MentionsData {
    match outcome {
        Outcome::Updated(data) => data,
        Outcome::Preserved(reason) => panic!("expected update, preserved: {reason}"),
    }
}

#[test]
fn threshold_is_inclusive() {
    let mut search = Scripted::new(vec![
        Some(vec![
            // location + context = 3, pharmacy keyword = 1 -> exactly 4
            article("https://a", "Springfield clinic pharmacy", "20240110T000000Z"),
            // location + context only = 3
            article("https://b", "Springfield clinic opens", "20240111T000000Z"),
        ]),
        Some(Vec::new()),
    ]);
    let (outcome, summary) =
        build(&mut search, &identity(), None, now(), &ProgressBar::hidden()).unwrap();
    let data = updated(outcome);

    let urls: Vec<_> = data.mentions.iter().map(|m| m.url.as_str()).collect();
    assert_eq!(urls, ["https://a"]);
    assert_eq!(data.mentions[0].score, 4);
    assert_eq!(
        data.mentions[0].signals_activated,
        ["locationScientific", "keywords:pharmacy"]
    );
    assert_eq!(summary.below_threshold, 1);
    assert_eq!(data.score_threshold, 4);
}

#[test]
fn duplicates_across_queries_keep_first() {
    let mut search = Scripted::new(vec![
        Some(vec![article(
            "https://same",
            "General Hospital first copy",
            "20240101T000000Z",
        )]),
        Some(vec![article(
            "https://same",
            "General Hospital second copy",
            "20240102T000000Z",
        )]),
    ]);
    let (outcome, summary) =
        build(&mut search, &identity(), None, now(), &ProgressBar::hidden()).unwrap();
    let data = updated(outcome);
    assert_eq!(summary.articles, 1);
    assert_eq!(data.count, 1);
    assert_eq!(data.mentions[0].title, "General Hospital first copy");
    assert_eq!(search.asked, ["\"Doe-Smith\"", "\"General Hospital\""]);
}

#[test]
fn one_failed_query_is_skipped() {
    let mut search = Scripted::new(vec![
        None,
        Some(vec![article(
            "https://h",
            "General Hospital news",
            "20240301T000000Z",
        )]),
    ]);
    let (outcome, summary) =
        build(&mut search, &identity(), None, now(), &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.failed_queries, 1);
    assert_eq!(updated(outcome).count, 1);
}

#[test]
fn merges_with_previous_snapshot() {
    let previous = MentionsData {
        last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        count: 2,
        score_threshold: 4,
        mentions: updated(
            build(
                &mut Scripted::new(vec![
                    Some(vec![
                        article("https://old", "General Hospital old story", "20230501T000000Z"),
                        article("https://again", "General Hospital draft", "20230601T000000Z"),
                    ]),
                    None,
                ]),
                &identity(),
                None,
                now(),
                &ProgressBar::hidden(),
            )
            .unwrap()
            .0,
        )
        .mentions,
    };

    let mut search = Scripted::new(vec![
        Some(vec![
            article("https://again", "General Hospital final", "20240201T000000Z"),
            article("https://undated", "General Hospital clinic", ""),
        ]),
        Some(Vec::new()),
    ]);
    let (outcome, summary) = build(
        &mut search,
        &identity(),
        Some(&previous),
        now(),
        &ProgressBar::hidden(),
    )
    .unwrap();
    let data = updated(outcome);

    assert_eq!(summary.previous, 2);
    assert_eq!(data.last_updated, now());
    let urls: Vec<_> = data.mentions.iter().map(|m| m.url.as_str()).collect();
    assert_eq!(urls, ["https://again", "https://old", "https://undated"]);
    // new record replaced the old one
    assert_eq!(data.mentions[0].title, "General Hospital final");
    assert_eq!(data.mentions[0].date.as_deref(), Some("2024-02-01"));
    assert_eq!(data.count, 3);
}

#[test]
fn every_query_failing_preserves_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mentions.json");

    let mut first = Scripted::new(vec![Some(vec![article(
        "https://keep",
        "General Hospital",
        "20240101T000000Z",
    )])]);
    let (outcome, _) =
        build(&mut first, &identity(), None, now(), &ProgressBar::hidden()).unwrap();
    assert!(persist(&path, &outcome).unwrap());
    let before = std::fs::read(&path).unwrap();

    let previous: Option<MentionsData> = read_snapshot(&path).unwrap();
    let mut down = Scripted::new(vec![None, None]);
    let (outcome, summary) = build(
        &mut down,
        &identity(),
        previous.as_ref(),
        now(),
        &ProgressBar::hidden(),
    )
    .unwrap();

    assert_eq!(outcome, Outcome::Preserved(PreserveReason::AllQueriesFailed));
    assert_eq!(summary.failed_queries, 2);
    assert!(!persist(&path, &outcome).unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn no_articles_preserves_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mentions.json");
    write_snapshot(
        &path,
        &MentionsData {
            last_updated: now(),
            count: 0,
            score_threshold: 4,
            mentions: Vec::new(),
        },
    )
    .unwrap();
    let before = std::fs::read(&path).unwrap();

    let mut empty = Scripted::new(vec![Some(Vec::new()), Some(Vec::new())]);
    let (outcome, _) =
        build(&mut empty, &identity(), None, now(), &ProgressBar::hidden()).unwrap();
    assert_eq!(outcome, Outcome::Preserved(PreserveReason::NoArticles));
    assert!(!persist(&path, &outcome).unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn snapshot_shape() {
    let mut search = Scripted::new(vec![Some(vec![article(
        "https://s",
        "General Hospital",
        "20240101T000000Z",
    )])]);
    let (outcome, _) =
        build(&mut search, &identity(), None, now(), &ProgressBar::hidden()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mentions.json");
    persist(&path, &outcome).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["scoreThreshold"], 4);
    assert_eq!(json["lastUpdated"], "2024-06-01T12:00:00Z");
    let m = &json["mentions"][0];
    assert_eq!(m["source"], "news.example");
    assert_eq!(m["date"], "2024-01-01");
    assert!(m["snippet"].is_null());
    assert!(m["imageUrl"].is_null());
    assert_eq!(m["signalsActivated"][0], "affiliationHospital");
}
