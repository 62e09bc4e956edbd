//! NCBI E-utilities: PubMed search and document summaries

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use vitae_core::{FetchError, get_json};

use crate::normalize::{non_empty, normalize_doi, year_from_date};

/// One PubMed document summary
#[derive(Debug, Clone, PartialEq)]
pub struct PubmedArticle {
    pub pmid: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub date: Option<String>,
    pub doi: Option<String>,
}

// === esearch ===

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    esearchresult: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Option<Vec<String>>,
}

impl SearchResponse {
    pub(crate) fn ids(self) -> Vec<String> {
        self.esearchresult
            .and_then(|r| r.idlist)
            .unwrap_or_default()
    }
}

// === esummary ===

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    /// PMID -> record, plus a `uids` list we don't need
    #[serde(default)]
    result: Option<FxHashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct SummaryRecord {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<SummaryAuthor>>,
    #[serde(default)]
    fulljournalname: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    pubdate: Option<String>,
    #[serde(default)]
    articleids: Option<Vec<ArticleId>>,
}

#[derive(Debug, Deserialize)]
struct SummaryAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleId {
    #[serde(default)]
    idtype: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl SummaryRecord {
    fn into_article(self, pmid: &str) -> PubmedArticle {
        let date = non_empty(self.pubdate.as_deref());
        let doi = self
            .articleids
            .unwrap_or_default()
            .into_iter()
            .find(|id| id.idtype.as_deref() == Some("doi"))
            .and_then(|id| id.value.as_deref().and_then(normalize_doi));

        PubmedArticle {
            pmid: pmid.to_string(),
            title: self.title.unwrap_or_default().trim().to_string(),
            authors: self
                .authors
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.name.unwrap_or_default())
                .collect(),
            journal: non_empty(self.fulljournalname.as_deref())
                .or_else(|| non_empty(self.source.as_deref())),
            year: date.as_deref().and_then(year_from_date),
            date,
            doi,
        }
    }
}

/// Articles for `ids` in search order, skipping missing and errored entries.
pub(crate) fn articles_from_summary(response: SummaryResponse, ids: &[String]) -> Vec<PubmedArticle> {
    let Some(mut result) = response.result else {
        return Vec::new();
    };
    ids.iter()
        .filter_map(|pmid| {
            let value = result.remove(pmid)?;
            let record: SummaryRecord = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(e) => {
                    log::debug!("PubMed {pmid}: unreadable summary: {e}");
                    return None;
                }
            };
            if record.error.is_some() {
                log::debug!("PubMed {pmid}: summary reports an error, skipped");
                return None;
            }
            Some(record.into_article(pmid))
        })
        .collect()
}

/// esearch for `term`, pause, then esummary for the hits.
pub fn fetch_articles(
    eutils_base_url: &str,
    term: &str,
    retmax: u32,
    delay: Duration,
) -> Result<Vec<PubmedArticle>, FetchError> {
    let base = eutils_base_url.trim_end_matches('/');

    let search: SearchResponse = get_json(
        "PubMed esearch",
        &format!("{base}/esearch.fcgi"),
        &[
            ("db", "pubmed".to_string()),
            ("term", term.to_string()),
            ("retmax", retmax.to_string()),
            ("retmode", "json".to_string()),
        ],
    )?;
    let ids = search.ids();
    if ids.is_empty() {
        log::info!("No PubMed results for {term}");
        return Ok(Vec::new());
    }
    log::debug!("PubMed esearch: {} PMIDs", ids.len());

    std::thread::sleep(delay);

    let summary: SummaryResponse = get_json(
        "PubMed esummary",
        &format!("{base}/esummary.fcgi"),
        &[
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "json".to_string()),
        ],
    )?;
    Ok(articles_from_summary(summary, &ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"{
      "header": {"type": "esearch", "version": "0.3"},
      "esearchresult": {"count": "3", "retmax": "3", "idlist": ["37000001", "37000002", "37000003", "37000004"]}
    }"#;

    const SUMMARY: &str = r#"{
      "header": {"type": "esummary"},
      "result": {
        "uids": ["37000001", "37000002", "37000003"],
        "37000001": {
          "uid": "37000001",
          "pubdate": "2023 Mar 15",
          "source": "Farm Hosp",
          "fulljournalname": "Farmacia hospitalaria",
          "authors": [{"name": "Mercadal-Orfila G", "authtype": "Author"}, {"name": "Smith J"}],
          "title": "Pharmacogenomics in hospital practice.",
          "articleids": [
            {"idtype": "pubmed", "value": "37000001"},
            {"idtype": "doi", "value": "10.1000/ABC.123"}
          ]
        },
        "37000002": {"uid": "37000002", "error": "cannot get document summary"},
        "37000003": {
          "uid": "37000003",
          "pubdate": "Spring 2020",
          "source": "Rev Esp",
          "fulljournalname": "",
          "authors": [],
          "title": "Older work"
        }
      }
    }"#;

    #[test]
    fn search_ids() {
        let response: SearchResponse = serde_json::from_str(SEARCH).unwrap();
        assert_eq!(response.ids().len(), 4);
        let empty: SearchResponse = serde_json::from_str(r#"{"esearchresult": {}}"#).unwrap();
        assert!(empty.ids().is_empty());
    }

    #[test]
    fn summaries_in_search_order() {
        let search: SearchResponse = serde_json::from_str(SEARCH).unwrap();
        let ids = search.ids();
        let summary: SummaryResponse = serde_json::from_str(SUMMARY).unwrap();
        let articles = articles_from_summary(summary, &ids);

        // errored and missing ids dropped
        assert_eq!(articles.len(), 2);

        let a = &articles[0];
        assert_eq!(a.pmid, "37000001");
        assert_eq!(a.title, "Pharmacogenomics in hospital practice.");
        assert_eq!(a.authors, ["Mercadal-Orfila G", "Smith J"]);
        assert_eq!(a.journal.as_deref(), Some("Farmacia hospitalaria"));
        assert_eq!(a.doi.as_deref(), Some("10.1000/abc.123"));
        assert_eq!(a.date.as_deref(), Some("2023 Mar 15"));
        assert_eq!(a.year, Some(2023));

        let b = &articles[1];
        assert_eq!(b.journal.as_deref(), Some("Rev Esp"));
        assert_eq!(b.year, None);
        assert_eq!(b.doi, None);
        assert!(b.authors.is_empty());
    }

    #[test]
    fn missing_result_is_empty() {
        let summary: SummaryResponse = serde_json::from_str("{}").unwrap();
        assert!(articles_from_summary(summary, &["1".to_string()]).is_empty());
    }

    #[test]
    #[ignore] // network
    fn search_live() {
        let articles = fetch_articles(
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils",
            "Curie M[Author]",
            5,
            Duration::from_millis(400),
        )
        .unwrap();
        assert!(articles.len() <= 5);
    }
}
