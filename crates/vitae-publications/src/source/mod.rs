//! Remote bibliographic sources
//!
//! Each adapter decodes its API's JSON into typed serde structs and reduces
//! them to one record type. [`SourceRecord`] unifies the three so every
//! record goes through the same conversion into a candidate [`Publication`].

pub mod crossref;
pub mod orcid;
pub mod pubmed;

use std::collections::BTreeSet;

use serde::Deserialize;

pub use crossref::CrossrefWork;
pub use orcid::OrcidWork;
pub use pubmed::PubmedArticle;

use crate::normalize::{content_key, hash_id};
use crate::schema::{Publication, Source};

/// Record produced by one of the adapters
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Orcid(OrcidWork),
    Crossref(CrossrefWork),
    Pubmed(PubmedArticle),
}

impl SourceRecord {
    pub fn source(&self) -> Source {
        match self {
            Self::Orcid(_) => Source::Orcid,
            Self::Crossref(_) => Source::Crossref,
            Self::Pubmed(_) => Source::Pubmed,
        }
    }

    /// Candidate publication carrying only what this record knows.
    pub fn into_publication(self) -> Publication {
        let source = self.source();
        let mut publication = match self {
            Self::Orcid(work) => Publication {
                id: String::new(),
                title: work.title,
                authors: Vec::new(),
                year: work.year,
                date: None,
                journal: None,
                kind: work.kind,
                doi: work.doi,
                pmid: None,
                orcid_put_code: work.put_code,
                abstract_text: None,
                url: work.url,
                sources: BTreeSet::new(),
            },
            Self::Crossref(work) => Publication {
                id: String::new(),
                title: work.title.unwrap_or_default(),
                authors: work.authors,
                year: work.year,
                date: work.date,
                journal: work.journal,
                kind: work.kind,
                doi: Some(work.doi),
                pmid: None,
                orcid_put_code: None,
                abstract_text: work.abstract_text,
                url: work.url,
                sources: BTreeSet::new(),
            },
            Self::Pubmed(article) => {
                let url = match &article.doi {
                    Some(doi) => format!("https://doi.org/{doi}"),
                    None => format!("https://pubmed.ncbi.nlm.nih.gov/{}/", article.pmid),
                };
                Publication {
                    id: String::new(),
                    title: article.title,
                    authors: article.authors,
                    year: article.year,
                    date: article.date,
                    journal: article.journal,
                    kind: Some("journal-article".to_string()),
                    doi: article.doi,
                    pmid: Some(article.pmid),
                    orcid_put_code: None,
                    abstract_text: None,
                    url: Some(url),
                    sources: BTreeSet::new(),
                }
            }
        };
        publication.sources.insert(source);
        publication.id = derive_id(&publication);
        publication
    }
}

/// `doi:` first, then `pmid:`, then the content hash of title, year and first author.
pub fn derive_id(publication: &Publication) -> String {
    if let Some(doi) = &publication.doi {
        return format!("doi:{doi}");
    }
    if let Some(pmid) = &publication.pmid {
        return format!("pmid:{pmid}");
    }
    let first_author = publication.authors.first().map_or("", String::as_str);
    hash_id(&content_key(
        &publication.title,
        publication.year,
        first_author,
    ))
}

/// JSON value that may arrive as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub(crate) fn to_text(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v.trim().to_string(),
        }
    }

    pub(crate) fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => i32::try_from(*v).ok(),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i32),
            Self::Float(_) => None,
            Self::Text(v) => v.trim().parse().ok(),
        }
    }
}

/// Field that is sometimes a list, sometimes a single value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub(crate) fn first(&self) -> Option<&T> {
        match self {
            Self::Many(items) => items.first(),
            Self::One(item) => Some(item),
        }
    }
}
