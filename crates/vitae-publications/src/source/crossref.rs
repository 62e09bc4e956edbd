//! Crossref REST API: per-DOI metadata

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use vitae_core::{FetchError, get_json};

use super::{OneOrMany, Scalar};
use crate::normalize::{clean_abstract, display_name, non_empty};

/// Same unreserved set as a URL component encoder: `/` in DOIs is escaped.
const DOI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Bibliographic metadata for one DOI.
///
/// `None`/empty fields mean Crossref didn't provide them; they never
/// overwrite values from other sources.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossrefWork {
    /// The DOI that was looked up (normalized)
    pub doi: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub date: Option<String>,
    pub year: Option<i32>,
    pub abstract_text: Option<String>,
    pub kind: Option<String>,
    pub url: Option<String>,
}

// === Raw response ===

#[derive(Debug, Deserialize)]
pub(crate) struct WorkResponse {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    title: Option<OneOrMany<String>>,
    #[serde(default)]
    author: Option<Vec<Author>>,
    #[serde(rename = "container-title", default)]
    container_title: Option<OneOrMany<String>>,
    #[serde(default)]
    published: Option<DateBlock>,
    #[serde(rename = "published-print", default)]
    published_print: Option<DateBlock>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(rename = "URL", default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
    /// Organizational authors only carry a name
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateBlock {
    #[serde(rename = "date-parts", default)]
    date_parts: Option<Vec<Vec<Option<Scalar>>>>,
}

impl DateBlock {
    /// Leading non-null parts of the first date, e.g. `[2023, 3]`.
    fn parts(&self) -> Option<Vec<i32>> {
        let first = self.date_parts.as_ref()?.first()?;
        let parts: Vec<i32> = first
            .iter()
            .map_while(|p| p.as_ref().and_then(Scalar::as_i32))
            .collect();
        (!parts.is_empty()).then_some(parts)
    }
}

impl Author {
    fn display(&self) -> Option<String> {
        match non_empty(self.family.as_deref()) {
            Some(family) => Some(display_name(&family, self.given.as_deref())),
            None => non_empty(self.name.as_deref()),
        }
    }
}

impl Message {
    fn into_work(self, doi: &str) -> CrossrefWork {
        let parts = self
            .published
            .as_ref()
            .and_then(DateBlock::parts)
            .or_else(|| self.published_print.as_ref().and_then(DateBlock::parts));
        let date = parts.as_ref().map(|p| {
            p.iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join("-")
        });
        let year = parts.as_ref().and_then(|p| p.first().copied());

        CrossrefWork {
            doi: doi.to_string(),
            title: non_empty(self.title.as_ref().and_then(OneOrMany::first).map(String::as_str)),
            authors: self
                .author
                .unwrap_or_default()
                .iter()
                .filter_map(Author::display)
                .collect(),
            journal: non_empty(
                self.container_title
                    .as_ref()
                    .and_then(OneOrMany::first)
                    .map(String::as_str),
            ),
            date,
            year,
            abstract_text: self.abstract_text.as_deref().and_then(clean_abstract),
            kind: non_empty(self.kind.as_deref()),
            url: non_empty(self.url.as_deref()),
        }
    }
}

/// Reduce a `/works/{doi}` response. `None` when it has no `message`.
pub(crate) fn work_from_response(response: WorkResponse, doi: &str) -> Option<CrossrefWork> {
    response.message.map(|m| m.into_work(doi))
}

/// `GET {base}/works/{doi}`. A DOI Crossref doesn't know is `Ok(None)`.
pub fn fetch_work(base_url: &str, doi: &str) -> Result<Option<CrossrefWork>, FetchError> {
    let url = format!(
        "{}/works/{}",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(doi, DOI_COMPONENT)
    );
    match get_json::<WorkResponse>("Crossref work", &url, &[]) {
        Ok(response) => Ok(work_from_response(response, doi)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
