//! ORCID public API: the researcher's works list

use serde::Deserialize;
use vitae_core::{FetchError, get_json};

use super::Scalar;
use crate::normalize::{non_empty, normalize_doi};

/// One work, taken from the first summary of an ORCID work group.
#[derive(Debug, Clone, PartialEq)]
pub struct OrcidWork {
    pub put_code: Option<String>,
    pub title: String,
    pub kind: Option<String>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub url: Option<String>,
}

// === Raw response ===

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WorksResponse {
    #[serde(default)]
    group: Option<Vec<WorkGroup>>,
}

#[derive(Debug, Deserialize)]
struct WorkGroup {
    #[serde(rename = "work-summary", default)]
    work_summary: Option<Vec<WorkSummary>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WorkSummary {
    #[serde(default)]
    put_code: Option<Scalar>,
    #[serde(default)]
    title: Option<TitleBlock>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    publication_date: Option<PublicationDate>,
    #[serde(default)]
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TitleBlock {
    #[serde(default)]
    title: Option<Valued<String>>,
    #[serde(default)]
    translated_title: Option<Valued<String>>,
}

#[derive(Debug, Deserialize)]
struct Valued<T> {
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PublicationDate {
    #[serde(default)]
    year: Option<Valued<Scalar>>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "external-id", default)]
    external_id: Option<Vec<ExternalId>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ExternalId {
    #[serde(default)]
    external_id_type: Option<String>,
    #[serde(default)]
    external_id_value: Option<String>,
    #[serde(default)]
    external_id_url: Option<Valued<String>>,
}

impl WorkSummary {
    fn into_work(self) -> OrcidWork {
        let title = self
            .title
            .as_ref()
            .and_then(|t| {
                let value = |v: &Option<Valued<String>>| {
                    v.as_ref().and_then(|v| v.value.clone())
                };
                value(&t.title).or_else(|| value(&t.translated_title))
            })
            .unwrap_or_default();

        let year = self
            .publication_date
            .as_ref()
            .and_then(|d| d.year.as_ref())
            .and_then(|y| y.value.as_ref())
            .and_then(Scalar::as_i32);

        let mut doi = None;
        let mut url = None;
        let ids = self
            .external_ids
            .and_then(|e| e.external_id)
            .unwrap_or_default();
        for id in &ids {
            if doi.is_none() && id.external_id_type.as_deref() == Some("doi") {
                doi = id.external_id_value.as_deref().and_then(normalize_doi);
            }
            if url.is_none() {
                url = non_empty(
                    id.external_id_url
                        .as_ref()
                        .and_then(|u| u.value.as_deref()),
                );
            }
        }
        if url.is_none() {
            url = doi.as_ref().map(|d| format!("https://doi.org/{d}"));
        }

        OrcidWork {
            put_code: self.put_code.as_ref().map(Scalar::to_text),
            title,
            kind: non_empty(self.kind.as_deref()),
            year,
            doi,
            url,
        }
    }
}

/// First summary of every group, in ORCID's order.
pub(crate) fn works_from_response(response: WorksResponse) -> Vec<OrcidWork> {
    response
        .group
        .unwrap_or_default()
        .into_iter()
        .filter_map(|g| g.work_summary?.into_iter().next())
        .map(WorkSummary::into_work)
        .collect()
}

/// `GET {base}/{orcid}/works`
pub fn fetch_works(base_url: &str, orcid: &str) -> Result<Vec<OrcidWork>, FetchError> {
    let url = format!("{}/{}/works", base_url.trim_end_matches('/'), orcid.trim());
    let response: WorksResponse = get_json("ORCID works", &url, &[])?;
    Ok(works_from_response(response))
}
