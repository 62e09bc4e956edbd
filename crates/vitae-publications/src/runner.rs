//! Main runner for the publications pipeline

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::ProgressBar;
use vitae_core::{FetchError, Identity, ProgressContext};

use crate::config::Config;
use crate::resolver::{Resolution, Resolver};
use crate::schema::{Publication, PublicationsData};
use crate::source::{CrossrefWork, OrcidWork, PubmedArticle, crossref, orcid, pubmed};

/// Where bibliographic records come from.
///
/// [`RemoteBibliography`] talks to the public APIs; tests plug in fixtures.
pub trait Bibliography {
    fn orcid_works(&mut self) -> Result<Vec<OrcidWork>, FetchError>;
    fn pubmed_articles(&mut self) -> Result<Vec<PubmedArticle>, FetchError>;
    /// `Ok(None)` when Crossref doesn't know the DOI
    fn crossref_work(&mut self, doi: &str) -> Result<Option<CrossrefWork>, FetchError>;
}

/// ORCID, Crossref and PubMed over HTTP, with the configured pauses.
pub struct RemoteBibliography<'a> {
    config: &'a Config,
    orcid: String,
    pubmed_term: Option<String>,
}

impl<'a> RemoteBibliography<'a> {
    pub fn new(config: &'a Config, identity: &Identity) -> Result<Self> {
        let orcid = identity.orcid.trim();
        if orcid.is_empty() {
            anyhow::bail!("identity.orcid is not set");
        }
        Ok(Self {
            config,
            orcid: orcid.to_string(),
            pubmed_term: identity.pubmed.term(),
        })
    }
}

impl Bibliography for RemoteBibliography<'_> {
    fn orcid_works(&mut self) -> Result<Vec<OrcidWork>, FetchError> {
        orcid::fetch_works(&self.config.orcid_base_url, &self.orcid)
    }

    fn pubmed_articles(&mut self) -> Result<Vec<PubmedArticle>, FetchError> {
        let Some(term) = &self.pubmed_term else {
            log::warn!("No PubMed query configured, skipping PubMed");
            return Ok(Vec::new());
        };
        pubmed::fetch_articles(
            &self.config.eutils_base_url,
            term,
            self.config.pubmed_retmax,
            self.config.pubmed_delay,
        )
    }

    fn crossref_work(&mut self, doi: &str) -> Result<Option<CrossrefWork>, FetchError> {
        std::thread::sleep(self.config.crossref_delay);
        crossref::fetch_work(&self.config.crossref_base_url, doi)
    }
}

/// Pipeline execution summary
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub orcid_works: usize,
    pub pubmed_articles: usize,
    pub crossref_hits: usize,
    pub crossref_misses: usize,
    pub merged_by_doi: usize,
    pub merged_by_hash: usize,
    pub duplicate_pmids: usize,
    pub created_from_pubmed: usize,
    /// Sources that failed and contributed nothing
    pub failed_sources: Vec<&'static str>,
    pub publications: usize,
    pub elapsed: Duration,
}

impl Summary {
    fn count(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Created => {}
            Resolution::MergedByDoi => self.merged_by_doi += 1,
            Resolution::MergedByHash => self.merged_by_hash += 1,
            Resolution::DuplicatePmid => self.duplicate_pmids += 1,
        }
    }
}

/// Crossref lookup that never fails the run.
fn enrich<B: Bibliography + ?Sized>(
    sources: &mut B,
    summary: &mut Summary,
    pb: &ProgressBar,
    doi: &str,
) -> Option<CrossrefWork> {
    pb.set_message(format!(
        "Crossref {}: {doi}",
        summary.crossref_hits + summary.crossref_misses + 1
    ));
    match sources.crossref_work(doi) {
        Ok(Some(work)) => {
            summary.crossref_hits += 1;
            Some(work)
        }
        Ok(None) => {
            log::debug!("Crossref has no record for {doi}");
            summary.crossref_misses += 1;
            None
        }
        Err(e) => {
            log::warn!("Crossref lookup failed for {doi}: {e}");
            summary.crossref_misses += 1;
            None
        }
    }
}

/// Fetch every source and resolve the records into canonical publications.
///
/// A failing source is logged and contributes nothing. When ORCID fails
/// and PubMed has nothing either, the run fails instead of producing an
/// empty list.
pub fn build<B: Bibliography + ?Sized>(
    sources: &mut B,
    pb: &ProgressBar,
) -> Result<(Vec<Publication>, Summary)> {
    let mut summary = Summary::default();

    pb.set_message("ORCID works");
    let works = match sources.orcid_works() {
        Ok(works) => works,
        Err(e) => {
            log::warn!("ORCID fetch failed, continuing without it: {e}");
            summary.failed_sources.push("orcid");
            Vec::new()
        }
    };
    summary.orcid_works = works.len();
    log::info!("ORCID: {} works", works.len());

    pb.set_message("PubMed search");
    let articles = match sources.pubmed_articles() {
        Ok(articles) => articles,
        Err(e) => {
            log::warn!("PubMed fetch failed, continuing without it: {e}");
            summary.failed_sources.push("pubmed");
            Vec::new()
        }
    };
    summary.pubmed_articles = articles.len();
    log::info!("PubMed: {} articles", articles.len());

    if summary.failed_sources.contains(&"orcid") && articles.is_empty() {
        anyhow::bail!("ORCID failed and PubMed returned nothing, refusing to build an empty list");
    }

    let mut resolver = Resolver::new();
    for work in works {
        let resolution =
            resolver.add_orcid_work(work, |doi| enrich(&mut *sources, &mut summary, pb, doi));
        summary.count(resolution);
    }
    for article in articles {
        let resolution =
            resolver.add_pubmed_article(article, |doi| enrich(&mut *sources, &mut summary, pb, doi));
        if resolution == Resolution::Created {
            summary.created_from_pubmed += 1;
        }
        summary.count(resolution);
    }

    let publications = resolver.into_publications();
    summary.publications = publications.len();
    Ok((publications, summary))
}

/// Run the publications pipeline against the remote APIs.
///
/// Returns the dataset to write; writing it is left to the caller.
pub fn run(
    config: &Config,
    identity: &Identity,
    progress: &ProgressContext,
) -> Result<(PublicationsData, Summary)> {
    let start = Instant::now();
    let mut sources =
        RemoteBibliography::new(config, identity).context("Invalid publications identity")?;

    let pb = progress.stage_line("publications");
    let result = build(&mut sources, &pb);
    pb.finish_and_clear();
    let (publications, mut summary) = result?;

    let data = PublicationsData::new(publications, Utc::now());
    summary.elapsed = start.elapsed();

    log::info!("=== Publications Summary ===");
    log::info!(
        "Sources: {} ORCID works, {} PubMed articles",
        summary.orcid_works,
        summary.pubmed_articles
    );
    log::info!(
        "Crossref: {} enriched, {} missed",
        summary.crossref_hits,
        summary.crossref_misses
    );
    log::info!(
        "Merged: {} by DOI, {} by title/year, {} duplicate PMIDs",
        summary.merged_by_doi,
        summary.merged_by_hash,
        summary.duplicate_pmids
    );
    log::info!("Publications: {}", summary.publications);
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok((data, summary))
}
