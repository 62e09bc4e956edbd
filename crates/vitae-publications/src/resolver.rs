//! Identity resolution: one canonical publication per real-world work
//!
//! Publications live in an arena; three maps index into it by DOI, PMID and
//! content key. Learning a new identifier for an entity only adds a map
//! entry, so an entity can never be split or copied.
//!
//! Only entities seeded from DOI-less ORCID works are content-indexed.
//! Everything else is identified by DOI or PMID alone.
//!
//! Content keys are compared as full strings. The blake3 digest derived from
//! a key only names the entity in its `hash:` id.

use rustc_hash::FxHashMap;

use crate::normalize::{content_key, normalize_doi};
use crate::schema::{Publication, Source};
use crate::source::{CrossrefWork, OrcidWork, PubmedArticle, SourceRecord, derive_id};

/// What happened to an incoming record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// New canonical publication
    Created,
    /// Folded into the publication holding the same DOI
    MergedByDoi,
    /// Folded into the publication with the same content key
    MergedByHash,
    /// PMID already seen in this run, record dropped
    DuplicatePmid,
}

#[derive(Debug, Default)]
pub struct Resolver {
    arena: Vec<Publication>,
    by_doi: FxHashMap<String, usize>,
    by_pmid: FxHashMap<String, usize>,
    by_key: FxHashMap<String, usize>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Seed from an ORCID work. `enrich` is asked for Crossref metadata when
    /// a DOI is seen for the first time.
    pub fn add_orcid_work<F>(&mut self, mut work: OrcidWork, mut enrich: F) -> Resolution
    where
        F: FnMut(&str) -> Option<CrossrefWork>,
    {
        work.doi = work.doi.as_deref().and_then(normalize_doi);

        if let Some(doi) = &work.doi {
            if let Some(&idx) = self.by_doi.get(doi) {
                fold_orcid(&mut self.arena[idx], work);
                return Resolution::MergedByDoi;
            }
            let doi = doi.clone();
            let mut publication = SourceRecord::Orcid(work).into_publication();
            if let Some(crossref) = enrich(&doi) {
                apply_crossref(&mut publication, crossref);
            }
            self.insert(publication, None);
            return Resolution::Created;
        }

        let key = content_key(&work.title, work.year, "");
        if let Some(&idx) = self.by_key.get(&key) {
            fold_orcid(&mut self.arena[idx], work);
            return Resolution::MergedByHash;
        }
        self.insert(SourceRecord::Orcid(work).into_publication(), Some(key));
        Resolution::Created
    }

    /// Fold in a PubMed article: DOI match, then PMID, then content key.
    pub fn add_pubmed_article<F>(&mut self, mut article: PubmedArticle, mut enrich: F) -> Resolution
    where
        F: FnMut(&str) -> Option<CrossrefWork>,
    {
        article.doi = article.doi.as_deref().and_then(normalize_doi);

        if let Some(&idx) = article.doi.as_ref().and_then(|d| self.by_doi.get(d)) {
            self.attach_pubmed(idx, article);
            return Resolution::MergedByDoi;
        }

        if self.by_pmid.contains_key(&article.pmid) {
            return Resolution::DuplicatePmid;
        }

        if let Some(idx) = self.find_by_content(&article) {
            if let Some(doi) = article.doi.clone() {
                if self.arena[idx].doi.is_none() {
                    log::debug!("Promoting {} to doi:{doi}", self.arena[idx].title);
                    self.arena[idx].doi = Some(doi.clone());
                    self.by_doi.insert(doi, idx);
                }
            }
            self.attach_pubmed(idx, article);
            return Resolution::MergedByHash;
        }

        let doi = article.doi.clone();
        let mut publication = SourceRecord::Pubmed(article).into_publication();
        if let Some(crossref) = doi.as_deref().and_then(&mut enrich) {
            apply_crossref(&mut publication, crossref);
        }
        self.insert(publication, None);
        Resolution::Created
    }

    /// All canonical publications in insertion order, ids derived from
    /// their final identifiers.
    pub fn into_publications(self) -> Vec<Publication> {
        self.arena
            .into_iter()
            .map(|mut p| {
                p.id = derive_id(&p);
                p
            })
            .collect()
    }

    /// Index a new entity by its identifiers, and by content `key` when it
    /// has no DOI to be found under.
    fn insert(&mut self, publication: Publication, key: Option<String>) -> usize {
        let idx = self.arena.len();
        if let Some(doi) = &publication.doi {
            self.by_doi.entry(doi.clone()).or_insert(idx);
        }
        if let Some(pmid) = &publication.pmid {
            self.by_pmid.entry(pmid.clone()).or_insert(idx);
        }
        if let Some(key) = key {
            self.by_key.entry(key).or_insert(idx);
        }
        self.arena.push(publication);
        idx
    }

    /// Probe the author key, then the author-less key ORCID works use.
    /// An entity holding a different DOI or PMID is never a match.
    fn find_by_content(&self, article: &PubmedArticle) -> Option<usize> {
        let first_author = article.authors.first().map_or("", String::as_str);
        let probes = [
            content_key(&article.title, article.year, first_author),
            content_key(&article.title, article.year, ""),
        ];
        probes.iter().find_map(|key| {
            let idx = *self.by_key.get(key)?;
            let entity = &self.arena[idx];
            let doi_conflict = matches!(
                (&entity.doi, &article.doi),
                (Some(existing), Some(incoming)) if existing != incoming
            );
            let pmid_conflict = entity
                .pmid
                .as_deref()
                .is_some_and(|pmid| pmid != article.pmid);
            (!doi_conflict && !pmid_conflict).then_some(idx)
        })
    }

    /// PMID, provenance and backfill of empty authors/journal.
    fn attach_pubmed(&mut self, idx: usize, article: PubmedArticle) {
        let publication = &mut self.arena[idx];
        if publication.pmid.is_none() {
            self.by_pmid.entry(article.pmid.clone()).or_insert(idx);
            publication.pmid = Some(article.pmid);
        } else if publication.pmid.as_deref() != Some(article.pmid.as_str()) {
            log::debug!(
                "{}: keeping PMID {}, ignoring {}",
                publication.title,
                publication.pmid.as_deref().unwrap_or_default(),
                article.pmid
            );
        }
        publication.sources.insert(Source::Pubmed);
        if publication.authors.is_empty() && !article.authors.is_empty() {
            publication.authors = article.authors;
        }
        if publication.journal.is_none() {
            publication.journal = article.journal;
        }
    }
}

/// Fill gaps from a further ORCID work describing the same publication.
fn fold_orcid(publication: &mut Publication, work: OrcidWork) {
    if publication.title.is_empty() {
        publication.title = work.title;
    }
    if publication.year.is_none() {
        publication.year = work.year;
    }
    if publication.kind.is_none() {
        publication.kind = work.kind;
    }
    if publication.url.is_none() {
        publication.url = work.url;
    }
    if publication.orcid_put_code.is_none() {
        publication.orcid_put_code = work.put_code;
    }
    publication.sources.insert(Source::Orcid);
}

/// Crossref values replace existing ones wherever Crossref provided them.
pub fn apply_crossref(publication: &mut Publication, work: CrossrefWork) {
    let crossref = SourceRecord::Crossref(work).into_publication();
    if !crossref.title.is_empty() {
        publication.title = crossref.title;
    }
    if !crossref.authors.is_empty() {
        publication.authors = crossref.authors;
    }
    if crossref.journal.is_some() {
        publication.journal = crossref.journal;
    }
    if crossref.date.is_some() {
        publication.date = crossref.date;
    }
    if crossref.year.is_some() {
        publication.year = crossref.year;
    }
    if crossref.abstract_text.is_some() {
        publication.abstract_text = crossref.abstract_text;
    }
    if crossref.kind.is_some() {
        publication.kind = crossref.kind;
    }
    if crossref.url.is_some() {
        publication.url = crossref.url;
    }
    publication.sources.insert(Source::Crossref);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn orcid(title: &str, year: Option<i32>, doi: Option<&str>) -> OrcidWork {
        OrcidWork {
            put_code: Some(format!("pc-{title}")),
            title: title.to_string(),
            kind: Some("journal-article".into()),
            year,
            doi: doi.map(str::to_string),
            url: doi.map(|d| format!("https://doi.org/{d}")),
        }
    }

    fn pubmed(pmid: &str, title: &str, year: Option<i32>, doi: Option<&str>) -> PubmedArticle {
        PubmedArticle {
            pmid: pmid.to_string(),
            title: title.to_string(),
            authors: vec!["Doe J".into(), "Roe R".into()],
            journal: Some("J Test".into()),
            year,
            date: year.map(|y| format!("{y} Jan")),
            doi: doi.map(str::to_string),
        }
    }

    fn crossref(doi: &str) -> CrossrefWork {
        CrossrefWork {
            doi: doi.to_string(),
            title: Some("Crossref Title".into()),
            authors: vec!["Curie M".into()],
            journal: Some("Crossref Journal".into()),
            date: Some("2023-3-15".into()),
            year: Some(2023),
            abstract_text: None,
            kind: None,
            url: None,
        }
    }

    fn no_enrich(_: &str) -> Option<CrossrefWork> {
        None
    }

    fn sources(list: &[Source]) -> BTreeSet<Source> {
        list.iter().copied().collect()
    }

    #[test]
    fn shared_doi_is_one_publication() {
        let mut r = Resolver::new();
        assert_eq!(
            r.add_orcid_work(orcid("Title", Some(2020), Some("10.1/ABC")), no_enrich),
            Resolution::Created
        );
        assert_eq!(
            r.add_pubmed_article(pubmed("111", "Title.", Some(2020), Some("10.1/abc")), no_enrich),
            Resolution::MergedByDoi
        );

        let pubs = r.into_publications();
        assert_eq!(pubs.len(), 1);
        let p = &pubs[0];
        assert_eq!(p.id, "doi:10.1/abc");
        assert_eq!(p.pmid.as_deref(), Some("111"));
        assert_eq!(p.sources, sources(&[Source::Orcid, Source::Pubmed]));
        // backfilled, ORCID had neither
        assert_eq!(p.authors, ["Doe J", "Roe R"]);
        assert_eq!(p.journal.as_deref(), Some("J Test"));
    }

    #[test]
    fn crossref_enrichment_overwrites_provided_fields() {
        let mut r = Resolver::new();
        let mut calls = Vec::new();
        r.add_orcid_work(orcid("orcid title", Some(2022), Some("10.1/x")), |doi| {
            calls.push(doi.to_string());
            Some(crossref(doi))
        });
        r.add_pubmed_article(pubmed("5", "Other", Some(2022), Some("10.1/x")), |_| {
            panic!("DOI already known, no second lookup")
        });
        assert_eq!(calls, ["10.1/x"]);

        let p = &r.into_publications()[0];
        assert_eq!(p.title, "Crossref Title");
        assert_eq!(p.year, Some(2023));
        assert_eq!(p.journal.as_deref(), Some("Crossref Journal"));
        // Crossref gave no type or URL
        assert_eq!(p.kind.as_deref(), Some("journal-article"));
        assert_eq!(p.url.as_deref(), Some("https://doi.org/10.1/x"));
        // PubMed never overwrites populated fields
        assert_eq!(p.authors, ["Curie M"]);
        assert_eq!(
            p.sources,
            sources(&[Source::Orcid, Source::Crossref, Source::Pubmed])
        );
    }

    #[test]
    fn same_title_and_year_collapse() {
        let mut r = Resolver::new();
        r.add_orcid_work(orcid("A Study: Part 1", Some(2019), None), no_enrich);
        assert_eq!(
            r.add_orcid_work(orcid("a study part 1", Some(2019), None), no_enrich),
            Resolution::MergedByHash
        );
        assert_eq!(
            r.add_orcid_work(orcid("A Study: Part 1", Some(2020), None), no_enrich),
            Resolution::Created
        );
        let pubs = r.into_publications();
        assert_eq!(pubs.len(), 2);
        assert!(pubs.iter().all(|p| p.id.starts_with("hash:")));
        assert_ne!(pubs[0].id, pubs[1].id);
    }

    #[test]
    fn duplicate_orcid_doi_folds() {
        let mut r = Resolver::new();
        let mut lookups = 0;
        let mut enrich = |_: &str| {
            lookups += 1;
            None
        };
        r.add_orcid_work(orcid("T", Some(2020), Some("10.1/d")), &mut enrich);
        assert_eq!(
            r.add_orcid_work(orcid("T again", None, Some("doi:10.1/D")), &mut enrich),
            Resolution::MergedByDoi
        );
        assert_eq!(lookups, 1);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn pubmed_matches_orcid_by_content_and_promotes_doi() {
        let mut r = Resolver::new();
        r.add_orcid_work(orcid("Hospital pharmacy outcomes", Some(2021), None), no_enrich);
        assert_eq!(
            r.add_pubmed_article(
                pubmed("222", "Hospital pharmacy outcomes", Some(2021), Some("10.9/new")),
                no_enrich
            ),
            Resolution::MergedByHash
        );
        // the promoted DOI now resolves to the same entity
        assert_eq!(
            r.add_pubmed_article(pubmed("333", "Erratum", Some(2021), Some("10.9/new")), no_enrich),
            Resolution::MergedByDoi
        );

        let pubs = r.into_publications();
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].id, "doi:10.9/new");
        assert_eq!(pubs[0].pmid.as_deref(), Some("222"));
        assert_eq!(pubs[0].orcid_put_code.as_deref(), Some("pc-Hospital pharmacy outcomes"));
    }

    #[test]
    fn conflicting_doi_is_not_a_content_match() {
        let mut r = Resolver::new();
        r.add_orcid_work(orcid("Editorial", Some(2021), Some("10.1/a")), no_enrich);
        assert_eq!(
            r.add_pubmed_article(pubmed("9", "Editorial", Some(2021), Some("10.1/b")), no_enrich),
            Resolution::Created
        );
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn distinct_pmids_sharing_a_title_stay_apart() {
        let mut r = Resolver::new();
        assert_eq!(
            r.add_pubmed_article(pubmed("111", "Correction", Some(2020), None), no_enrich),
            Resolution::Created
        );
        assert_eq!(
            r.add_pubmed_article(pubmed("222", "Correction", Some(2020), None), no_enrich),
            Resolution::Created
        );
        assert_eq!(r.len(), 2);
        let ids: Vec<_> = r.into_publications().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["pmid:111", "pmid:222"]);
    }

    #[test]
    fn doi_less_pubmed_does_not_join_doi_bearing_work() {
        let mut r = Resolver::new();
        r.add_orcid_work(orcid("Editorial", Some(2020), Some("10.1/a")), no_enrich);
        assert_eq!(
            r.add_pubmed_article(pubmed("111", "Editorial", Some(2020), Some("10.1/a")), no_enrich),
            Resolution::MergedByDoi
        );
        assert_eq!(
            r.add_pubmed_article(pubmed("222", "Editorial", Some(2020), None), no_enrich),
            Resolution::Created
        );
        assert_eq!(r.len(), 2);
        let pmids: Vec<_> = r
            .into_publications()
            .into_iter()
            .map(|p| p.pmid)
            .collect();
        assert_eq!(pmids, [Some("111".to_string()), Some("222".to_string())]);
    }

    #[test]
    fn content_match_rejects_a_second_pmid() {
        let mut r = Resolver::new();
        r.add_orcid_work(orcid("Poster", Some(2021), None), no_enrich);
        assert_eq!(
            r.add_pubmed_article(pubmed("1", "Poster", Some(2021), None), no_enrich),
            Resolution::MergedByHash
        );
        assert_eq!(
            r.add_pubmed_article(pubmed("2", "Poster", Some(2021), None), no_enrich),
            Resolution::Created
        );
        let pubs = r.into_publications();
        assert_eq!(pubs.len(), 2);
        assert_eq!(pubs[0].pmid.as_deref(), Some("1"));
        assert_eq!(pubs[0].sources, sources(&[Source::Orcid, Source::Pubmed]));
        assert_eq!(pubs[1].id, "pmid:2");
    }

    #[test]
    fn repeated_pmid_is_dropped() {
        let mut r = Resolver::new();
        assert_eq!(
            r.add_pubmed_article(pubmed("444", "Only PubMed", Some(2018), None), no_enrich),
            Resolution::Created
        );
        assert_eq!(
            r.add_pubmed_article(pubmed("444", "Only PubMed (v2)", Some(2018), None), no_enrich),
            Resolution::DuplicatePmid
        );
        let pubs = r.into_publications();
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].id, "pmid:444");
        assert_eq!(
            pubs[0].url.as_deref(),
            Some("https://pubmed.ncbi.nlm.nih.gov/444/")
        );
    }

    #[test]
    fn pubmed_only_with_doi_is_enriched() {
        let mut r = Resolver::new();
        r.add_pubmed_article(pubmed("555", "Raw", Some(2020), Some("10.5/z")), |d| {
            Some(crossref(d))
        });
        let p = &r.into_publications()[0];
        assert_eq!(p.id, "doi:10.5/z");
        assert_eq!(p.title, "Crossref Title");
        assert_eq!(p.kind.as_deref(), Some("journal-article"));
        assert_eq!(p.sources, sources(&[Source::Crossref, Source::Pubmed]));
    }

    #[test]
    fn resolving_twice_is_identical() {
        let run = || {
            let mut r = Resolver::new();
            r.add_orcid_work(orcid("One", Some(2020), Some("10.1/one")), |d| Some(crossref(d)));
            r.add_orcid_work(orcid("Two", None, None), no_enrich);
            r.add_pubmed_article(pubmed("1", "Three", Some(2019), None), no_enrich);
            r.add_pubmed_article(pubmed("2", "Two", None, None), no_enrich);
            r.into_publications()
        };
        assert_eq!(run(), run());
    }
}
