//! Fetch subcommand - run the pipelines and write the snapshots

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use vitae_core::SharedProgress;
use vitae_mentions::{MentionsData, Outcome};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(subcommand)]
    pub target: FetchTarget,
}

#[derive(Subcommand, Debug)]
pub enum FetchTarget {
    /// Build publications.json from ORCID, Crossref and PubMed
    Publications(TargetArgs),
    /// Update mentions.json from GDELT news search
    Mentions(TargetArgs),
    /// Publications, then mentions
    All(TargetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run the pipeline and print the summary without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    match args.target {
        FetchTarget::Publications(args) => fetch_publications(&args, config, progress),
        FetchTarget::Mentions(args) => fetch_mentions(&args, config, progress),
        FetchTarget::All(args) => fetch_all(&args, config, progress),
    }
}

/// Print a key-value summary table on stderr
fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

fn fetch_publications(args: &TargetArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let path = config.publications_path(args.output.as_deref());

    log::info!("Fetching publications");
    log::info!("  Output: {}", path.display());

    let (data, summary) = vitae_publications::run(
        &config.publications_config(),
        &config.identity,
        progress,
    )?;

    let written = if args.dry_run {
        log::info!("Dry run, not writing {}", path.display());
        "dry run".to_string()
    } else {
        vitae_core::write_snapshot(&path, &data)?;
        log::info!("Wrote {} publications to {}", data.count, path.display());
        path.display().to_string()
    };

    let failed = if summary.failed_sources.is_empty() {
        "none".to_string()
    } else {
        summary.failed_sources.join(", ")
    };

    print_summary(
        "Publications",
        &[
            (
                "Sources",
                format!(
                    "{} ORCID, {} PubMed",
                    summary.orcid_works, summary.pubmed_articles
                ),
            ),
            ("Failed sources", failed),
            (
                "Crossref",
                format!(
                    "{} enriched, {} missed",
                    summary.crossref_hits, summary.crossref_misses
                ),
            ),
            (
                "Merged",
                format!(
                    "{} by DOI, {} by title/year, {} duplicate PMIDs",
                    summary.merged_by_doi, summary.merged_by_hash, summary.duplicate_pmids
                ),
            ),
            ("PubMed only", summary.created_from_pubmed.to_string()),
            ("Publications", summary.publications.to_string()),
            ("Snapshot", written),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );

    Ok(())
}

fn fetch_mentions(args: &TargetArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let path = config.mentions_path(args.output.as_deref());

    log::info!("Fetching news mentions");
    log::info!("  Output: {}", path.display());

    let previous: Option<MentionsData> = match vitae_core::read_snapshot(&path) {
        Ok(previous) => previous,
        Err(e) => {
            log::warn!("Ignoring unreadable previous mentions: {e:#}");
            None
        }
    };

    let (outcome, summary) = vitae_mentions::run(
        &config.mentions_config(),
        &config.identity,
        previous.as_ref(),
        progress,
    )?;

    let snapshot = match &outcome {
        Outcome::Preserved(reason) => format!("kept previous ({reason})"),
        Outcome::Updated(_) if args.dry_run => {
            log::info!("Dry run, not writing {}", path.display());
            "dry run".to_string()
        }
        Outcome::Updated(data) => {
            vitae_mentions::persist(&path, &outcome)?;
            log::info!("Wrote {} mentions to {}", data.count, path.display());
            path.display().to_string()
        }
    };

    print_summary(
        "Mentions",
        &[
            (
                "Queries",
                format!("{} ({} failed)", summary.queries, summary.failed_queries),
            ),
            ("Articles", summary.articles.to_string()),
            (
                "Scored",
                format!(
                    "{} kept, {} below threshold",
                    summary.kept, summary.below_threshold
                ),
            ),
            (
                "Mentions",
                format!("{} ({} before)", summary.total, summary.previous),
            ),
            ("Snapshot", snapshot),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );

    Ok(())
}

fn fetch_all(args: &TargetArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let publications = fetch_publications(args, config, progress);
    if let Err(e) = &publications {
        log::error!("Publications failed: {e:#}");
    }

    let mentions = fetch_mentions(args, config, progress);
    if let Err(e) = &mentions {
        log::error!("Mentions failed: {e:#}");
    }

    match (publications, mentions) {
        (Ok(()), Ok(())) => {
            eprintln!("\nAll pipelines completed.");
            Ok(())
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(_), Err(_)) => anyhow::bail!("Both pipelines failed"),
    }
}
