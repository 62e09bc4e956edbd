//! vitae - data pipelines for an academic portfolio site
//!
//! Builds the publication list from ORCID, Crossref and PubMed and the news
//! mentions list from GDELT, writing JSON snapshots the site reads.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "vitae")]
#[command(about = "Data pipelines for an academic portfolio site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./vitae.toml or ~/.config/vitae/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Total timeout per HTTP request in seconds
    #[arg(long, global = true)]
    request_timeout: Option<u64>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch publications and/or news mentions
    Fetch(cmd::fetch::FetchArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = Arc::new(vitae_core::ProgressContext::new());

    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    vitae_core::init_logging(vitae_core::Verbosity::from_flags(cli.quiet, cli.debug), multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    // Config file defaults, CLI overrides
    vitae_core::set_http_config(
        config
            .http
            .to_http_config(cli.request_timeout, cli.max_retries),
    );

    match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, &progress),
        Command::Config => {
            print_config(&config, cli.request_timeout, cli.max_retries);
            Ok(())
        }
    }
}

fn print_config(config: &Config, request_timeout: Option<u64>, max_retries: Option<u32>) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let http = config.http.to_http_config(request_timeout, max_retries);
    let identity = &config.identity;
    let or_unset = |value: &str| {
        if value.trim().is_empty() {
            "not set".to_string()
        } else {
            value.to_string()
        }
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Publications file",
        &config.publications_path(None).display().to_string(),
    ]);
    table.add_row(vec![
        "Mentions file",
        &config.mentions_path(None).display().to_string(),
    ]);
    table.add_row(vec!["ORCID API", &config.endpoints.orcid]);
    table.add_row(vec!["Crossref API", &config.endpoints.crossref]);
    table.add_row(vec!["E-utilities", &config.endpoints.eutils]);
    table.add_row(vec!["GDELT API", &config.endpoints.gdelt]);
    table.add_row(vec!["User-Agent", &http.user_agent]);
    table.add_row(vec![
        "Timeouts",
        &format!(
            "{}s connect, {}s request",
            http.connect_timeout.as_secs(),
            http.request_timeout.as_secs()
        ),
    ]);
    table.add_row(vec![
        "Retries",
        &format!("{} (backoff base {}ms)", http.max_retries, http.backoff_base.as_millis()),
    ]);
    table.add_row(vec![
        "Delays",
        &format!(
            "Crossref {}ms, PubMed {}ms, GDELT {}ms",
            config.delays.crossref_ms, config.delays.pubmed_ms, config.delays.gdelt_ms
        ),
    ]);
    table.add_row(vec!["Researcher", &or_unset(&identity.full_name)]);
    table.add_row(vec!["ORCID iD", &or_unset(&identity.orcid)]);
    table.add_row(vec![
        "PubMed query",
        &identity.pubmed.term().unwrap_or_else(|| "not set".to_string()),
    ]);
    table.add_row(vec![
        "Mention queries",
        &vitae_mentions::runner::derive_queries(identity).len().to_string(),
    ]);
    table.add_row(vec![
        "Score threshold",
        &identity.mentions.score_threshold.to_string(),
    ]);

    eprintln!("\n{table}");
}
