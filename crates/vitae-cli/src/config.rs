//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use vitae_core::{HttpConfig, Identity};

/// Global configuration for vitae
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub http: HttpSettings,
    pub endpoints: EndpointsConfig,
    pub delays: DelaysConfig,
    pub identity: Identity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub publications_file: String,
    pub mentions_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
            publications_file: "publications.json".to_string(),
            mentions_file: "mentions.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: Option<String>,
    /// Contact address appended to the User-Agent (Crossref polite pool)
    #[serde(deserialize_with = "deserialize_env_var")]
    pub mailto: Option<String>,
    /// Seconds
    pub connect_timeout: u64,
    /// Seconds
    pub request_timeout: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpConfig::default();
        Self {
            user_agent: None,
            mailto: std::env::var("VITAE_MAILTO").ok(),
            connect_timeout: defaults.connect_timeout.as_secs(),
            request_timeout: defaults.request_timeout.as_secs(),
            max_retries: defaults.max_retries,
            backoff_base_ms: defaults.backoff_base.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub orcid: String,
    pub crossref: String,
    pub eutils: String,
    pub gdelt: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        let publications = vitae_publications::Config::default();
        Self {
            orcid: publications.orcid_base_url,
            crossref: publications.crossref_base_url,
            eutils: publications.eutils_base_url,
            gdelt: vitae_mentions::Config::default().gdelt_base_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DelaysConfig {
    pub crossref_ms: u64,
    pub pubmed_ms: u64,
    pub gdelt_ms: u64,
}

impl Default for DelaysConfig {
    fn default() -> Self {
        Self {
            crossref_ms: 200,
            pubmed_ms: 400,
            gdelt_ms: 1000,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl HttpSettings {
    /// Configured User-Agent, with the contact address when one is set.
    pub fn effective_user_agent(&self) -> String {
        let base = self
            .user_agent
            .clone()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| vitae_core::http::DEFAULT_USER_AGENT.to_string());
        match self.mailto.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(mailto) => format!("{base} mailto:{mailto}"),
            None => base,
        }
    }

    /// Client settings, with command-line overrides applied.
    pub fn to_http_config(&self, request_timeout: Option<u64>, max_retries: Option<u32>) -> HttpConfig {
        HttpConfig {
            user_agent: self.effective_user_agent(),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(request_timeout.unwrap_or(self.request_timeout)),
            max_retries: max_retries.unwrap_or(self.max_retries),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./vitae.toml (current directory)
    /// 2. ~/.config/vitae/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("vitae.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "vitae") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn publications_config(&self) -> vitae_publications::Config {
        vitae_publications::Config {
            orcid_base_url: self.endpoints.orcid.clone(),
            crossref_base_url: self.endpoints.crossref.clone(),
            eutils_base_url: self.endpoints.eutils.clone(),
            crossref_delay: Duration::from_millis(self.delays.crossref_ms),
            pubmed_delay: Duration::from_millis(self.delays.pubmed_ms),
            ..Default::default()
        }
    }

    pub fn mentions_config(&self) -> vitae_mentions::Config {
        vitae_mentions::Config {
            gdelt_base_url: self.endpoints.gdelt.clone(),
            query_delay: Duration::from_millis(self.delays.gdelt_ms),
            ..Default::default()
        }
    }

    /// Snapshot paths inside `dir` (or the configured output directory)
    pub fn publications_path(&self, dir: Option<&Path>) -> PathBuf {
        dir.unwrap_or(self.output.dir.as_path())
            .join(&self.output.publications_file)
    }

    pub fn mentions_path(&self, dir: Option<&Path>) -> PathBuf {
        dir.unwrap_or(self.output.dir.as_path()).join(&self.output.mentions_file)
    }
}
