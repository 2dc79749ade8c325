//! Application configuration loaded from TOML with environment overrides.
//!
//! Resolution order for the file: explicit path, `VECTORBASE_CONFIG`, then
//! `vectorbase.toml` in the working directory. A missing file is created with
//! defaults so operators have something to edit.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "VECTORBASE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "vectorbase.toml";

const ENV_PROVIDER: &str = "VECTORBASE_EMBEDDING_PROVIDER";
const ENV_MODEL: &str = "VECTORBASE_EMBEDDING_MODEL";
const ENV_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub chunking: ChunkingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
    /// Deterministic local feature hashing; no network.
    Hashing,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "hashing" => Ok(Self::Hashing),
            other => bail!("unknown embedding provider '{other}' (expected openai or hashing)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Unset means "OpenAI when an API key is available, hashing otherwise".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    pub model: String,
    pub base_url: String,
    /// Never written back to disk; usually supplied through `OPENAI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Output width of the hashing provider.
    pub dimension: usize,
    /// Maximum inputs per upstream request.
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Provider to build once file, environment, and key are all known.
    pub const fn resolved_provider(&self) -> ProviderKind {
        match (self.provider, &self.api_key) {
            (Some(kind), _) => kind,
            (None, Some(_)) => ProviderKind::OpenAi,
            (None, None) => ProviderKind::Hashing,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            dimension: 256,
            batch_size: 512,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_metric: String,
    pub default_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_metric: "cosine".to_string(),
            default_k: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `VECTORBASE_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; absent sections and fields fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parse config TOML")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config TOML")
    }

    /// Apply environment-style overrides read through `lookup`, so tests do
    /// not have to mutate the process environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PROVIDER) {
            self.embedding.provider = Some(raw.parse()?);
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            self.embedding.model = model;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.embedding.api_key = Some(key);
        }
        Ok(())
    }

    /// Reject settings that would only fail later and more confusingly.
    ///
    /// `search.default_metric` is checked by whoever resolves it against the
    /// metric registry.
    pub fn validate(&self) -> Result<()> {
        if self.search.default_metric.trim().is_empty() {
            bail!("search.default_metric must not be empty");
        }
        if self.search.default_k == 0 {
            bail!("search.default_k must be at least 1");
        }
        if self.embedding.dimension == 0 {
            bail!("embedding.dimension must be at least 1");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be at least 1");
        }
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be at least 1");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.embedding.resolved_provider() == ProviderKind::OpenAi
            && self.embedding.api_key.is_none()
        {
            bail!("embedding.provider = \"openai\" requires OPENAI_API_KEY or embedding.api_key");
        }
        Ok(())
    }
}

/// Pick the config path from the argument, the environment, or the default.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// A validated config and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    /// The file did not exist and was written with defaults. Reported to the
    /// caller because logging is usually configured from `config` itself.
    pub created: bool,
}

/// Load the config file, writing defaults first if it does not exist, then
/// apply environment overrides and validate.
pub fn load_or_create_config(path: Option<&Path>) -> Result<LoadedConfig> {
    load_with(&resolve_config_path(path), |name| env::var(name).ok())
}

fn load_with<F>(path: &Path, lookup: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let created = !path.exists();
    let mut config = if created {
        let cfg = AppConfig::default();
        write_config(path, &cfg)?;
        cfg
    } else {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        AppConfig::from_toml_str(&raw).with_context(|| format!("load {}", path.display()))?
    };

    config.apply_overrides_from(lookup)?;
    config.validate()?;
    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        created,
    })
}

fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    fs::write(path, cfg.to_toml_string()?)
        .with_context(|| format!("write config {}", path.display()))
}
