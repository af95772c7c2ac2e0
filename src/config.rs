use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub subjective: SubjectiveConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// `http(s)://` base URL of the `/data/` directory, or a local directory.
    pub base: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_search_index_file")]
    pub search_index_file: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_index_file() -> String {
    "index.json".to_string()
}
fn default_search_index_file() -> String {
    "search_index.json".to_string()
}

impl DataConfig {
    pub fn is_remote(&self) -> bool {
        self.base.starts_with("http://") || self.base.starts_with("https://")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            default_limit: default_limit(),
            min_query_len: default_min_query_len(),
        }
    }
}

fn default_threshold() -> f64 {
    0.4
}
fn default_limit() -> usize {
    20
}
fn default_min_query_len() -> usize {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubjectiveConfig {
    #[serde(default = "default_subjective_path")]
    pub path: PathBuf,
}

impl Default for SubjectiveConfig {
    fn default() -> Self {
        Self {
            path: default_subjective_path(),
        }
    }
}

fn default_subjective_path() -> PathBuf {
    PathBuf::from("./.halilit/subjective.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

impl Config {
    /// All defaults, reading catalog data from `base`.
    pub fn minimal(base: &str) -> Self {
        Self {
            data: DataConfig {
                base: base.to_string(),
                index_file: default_index_file(),
                search_index_file: default_search_index_file(),
                timeout_secs: None,
            },
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            subjective: SubjectiveConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.data.base.trim().is_empty() {
        anyhow::bail!("data.base must not be empty");
    }

    if !(0.0..=1.0).contains(&config.search.threshold) {
        anyhow::bail!("search.threshold must be in [0.0, 1.0]");
    }

    if config.search.default_limit < 1 {
        anyhow::bail!("search.default_limit must be >= 1");
    }

    if config.watch.enabled && config.data.is_remote() {
        anyhow::bail!(
            "watch.enabled requires a local data directory, but data.base is '{}'",
            config.data.base
        );
    }

    Ok(())
}
