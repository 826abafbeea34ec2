// src/config.rs
//! Service configuration (TOML) + credentials (env).
//!
//! Resolution order for the config file:
//! 1) `$TRENDING_CONFIG_PATH` (must exist)
//! 2) `config/trending.toml`
//! 3) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::planner::DEFAULT_FALLBACK_COMMUNITY;

pub const DEFAULT_CONFIG_PATH: &str = "config/trending.toml";
pub const ENV_CONFIG_PATH: &str = "TRENDING_CONFIG_PATH";

pub const DEFAULT_REGION: &str = "VN";
pub const DEFAULT_MAX_RESULTS: usize = 20;
pub const DEFAULT_SUMMARY_LANGUAGE: &str = "Vietnamese";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub http: HttpConfig,
    pub extractor: ExtractorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_region: String,
    pub default_max_results: usize,
    pub fallback_community: String,
    /// Run sources concurrently (true) or one after another.
    pub parallel: bool,
    pub source_timeout_secs: u64,
    /// Optional TOML route table replacing the built-in one.
    pub routes_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
            default_max_results: DEFAULT_MAX_RESULTS,
            fallback_community: DEFAULT_FALLBACK_COMMUNITY.to_string(),
            parallel: true,
            source_timeout_secs: 30,
            routes_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "trending-crawlers/0.1".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub enabled: bool,
    pub model: String,
    /// Describe each trending search from its news headlines (needs OPENAI_API_KEY).
    pub summarize_trends: bool,
    pub summary_language: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-4o-mini".to_string(),
            summarize_trends: false,
            summary_language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        let e = &mut self.engine;
        e.default_region = e.default_region.trim().to_ascii_uppercase();
        if e.default_region.is_empty() {
            e.default_region = DEFAULT_REGION.to_string();
        }
        if e.default_max_results == 0 {
            e.default_max_results = DEFAULT_MAX_RESULTS;
        }
        if e.fallback_community.trim().is_empty() {
            e.fallback_community = DEFAULT_FALLBACK_COMMUNITY.to_string();
        }
        if e.source_timeout_secs == 0 {
            e.source_timeout_secs = EngineConfig::default().source_timeout_secs;
        }
        if self.extractor.summary_language.trim().is_empty() {
            self.extractor.summary_language = DEFAULT_SUMMARY_LANGUAGE.to_string();
        }
    }
}

/// API credentials, read from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub youtube_api_key: Option<String>,
    pub reddit_client: Option<String>,
    pub reddit_token: Option<String>,
    pub serp_token: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            youtube_api_key: env_non_empty("YOUTUBE_API_KEY"),
            reddit_client: env_non_empty("REDDIT_CLIENT"),
            reddit_token: env_non_empty("REDDIT_TOKEN"),
            serp_token: env_non_empty("SERP_TOKEN"),
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
        }
    }
}

// Never print secrets; only which ones are present.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("youtube_api_key", &self.youtube_api_key.is_some())
            .field("reddit_client", &self.reddit_client.is_some())
            .field("reddit_token", &self.reddit_token.is_some())
            .field("serp_token", &self.serp_token.is_some())
            .field("openai_api_key", &self.openai_api_key.is_some())
            .finish()
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
