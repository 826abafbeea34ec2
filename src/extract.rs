// src/extract.rs
//! Natural-language → tags extraction (optional).
//!
//! The engine only calls this when a request carries a free-text query and no
//! tags. Any failure is absorbed by the caller and treated as "no tags".

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Credentials, ExtractorConfig, HttpConfig, DEFAULT_SUMMARY_LANGUAGE};
use crate::tags;

#[async_trait]
pub trait TagExtractor: Send + Sync {
    async fn extract_tags(&self, query: &str) -> Result<Vec<String>>;
    fn provider_name(&self) -> &'static str;
}

pub type DynExtractor = Arc<dyn TagExtractor>;

/// Used when extraction is off: always fails, so the engine falls back.
pub struct DisabledExtractor;

#[async_trait]
impl TagExtractor for DisabledExtractor {
    async fn extract_tags(&self, _query: &str) -> Result<Vec<String>> {
        bail!("tag extraction is disabled")
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Turns a handful of news headlines into a short description (trends enrichment).
#[async_trait]
pub trait TrendSummarizer: Send + Sync {
    async fn summarize(&self, headlines: &[String]) -> Result<String>;
}

pub type DynSummarizer = Arc<dyn TrendSummarizer>;

/// OpenAI Chat Completions client. Requires `OPENAI_API_KEY`.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    summary_language: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
            summary_language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
        }
    }

    pub fn with_summary_language(mut self, language: impl Into<String>) -> Self {
        self.summary_language = language.into();
        self
    }

    async fn chat(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            max_tokens,
        };

        let body: Resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?
            .error_for_status()
            .context("openai status")?
            .json()
            .await
            .context("openai json")?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("openai returned no choices"))
    }
}

#[async_trait]
impl TagExtractor for OpenAiClient {
    async fn extract_tags(&self, query: &str) -> Result<Vec<String>> {
        let sys = format!(
            "{} Return ONLY a JSON array of tag strings, no explanation.",
            tags::predefined_tags_prompt()
        );
        let content = self.chat(&sys, query, 60).await?;
        Ok(parse_tag_list(&content))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl TrendSummarizer for OpenAiClient {
    async fn summarize(&self, headlines: &[String]) -> Result<String> {
        if headlines.is_empty() {
            bail!("no headlines to summarize");
        }
        let user = summary_prompt(&self.summary_language, headlines);
        let out = self
            .chat("Only return the answer, no explanation.", &user, 120)
            .await?;
        let out = out.trim();
        if out.is_empty() {
            bail!("openai returned an empty summary");
        }
        Ok(out.to_string())
    }
}

pub fn summary_prompt(language: &str, headlines: &[String]) -> String {
    format!(
        "Generate a short {language} description for the following news headlines:\n- {}",
        headlines.join("\n- ")
    )
}

/// Accept a JSON array (optionally inside a ```json fence) or a comma/newline list.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(v) = serde_json::from_str::<Vec<String>>(trimmed) {
        return clean(v);
    }
    clean(
        trimmed
            .split([',', '\n'])
            .map(|s| s.trim_matches(|c: char| c == '"' || c == '\'' || c == '-' || c.is_whitespace()))
            .map(str::to_string)
            .collect(),
    )
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Build the extractor according to config and credentials.
pub fn build_extractor(
    cfg: &ExtractorConfig,
    http_cfg: &HttpConfig,
    creds: &Credentials,
) -> Result<DynExtractor> {
    if !cfg.enabled {
        return Ok(Arc::new(DisabledExtractor));
    }
    let Some(key) = creds.openai_api_key.clone() else {
        tracing::warn!(target: "engine", "extractor enabled but OPENAI_API_KEY is missing; disabling");
        return Ok(Arc::new(DisabledExtractor));
    };
    let http = crate::sources::build_http_client(http_cfg)?;
    Ok(Arc::new(OpenAiClient::new(http, key, cfg.model.clone())))
}

/// Summarizer for trend enrichment, or `None` when summaries are off or no key is set.
pub fn build_summarizer(
    cfg: &ExtractorConfig,
    http: reqwest::Client,
    creds: &Credentials,
) -> Option<DynSummarizer> {
    if !cfg.summarize_trends {
        return None;
    }
    let Some(key) = creds.openai_api_key.clone() else {
        tracing::warn!(target: "sources", "trend summaries enabled but OPENAI_API_KEY is missing; skipping");
        return None;
    };
    Some(Arc::new(
        OpenAiClient::new(http, key, cfg.model.clone())
            .with_summary_language(cfg.summary_language.clone()),
    ))
}
