// src/sources/mod.rs
//! Source adapters: the post model, the `SourceAdapter` capability, and the
//! registry the fan-out executor dispatches through.

pub mod huggingface;
pub mod reddit;
pub mod trends;
pub mod youtube;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, Credentials, HttpConfig};
use crate::routing::SourceId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub source: SourceId,
    pub uid: String,
    pub title: String,
    pub content: Option<String>,
    pub author: String,
    pub url: Option<String>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub relevance_score: Option<f32>,
    pub metadata: SourceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceMeta {
    Video {
        video_id: String,
        view_count: u64,
        like_count: u64,
        thumbnail: Option<String>,
    },
    Forum {
        post_id: String,
        permalink: Option<String>,
        upvote_ratio: Option<f32>,
        score: i64,
        num_comments: u64,
    },
    Paper {
        paper_id: String,
        upvotes: u64,
        thumbnail: Option<String>,
        num_comments: u64,
    },
    Trend {
        search_volume: Option<u64>,
        thumbnail: Option<String>,
        news_page_token: Option<String>,
        /// Provider category names, as reported (not vocabulary tags).
        #[serde(default)]
        categories: Vec<String>,
    },
}

/// One call's worth of source-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceQuery {
    Forum { subreddit: String },
    Video { category_id: Option<String> },
    PaperIndex { search_query: String },
    Trends { category_id: Option<String> },
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub query: SourceQuery,
    /// Tags assigned to the source; adapters stamp them on posts.
    pub tags: Vec<String>,
    pub region: String,
    pub limit: usize,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> SourceId;
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<Post>>;
}

/// Adapters by source. A planned source without an adapter is a failed source.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.source(), adapter);
    }

    pub fn get(&self, source: SourceId) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(&source)
    }

    pub fn sources(&self) -> Vec<SourceId> {
        let mut v: Vec<SourceId> = self.adapters.keys().copied().collect();
        v.sort();
        v
    }

    /// Live HTTP adapters for all four sources, sharing one client.
    pub fn from_config(cfg: &AppConfig, creds: &Credentials) -> Result<Self> {
        let http = build_http_client(&cfg.http)?;
        let summarizer = crate::extract::build_summarizer(&cfg.extractor, http.clone(), creds);
        Ok(Self::new()
            .with(Arc::new(reddit::RedditAdapter::new(
                http.clone(),
                creds.reddit_client.clone(),
                creds.reddit_token.clone(),
                cfg.http.user_agent.clone(),
            )))
            .with(Arc::new(youtube::YoutubeAdapter::new(
                http.clone(),
                creds.youtube_api_key.clone(),
            )))
            .with(Arc::new(huggingface::HuggingFaceAdapter::new(http.clone())))
            .with(Arc::new(
                trends::TrendsAdapter::new(http, creds.serp_token.clone())
                    .with_summarizer(summarizer),
            )))
    }
}

pub fn build_http_client(cfg: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("building http client")
}

/// Normalize free text from a source: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }
    out
}

/// `Some(normalized)` or `None` when nothing is left.
pub(crate) fn non_empty_text(s: Option<&str>) -> Option<String> {
    s.map(normalize_text).filter(|t| !t.is_empty())
}

/// Stable fallback uid for items without a native id.
pub(crate) fn content_uid(source: SourceId, parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut out = format!("{source}_");
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub(crate) fn tag_set(tags: &[String]) -> BTreeSet<String> {
    tags.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        assert_eq!(
            normalize_text("  <p>Hello&nbsp;&amp;\n\n world</p> "),
            "Hello & world"
        );
    }

    #[test]
    fn normalize_text_keeps_comparison_signs() {
        assert_eq!(normalize_text("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn content_uid_is_stable_and_prefixed() {
        let a = content_uid(SourceId::Trends, &["q", "1"]);
        let b = content_uid(SourceId::Trends, &["q", "1"]);
        let c = content_uid(SourceId::Trends, &["q1", ""]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("google_trends_"));
    }

    #[test]
    fn meta_serializes_with_kind_tag() {
        let m = SourceMeta::Paper {
            paper_id: "2401.1".into(),
            upvotes: 3,
            thumbnail: None,
            num_comments: 0,
        };
        let v = serde_json::to_value(m).unwrap();
        assert_eq!(v["kind"], "paper");
    }
}
