// src/sources/huggingface.rs
//! Hugging Face daily papers (paper-index source).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{non_empty_text, tag_set, FetchRequest, Post, SourceAdapter, SourceMeta, SourceQuery};
use crate::routing::SourceId;

const API_URL: &str = "https://huggingface.co/api/daily_papers";
const MAX_LIMIT: usize = 100;

pub struct HuggingFaceAdapter {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyPaper {
    paper: Paper,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    upvotes: u64,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: String,
}

impl HuggingFaceAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SourceAdapter for HuggingFaceAdapter {
    fn source(&self) -> SourceId {
        SourceId::PaperIndex
    }

    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<Post>> {
        let SourceQuery::PaperIndex { search_query } = &req.query else {
            return Err(anyhow!("huggingface adapter got {:?}", req.query));
        };
        // The daily list has no query filter; the query only travels in logs/metadata.
        tracing::debug!(target: "sources", %search_query, "fetching daily papers");

        let limit = req.limit.clamp(1, MAX_LIMIT).to_string();
        let body = self
            .http
            .get(API_URL)
            .query(&[("limit", limit.as_str())])
            .send()
            .await
            .context("huggingface request")?
            .error_for_status()
            .context("huggingface status")?
            .text()
            .await
            .context("huggingface .text()")?;

        let mut posts = parse_daily_papers(&body, &req.tags)?;
        posts.truncate(req.limit);
        Ok(posts)
    }
}

/// Relevance = upvotes relative to the most upvoted paper in the batch.
pub fn parse_daily_papers(body: &str, tags: &[String]) -> Result<Vec<Post>> {
    let papers: Vec<DailyPaper> =
        serde_json::from_str(body).context("parsing huggingface daily papers")?;
    let max_upvotes = papers.iter().map(|p| p.paper.upvotes).max().unwrap_or(0);

    let out = papers
        .into_iter()
        .map(|d| {
            let p = d.paper;
            let title = p.title.or(d.title).unwrap_or_default();
            let author = p
                .authors
                .iter()
                .map(|a| a.name.as_str())
                .filter(|n| !n.is_empty())
                .take(3)
                .collect::<Vec<_>>()
                .join(", ");
            let relevance = if max_upvotes == 0 {
                0.0
            } else {
                p.upvotes as f32 / max_upvotes as f32
            };
            Post {
                source: SourceId::PaperIndex,
                uid: format!("huggingface_{}", p.id),
                title: super::normalize_text(&title),
                content: non_empty_text(p.summary.as_deref()),
                author,
                url: Some(format!("https://huggingface.co/papers/{}", p.id)),
                tags: tag_set(tags),
                created_at: p.published_at.or(d.published_at).unwrap_or_default(),
                relevance_score: Some(relevance),
                metadata: SourceMeta::Paper {
                    paper_id: p.id,
                    upvotes: p.upvotes,
                    thumbnail: d.thumbnail,
                    num_comments: d.num_comments,
                },
            }
        })
        .collect();
    Ok(out)
}
