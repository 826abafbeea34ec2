// src/sources/reddit.rs
//! Reddit (forum source): top posts of the day for one subreddit.
//! App-only OAuth (client credentials), then `/r/{sub}/top`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{non_empty_text, tag_set, FetchRequest, Post, SourceAdapter, SourceMeta, SourceQuery};
use crate::routing::SourceId;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const MAX_LIMIT: usize = 100;

pub struct RedditAdapter {
    http: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct TokenResp {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: String,
    title: String,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    upvote_ratio: Option<f32>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
}

impl RedditAdapter {
    pub fn new(
        http: reqwest::Client,
        client_id: Option<String>,
        client_secret: Option<String>,
        user_agent: String,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            user_agent,
        }
    }

    async fn access_token(&self) -> Result<String> {
        let (id, secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(anyhow!("REDDIT_CLIENT / REDDIT_TOKEN are not set")),
        };
        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(id, Some(secret))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("reddit token request")?
            .error_for_status()
            .context("reddit token status")?;
        let tok: TokenResp = resp.json().await.context("reddit token json")?;
        Ok(tok.access_token)
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn source(&self) -> SourceId {
        SourceId::Forum
    }

    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<Post>> {
        let SourceQuery::Forum { subreddit } = &req.query else {
            return Err(anyhow!("reddit adapter got {:?}", req.query));
        };
        let token = self.access_token().await?;
        let limit = req.limit.clamp(1, MAX_LIMIT).to_string();

        let body = self
            .http
            .get(format!("{API_BASE}/r/{subreddit}/top"))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("t", "day"), ("limit", limit.as_str()), ("raw_json", "1")])
            .send()
            .await
            .with_context(|| format!("reddit r/{subreddit} request"))?
            .error_for_status()
            .with_context(|| format!("reddit r/{subreddit} status"))?
            .text()
            .await
            .context("reddit .text()")?;

        parse_listing(&body, &req.tags)
    }
}

/// Map a `/top` listing to posts.
pub fn parse_listing(body: &str, tags: &[String]) -> Result<Vec<Post>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing")?;
    let out = listing
        .data
        .children
        .into_iter()
        .map(|c| {
            let p = c.data;
            let relevance = p
                .upvote_ratio
                .map(|r| (r * p.score as f32 / 100.0).clamp(0.0, 1.0))
                .unwrap_or(0.0);
            let permalink = p
                .permalink
                .as_deref()
                .map(|l| format!("https://reddit.com{l}"));
            Post {
                source: SourceId::Forum,
                uid: format!("reddit_{}", p.id),
                title: super::normalize_text(&p.title),
                content: non_empty_text(p.selftext.as_deref()),
                author: p
                    .author
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| format!("r/{}", p.subreddit)),
                url: p.url.or_else(|| permalink.clone()),
                tags: tag_set(tags),
                created_at: DateTime::<Utc>::from_timestamp(p.created_utc as i64, 0)
                    .unwrap_or_default(),
                relevance_score: Some(relevance),
                metadata: SourceMeta::Forum {
                    post_id: p.id,
                    permalink,
                    upvote_ratio: p.upvote_ratio,
                    score: p.score,
                    num_comments: p.num_comments,
                },
            }
        })
        .collect();
    Ok(out)
}
