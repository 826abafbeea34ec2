// src/sources/trends.rs
//! Google Trends "trending now" through SerpApi (trends source).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

use super::{
    content_uid, non_empty_text, tag_set, FetchRequest, Post, SourceAdapter, SourceMeta,
    SourceQuery,
};
use crate::extract::{DynSummarizer, TrendSummarizer};
use crate::routing::SourceId;
use crate::tags;

const API_URL: &str = "https://serpapi.com/search.json";
/// Only the head of the trending list is worth returning.
const TOP_N: usize = 5;
/// Headlines fed to the summarizer per trend.
const NEWS_HEADLINES: usize = 5;

pub struct TrendsAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
    summarizer: Option<DynSummarizer>,
}

#[derive(Debug, Deserialize)]
struct TrendingNow {
    #[serde(default)]
    search_metadata: SearchMetadata,
    #[serde(default)]
    trending_searches: Vec<TrendingSearch>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMetadata {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct TrendingSearch {
    query: String,
    #[serde(default)]
    start_timestamp: i64,
    #[serde(default)]
    search_volume: Option<u64>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    news_page_token: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewsPage {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Headlines behind one trending search (`google_trends_news`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendNews {
    pub headlines: Vec<String>,
    /// Thumbnail of the first article.
    pub thumbnail: Option<String>,
}

impl TrendsAdapter {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            summarizer: None,
        }
    }

    /// Enable news-based descriptions of each trend.
    pub fn with_summarizer(mut self, summarizer: Option<DynSummarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    async fn fetch_news(&self, key: &str, page_token: &str) -> Result<TrendNews> {
        let body = self
            .http
            .get(API_URL)
            .query(&[
                ("engine", "google_trends_news"),
                ("page_token", page_token),
                ("api_key", key),
            ])
            .send()
            .await
            .context("serpapi news request")?
            .error_for_status()
            .context("serpapi news status")?
            .text()
            .await
            .context("serpapi news .text()")?;
        parse_trend_news(&body)
    }

    /// Best effort: any failure leaves the post as parsed.
    async fn enrich(&self, key: &str, summarizer: &dyn TrendSummarizer, post: &mut Post) {
        let token = match &post.metadata {
            SourceMeta::Trend {
                news_page_token: Some(t),
                ..
            } if !t.is_empty() => t.clone(),
            _ => return,
        };
        match self.fetch_news(key, &token).await {
            Ok(news) => apply_news(post, news, summarizer).await,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(target: "sources", uid = %post.uid, %error, "trend news lookup failed");
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for TrendsAdapter {
    fn source(&self) -> SourceId {
        SourceId::Trends
    }

    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<Post>> {
        let SourceQuery::Trends { category_id } = &req.query else {
            return Err(anyhow!("trends adapter got {:?}", req.query));
        };
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("SERP_TOKEN is not set"))?;

        let mut params = vec![
            ("engine", "google_trends_trending_now"),
            ("geo", req.region.as_str()),
            ("hours", "24"),
            ("api_key", key),
        ];
        if let Some(cat) = category_id {
            params.push(("category_id", cat.as_str()));
        }

        let body = self
            .http
            .get(API_URL)
            .query(&params)
            .send()
            .await
            .context("serpapi request")?
            .error_for_status()
            .context("serpapi status")?
            .text()
            .await
            .context("serpapi .text()")?;

        let mut posts = parse_trending_now(&body, &req.tags, &req.region)?;
        posts.truncate(req.limit.min(TOP_N));

        if let Some(summarizer) = self.summarizer.as_deref() {
            join_all(
                posts
                    .iter_mut()
                    .map(|post| self.enrich(key, summarizer, post)),
            )
            .await;
        }
        Ok(posts)
    }
}

pub fn parse_trending_now(body: &str, assigned: &[String], region: &str) -> Result<Vec<Post>> {
    let resp: TrendingNow = serde_json::from_str(body).context("parsing serpapi trending now")?;
    let search_id = resp.search_metadata.id;

    let out = resp
        .trending_searches
        .into_iter()
        .take(TOP_N)
        .map(|item| {
            let categories: Vec<String> = item
                .categories
                .iter()
                .map(|c| c.name.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            let known: BTreeSet<String> = categories
                .iter()
                .map(|c| category_tag(c))
                .filter(|t| tags::is_known(t))
                .collect();
            let post_tags = if known.is_empty() { tag_set(assigned) } else { known };
            let uid = if search_id.is_empty() {
                content_uid(
                    SourceId::Trends,
                    &[&item.query, &item.start_timestamp.to_string()],
                )
            } else {
                format!("{search_id}_{}_{}", item.start_timestamp, query_slug(&item.query))
            };
            let url = reqwest::Url::parse_with_params(
                "https://trends.google.com/trends/explore",
                &[("q", item.query.as_str()), ("geo", region)],
            )
            .ok()
            .map(String::from);

            Post {
                source: SourceId::Trends,
                uid,
                title: super::normalize_text(&item.query),
                content: None,
                author: "Google Trends".to_string(),
                url,
                tags: post_tags,
                created_at: DateTime::<Utc>::from_timestamp(item.start_timestamp, 0)
                    .unwrap_or_default(),
                relevance_score: None,
                metadata: SourceMeta::Trend {
                    search_volume: item.search_volume,
                    thumbnail: item.thumbnail,
                    news_page_token: item.news_page_token,
                    categories,
                },
            }
        })
        .collect();
    Ok(out)
}

/// "Climate" → "climate", "TV Shows" → "tv_shows".
fn category_tag(name: &str) -> String {
    tags::normalize_tag(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn query_slug(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub fn parse_trend_news(body: &str) -> Result<TrendNews> {
    let page: NewsPage = serde_json::from_str(body).context("parsing serpapi trends news")?;
    let thumbnail = page
        .news
        .first()
        .and_then(|n| n.thumbnail.clone())
        .filter(|t| !t.is_empty());
    let headlines = page
        .news
        .iter()
        .filter_map(|n| non_empty_text(n.title.as_deref()))
        .take(NEWS_HEADLINES)
        .collect();
    Ok(TrendNews {
        headlines,
        thumbnail,
    })
}

/// Put the news thumbnail and a generated description on a trend post.
pub async fn apply_news(post: &mut Post, news: TrendNews, summarizer: &dyn TrendSummarizer) {
    if let (Some(thumb), SourceMeta::Trend { thumbnail, .. }) = (news.thumbnail, &mut post.metadata)
    {
        *thumbnail = Some(thumb);
    }
    if news.headlines.is_empty() {
        return;
    }
    match summarizer.summarize(&news.headlines).await {
        Ok(text) => post.content = non_empty_text(Some(&text)),
        Err(e) => {
            let error = format!("{e:#}");
            warn!(target: "sources", uid = %post.uid, %error, "trend summary failed");
        }
    }
}
