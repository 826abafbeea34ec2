// src/sources/youtube.rs
//! YouTube (video source): `videos?chart=mostPopular`, optionally per category.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{non_empty_text, tag_set, FetchRequest, Post, SourceAdapter, SourceMeta, SourceQuery};
use crate::routing::SourceId;

const API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const MAX_RESULTS: usize = 50;

pub struct YoutubeAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumb>,
    medium: Option<Thumb>,
    default: Option<Thumb>,
}

#[derive(Debug, Deserialize)]
struct Thumb {
    url: String,
}

// The API returns counters as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

impl YoutubeAdapter {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl SourceAdapter for YoutubeAdapter {
    fn source(&self) -> SourceId {
        SourceId::Video
    }

    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<Post>> {
        let SourceQuery::Video { category_id } = &req.query else {
            return Err(anyhow!("youtube adapter got {:?}", req.query));
        };
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("YOUTUBE_API_KEY is not set"))?;

        let max = req.limit.clamp(1, MAX_RESULTS).to_string();
        let mut params = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", req.region.as_str()),
            ("maxResults", max.as_str()),
            ("key", key),
        ];
        if let Some(cat) = category_id {
            params.push(("videoCategoryId", cat.as_str()));
        }

        let body = self
            .http
            .get(API_URL)
            .query(&params)
            .send()
            .await
            .context("youtube request")?
            .error_for_status()
            .with_context(|| format!("youtube status (category {category_id:?})"))?
            .text()
            .await
            .context("youtube .text()")?;

        parse_videos(&body, &req.tags)
    }
}

/// Like ratio scaled so that 5% likes/views saturates at 1.0.
pub fn relevance(views: u64, likes: u64) -> f32 {
    if views == 0 {
        return 0.0;
    }
    ((likes as f64 / views as f64) * 20.0).min(1.0) as f32
}

pub fn parse_videos(body: &str, tags: &[String]) -> Result<Vec<Post>> {
    let list: VideoList = serde_json::from_str(body).context("parsing youtube videos")?;
    let out = list
        .items
        .into_iter()
        .map(|v| {
            let views = parse_count(v.statistics.view_count.as_deref());
            let likes = parse_count(v.statistics.like_count.as_deref());
            let thumbs = v.snippet.thumbnails;
            let thumbnail = thumbs
                .high
                .or(thumbs.medium)
                .or(thumbs.default)
                .map(|t| t.url);
            Post {
                source: SourceId::Video,
                uid: format!("youtube_{}", v.id),
                title: super::normalize_text(&v.snippet.title),
                content: non_empty_text(v.snippet.description.as_deref()),
                author: v.snippet.channel_title,
                url: Some(format!("https://www.youtube.com/watch?v={}", v.id)),
                tags: tag_set(tags),
                created_at: v.snippet.published_at.unwrap_or_default(),
                relevance_score: Some(relevance(views, likes)),
                metadata: SourceMeta::Video {
                    video_id: v.id,
                    view_count: views,
                    like_count: likes,
                    thumbnail,
                },
            }
        })
        .collect();
    Ok(out)
}

fn parse_count(s: Option<&str>) -> u64 {
    s.and_then(|x| x.parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEOS: &str = r#"{
      "kind": "youtube#videoListResponse",
      "items": [
        { "id": "vid1",
          "snippet": { "title": "Trailer", "description": "New  trailer\nout",
                       "publishedAt": "2024-05-01T10:00:00Z", "channelTitle": "Studio",
                       "thumbnails": { "high": { "url": "https://i.ytimg.com/h.jpg" } } },
          "statistics": { "viewCount": "1000", "likeCount": "10" } },
        { "id": "vid2",
          "snippet": { "title": "No stats", "publishedAt": "2024-05-02T10:00:00Z",
                       "channelTitle": "Someone", "thumbnails": {} } }
      ]
    }"#;

    #[test]
    fn parses_videos() {
        let posts = parse_videos(VIDEOS, &["movies".into()]).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].uid, "youtube_vid1");
        assert_eq!(posts[0].content.as_deref(), Some("New trailer out"));
        assert_eq!(
            posts[0].url.as_deref(),
            Some("https://www.youtube.com/watch?v=vid1")
        );
        assert!((posts[0].relevance_score.unwrap() - 0.2).abs() < 1e-6);
        match &posts[0].metadata {
            SourceMeta::Video {
                view_count,
                thumbnail,
                ..
            } => {
                assert_eq!(*view_count, 1000);
                assert_eq!(thumbnail.as_deref(), Some("https://i.ytimg.com/h.jpg"));
            }
            other => panic!("unexpected meta {other:?}"),
        }
        assert_eq!(posts[1].relevance_score, Some(0.0));
    }

    #[test]
    fn relevance_saturates() {
        assert_eq!(relevance(0, 5), 0.0);
        assert_eq!(relevance(100, 50), 1.0);
    }
}
