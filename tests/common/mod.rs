// tests/common/mod.rs
// Stub adapters + post builders shared by integration tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use trending_crawlers::config::EngineConfig;
use trending_crawlers::routing::RouteTable;
use trending_crawlers::sources::{FetchRequest, SourceRegistry};
use trending_crawlers::{Post, SourceAdapter, SourceId, SourceMeta, TrendingEngine};

pub fn post(source: SourceId, uid: &str) -> Post {
    Post {
        source,
        uid: uid.to_string(),
        title: format!("title {uid}"),
        content: None,
        author: "stub".to_string(),
        url: None,
        tags: BTreeSet::new(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        relevance_score: Some(0.5),
        metadata: SourceMeta::Trend {
            search_volume: None,
            thumbnail: None,
            news_page_token: None,
            categories: Vec::new(),
        },
    }
}

pub enum Behavior {
    Posts(Vec<Post>),
    Fail(&'static str),
    Delayed(Duration, Vec<Post>),
}

pub struct StubAdapter {
    source: SourceId,
    behavior: Behavior,
    pub calls: Arc<Mutex<Vec<FetchRequest>>>,
}

impl StubAdapter {
    pub fn new(source: SourceId, behavior: Behavior) -> Self {
        Self {
            source,
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok(source: SourceId, uids: &[&str]) -> Self {
        Self::new(
            source,
            Behavior::Posts(uids.iter().map(|u| post(source, u)).collect()),
        )
    }

    pub fn failing(source: SourceId) -> Self {
        Self::new(source, Behavior::Fail("upstream exploded"))
    }
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch(&self, req: &FetchRequest) -> anyhow::Result<Vec<Post>> {
        self.calls.lock().expect("calls mutex").push(req.clone());
        match &self.behavior {
            Behavior::Posts(p) => Ok(p.clone()),
            Behavior::Fail(msg) => Err(anyhow::anyhow!(*msg)),
            Behavior::Delayed(d, p) => {
                tokio::time::sleep(*d).await;
                Ok(p.clone())
            }
        }
    }
}

pub fn engine_with(adapters: Vec<StubAdapter>) -> TrendingEngine {
    engine_with_settings(adapters, EngineConfig::default())
}

pub fn engine_with_settings(adapters: Vec<StubAdapter>, settings: EngineConfig) -> TrendingEngine {
    let mut registry = SourceRegistry::new();
    for a in adapters {
        registry.register(Arc::new(a));
    }
    TrendingEngine::new(RouteTable::builtin(), registry, settings)
}

pub fn uids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.uid.clone()).collect()
}
