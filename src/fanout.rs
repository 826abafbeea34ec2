// src/fanout.rs
//! Fan-out executor + result normalizer/deduplicator.
//!
//! Every planned source is invoked independently. Errors, timeouts and
//! missing adapters are logged and counted, and the source contributes zero
//! posts. Results land in one slot per plan position, so the merged sequence
//! follows plan order no matter which source finishes first.

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::planner::{DispatchConfig, SourceParams};
use crate::routing::SourceId;
use crate::sources::{FetchRequest, Post, SourceQuery, SourceRegistry};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fanout_source_calls_total", "Adapter fetch calls issued.");
        describe_counter!(
            "fanout_source_errors_total",
            "Adapter fetch calls that failed or timed out."
        );
        describe_counter!("fanout_posts_total", "Posts returned by adapters.");
        describe_counter!(
            "fanout_dedup_dropped_total",
            "Posts dropped as duplicate uids."
        );
        describe_histogram!("fanout_source_ms", "Adapter fetch latency in milliseconds.");
    });
}

#[derive(Debug, Clone)]
pub struct FanoutContext {
    pub region: String,
    /// Per-source result budget.
    pub limit: usize,
    pub fallback_community: String,
    pub parallel: bool,
    pub source_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: SourceId,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct FanoutOutcome {
    /// Posts of all sources, concatenated in plan order (not yet deduplicated).
    pub posts: Vec<Post>,
    pub failed: Vec<SourceFailure>,
    /// Sources that produced at least one successful call.
    pub succeeded: Vec<SourceId>,
}

#[derive(Debug, Default)]
struct SourceRun {
    posts: Vec<Post>,
    errors: Vec<String>,
    ok_calls: usize,
}

/// Turn one plan entry into the adapter calls it needs. Video with several
/// categories is called once per category and splits the budget evenly.
pub fn expand(cfg: &DispatchConfig, ctx: &FanoutContext) -> Vec<FetchRequest> {
    let request = |query: SourceQuery, limit: usize| FetchRequest {
        query,
        tags: cfg.assigned_tags.clone(),
        region: ctx.region.clone(),
        limit,
    };

    match cfg.params(&ctx.fallback_community) {
        SourceParams::Forum { subreddit } => {
            vec![request(SourceQuery::Forum { subreddit }, ctx.limit)]
        }
        SourceParams::Video { category_ids } if category_ids.is_empty() => {
            vec![request(SourceQuery::Video { category_id: None }, ctx.limit)]
        }
        SourceParams::Video { category_ids } => {
            let per = (ctx.limit / category_ids.len()).max(1);
            category_ids
                .into_iter()
                .map(|c| {
                    request(
                        SourceQuery::Video {
                            category_id: Some(c),
                        },
                        per,
                    )
                })
                .collect()
        }
        SourceParams::PaperIndex { search_query } => {
            vec![request(SourceQuery::PaperIndex { search_query }, ctx.limit)]
        }
        SourceParams::Trends { category_id } => {
            vec![request(SourceQuery::Trends { category_id }, ctx.limit)]
        }
    }
}

async fn run_source(
    cfg: &DispatchConfig,
    registry: &SourceRegistry,
    ctx: &FanoutContext,
) -> SourceRun {
    let source = cfg.source;
    let Some(adapter) = registry.get(source) else {
        warn!(target: "fanout", %source, "no adapter registered for planned source");
        counter!("fanout_source_errors_total", "source" => source.as_str()).increment(1);
        return SourceRun {
            errors: vec!["no adapter registered".to_string()],
            ..Default::default()
        };
    };

    let requests = expand(cfg, ctx);
    let calls = requests.iter().map(|req| async move {
        counter!("fanout_source_calls_total", "source" => source.as_str()).increment(1);
        let t0 = Instant::now();
        let res = tokio::time::timeout(ctx.source_timeout, adapter.fetch(req)).await;
        histogram!("fanout_source_ms", "source" => source.as_str())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        match res {
            Ok(Ok(posts)) => Ok(posts),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(_) => Err(format!("timed out after {:?}", ctx.source_timeout)),
        }
    });
    let results = if ctx.parallel {
        join_all(calls).await
    } else {
        let mut out = Vec::with_capacity(requests.len());
        for call in calls {
            out.push(call.await);
        }
        out
    };

    let mut run = SourceRun::default();
    for (req, res) in requests.iter().zip(results) {
        match res {
            Ok(mut posts) => {
                debug!(target: "fanout", %source, query = ?req.query, n = posts.len(), "source returned");
                counter!("fanout_posts_total", "source" => source.as_str())
                    .increment(posts.len() as u64);
                run.ok_calls += 1;
                run.posts.append(&mut posts);
            }
            Err(error) => {
                warn!(target: "fanout", %source, query = ?req.query, %error, "source failed");
                counter!("fanout_source_errors_total", "source" => source.as_str()).increment(1);
                run.errors.push(error);
            }
        }
    }
    run
}

pub async fn execute(
    plan: &[DispatchConfig],
    registry: &SourceRegistry,
    ctx: &FanoutContext,
) -> FanoutOutcome {
    ensure_metrics_described();

    // One slot per plan position.
    let runs: Vec<SourceRun> = if ctx.parallel {
        join_all(plan.iter().map(|cfg| run_source(cfg, registry, ctx))).await
    } else {
        let mut v = Vec::with_capacity(plan.len());
        for cfg in plan {
            v.push(run_source(cfg, registry, ctx).await);
        }
        v
    };

    let mut out = FanoutOutcome::default();
    for (cfg, mut run) in plan.iter().zip(runs) {
        if run.ok_calls > 0 {
            out.succeeded.push(cfg.source);
        } else {
            out.failed.push(SourceFailure {
                source: cfg.source,
                error: run.errors.join("; "),
            });
        }
        out.posts.append(&mut run.posts);
    }
    out
}

/// Enforce post invariants: relevance in [0, 1] (NaN dropped), trimmed text fields.
pub fn normalize_post(mut post: Post) -> Post {
    post.relevance_score = post
        .relevance_score
        .filter(|s| !s.is_nan())
        .map(|s| s.clamp(0.0, 1.0));
    post.title = post.title.trim().to_string();
    post.author = post.author.trim().to_string();
    post.content = post
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    post
}

/// First occurrence of each uid wins; order is preserved.
pub fn dedupe(posts: Vec<Post>) -> Vec<Post> {
    let mut seen: HashSet<String> = HashSet::with_capacity(posts.len());
    posts
        .into_iter()
        .filter(|p| seen.insert(p.uid.clone()))
        .collect()
}

/// Normalize every post, then dedupe. Returns (posts, dropped duplicates).
pub fn normalize_and_dedupe(posts: Vec<Post>) -> (Vec<Post>, usize) {
    let before = posts.len();
    let out = dedupe(posts.into_iter().map(normalize_post).collect());
    let dropped = before - out.len();
    counter!("fanout_dedup_dropped_total").increment(dropped as u64);
    (out, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceMeta;
    use chrono::Utc;
    use std::collections::{BTreeSet, HashSet};

    fn post(uid: &str, source: SourceId) -> Post {
        Post {
            source,
            uid: uid.to_string(),
            title: format!(" {uid} "),
            content: Some("   ".into()),
            author: "a".into(),
            url: None,
            tags: BTreeSet::new(),
            created_at: Utc::now(),
            relevance_score: None,
            metadata: SourceMeta::Trend {
                search_volume: None,
                thumbnail: None,
                news_page_token: None,
                categories: Vec::new(),
            },
        }
    }

    fn ctx(limit: usize) -> FanoutContext {
        FanoutContext {
            region: "VN".into(),
            limit,
            fallback_community: "Vietnam".into(),
            parallel: true,
            source_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn dedupe_keeps_first_and_is_idempotent() {
        let xs = vec![
            post("a", SourceId::Video),
            post("b", SourceId::Video),
            post("a", SourceId::Forum),
            post("c", SourceId::Forum),
            post("b", SourceId::Trends),
        ];
        let once = dedupe(xs);
        let uids: Vec<&str> = once.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
        assert_eq!(once[0].source, SourceId::Video);

        let twice = dedupe(once.clone());
        assert_eq!(twice, once);
        let unique: HashSet<&str> = twice.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(unique.len(), twice.len());
    }

    #[test]
    fn normalize_clamps_and_trims() {
        let mut p = post("x", SourceId::Video);
        p.relevance_score = Some(1.7);
        let p = normalize_post(p);
        assert_eq!(p.relevance_score, Some(1.0));
        assert_eq!(p.title, "x");
        assert_eq!(p.content, None);

        let mut q = post("y", SourceId::Video);
        q.relevance_score = Some(f32::NAN);
        assert_eq!(normalize_post(q).relevance_score, None);
    }

    #[test]
    fn normalize_and_dedupe_counts_drops() {
        let (out, dropped) = normalize_and_dedupe(vec![
            post("a", SourceId::Video),
            post("a", SourceId::Forum),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn video_budget_is_split_per_category() {
        let cfg = DispatchConfig {
            source: SourceId::Video,
            assigned_tags: vec!["movies".into(), "politician".into()],
            category_ids: ["30".to_string(), "25".to_string()].into_iter().collect(),
            max_priority: 3,
        };
        let reqs = expand(&cfg, &ctx(20));
        assert_eq!(reqs.len(), 2);
        assert!(reqs.iter().all(|r| r.limit == 10));
        assert_eq!(
            reqs[0].query,
            SourceQuery::Video {
                category_id: Some("25".into())
            }
        );

        let tiny = expand(&cfg, &ctx(1));
        assert!(tiny.iter().all(|r| r.limit == 1));
    }

    #[test]
    fn video_without_categories_is_one_unfiltered_call() {
        let cfg = DispatchConfig {
            source: SourceId::Video,
            assigned_tags: vec!["trending".into()],
            category_ids: BTreeSet::new(),
            max_priority: 2,
        };
        let reqs = expand(&cfg, &ctx(20));
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].query, SourceQuery::Video { category_id: None });
        assert_eq!(reqs[0].limit, 20);
    }

    #[test]
    fn forum_fallback_uses_configured_community() {
        let reqs = expand(&DispatchConfig::fallback(), &ctx(20));
        assert_eq!(
            reqs[0].query,
            SourceQuery::Forum {
                subreddit: "Vietnam".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_adapter_is_a_failed_source() {
        let plan = vec![DispatchConfig::fallback()];
        let out = execute(&plan, &SourceRegistry::new(), &ctx(5)).await;
        assert!(out.posts.is_empty());
        assert_eq!(out.failed.len(), 1);
        assert_eq!(out.failed[0].source, SourceId::Forum);
    }
}
