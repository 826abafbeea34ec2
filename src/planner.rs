// src/planner.rs
//! Dispatch planner: folds validated tags through the route table into one
//! `DispatchConfig` per source, ordered by max priority (desc, stable).

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::routing::{RouteTable, SourceId};

/// Community used by the forum source when no tag selects one.
pub const DEFAULT_FALLBACK_COMMUNITY: &str = "Vietnam";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchConfig {
    pub source: SourceId,
    /// Tags routed to this source, in processing order (duplicates kept).
    pub assigned_tags: Vec<String>,
    pub category_ids: BTreeSet<String>,
    pub max_priority: u8,
}

/// Source-specific parameters derived from a `DispatchConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SourceParams {
    Forum { subreddit: String },
    Video { category_ids: Vec<String> },
    PaperIndex { search_query: String },
    Trends { category_id: Option<String> },
}

/// Serializable view of one plan entry (`metadata.crawler_configs`).
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerConfig {
    pub crawler: SourceId,
    pub assigned_tags: Vec<String>,
    pub max_priority: u8,
    pub params: SourceParams,
}

impl DispatchConfig {
    fn empty(source: SourceId) -> Self {
        Self {
            source,
            assigned_tags: Vec::new(),
            category_ids: BTreeSet::new(),
            max_priority: 0,
        }
    }

    /// The forum-only plan used when nothing routes anywhere.
    pub fn fallback() -> Self {
        Self {
            max_priority: 1,
            ..Self::empty(SourceId::Forum)
        }
    }

    pub fn params(&self, fallback_community: &str) -> SourceParams {
        match self.source {
            SourceId::Forum => SourceParams::Forum {
                subreddit: self
                    .assigned_tags
                    .first()
                    .cloned()
                    .unwrap_or_else(|| fallback_community.to_string()),
            },
            SourceId::Video => SourceParams::Video {
                category_ids: self.category_ids.iter().cloned().collect(),
            },
            SourceId::PaperIndex => SourceParams::PaperIndex {
                search_query: self.assigned_tags.join(" "),
            },
            // Single-category source: first id in sorted order. Lossy on purpose.
            SourceId::Trends => SourceParams::Trends {
                category_id: self.category_ids.iter().next().cloned(),
            },
        }
    }

    pub fn describe(&self, fallback_community: &str) -> CrawlerConfig {
        CrawlerConfig {
            crawler: self.source,
            assigned_tags: self.assigned_tags.clone(),
            max_priority: self.max_priority,
            params: self.params(fallback_community),
        }
    }
}

pub fn plan<S: AsRef<str>>(accepted: &[S], table: &RouteTable) -> Vec<DispatchConfig> {
    if accepted.is_empty() {
        return vec![DispatchConfig::fallback()];
    }

    let mut configs: Vec<DispatchConfig> = Vec::new();
    let mut slot: HashMap<SourceId, usize> = HashMap::new();

    for tag in accepted {
        let tag = tag.as_ref();
        for mapping in table.resolve(tag) {
            let idx = *slot.entry(mapping.source).or_insert_with(|| {
                configs.push(DispatchConfig::empty(mapping.source));
                configs.len() - 1
            });
            let cfg = &mut configs[idx];
            cfg.assigned_tags.push(tag.to_string());
            if let Some(cat) = &mapping.category {
                cfg.category_ids.insert(cat.clone());
            }
            cfg.max_priority = cfg.max_priority.max(mapping.priority);
        }
    }

    if configs.is_empty() {
        tracing::debug!(target: "engine", "no accepted tag has a route; using forum fallback");
        return vec![DispatchConfig::fallback()];
    }

    // Vec::sort_by is stable: ties keep first-insertion order.
    configs.sort_by(|a, b| b.max_priority.cmp(&a.max_priority));
    configs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::builtin_table;

    fn sources(p: &[DispatchConfig]) -> Vec<SourceId> {
        p.iter().map(|c| c.source).collect()
    }

    #[test]
    fn empty_input_falls_back_to_forum() {
        let p = plan::<&str>(&[], builtin_table());
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].source, SourceId::Forum);
        assert!(p[0].assigned_tags.is_empty());
        assert_eq!(
            p[0].params(DEFAULT_FALLBACK_COMMUNITY),
            SourceParams::Forum {
                subreddit: "Vietnam".into()
            }
        );
    }

    #[test]
    fn ai_orders_papers_then_video_then_trends() {
        let p = plan(&["ai"], builtin_table());
        assert_eq!(
            sources(&p),
            vec![SourceId::PaperIndex, SourceId::Video, SourceId::Trends]
        );
        assert_eq!(p[0].max_priority, 3);
        assert_eq!(p[0].assigned_tags, vec!["ai"]);
        assert!(p[0].category_ids.is_empty());
        assert!(p[1].category_ids.contains("28"));
    }

    #[test]
    fn duplicates_are_kept_in_assigned_tags() {
        let p = plan(&["discussion", "discussion"], builtin_table());
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].assigned_tags, vec!["discussion", "discussion"]);
    }

    #[test]
    fn max_priority_wins_across_tags() {
        // movies gives trends p2, climate gives trends p3
        let p = plan(&["movies", "climate"], builtin_table());
        let trends = p.iter().find(|c| c.source == SourceId::Trends).unwrap();
        assert_eq!(trends.max_priority, 3);
        assert_eq!(
            trends.category_ids.iter().cloned().collect::<Vec<_>>(),
            vec!["20".to_string(), "4".to_string()]
        );
        // sorted order picks "20"
        assert_eq!(
            trends.params(DEFAULT_FALLBACK_COMMUNITY),
            SourceParams::Trends {
                category_id: Some("20".into())
            }
        );
    }

    #[test]
    fn ties_keep_first_insertion_order() {
        // music: video p3, trends p2, forum p1; discussion: forum p3
        let p = plan(&["music", "discussion"], builtin_table());
        assert_eq!(
            sources(&p),
            vec![SourceId::Video, SourceId::Forum, SourceId::Trends]
        );
    }

    #[test]
    fn unrouted_tags_only_fall_back_to_forum() {
        let p = plan(&["lifestyle"], builtin_table());
        assert_eq!(p, vec![DispatchConfig::fallback()]);
    }

    #[test]
    fn forum_uses_first_assigned_tag() {
        let p = plan(&["news", "discussion"], builtin_table());
        assert_eq!(
            p[0].params("x"),
            SourceParams::Forum {
                subreddit: "news".into()
            }
        );
    }

    #[test]
    fn paper_index_joins_tags_and_video_gets_all_categories() {
        let p = plan(&["ai", "movies", "paper"], builtin_table());
        let papers = p.iter().find(|c| c.source == SourceId::PaperIndex).unwrap();
        assert_eq!(
            papers.params("x"),
            SourceParams::PaperIndex {
                search_query: "ai paper".into()
            }
        );
        let video = p.iter().find(|c| c.source == SourceId::Video).unwrap();
        assert_eq!(
            video.params("x"),
            SourceParams::Video {
                category_ids: vec!["28".into(), "30".into()]
            }
        );
    }

    #[test]
    fn describe_serializes_like_tool_metadata() {
        let p = plan(&["movies"], builtin_table());
        let v = serde_json::to_value(p[0].describe("x")).unwrap();
        assert_eq!(v["crawler"], "youtube");
        assert_eq!(v["params"]["category_ids"][0], "30");
    }
}
