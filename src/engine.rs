// src/engine.rs
//! Tool operations: `get_predefined_tags` and `process_interest`.
//!
//! process_interest = validate → plan → fan out → normalize + dedupe.
//! Only a request without tags (and without a free-text query) is an error;
//! everything that goes wrong downstream ends up in metadata and logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{AppConfig, Credentials, EngineConfig};
use crate::extract::{build_extractor, DisabledExtractor, DynExtractor};
use crate::fanout::{self, FanoutContext, SourceFailure};
use crate::planner::{self, CrawlerConfig};
use crate::routing::RouteTable;
use crate::sources::{Post, SourceRegistry};
use crate::tags;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredefinedTags {
    pub available_tags: Vec<String>,
    pub total_tags: usize,
    pub instructions: String,
    pub example_usage: Vec<Vec<String>>,
}

/// Arguments of `process_interest`. Missing fields take the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessInterest {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub max_results_per_crawler: Option<usize>,
    /// Free-text interest; only used when `tags` is empty.
    #[serde(default)]
    pub user_query: Option<String>,
}

impl ProcessInterest {
    pub fn with_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        Self {
            tags: Some(tags.iter().map(|t| t.as_ref().to_string()).collect()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub data: Vec<Post>,
    pub total: usize,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub input_tags: Vec<String>,
    pub accepted_tags: Vec<String>,
    pub rejected_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_tags: Option<Vec<String>>,
    pub region: String,
    pub crawler_configs: Vec<CrawlerConfig>,
    pub failed_sources: Vec<SourceFailure>,
    pub duplicates_dropped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

/// Caller-facing error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolError {
    pub error: String,
    pub hint: String,
}

impl ToolError {
    pub fn missing_tags() -> Self {
        Self {
            error: "tags must be provided".to_string(),
            hint: "Call get_predefined_tags() to see available tags".to_string(),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.hint)
    }
}

impl std::error::Error for ToolError {}

#[derive(Clone)]
pub struct TrendingEngine {
    table: Arc<RouteTable>,
    registry: SourceRegistry,
    extractor: DynExtractor,
    settings: EngineConfig,
}

impl TrendingEngine {
    pub fn new(table: RouteTable, registry: SourceRegistry, settings: EngineConfig) -> Self {
        Self {
            table: Arc::new(table),
            registry,
            extractor: Arc::new(DisabledExtractor),
            settings,
        }
    }

    pub fn with_extractor(mut self, extractor: DynExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Wire live adapters, the route table and the extractor from config.
    pub fn from_config(cfg: &AppConfig, creds: &Credentials) -> anyhow::Result<Self> {
        let table = match &cfg.engine.routes_path {
            Some(p) => RouteTable::from_path(p)?,
            None => RouteTable::builtin(),
        };
        let registry = SourceRegistry::from_config(cfg, creds)?;
        let extractor = build_extractor(&cfg.extractor, &cfg.http, creds)?;
        info!(
            target: "engine",
            routed_tags = table.routed_tags().len(),
            sources = ?registry.sources(),
            extractor = extractor.provider_name(),
            "engine ready"
        );
        Ok(Self::new(table, registry, cfg.engine.clone()).with_extractor(extractor))
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    pub fn get_predefined_tags(&self) -> PredefinedTags {
        let available_tags = tags::sorted_vocabulary();
        PredefinedTags {
            total_tags: available_tags.len(),
            available_tags,
            instructions: tags::predefined_tags_prompt(),
            example_usage: tags::example_usage(),
        }
    }

    pub async fn process_interest(&self, req: ProcessInterest) -> Result<ToolResponse, ToolError> {
        let input_tags = req.tags.unwrap_or_default();
        let query = req
            .user_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        if input_tags.is_empty() && query.is_none() {
            return Err(ToolError::missing_tags());
        }

        let mut extracted_tags = None;
        let raw_tags = match query {
            Some(q) if input_tags.is_empty() => {
                let found = match self.extractor.extract_tags(q).await {
                    Ok(v) => v,
                    Err(e) => {
                        let error = format!("{e:#}");
                        warn!(target: "engine", %error, "tag extraction failed");
                        Vec::new()
                    }
                };
                extracted_tags = Some(found.clone());
                found
            }
            _ => input_tags.clone(),
        };

        let validated = tags::validate(&raw_tags);
        let plan = planner::plan(&validated.accepted, &self.table);

        let region = req
            .region_code
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.settings.default_region.clone());
        let limit = req
            .max_results_per_crawler
            .unwrap_or(self.settings.default_max_results)
            .max(1);

        info!(
            target: "engine",
            input = ?raw_tags,
            accepted = ?validated.accepted,
            configs = plan.len(),
            %region,
            limit,
            "processing interest"
        );

        let ctx = FanoutContext {
            region: region.clone(),
            limit,
            fallback_community: self.settings.fallback_community.clone(),
            parallel: self.settings.parallel,
            source_timeout: Duration::from_secs(self.settings.source_timeout_secs),
        };
        let outcome = fanout::execute(&plan, &self.registry, &ctx).await;
        let (data, duplicates_dropped) = fanout::normalize_and_dedupe(outcome.posts);

        let advisory = if outcome.succeeded.is_empty() {
            warn!(target: "engine", failed = outcome.failed.len(), "every planned source failed");
            Some("All content sources failed; no trending content could be fetched.".to_string())
        } else {
            None
        };

        info!(
            target: "engine",
            total = data.len(),
            duplicates_dropped,
            failed = outcome.failed.len(),
            "interest processed"
        );

        Ok(ToolResponse {
            total: data.len(),
            data,
            metadata: ResponseMetadata {
                input_tags,
                accepted_tags: validated.accepted,
                rejected_tags: validated.rejected,
                extracted_tags,
                region,
                crawler_configs: plan
                    .iter()
                    .map(|c| c.describe(&self.settings.fallback_community))
                    .collect(),
                failed_sources: outcome.failed,
                duplicates_dropped,
                advisory,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TrendingEngine {
        TrendingEngine::new(
            RouteTable::builtin(),
            SourceRegistry::new(),
            EngineConfig::default(),
        )
    }

    #[test]
    fn predefined_tags_are_sorted_and_counted() {
        let t = engine().get_predefined_tags();
        assert_eq!(t.total_tags, t.available_tags.len());
        assert_eq!(t.total_tags, 45);
        let mut sorted = t.available_tags.clone();
        sorted.sort();
        assert_eq!(sorted, t.available_tags);
        assert_eq!(t.example_usage.len(), 3);
    }

    #[tokio::test]
    async fn empty_tags_is_a_tool_error() {
        let err = engine()
            .process_interest(ProcessInterest::default())
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::missing_tags());

        let err = engine()
            .process_interest(ProcessInterest {
                tags: Some(vec![]),
                user_query: Some("   ".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.error, "tags must be provided");
    }

    #[tokio::test]
    async fn no_adapters_gives_empty_result_with_advisory() {
        let resp = engine()
            .process_interest(ProcessInterest::with_tags(&["ai"]))
            .await
            .unwrap();
        assert_eq!(resp.total, 0);
        assert!(resp.data.is_empty());
        assert!(resp.metadata.advisory.is_some());
        assert_eq!(resp.metadata.failed_sources.len(), 3);
        assert_eq!(resp.metadata.region, "VN");
    }
}
