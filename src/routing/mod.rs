// src/routing/mod.rs
//! Tag → source resolution.
//!
//! - `SourceId` names the closed set of content sources.
//! - `RouteTable` maps vocabulary tags to `SourceMapping`s (source, optional
//!   category, priority). It is plain data: built from [`table::BUILTIN_ROUTES`]
//!   or loaded from a TOML file, and inspectable without running the planner.
//! - Lookups for tags without routes return an empty slice.

pub mod table;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::tags;

/// Content sources. Wire names follow the crawler names used by tool clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceId {
    #[serde(rename = "reddit")]
    Forum,
    #[serde(rename = "youtube")]
    Video,
    #[serde(rename = "huggingface")]
    PaperIndex,
    #[serde(rename = "google_trends")]
    Trends,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Forum,
        SourceId::Video,
        SourceId::PaperIndex,
        SourceId::Trends,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Forum => "reddit",
            SourceId::Video => "youtube",
            SourceId::PaperIndex => "huggingface",
            SourceId::Trends => "google_trends",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapping {
    pub source: SourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub priority: u8,
}

impl From<&table::RouteSpec> for SourceMapping {
    fn from(r: &table::RouteSpec) -> Self {
        Self {
            source: r.source,
            category: r.category.map(str::to_string),
            priority: r.priority,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Vec<SourceMapping>>,
}

#[derive(Debug, Deserialize)]
struct RouteFile {
    routes: BTreeMap<String, Vec<SourceMapping>>,
}

static BUILTIN: Lazy<RouteTable> = Lazy::new(RouteTable::builtin);

impl RouteTable {
    pub fn builtin() -> Self {
        let routes = table::BUILTIN_ROUTES
            .iter()
            .map(|(tag, specs)| {
                (
                    tag.to_string(),
                    specs.iter().map(SourceMapping::from).collect(),
                )
            })
            .collect();
        Self { routes }
    }

    /// Parse a route table from TOML:
    ///
    /// ```toml
    /// [routes]
    /// movies = [{ source = "youtube", category = "30", priority = 3 }, { source = "reddit", priority = 1 }]
    /// ```
    ///
    /// Every tag must be in the vocabulary and every priority must be >= 1.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: RouteFile = toml::from_str(s).context("parsing route table toml")?;
        let mut routes = HashMap::with_capacity(file.routes.len());
        for (raw_tag, mappings) in file.routes {
            let tag = tags::normalize_tag(&raw_tag);
            if !tags::is_known(&tag) {
                bail!("route table: tag '{raw_tag}' is not in the vocabulary");
            }
            if let Some(m) = mappings.iter().find(|m| m.priority == 0) {
                bail!("route table: tag '{tag}' maps to {} with priority 0", m.source);
            }
            if routes.insert(tag.clone(), mappings).is_some() {
                bail!("route table: tag '{tag}' is defined more than once");
            }
        }
        Ok(Self { routes })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading route table from {}", path.display()))?;
        Self::from_toml_str(&s)
    }

    pub fn resolve(&self, tag: &str) -> &[SourceMapping] {
        self.routes.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tags with at least one mapping, sorted.
    pub fn routed_tags(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self
            .routes
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(t, _)| t.as_str())
            .collect();
        v.sort_unstable();
        v
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Shared built-in table.
pub fn builtin_table() -> &'static RouteTable {
    &BUILTIN
}

/// Resolve against the built-in table.
pub fn resolve(tag: &str) -> &'static [SourceMapping] {
    BUILTIN.resolve(tag)
}
