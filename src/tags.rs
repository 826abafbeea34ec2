// src/tags.rs
//! Tag vocabulary + validator.
//!
//! The vocabulary is closed: callers (usually an LLM) pick from this list, and
//! anything else is rejected before routing. Validation trims and lowercases,
//! keeps duplicates (a repeated tag weighs more in the planner), and reports
//! the original spelling of every rejected tag.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use tracing::warn;

/// Every tag a caller may use. Keep in sync with `routing::table`.
pub const PREDEFINED_TAGS: &[&str] = &[
    // AI / research
    "ai",
    "machine_learning",
    "deep_learning",
    "nlp",
    "computer_vision",
    "model",
    "dataset",
    "paper",
    "research",
    // Tech & science
    "technology",
    "programming",
    "science",
    "space",
    // Entertainment
    "movies",
    "music",
    "gaming",
    "entertainment",
    "comedy",
    "anime",
    "celebrity",
    "tv_shows",
    // News & society
    "news",
    "politics",
    "politician",
    "economy",
    "business",
    "finance",
    "crypto",
    "climate",
    "environment",
    "health",
    "education",
    // Lifestyle
    "sports",
    "football",
    "travel",
    "food",
    "fashion",
    "pets",
    "cars",
    "lifestyle",
    // Community
    "discussion",
    "community",
    "ask",
    "meme",
    // Meta
    "trending",
];

static VOCABULARY: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| PREDEFINED_TAGS.iter().copied().collect());

/// True when `tag` (already normalized) belongs to the vocabulary.
pub fn is_known(tag: &str) -> bool {
    VOCABULARY.contains(tag)
}

/// Vocabulary in sorted order.
pub fn sorted_vocabulary() -> Vec<String> {
    VOCABULARY.iter().map(|t| t.to_string()).collect()
}

/// Lowercase + strip surrounding whitespace.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Outcome of [`validate`]. `accepted` holds normalized vocabulary members in
/// input order; `rejected` holds the raw strings that did not match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validated {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

pub fn validate<S: AsRef<str>>(raw_tags: &[S]) -> Validated {
    let mut out = Validated::default();
    for raw in raw_tags {
        let raw = raw.as_ref();
        let tag = normalize_tag(raw);
        if is_known(&tag) {
            out.accepted.push(tag);
        } else {
            out.rejected.push(raw.to_string());
        }
    }

    if !out.rejected.is_empty() {
        warn!(target: "engine", rejected = ?out.rejected, "unknown tags ignored");
    }
    out
}

/// Usage instructions returned by `get_predefined_tags`.
pub fn predefined_tags_prompt() -> String {
    format!(
        "Pick 1-5 tags that describe the user's interest, using ONLY tags from this list: {}. \
         Prefer specific tags (e.g. \"movies\", \"machine_learning\") over broad ones. \
         Add \"discussion\" when the user wants community conversation, and \"paper\" or \
         \"dataset\" when they want research. Unknown tags are ignored.",
        sorted_vocabulary().join(", ")
    )
}

pub fn example_usage() -> Vec<Vec<String>> {
    [
        &["politician", "movies", "climate", "discussion"][..],
        &["ai", "machine_learning", "paper"][..],
        &["music", "gaming", "entertainment"][..],
    ]
    .iter()
    .map(|ex| ex.iter().map(|t| t.to_string()).collect())
    .collect()
}
