// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod engine;
pub mod extract;
pub mod fanout;
pub mod metrics;
pub mod planner;
pub mod routing;
pub mod sources;
pub mod tags;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::engine::{ProcessInterest, ToolError, ToolResponse, TrendingEngine};
pub use crate::routing::{RouteTable, SourceId, SourceMapping};
pub use crate::sources::{Post, SourceAdapter, SourceMeta};
