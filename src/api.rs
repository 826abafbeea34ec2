// src/api.rs
//! HTTP transport for the two tools.
//!
//! - GET  /health
//! - GET  /tools                       → tool descriptors
//! - GET  /tools/get_predefined_tags
//! - POST /tools/process_interest      → 200 ToolResponse | 400 ToolError
//! - POST /tools/call {tool_name,args} → dispatch by name (404 for unknown tools)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::engine::{PredefinedTags, ProcessInterest, ToolError, ToolResponse, TrendingEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TrendingEngine>,
}

impl AppState {
    pub fn new(engine: TrendingEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/tools", get(list_tools))
        .route("/tools/get_predefined_tags", get(get_predefined_tags))
        .route("/tools/process_interest", post(process_interest))
        .route("/tools/call", post(call_tool))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "get_predefined_tags",
            description: "List the predefined tags. Call this first to know which tags are available.",
        },
        ToolDescriptor {
            name: "process_interest",
            description: "Fetch trending content for a list of predefined tags \
                          (args: tags, region_code = \"VN\", max_results_per_crawler = 20, user_query).",
        },
    ]
}

/// Generic tool invocation envelope.
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

async fn list_tools() -> Json<Vec<ToolDescriptor>> {
    Json(tool_descriptors())
}

async fn get_predefined_tags(State(state): State<AppState>) -> Json<PredefinedTags> {
    Json(state.engine.get_predefined_tags())
}

async fn process_interest(
    State(state): State<AppState>,
    Json(body): Json<ProcessInterest>,
) -> Result<Json<ToolResponse>, (StatusCode, Json<ToolError>)> {
    state
        .engine
        .process_interest(body)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(e)))
}

async fn call_tool(State(state): State<AppState>, Json(call): Json<ToolCall>) -> Response {
    match call.tool_name.as_str() {
        "get_predefined_tags" => Json(state.engine.get_predefined_tags()).into_response(),
        "process_interest" => {
            let args = if call.args.is_null() {
                ProcessInterest::default()
            } else {
                match serde_json::from_value::<ProcessInterest>(call.args) {
                    Ok(a) => a,
                    Err(e) => {
                        let err = ToolError {
                            error: format!("invalid arguments: {e}"),
                            hint: "Expected {\"tags\": [..], \"region_code\": \"VN\", \"max_results_per_crawler\": 20}".to_string(),
                        };
                        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
                    }
                }
            };
            match state.engine.process_interest(args).await {
                Ok(resp) => Json(resp).into_response(),
                Err(e) => (StatusCode::BAD_REQUEST, Json(e)).into_response(),
            }
        }
        other => {
            let err = ToolError {
                error: format!("unknown tool '{other}'"),
                hint: "GET /tools lists the available tools".to_string(),
            };
            (StatusCode::NOT_FOUND, Json(err)).into_response()
        }
    }
}
