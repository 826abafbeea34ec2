// tests/api_http.rs
//
// HTTP-level tests for the tool Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /health
// - GET  /tools, /tools/get_predefined_tags
// - POST /tools/process_interest (200 + 400)
// - POST /tools/call (dispatch, bad args, unknown tool)

mod common;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use common::{engine_with, StubAdapter};
use trending_crawlers::api::{self, AppState};
use trending_crawlers::SourceId;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router() -> Router {
    let engine = engine_with(vec![
        StubAdapter::ok(SourceId::PaperIndex, &["huggingface_1"]),
        StubAdapter::ok(SourceId::Video, &["youtube_1"]),
        StubAdapter::failing(SourceId::Trends),
        StubAdapter::ok(SourceId::Forum, &["reddit_1"]),
    ]);
    api::create_router(AppState::new(engine))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, body) = send(test_router(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).expect("utf8"), "ok");
}

#[tokio::test]
async fn tools_lists_both_operations() {
    let (status, body) = send(test_router(), get("/tools")).await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).expect("json");
    let names: Vec<&str> = v
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["get_predefined_tags", "process_interest"]);
}

#[tokio::test]
async fn predefined_tags_endpoint_shape() {
    let (status, body) = send(test_router(), get("/tools/get_predefined_tags")).await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).expect("json");
    let tags = v["available_tags"].as_array().expect("available_tags");
    assert_eq!(v["total_tags"].as_u64(), Some(tags.len() as u64));
    assert!(tags.iter().any(|t| t == "ai"));
    assert!(v["instructions"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(v["example_usage"].is_array());
}

#[tokio::test]
async fn process_interest_returns_merged_posts_and_metadata() {
    let (status, body) = send(
        test_router(),
        post_json(
            "/tools/process_interest",
            json!({ "tags": ["ai", "bogus"], "region_code": "vn", "max_results_per_crawler": 5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_slice(&body).expect("json");
    let uids: Vec<&str> = v["data"]
        .as_array()
        .expect("data")
        .iter()
        .filter_map(|p| p["uid"].as_str())
        .collect();
    // paper index (3) before video (2); trends failed
    assert_eq!(uids, vec!["huggingface_1", "youtube_1"]);
    assert_eq!(v["total"], 2);

    let meta = &v["metadata"];
    assert_eq!(meta["accepted_tags"], json!(["ai"]));
    assert_eq!(meta["rejected_tags"], json!(["bogus"]));
    assert_eq!(meta["region"], "VN");
    assert_eq!(meta["failed_sources"][0]["source"], "google_trends");
    assert_eq!(meta["crawler_configs"][0]["crawler"], "huggingface");
    assert!(meta.get("advisory").is_none());

    let first = &v["data"][0];
    assert_eq!(first["source"], "huggingface");
    assert!(first.get("created_at").is_some());
}

#[tokio::test]
async fn process_interest_without_tags_is_400_with_hint() {
    let (status, body) = send(
        test_router(),
        post_json("/tools/process_interest", json!({ "tags": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Json = serde_json::from_slice(&body).expect("json");
    assert_eq!(v["error"], "tags must be provided");
    assert_eq!(v["hint"], "Call get_predefined_tags() to see available tags");
}

#[tokio::test]
async fn tool_call_dispatches_by_name() {
    let (status, body) = send(
        test_router(),
        post_json(
            "/tools/call",
            json!({ "tool_name": "process_interest", "args": { "tags": ["discussion"] } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).expect("json");
    assert_eq!(v["data"][0]["uid"], "reddit_1");

    let (status, body) = send(
        test_router(),
        post_json("/tools/call", json!({ "tool_name": "get_predefined_tags" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).expect("json");
    assert!(v["total_tags"].as_u64().is_some_and(|n| n > 0));
}

#[tokio::test]
async fn tool_call_rejects_bad_args_and_unknown_tools() {
    let (status, _) = send(
        test_router(),
        post_json(
            "/tools/call",
            json!({ "tool_name": "process_interest", "args": { "tags": "ai" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        test_router(),
        post_json("/tools/call", json!({ "tool_name": "process_interest" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        test_router(),
        post_json("/tools/call", json!({ "tool_name": "nope", "args": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let v: Json = serde_json::from_slice(&body).expect("json");
    assert!(v["error"].as_str().is_some_and(|e| e.contains("nope")));
}
