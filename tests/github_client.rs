//! Search client tests against a local mock of the GitHub API.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use commits_lol::config::GithubConfig;
use commits_lol::github::{GithubClient, SearchError, SearchOptions};
use commits_lol::rate_limit::RateLimiter;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ─── Mock API ───────────────────────────────────────────────────────

#[derive(Default)]
struct MockApi {
    total: usize,
    per_page: usize,
    /// Pages from this one on come back with no items.
    empty_from: Option<u32>,
    /// This page answers 500.
    fail_page: Option<u32>,
    /// Answer every request with this status and raw body.
    fixed: Option<(StatusCode, String)>,
    /// Report this `total_count` instead of `total`.
    reported_total: Option<usize>,
    pages: Mutex<Vec<u32>>,
    headers: Mutex<Vec<HeaderMap>>,
}

impl MockApi {
    fn paged(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page,
            ..Self::default()
        }
    }

    fn fixed(status: StatusCode, body: &str) -> Self {
        Self {
            fixed: Some((status, body.to_string())),
            ..Self::default()
        }
    }

    fn pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }
}

fn commit_json(n: usize) -> Value {
    json!({
        "sha": format!("sha{}", n),
        "html_url": format!("https://github.com/alice/repo/commit/sha{}", n),
        "commit": {
            "message": format!("fixed bug number {}", n),
            "author": { "date": "2020-09-04T17:41:34Z" }
        },
        "author": {
            "login": "alice",
            "avatar_url": "https://avatars.example.com/alice",
            "html_url": "https://github.com/alice"
        },
        "repository": {
            "name": "repo",
            "description": null,
            "html_url": "https://github.com/alice/repo",
            "owner": { "login": "alice" }
        },
        "score": 1.0
    })
}

async fn handle_search(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    api.pages.lock().unwrap().push(page);
    api.headers.lock().unwrap().push(headers);

    if let Some((status, body)) = &api.fixed {
        return (*status, body.clone()).into_response();
    }
    if api.fail_page == Some(page) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Server Error" })),
        )
            .into_response();
    }

    let empty = api.empty_from.is_some_and(|from| page >= from);
    let start = (page.max(1) as usize - 1) * api.per_page;
    let end = (start + api.per_page).min(api.total);
    let items: Vec<Value> = if empty || start >= end {
        Vec::new()
    } else {
        (start..end).map(commit_json).collect()
    };

    Json(json!({
        "total_count": api.reported_total.unwrap_or(api.total),
        "incomplete_results": false,
        "items": items
    }))
    .into_response()
}

async fn handle_rate_limit() -> Json<Value> {
    Json(json!({
        "resources": {
            "core": { "limit": 5000, "used": 95, "remaining": 4905, "reset": 1606461255 },
            "search": { "limit": 30, "used": 1, "remaining": 29, "reset": 1606457743 }
        }
    }))
}

async fn spawn_mock(api: Arc<MockApi>) -> String {
    let app = Router::new()
        .route("/search/commits", get(handle_search))
        .route("/rate_limit", get(handle_rate_limit))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, max_fetch: usize) -> GithubClient {
    let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(60)));
    client_with_limiter(base_url, max_fetch, limiter)
}

fn client_with_limiter(
    base_url: &str,
    max_fetch: usize,
    limiter: Arc<RateLimiter>,
) -> GithubClient {
    let config = GithubConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-token".to_string()),
        max_fetch,
        timeout_secs: 5,
        ..GithubConfig::default()
    };
    GithubClient::new(&config, limiter).unwrap()
}

// ─── Single page ────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_decodes_items_and_sends_headers() {
    let api = Arc::new(MockApi::paged(2, 10));
    let base = spawn_mock(api.clone()).await;

    let response = client(&base, 50)
        .search(&SearchOptions::with_text("fixed a bug"))
        .await
        .unwrap();

    assert_eq!(response.total_count, 2);
    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].sha, "sha0");
    assert_eq!(response.items[0].author.login, "alice");
    assert_eq!(response.items[0].repo.description, "");

    let headers = api.headers.lock().unwrap()[0].clone();
    assert_eq!(headers["authorization"], "token test-token");
    assert_eq!(
        headers["accept"],
        "application/vnd.github.cloak-preview+json"
    );
    assert!(headers.contains_key("user-agent"));
}

#[tokio::test]
async fn test_api_error_is_structured() {
    let api = Arc::new(MockApi::fixed(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"message": "Validation Failed"}"#,
    ));
    let base = spawn_mock(api).await;

    let err = client(&base, 50)
        .search(&SearchOptions::with_text("fixed a bug"))
        .await
        .unwrap_err();

    match err {
        SearchError::Api(api_err) => {
            assert_eq!(api_err.status, 422);
            assert_eq!(api_err.message, "Validation Failed");
            assert!(api_err.url.starts_with(&base));
            assert!(api_err.url.contains("/search/commits?q="));
            assert!(api_err
                .to_string()
                .starts_with("github error 422: Validation Failed | URL: "));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let api = Arc::new(MockApi::fixed(StatusCode::OK, r#"{"bad json"}"#));
    let base = spawn_mock(api).await;

    let err = client(&base, 50)
        .search(&SearchOptions::with_text("oops"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_query_sends_nothing() {
    let api = Arc::new(MockApi::paged(5, 5));
    let base = spawn_mock(api.clone()).await;

    let err = client(&base, 50)
        .search(&SearchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::EmptyQuery));
    assert_eq!(err.to_string(), "no search options provided");
    assert!(api.pages().is_empty());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = client(&format!("http://127.0.0.1:{}", port), 50)
        .search(&SearchOptions::with_text("oops"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)), "got {:?}", err);
}

// ─── Pagination ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_paginates_until_total_count() {
    let api = Arc::new(MockApi::paged(7, 3));
    let base = spawn_mock(api.clone()).await;

    let items = client(&base, 50)
        .search_paginated(&SearchOptions::with_text("bug"))
        .await
        .unwrap();

    assert_eq!(items.len(), 7);
    assert_eq!(api.pages(), vec![1, 2, 3]);
    assert_eq!(items[6].sha, "sha6");
}

#[tokio::test]
async fn test_pagination_stops_and_truncates_at_max_fetch() {
    let api = Arc::new(MockApi::paged(10, 3));
    let base = spawn_mock(api.clone()).await;

    let items = client(&base, 4)
        .search_paginated(&SearchOptions::with_text("bug"))
        .await
        .unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(api.pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let api = Arc::new(MockApi {
        empty_from: Some(2),
        ..MockApi::paged(100, 3)
    });
    let base = spawn_mock(api.clone()).await;

    let items = client(&base, 50)
        .search_paginated(&SearchOptions::with_text("bug"))
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(api.pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_failed_page_discards_collected_items() {
    let api = Arc::new(MockApi {
        fail_page: Some(2),
        ..MockApi::paged(9, 3)
    });
    let base = spawn_mock(api.clone()).await;

    let err = client(&base, 50)
        .search_paginated(&SearchOptions::with_text("bug"))
        .await
        .unwrap_err();

    match err {
        SearchError::Api(api_err) => assert_eq!(api_err.status, 500),
        other => panic!("expected Api error, got {:?}", other),
    }
    assert_eq!(api.pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_pagination_starts_at_requested_page() {
    let api = Arc::new(MockApi::paged(9, 3));
    let base = spawn_mock(api.clone()).await;

    let options = SearchOptions {
        page: 2,
        ..SearchOptions::with_text("bug")
    };
    let items = client(&base, 50).search_paginated(&options).await.unwrap();

    // Pages 2 and 3 hold 6 of 9 items; page 4 is empty.
    assert_eq!(items.len(), 6);
    assert_eq!(api.pages(), vec![2, 3, 4]);
}

#[tokio::test]
async fn test_pagination_never_exceeds_total_count() {
    let api = Arc::new(MockApi {
        reported_total: Some(2),
        ..MockApi::paged(3, 10)
    });
    let base = spawn_mock(api.clone()).await;

    let items = client(&base, 50)
        .search_paginated(&SearchOptions::with_text("bug"))
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[1].sha, "sha1");
    assert_eq!(api.pages(), vec![1]);
}

// ─── Rate limits ────────────────────────────────────────────────────

const BLOCKED: Duration = Duration::from_millis(500);

#[tokio::test]
async fn test_every_page_spends_a_token() {
    let api = Arc::new(MockApi::paged(9, 3));
    let base = spawn_mock(api.clone()).await;
    let limiter = Arc::new(RateLimiter::new(2, Duration::from_secs(3600)));
    let client = client_with_limiter(&base, 50, limiter);

    // Two tokens cover pages 1 and 2; page 3 waits for the window.
    let result = tokio::time::timeout(
        BLOCKED,
        client.search_paginated(&SearchOptions::with_text("bug")),
    )
    .await;

    assert!(result.is_err(), "third page should wait for a token");
    assert_eq!(api.pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_empty_query_spends_no_token() {
    let api = Arc::new(MockApi::paged(2, 10));
    let base = spawn_mock(api.clone()).await;
    let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(3600)));
    let client = client_with_limiter(&base, 50, limiter);

    let err = client.search(&SearchOptions::default()).await.unwrap_err();
    assert!(matches!(err, SearchError::EmptyQuery));

    let response = tokio::time::timeout(
        BLOCKED,
        client.search(&SearchOptions::with_text("bug")),
    )
    .await
    .expect("the only token is still available")
    .unwrap();
    assert_eq!(response.items.len(), 2);
    assert_eq!(api.pages(), vec![0]);
}


#[tokio::test]
async fn test_rate_limits() {
    let base = spawn_mock(Arc::new(MockApi::default())).await;

    let limits = client(&base, 50).rate_limits().await.unwrap();
    assert_eq!(limits.resources.core.limit, 5000);
    assert_eq!(limits.resources.core.remaining, 4905);
    assert_eq!(limits.resources.search.limit, 30);
    assert_eq!(limits.resources.search.used, 1);
}
