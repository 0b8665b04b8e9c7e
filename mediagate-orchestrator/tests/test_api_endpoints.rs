//! HTTP-level tests for the orchestrator router
//!
//! Upstreams are wiremock servers; `expect(n)` pins how often the gate lets
//! a request through to them.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header as match_header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use mediagate_core::config::RatePolicy;
use mediagate_core::infrastructure::ManualClock;

const VENDOR_PAGE: &str = "https://www.vendor.test/free-videos/sunset-beach-123456";

#[tokio::test]
async fn test_repeated_search_hits_upstream_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "mountain lake"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "a1", "provider": "pexels" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let first = send(&router, get("/resolve-search?query=mountain%20lake")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-cache"), Some("MISS"));
    assert!(header(&first, "ratelimit-limit").is_some());
    let first_body = body_json(first).await;

    let second = send(&router, get("/resolve-search?query=%20mountain%20lake%20&page=1")).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "x-cache"), Some("HIT"));
    assert_eq!(body_json(second).await, first_body);
}

#[tokio::test]
async fn test_search_without_query_is_rejected_before_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let response = send(&router, get("/resolve-search")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["request_id"].is_string());

    let response = send(&router, get("/resolve-search?query=x&page=0")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_upstream_failure_serves_uncached_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    for _ in 0..2 {
        let response = send(&router, get("/resolve-search?query=design")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "x-mediagate-source"), Some("fallback"));
        assert_eq!(header(&response, "x-cache"), Some("MISS"));
        let body = body_json(response).await;
        assert!(body.is_object() || body.is_array());
    }
}

#[tokio::test]
async fn test_rate_limit_rejects_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.rate_limits.search = RatePolicy::new(2, 60);
    let router = build_router(&config);

    for _ in 0..2 {
        let response = send(
            &router,
            get_with_header("/resolve-search?query=a", "x-forwarded-for", "203.0.113.7"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = send(
        &router,
        get_with_header("/resolve-search?query=a", "x-forwarded-for", "203.0.113.7"),
    )
    .await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = header(&limited, "retry-after")
        .and_then(|v| v.parse().ok())
        .expect("retry-after header");
    assert!((1..=60).contains(&retry_after));
    assert_eq!(body_json(limited).await["code"], "RATE_LIMITED");

    // Other clients keep their own budget
    let other = send(
        &router,
        get_with_header("/resolve-search?query=a", "x-forwarded-for", "198.51.100.2"),
    )
    .await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_provider_search_validates_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/provider/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let missing = send(&router, post_json("/provider-search", r#"{"query":"cats"}"#)).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let malformed = send(&router, post_json("/provider-search", "{not json")).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(malformed).await["code"], "VALIDATION_ERROR");

    let ok = send(
        &router,
        post_json("/provider-search", r#"{"provider":"pexels","query":"cats"}"#),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await, json!({ "items": [] }));
}

#[tokio::test]
async fn test_provider_data_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/provider/data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let response = send(
        &router,
        post_json("/provider-data", r#"{"provider":"pexels","id":"2014422"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_media_resolve_rejects_unlisted_host() {
    let server = MockServer::start().await;
    let router = build_router(&test_config(&server));

    let uri = format!(
        "/media-resolve?url={}",
        encode("https://evil.example/free-videos/sunset-beach-123456")
    );
    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_media_resolve_redirects_to_first_live_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("sunset-beach_123456"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-type", "video/mp4")
                .insert_header("content-range", "bytes 0-0/1000")
                .set_body_bytes(vec![0u8]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let uri = format!("/media-resolve?url={}", encode(VENDOR_PAGE));
    let redirect = send(&router, get(&uri)).await;
    assert_eq!(redirect.status(), StatusCode::FOUND);
    let location = header(&redirect, "location").expect("location").to_string();
    assert!(location.starts_with(&server.uri()));
    assert!(location.contains("sunset-beach_123456"));

    let json_uri = format!("{}&format=json", uri);
    let cached = send(&router, get(&json_uri)).await;
    assert_eq!(cached.status(), StatusCode::OK);
    assert_eq!(header(&cached, "x-cache"), Some("HIT"));
    let body = body_json(cached).await;
    assert_eq!(body["url"], location);
    assert_eq!(body["placeholder"], false);
    assert_eq!(body["attempts"], 1);
}

#[tokio::test]
async fn test_media_resolve_exhaustion_serves_placeholder() {
    // Nothing mounted: every candidate answers 404
    let server = MockServer::start().await;
    let router = build_router(&test_config(&server));

    let uri = format!("/media-resolve?url={}", encode(VENDOR_PAGE));
    let redirect = send(&router, get(&uri)).await;
    assert_eq!(redirect.status(), StatusCode::FOUND);
    assert_eq!(header(&redirect, "location"), Some("/assets/placeholder.svg"));
    assert_eq!(header(&redirect, "x-mediagate-source"), Some("placeholder"));

    let json_uri = format!("{}&format=json", uri);
    let body = body_json(send(&router, get(&json_uri)).await).await;
    assert_eq!(body["placeholder"], true);
    assert_eq!(body["url"], "/assets/placeholder.svg");
}

#[tokio::test]
async fn test_media_resolve_placeholder_expires_and_candidates_are_retried() {
    let server = MockServer::start().await;
    let config = test_config(&server);
    let clock = Arc::new(ManualClock::new());
    let router = build_router_with_clock(&config, clock.clone());

    let uri = format!("/media-resolve?format=json&url={}", encode(VENDOR_PAGE));
    let body = body_json(send(&router, get(&uri)).await).await;
    assert_eq!(body["placeholder"], true);

    // The origin recovers, but the placeholder is still fresh
    Mock::given(method("GET"))
        .and(path_regex("sunset-beach_123456"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-type", "video/mp4")
                .insert_header("content-range", "bytes 0-0/1000")
                .set_body_bytes(vec![0u8]),
        )
        .mount(&server)
        .await;

    clock.advance(Duration::from_secs(config.cache.placeholder_ttl_seconds - 1));
    let cached = send(&router, get(&uri)).await;
    assert_eq!(header(&cached, "x-cache"), Some("HIT"));
    assert_eq!(body_json(cached).await["placeholder"], true);

    clock.advance(Duration::from_secs(2));
    let fresh = send(&router, get(&uri)).await;
    assert_eq!(header(&fresh, "x-cache"), Some("MISS"));
    let body = body_json(fresh).await;
    assert_eq!(body["placeholder"], false);
    assert!(body["url"].as_str().expect("url").contains("sunset-beach_123456"));
}

#[tokio::test]
async fn test_binary_image_failure_serves_placeholder_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let uri = format!(
        "/binary-proxy/image?url={}",
        encode(&format!("{}/missing.jpg", server.uri()))
    );
    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/svg+xml"));
    assert_eq!(header(&response, "x-mediagate-source"), Some("fallback"));
    let body = String::from_utf8(body_bytes(response).await).expect("utf8 svg");
    assert!(body.contains("<svg"));
}

#[tokio::test]
async fn test_binary_image_is_cached_after_first_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"\x89PNG-bytes".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let uri = format!(
        "/binary-proxy/image?url={}",
        encode(&format!("{}/photo.png", server.uri()))
    );

    let first = send(&router, get(&uri)).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "content-type"), Some("image/png"));
    assert_eq!(body_bytes(first).await, b"\x89PNG-bytes".to_vec());

    let second = send(&router, get(&uri)).await;
    assert_eq!(header(&second, "x-cache"), Some("HIT"));
}

#[tokio::test]
async fn test_binary_cached_placeholder_keeps_fallback_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let uri = format!(
        "/binary-proxy/image?url={}",
        encode(&format!("{}/gone.jpg", server.uri()))
    );

    let first = send(&router, get(&uri)).await;
    assert_eq!(header(&first, "x-mediagate-source"), Some("fallback"));

    let second = send(&router, get(&uri)).await;
    assert_eq!(header(&second, "x-cache"), Some("HIT"));
    assert_eq!(header(&second, "x-mediagate-source"), Some("fallback"));
}

#[tokio::test]
async fn test_binary_credentialed_fetch_is_not_shared_with_anonymous_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private.jpg"))
        .and(match_header("authorization", "Bearer alice-secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"ALICE-PRIVATE".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"PUBLIC-VIEW".to_vec()),
        )
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let uri = format!(
        "/binary-proxy/image?url={}",
        encode(&format!("{}/private.jpg", server.uri()))
    );

    let credentialed = {
        let router = router.clone();
        let uri = uri.clone();
        tokio::spawn(async move {
            send(&router, get_with_header(&uri, "authorization", "Bearer alice-secret")).await
        })
    };
    // Arrive while the credentialed fetch is still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    let anonymous = send(&router, get(&uri)).await;
    assert_eq!(body_bytes(anonymous).await, b"PUBLIC-VIEW".to_vec());

    let credentialed = credentialed.await.expect("task");
    assert_eq!(body_bytes(credentialed).await, b"ALICE-PRIVATE".to_vec());

    // Nothing private was left behind for later anonymous callers
    let later = send(&router, get(&uri)).await;
    assert_eq!(header(&later, "x-cache"), Some("HIT"));
    assert_eq!(body_bytes(later).await, b"PUBLIC-VIEW".to_vec());
}

#[tokio::test]
async fn test_binary_credentialed_caller_skips_anonymous_cache_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account.jpg"))
        .and(match_header("authorization", "Bearer bob-secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"BOB-VIEW".to_vec()),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"PUBLIC-VIEW".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let uri = format!(
        "/binary-proxy/image?url={}",
        encode(&format!("{}/account.jpg", server.uri()))
    );

    let anonymous = send(&router, get(&uri)).await;
    assert_eq!(body_bytes(anonymous).await, b"PUBLIC-VIEW".to_vec());

    for _ in 0..2 {
        let response = send(&router, get_with_header(&uri, "authorization", "Bearer bob-secret")).await;
        assert_eq!(header(&response, "x-cache"), Some("MISS"));
        assert_eq!(body_bytes(response).await, b"BOB-VIEW".to_vec());
    }
}

#[tokio::test]
async fn test_binary_video_over_buffer_bound_is_streamed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/long.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(vec![9u8; 4096]),
        )
        .expect(4)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.cache.max_cacheable_body_bytes = 1024;
    let router = build_router(&config);
    let uri = format!(
        "/binary-proxy/video?url={}",
        encode(&format!("{}/long.mp4", server.uri()))
    );

    // Each request is abandoned once over the bound, then passed through whole
    for _ in 0..2 {
        let response = send(&router, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-type"), Some("video/mp4"));
        assert_eq!(header(&response, "x-cache"), None);
        assert_eq!(body_bytes(response).await, vec![9u8; 4096]);
    }
}

#[tokio::test]
async fn test_binary_video_range_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .and(match_header("range", "bytes=0-3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-type", "video/mp4")
                .insert_header("content-range", "bytes 0-3/100")
                .insert_header("accept-ranges", "bytes")
                .set_body_bytes(vec![1u8, 2, 3, 4]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let uri = format!(
        "/binary-proxy/video?url={}",
        encode(&format!("{}/clip.mp4", server.uri()))
    );

    let response = send(&router, get_with_header(&uri, "range", "bytes=0-3")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&response, "content-range"), Some("bytes 0-3/100"));
    assert_eq!(header(&response, "accept-ranges"), Some("bytes"));
    assert_eq!(header(&response, "content-type"), Some("video/mp4"));
    assert_eq!(body_bytes(response).await, vec![1u8, 2, 3, 4]);
}

#[tokio::test]
async fn test_binary_rejects_unknown_kind() {
    let server = MockServer::start().await;
    let router = build_router(&test_config(&server));

    let uri = format!(
        "/binary-proxy/document?url={}",
        encode("https://cdn.example/file.pdf")
    );
    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preview_resolve_extracts_og_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head>
                <meta property="og:image" content="https://cdn.example/cover.jpg">
                <meta name="twitter:image" content="https://cdn.example/card.jpg">
            </head></html>"#,
            "text/html",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let uri = format!(
        "/preview-resolve?url={}",
        encode(&format!("{}/article", server.uri()))
    );

    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "image": "https://cdn.example/cover.jpg" })
    );

    let cached = send(&router, get(&uri)).await;
    assert_eq!(header(&cached, "x-cache"), Some("HIT"));
}

#[tokio::test]
async fn test_preview_resolve_unreachable_page_yields_null_image() {
    let server = MockServer::start().await;
    let router = build_router(&test_config(&server));
    let uri = format!(
        "/preview-resolve?url={}",
        encode(&format!("{}/gone", server.uri()))
    );

    let response = send(&router, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "image": null }));
}

#[tokio::test]
async fn test_aggregate_stats_tallies_sampled_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "provider": "Pexels", "file_type": "jpg" },
                { "provider": "pixabay", "file_type": "png" },
                { "provider": "pexels", "file_type": "jpg" }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let response = send(&router, get("/aggregate-stats/providers")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["dimension"], "providers");
    assert_eq!(body["fallback"], false);
    assert_eq!(body["sampled_queries"], 2);
    assert_eq!(body["items"][0], json!({ "name": "pexels", "count": 4 }));
    assert_eq!(body["items"][1], json!({ "name": "pixabay", "count": 2 }));
}

#[tokio::test]
async fn test_aggregate_stats_falls_back_when_every_sample_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));

    let response = send(&router, get("/aggregate-stats/file-types")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-mediagate-source"), Some("fallback"));
    let body = body_json(response).await;
    assert_eq!(body["fallback"], true);
    assert!(!body["items"].as_array().expect("items").is_empty());

    let unknown = send(&router, get("/aggregate-stats/licenses")).await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_stats_requires_configured_token() {
    let server = MockServer::start().await;

    let disabled = build_router(&test_config(&server));
    let response = send(
        &disabled,
        get_with_header("/admin/stats", "authorization", "Bearer anything"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut config = test_config(&server);
    config.admin.token = Some(ADMIN_TOKEN.to_string());
    let router = build_router(&config);

    let missing = send(&router, get("/admin/stats")).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = send(
        &router,
        get_with_header("/admin/stats", "authorization", "Bearer not-the-token"),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = send(
        &router,
        get_with_header("/admin/stats", "authorization", &format!("Bearer {}", ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert!(body["cache_entries"].is_number());
    assert!(body["rate_windows"].get("admin").is_some());
}

#[tokio::test]
async fn test_preflight_is_answered_without_gating() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let router = build_router(&test_config(&server));
    let request = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/resolve-search?query=a")
        .header("origin", "https://app.example")
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "authorization")
        .body(axum::body::Body::empty())
        .expect("request");

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(header(&response, "access-control-allow-origin"), Some("*"));
    assert!(header(&response, "ratelimit-limit").is_none());
}

#[tokio::test]
async fn test_health_and_placeholder_asset() {
    let server = MockServer::start().await;
    let router = build_router(&test_config(&server));

    let health = send(&router, get("/health")).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["status"], "healthy");

    let asset = send(&router, get("/assets/placeholder.svg")).await;
    assert_eq!(asset.status(), StatusCode::OK);
    assert_eq!(header(&asset, "content-type"), Some("image/svg+xml"));
}
