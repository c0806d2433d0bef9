/// Router tests that never reach the database
///
/// Authentication, request validation and upload policy are all enforced
/// before any query runs, so these use an unreachable lazy pool.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{multipart_request, TestApp};
use creatorhub_shared::auth::jwt::issue_token_pair;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_degraded_database() {
    let app = TestApp::offline().await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_admin_endpoints_require_authentication() {
    let app = TestApp::offline().await;

    let news_uri = format!("/api/news/{}", Uuid::new_v4());
    let application_uri = format!("/api/creator-applications/{}", Uuid::new_v4());
    let status_uri = format!("/api/workflows/{}/status", Uuid::new_v4());

    let cases = [
        (Method::GET, "/api/admin/workflows", None),
        (Method::GET, "/api/admin/admins", None),
        (Method::GET, "/api/creator-applications", None),
        (Method::POST, "/api/news", Some(json!({ "title": "t", "body": "b" }))),
        (Method::POST, "/api/events", Some(json!({ "title": "t" }))),
        (Method::DELETE, news_uri.as_str(), None),
        (Method::PATCH, application_uri.as_str(), Some(json!({ "status": "approved" }))),
        (Method::PATCH, status_uri.as_str(), Some(json!({ "status": "approved" }))),
    ];

    for (method, uri, body) in cases {
        let (status, json) = app.send(method.clone(), uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(json["code"], "unauthenticated", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_invalid_tokens_rejected() {
    let app = TestApp::offline().await;

    let (status, _) = app
        .send(Method::GET, "/api/auth/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Refresh tokens are not access tokens
    let refresh = issue_token_pair(Uuid::new_v4(), common::JWT_SECRET)
        .unwrap()
        .refresh_token;
    let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    // Wrong scheme
    let request = Request::builder()
        .uri("/api/profile")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notification_routes_require_authentication() {
    let app = TestApp::offline().await;

    for uri in ["/api/notifications", "/api/notifications/unread-count"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], "unauthenticated");
    }

    let (status, _) = app.send(Method::POST, "/api/notifications/read-all", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::offline().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "nope", "password": "short" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::offline().await;

    let (status, body) = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": "a@b.co" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workflow_missing_fields() {
    let app = TestApp::offline().await;
    let token = app.token_for(Uuid::new_v4());

    let (status, body) = app
        .send(Method::POST, "/api/workflows", Some(&token), Some(json!({ "title": "No description" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("description"));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/workflows",
            Some(&token),
            Some(json!({ "title": "", "description": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_workflow_rejects_bad_media_urls() {
    let app = TestApp::offline().await;
    let token = app.token_for(Uuid::new_v4());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/workflows",
            Some(&token),
            Some(json!({
                "title": "Lead router",
                "description": "Routes inbound leads",
                "media_urls": ["https://cdn.example.com/shot.png", "shot-2.png"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["details"][0]["field"], "media_urls");
}

#[tokio::test]
async fn test_invalid_path_id_is_bad_request() {
    let app = TestApp::offline().await;

    let (status, body) = app.send(Method::GET, "/api/workflows/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let app = TestApp::offline().await;

    let request = Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(app.app.clone(), request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn test_upload_stores_image() {
    let app = TestApp::offline().await;
    let user_id = Uuid::new_v4();
    let token = app.token_for(user_id);

    let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let (status, body) = app
        .call(multipart_request("/api/uploads/avatars", &token, "image/png", &png))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["bucket"], "avatars");
    assert_eq!(data["size_bytes"], 8);

    let key = data["key"].as_str().unwrap();
    assert!(key.starts_with(&format!("avatars/{user_id}/")));
    assert!(key.ends_with(".png"));
    assert_eq!(data["url"], format!("http://localhost:8080/storage/{key}"));
    assert!(app.storage_root.join(key).exists());
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let app = TestApp::offline().await;
    let token = app.token_for(Uuid::new_v4());

    let oversized = vec![0u8; 5 * 1024 * 1024 + 1];
    let (status, body) = app
        .call(multipart_request("/api/uploads/avatars", &token, "image/jpeg", &oversized))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_upload_rejects_disallowed_type() {
    let app = TestApp::offline().await;
    let token = app.token_for(Uuid::new_v4());

    let (status, body) = app
        .call(multipart_request("/api/uploads/avatars", &token, "text/html", b"<script>"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not allowed"));

    // Workflow files are only accepted in the workflows bucket
    let (status, _) = app
        .call(multipart_request("/api/uploads/avatars", &token, "application/json", b"{}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(multipart_request("/api/uploads/workflows", &token, "application/json", b"{}"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_upload_rejects_unknown_bucket_and_empty_file() {
    let app = TestApp::offline().await;
    let token = app.token_for(Uuid::new_v4());

    let (status, _) = app
        .call(multipart_request("/api/uploads/secrets", &token, "image/png", b"png"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(multipart_request("/api/uploads/avatars", &token, "image/png", b""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
