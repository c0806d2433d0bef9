/// End-to-end API tests against PostgreSQL
///
/// Ignored by default; run with:
/// DATABASE_URL=postgresql://... cargo test -p creatorhub-api --test api_db_tests -- --ignored --test-threads=1

mod common;

use axum::http::{Method, StatusCode};
use chrono::DateTime;
use common::TestApp;
use serde_json::{json, Value};
use sqlx::{Executor, PgPool};
use uuid::Uuid;

/// Submits and approves a creator application; returns the creator's token
async fn approved_creator(app: &TestApp, admin_token: &str) -> (Uuid, String) {
    let (user, token) = app.create_user().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/creator-applications",
            Some(&token),
            Some(json!({ "motivation": "I automate everything" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/creator-applications/{id}"),
            Some(admin_token),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    (user.id, token)
}

/// Creates a workflow as `creator_token` and approves it
async fn approved_workflow(app: &TestApp, creator_token: &str, admin_token: &str) -> String {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/workflows",
            Some(creator_token),
            Some(json!({
                "title": "Invoice sync",
                "description": "Copies invoices into the ledger",
                "tags": ["Finance", "finance", "ERP"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["tags"], json!(["finance", "erp"]));

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/workflows/{id}/status"),
            Some(admin_token),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "approved");

    id
}

/// Makes notification inserts for `user_id` fail; returns the trigger name
async fn break_notifications_for(db: &PgPool, user_id: Uuid) -> String {
    let name = format!("fail_notifications_{}", user_id.simple());
    let sql = format!(
        r#"
        CREATE FUNCTION {name}() RETURNS trigger AS $$
        BEGIN
            RAISE EXCEPTION 'notifications unavailable';
        END;
        $$ LANGUAGE plpgsql;

        CREATE TRIGGER {name} BEFORE INSERT ON notifications
            FOR EACH ROW WHEN (NEW.user_id = '{user_id}')
            EXECUTE FUNCTION {name}();
        "#
    );
    db.execute(sql.as_str()).await.expect("Failed to install trigger");
    name
}

async fn restore_notifications(db: &PgPool, name: &str) {
    let sql = format!("DROP TRIGGER IF EXISTS {name} ON notifications; DROP FUNCTION IF EXISTS {name}();");
    db.execute(sql.as_str()).await.expect("Failed to drop trigger");
}

fn notifications_of_type(body: &Value, kind: &str) -> usize {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["notification_type"] == kind)
        .count()
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_non_admin_gets_forbidden() {
    let app = TestApp::with_database().await;
    let (_, token) = app.create_user().await;

    let cases = [
        (Method::GET, "/api/admin/workflows".to_string(), None),
        (Method::GET, "/api/creator-applications".to_string(), None),
        (Method::POST, "/api/news".to_string(), Some(json!({ "title": "t", "body": "b" }))),
        (
            Method::POST,
            "/api/events".to_string(),
            Some(json!({ "title": "t", "description": "d", "starts_at": "2030-01-01T10:00:00Z" })),
        ),
        (Method::DELETE, format!("/api/admin/admins/{}", Uuid::new_v4()), None),
    ];

    for (method, uri, body) in cases {
        let (status, json) = app.send(method.clone(), &uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(json["code"], "forbidden");
    }

    // Content bucket is admin-only
    let request = common::multipart_request("/api/uploads/content", &token, "image/png", b"png");
    let (status, _) = app.call(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_admin_content_missing_fields() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;

    let (status, _) = app
        .send(Method::POST, "/api/news", Some(&admin), Some(json!({ "title": "No body" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/events",
            Some(&admin),
            Some(json!({ "title": "No start", "description": "d" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/events",
            Some(&admin),
            Some(json!({
                "title": "Backwards",
                "description": "d",
                "starts_at": "2030-01-02T10:00:00Z",
                "ends_at": "2030-01-01T10:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "ends_at");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_application_approval_is_idempotent() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;
    let (_, token) = app.create_user().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/creator-applications",
            Some(&token),
            Some(json!({ "motivation": "Shipping workflows weekly" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // A second pending application is a conflict
    let (status, _) = app
        .send(
            Method::POST,
            "/api/creator-applications",
            Some(&token),
            Some(json!({ "motivation": "Again" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/creator-applications/{id}");
    for _ in 0..2 {
        let (status, body) = app
            .send(Method::PATCH, &uri, Some(&admin), Some(json!({ "status": "approved" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "approved");
    }

    // A later rejection does not overturn the approval
    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({ "status": "rejected" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    let (_, body) = app.send(Method::GET, "/api/notifications", Some(&token), None).await;
    assert_eq!(notifications_of_type(&body, "application_approved"), 1);
    assert_eq!(notifications_of_type(&body, "application_rejected"), 0);

    let (status, body) = app.send(Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_star_twice_counts_once() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;
    let (_, creator) = approved_creator(&app, &admin).await;
    let workflow_id = approved_workflow(&app, &creator, &admin).await;
    let (_, fan) = app.create_user().await;

    let star_uri = format!("/api/workflows/{workflow_id}/star");

    let (status, body) = app.send(Method::POST, &star_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(body["data"]["star_count"], 1);

    let (_, body) = app.send(Method::POST, &star_uri, Some(&fan), None).await;
    assert_eq!(body["data"]["changed"], false);
    assert_eq!(body["data"]["star_count"], 1);

    let (_, body) = app.send(Method::DELETE, &star_uri, Some(&fan), None).await;
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(body["data"]["star_count"], 0);

    let (_, body) = app.send(Method::DELETE, &star_uri, Some(&fan), None).await;
    assert_eq!(body["data"]["changed"], false);
    assert_eq!(body["data"]["star_count"], 0);

    let download_uri = format!("/api/workflows/{workflow_id}/download");
    app.send(Method::POST, &download_uri, Some(&fan), None).await;
    let (_, body) = app.send(Method::POST, &download_uri, Some(&fan), None).await;
    assert_eq!(body["data"]["download_count"], 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_workflow_visibility_and_resubmission() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;
    let (owner_id, creator) = approved_creator(&app, &admin).await;
    let (_, stranger) = app.create_user().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/workflows",
            Some(&creator),
            Some(json!({ "title": "Draft idea", "description": "WIP", "draft": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "draft");
    let uri = format!("/api/workflows/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.send(Method::GET, &uri, Some(&creator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner_id"], owner_id.to_string());
    let (status, _) = app.send(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    // Drafts cannot be approved directly
    let (status, _) = app
        .send(Method::PATCH, &format!("{uri}/status"), Some(&admin), Some(json!({ "status": "approved" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&creator), Some(json!({ "submit": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("{uri}/status"),
            Some(&admin),
            Some(json!({ "status": "rejected", "rejection_reason": "Add screenshots" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rejection_reason"], "Add screenshots");

    let (_, body) = app.send(Method::GET, "/api/notifications", Some(&creator), None).await;
    assert_eq!(notifications_of_type(&body, "workflow_rejected"), 1);

    // Editing a rejected workflow resubmits it
    let (_, body) = app
        .send(Method::PATCH, &uri, Some(&creator), Some(json!({ "description": "Now with screenshots" })))
        .await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["rejection_reason"], Value::Null);

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&stranger), Some(json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_featured_feed_is_capped_and_sorted() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;

    for day in 1..=4 {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/news",
                Some(&admin),
                Some(json!({
                    "title": format!("News {day}"),
                    "body": "Body",
                    "status": "published",
                    "featured": true
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/events",
                Some(&admin),
                Some(json!({
                    "title": format!("Event {day}"),
                    "description": "Talks",
                    "starts_at": format!("2031-0{day}-01T18:00:00Z"),
                    "status": "published",
                    "featured": true
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.send(Method::GET, "/api/featured", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 5);

    let dates: Vec<_> = items
        .iter()
        .map(|item| DateTime::parse_from_rfc3339(item["date"].as_str().unwrap()).unwrap())
        .collect();
    assert!(dates.windows(2).all(|pair| pair[0] >= pair[1]));
    assert!(items.iter().all(|item| item["kind"] == "news" || item["kind"] == "event"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_unpublished_news_hidden_from_public() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;
    let (_, reader) = app.create_user().await;

    let (_, body) = app
        .send(Method::POST, "/api/news", Some(&admin), Some(json!({ "title": "Draft", "body": "Soon" })))
        .await;
    let uri = format!("/api/news/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/api/news?status=draft", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.send(Method::GET, "/api/news?status=draft", Some(&reader), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({ "status": "published" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["published_at"].is_string());

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_failed_notification_keeps_decision() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;
    let (owner_id, creator) = approved_creator(&app, &admin).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/workflows",
            Some(&creator),
            Some(json!({ "title": "Webhook relay", "description": "Forwards webhooks" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/workflows/{}", body["data"]["id"].as_str().unwrap());

    let trigger = break_notifications_for(&app.db, owner_id).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("{uri}/status"),
            Some(&admin),
            Some(json!({ "status": "rejected", "rejection_reason": "Missing docs" })),
        )
        .await;

    restore_notifications(&app.db, &trigger).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "rejected");

    let (status, body) = app.send(Method::GET, &uri, Some(&creator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejection_reason"], "Missing docs");

    let (_, body) = app.send(Method::GET, "/api/notifications", Some(&creator), None).await;
    assert_eq!(notifications_of_type(&body, "workflow_rejected"), 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_content_updates_validate_urls() {
    let app = TestApp::with_database().await;
    let (_, admin) = app.create_admin().await;

    let (_, body) = app
        .send(
            Method::POST,
            "/api/news",
            Some(&admin),
            Some(json!({ "title": "Launch", "body": "Soon", "image_url": "https://cdn.example.com/a.png" })),
        )
        .await;
    let news_uri = format!("/api/news/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app
        .send(Method::PATCH, &news_uri, Some(&admin), Some(json!({ "image_url": "a.png" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "image_url");

    // Blank clears the field
    let (status, body) = app
        .send(Method::PATCH, &news_uri, Some(&admin), Some(json!({ "image_url": "" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["image_url"], Value::Null);

    let (_, body) = app
        .send(
            Method::POST,
            "/api/events",
            Some(&admin),
            Some(json!({ "title": "Meetup", "description": "Talks", "starts_at": "2031-05-01T18:00:00Z" })),
        )
        .await;
    let event_uri = format!("/api/events/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app
        .send(Method::PATCH, &event_uri, Some(&admin), Some(json!({ "event_url": "meetup page" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "event_url");

    let (status, body) = app
        .send(
            Method::PATCH,
            &event_uri,
            Some(&admin),
            Some(json!({ "event_url": "https://meetup.example.com/may" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["event_url"], "https://meetup.example.com/may");
}
