//! Integration tests for the `/api/bugs` endpoints over the in-memory store.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    body_json, build_test_app, create_bug, delete, get, memory_app, post_json, put_json,
    valid_bug,
};
use serde_json::json;

use bugtrack_core::bug::{Bug, NewBug, Priority, Severity, Status};
use bugtrack_core::types::BugId;
use bugtrack_db::MemoryBugStore;

const MISSING_ID: &str = "0190b6d4-9a4e-7c1a-8f00-000000000000";

// ---------------------------------------------------------------------------
// POST /api/bugs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_201_with_defaults() {
    let app = memory_app();
    let response = post_json(app, "/api/bugs", valid_bug()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Bug created successfully");

    let data = &json["data"];
    assert!(data["id"].is_string());
    assert_eq!(data["title"], "Login button unresponsive");
    assert_eq!(data["severity"], "high");
    assert_eq!(data["status"], "open");
    assert_eq!(data["priority"], "medium");
    assert_eq!(data["stepsToReproduce"][1], "Click login");
    assert!(data["resolvedAt"].is_null());
    assert_eq!(data["createdAt"], data["updatedAt"]);
}

#[tokio::test]
async fn create_with_missing_fields_returns_every_error() {
    let app = memory_app();
    let response = post_json(app, "/api/bugs", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Validation failed");
    assert_eq!(
        json["errors"],
        json!([
            "Title is required and must be a string",
            "Description is required and must be a string",
            "Reporter is required and must be a string"
        ])
    );
}

#[tokio::test]
async fn create_rejects_invalid_enums_and_past_due_date() {
    let app = memory_app();
    let mut body = valid_bug();
    body["severity"] = json!("catastrophic");
    body["dueDate"] = json!((Utc::now() - Duration::days(1)).to_rfc3339());

    let response = post_json(app, "/api/bugs", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["errors"],
        json!([
            "Severity must be one of: low, medium, high, critical",
            "Due date must be in the future"
        ])
    );
}

#[tokio::test]
async fn create_sanitizes_text_fields() {
    let app = memory_app();
    let mut body = valid_bug();
    body["title"] = json!("<script>alert(\"Hack!\")</script>Click here!");
    body["reporter"] = json!("<b>Jane</b> onclick=\"steal()\"");

    let data = create_bug(&app, body).await;

    assert_eq!(data["title"], "alert(\"Hack!\")Click here!");
    let reporter = data["reporter"].as_str().unwrap();
    assert!(!reporter.contains('<'));
    assert!(!reporter.contains("onclick="));
}

#[tokio::test]
async fn create_with_resolved_status_stamps_resolved_at() {
    let app = memory_app();
    let mut body = valid_bug();
    body["status"] = json!("resolved");

    let data = create_bug(&app, body).await;

    assert_eq!(data["status"], "resolved");
    assert!(data["resolvedAt"].is_string());
}

#[tokio::test]
async fn malformed_json_body_returns_400() {
    let app = memory_app();
    let response = common::send(
        app,
        axum::http::Method::POST,
        "/api/bugs",
        Some(json!("not an object")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
}

// ---------------------------------------------------------------------------
// GET /api/bugs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_is_newest_first_with_pagination() {
    let app = memory_app();
    for title in ["First bug", "Second bug", "Third bug"] {
        let mut body = valid_bug();
        body["title"] = json!(title);
        create_bug(&app, body).await;
    }

    let response = get(app.clone(), "/api/bugs?limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["title"], "Third bug");
    assert_eq!(
        json["pagination"],
        json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 })
    );

    let json = body_json(get(app, "/api/bugs?limit=2&page=2").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["title"], "First bug");
}

#[tokio::test]
async fn list_filters_by_status_and_reporter() {
    let app = memory_app();
    create_bug(&app, valid_bug()).await;
    let mut other = valid_bug();
    other["reporter"] = json!("Alice Smith");
    other["status"] = json!("in-progress");
    create_bug(&app, other).await;

    let json = body_json(get(app.clone(), "/api/bugs?status=in-progress").await).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["reporter"], "Alice Smith");

    let json = body_json(get(app, "/api/bugs?reporter=smith").await).await;
    assert_eq!(json["pagination"]["total"], 1);
}

#[tokio::test]
async fn list_with_unknown_enum_filter_returns_empty_page() {
    let app = memory_app();
    create_bug(&app, valid_bug()).await;

    let response = get(app, "/api/bugs?status=pending&limit=5").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], json!([]));
    assert_eq!(
        json["pagination"],
        json!({ "page": 1, "limit": 5, "total": 0, "pages": 0 })
    );
}

#[tokio::test]
async fn empty_list_has_zero_pages() {
    let app = memory_app();
    let json = body_json(get(app, "/api/bugs").await).await;

    assert_eq!(json["data"], json!([]));
    assert_eq!(
        json["pagination"],
        json!({ "page": 1, "limit": 10, "total": 0, "pages": 0 })
    );
}

// ---------------------------------------------------------------------------
// GET /api/bugs/{id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_returns_the_bug() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let id = created["id"].as_str().unwrap();

    let response = get(app, &format!("/api/bugs/{id}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], created);
}

#[tokio::test]
async fn get_missing_returns_404() {
    let app = memory_app();
    let response = get(app, &format!("/api/bugs/{MISSING_ID}")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json, json!({ "success": false, "message": "Bug not found" }));
}

#[tokio::test]
async fn get_malformed_id_returns_400() {
    let app = memory_app();
    let response = get(app, "/api/bugs/invalid-id").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid bug ID");
}

// ---------------------------------------------------------------------------
// PUT /api/bugs/{id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let id = created["id"].as_str().unwrap();

    let response = put_json(
        app,
        &format!("/api/bugs/{id}"),
        json!({ "assignee": "Bob", "priority": "urgent" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Bug updated successfully");
    let data = &json["data"];
    assert_eq!(data["assignee"], "Bob");
    assert_eq!(data["priority"], "urgent");
    assert_eq!(data["title"], created["title"]);
    assert_eq!(data["severity"], "high");
    assert_eq!(data["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn resolving_sets_resolved_at_once() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let uri = format!("/api/bugs/{}", created["id"].as_str().unwrap());

    let first = body_json(put_json(app.clone(), &uri, json!({ "status": "resolved" })).await).await;
    let stamp = first["data"]["resolvedAt"].clone();
    assert!(stamp.is_string());

    let second = body_json(put_json(app, &uri, json!({ "status": "resolved" })).await).await;
    assert_eq!(second["data"]["resolvedAt"], stamp);
}

#[tokio::test]
async fn update_with_invalid_field_returns_400() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let uri = format!("/api/bugs/{}", created["id"].as_str().unwrap());

    let response = put_json(app.clone(), &uri, json!({ "status": "done" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Validation failed");

    // The stored record is untouched.
    let json = body_json(get(app, &uri).await).await;
    assert_eq!(json["data"]["status"], "open");
}

#[tokio::test]
async fn update_missing_returns_404_before_validating() {
    let app = memory_app();
    let response = put_json(
        app,
        &format!("/api/bugs/{MISSING_ID}"),
        json!({ "status": "done" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_malformed_id_returns_400() {
    let app = memory_app();
    let response = put_json(app, "/api/bugs/123", json!({ "status": "closed" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid bug ID");
}

// ---------------------------------------------------------------------------
// DELETE /api/bugs/{id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_the_bug() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let uri = format!("/api/bugs/{}", created["id"].as_str().unwrap());

    let response = delete(app.clone(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "Bug deleted successfully" })
    );

    assert_eq!(get(app.clone(), &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete(app, &uri).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// POST /api/bugs/{id}/comments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comment_is_appended() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let uri = format!("/api/bugs/{}/comments", created["id"].as_str().unwrap());

    let response = post_json(
        app,
        &uri,
        json!({ "author": "Carol", "content": "<i>Reproduced</i> on staging" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Comment added successfully");
    let comments = json["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["author"], "Carol");
    assert_eq!(comments[0]["content"], "Reproduced on staging");
    assert!(comments[0]["createdAt"].is_string());
}

#[tokio::test]
async fn invalid_comment_returns_400() {
    let app = memory_app();
    let created = create_bug(&app, valid_bug()).await;
    let uri = format!("/api/bugs/{}/comments", created["id"].as_str().unwrap());

    let response = post_json(app, &uri, json!({ "content": "No author" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["errors"],
        json!(["Comment author is required"])
    );
}

#[tokio::test]
async fn comment_on_missing_bug_returns_404() {
    let app = memory_app();
    let response = post_json(
        app,
        &format!("/api/bugs/{MISSING_ID}/comments"),
        json!({ "author": "Carol", "content": "Hello" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Stored due dates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_on_bug_past_its_due_date_returns_400() {
    let store = Arc::new(MemoryBugStore::new());
    let now = Utc::now();
    let bug = Bug::new(
        BugId::now_v7(),
        NewBug {
            title: "Overdue bug".to_string(),
            description: "A description long enough".to_string(),
            reporter: "Alice".to_string(),
            assignee: None,
            severity: Severity::High,
            status: Status::Open,
            priority: Priority::Medium,
            tags: vec![],
            steps_to_reproduce: vec![],
            environment: None,
            attachments: vec![],
            comments: vec![],
            due_date: Some(now - Duration::days(3)),
        },
        now - Duration::days(10),
    );
    let uri = format!("/api/bugs/{}", bug.id);
    store.insert(bug).await;
    let app = build_test_app(store);

    let response = put_json(app.clone(), &uri, json!({ "status": "closed" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["errors"],
        json!(["Due date must be in the future"])
    );

    // Supplying a fresh due date clears the way.
    let due = (now + Duration::days(7)).to_rfc3339();
    let response = put_json(app, &uri, json!({ "status": "closed", "dueDate": due })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "closed");
}
