//! Integration tests for the session CRUD surface.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

#[tokio::test]
async fn create_session_returns_created() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/sessions")
        .json(&serde_json::json!({ "name": "Demo" }))
        .await;
    resp.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = resp.json();
    assert!(body["id"].as_str().unwrap().starts_with("ses_"));
    assert_eq!(body["name"], "Demo");
    assert!(body["createdAt"].as_i64().unwrap() > 0);
    // The participant map is internal state and never serialized.
    assert!(body.get("participants").is_none());
}

#[tokio::test]
async fn create_session_rejects_blank_name() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/sessions")
        .json(&serde_json::json!({ "name": "   " }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["field"], "name");
}

#[tokio::test]
async fn list_sessions_returns_all_created() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let a: serde_json::Value = server
        .post("/api/sessions")
        .json(&serde_json::json!({ "name": "A" }))
        .await
        .json();
    let b: serde_json::Value = server
        .post("/api/sessions")
        .json(&serde_json::json!({ "name": "B" }))
        .await
        .json();

    let resp = server.get("/api/sessions").await;
    resp.assert_status(StatusCode::OK);

    let body: serde_json::Value = resp.json();
    let ids: Vec<&str> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a["id"].as_str().unwrap()));
    assert!(ids.contains(&b["id"].as_str().unwrap()));
}

#[tokio::test]
async fn get_session_returns_session_or_404() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let created: serde_json::Value = server
        .post("/api/sessions")
        .json(&serde_json::json!({ "name": "Lookup" }))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let resp = server.get(&format!("/api/sessions/{id}")).await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["name"], "Lookup");

    let resp = server.get("/api/sessions/ses_bogus").await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_session_removes_it() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let created: serde_json::Value = server
        .post("/api/sessions")
        .json(&serde_json::json!({ "name": "Doomed" }))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let resp = server.delete(&format!("/api/sessions/{id}")).await;
    resp.assert_status(StatusCode::NO_CONTENT);

    let resp = server.get(&format!("/api/sessions/{id}")).await;
    resp.assert_status(StatusCode::NOT_FOUND);

    // A second delete finds nothing.
    let resp = server.delete(&format!("/api/sessions/{id}")).await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/health").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "ok");
}
