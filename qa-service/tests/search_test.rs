//! Fuzzy search integration tests. These rely on the pg_trgm extension
//! installed by the migrations.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn search_finds_similar_question_titles() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("searcher", "moderator").await;
    let category_id = app.create_category(&token, "General").await;

    app.create_question(&token, category_id, "Postgres connection pooling")
        .await;
    app.create_question(&token, category_id, "Rust lifetime puzzle")
        .await;

    let results: Value = app
        .client
        .get(format!("{}/api/search/postgres%20pooling", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let questions = results["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["title"], "Postgres connection pooling");

    app.cleanup().await;
}

#[tokio::test]
async fn search_matches_question_bodies_too() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("author", "moderator").await;
    let category_id = app.create_category(&token, "General").await;

    let response = app
        .client
        .post(format!("{}/api/questions", app.address))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Unrelated headline",
            "body": "The connection keeps failing with a handshake timeout.",
            "category_id": category_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let results: Value = app
        .client
        .get(format!("{}/api/search/handshake%20timeout", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let questions = results["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["title"], "Unrelated headline");

    app.cleanup().await;
}

#[tokio::test]
async fn search_matches_users_and_tags() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("rustacean", "moderator").await;

    app.client
        .post(format!("{}/api/tags", app.address))
        .bearer_auth(&token)
        .json(&json!({ "name": "rustlang" }))
        .send()
        .await
        .unwrap();

    let results: Value = app
        .client
        .get(format!("{}/api/search/rust", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(results["users"]
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["username"] == "rustacean"));
    assert!(results["tags"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["name"] == "rustlang"));
    // Sanitized user payloads only.
    assert!(results["users"][0].get("email").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn unrelated_queries_return_empty_results() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("poster", "moderator").await;
    let category_id = app.create_category(&token, "General").await;
    app.create_question(&token, category_id, "Kubernetes ingress rules")
        .await;

    let results: Value = app
        .client
        .get(format!("{}/api/search/zzzzqqqq", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(results["questions"].as_array().unwrap().is_empty());
    assert!(results["tags"].as_array().unwrap().is_empty());

    app.cleanup().await;
}
