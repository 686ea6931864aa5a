//! Question lifecycle integration tests.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn question_create_embeds_author_category_and_tags() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("asker", "moderator").await;
    let category_id = app.create_category(&token, "Databases").await;

    let tag: Value = app
        .client
        .post(format!("{}/api/tags", app.address))
        .bearer_auth(&token)
        .json(&json!({ "name": "postgres" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tag_id = tag["id"].as_str().unwrap();

    let response = app
        .client
        .post(format!("{}/api/questions", app.address))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Why is my index not used?",
            "body": "The planner keeps choosing a seq scan.",
            "category_id": category_id,
            "tag_ids": [tag_id],
        }))
        .send()
        .await
        .expect("Failed to create question");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["title"], "Why is my index not used?");
    assert_eq!(body["author"]["username"], "asker");
    assert_eq!(body["category"]["name"], "Databases");
    assert_eq!(body["tags"][0]["name"], "postgres");
    assert_eq!(body["view_count"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn question_with_unknown_category_is_not_found() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_and_login("asker").await;

    let response = app
        .client
        .post(format!("{}/api/questions", app.address))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Lost question",
            "body": "Where does this go?",
            "category_id": "00000000-0000-0000-0000-000000000000",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn fetching_a_question_increments_view_count() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("asker", "moderator").await;
    let category_id = app.create_category(&token, "General").await;
    let question_id = app.create_question(&token, category_id, "View counting").await;

    for _ in 0..3 {
        app.client
            .get(format!("{}/api/questions/{}", app.address, question_id))
            .send()
            .await
            .unwrap();
    }

    let body: Value = app
        .client
        .get(format!("{}/api/questions/{}", app.address, question_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["view_count"], 4);

    app.cleanup().await;
}

#[tokio::test]
async fn listing_questions_is_paginated_newest_first() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("asker", "moderator").await;
    let category_id = app.create_category(&token, "General").await;

    for i in 0..5 {
        app.create_question(&token, category_id, &format!("Question number {}", i))
            .await;
    }

    let body: Value = app
        .client
        .get(format!("{}/api/questions?limit=2&offset=0", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["total"], 5);
    assert_eq!(body["limit"], 2);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Question number 4");

    app.cleanup().await;
}

#[tokio::test]
async fn only_the_author_or_moderator_can_update() {
    let app = TestApp::spawn().await;

    let (_, author_token) = app.register_with_role("author", "moderator").await;
    let (_, other_token) = app.register_and_login("other").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Original title")
        .await;

    let forbidden = app
        .client
        .put(format!("{}/api/questions/{}", app.address, question_id))
        .bearer_auth(&other_token)
        .json(&json!({ "title": "Hijacked title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let allowed = app
        .client
        .put(format!("{}/api/questions/{}", app.address, question_id))
        .bearer_auth(&author_token)
        .json(&json!({ "title": "Edited title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    let body: Value = allowed.json().await.unwrap();
    assert_eq!(body["title"], "Edited title");

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_a_question_cascades_to_answers() {
    let app = TestApp::spawn().await;

    let (_, author_token) = app.register_with_role("author", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Doomed question")
        .await;
    let answer_id = app.create_answer(&answerer_token, question_id).await;

    let response = app
        .client
        .delete(format!("{}/api/questions/{}", app.address, question_id))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let gone = app
        .client
        .put(format!("{}/api/answers/{}", app.address, answer_id))
        .bearer_auth(&answerer_token)
        .json(&json!({ "body": "Still here?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn questions_by_category_and_title_filters() {
    let app = TestApp::spawn().await;

    let (_, token) = app.register_with_role("asker", "moderator").await;
    let rust_cat = app.create_category(&token, "Rust").await;
    let sql_cat = app.create_category(&token, "SQL").await;

    app.create_question(&token, rust_cat, "Borrow checker puzzle")
        .await;
    app.create_question(&token, sql_cat, "Window function help")
        .await;

    let by_category: Value = app
        .client
        .get(format!("{}/api/categories/{}/questions", app.address, rust_cat))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_category.as_array().unwrap().len(), 1);
    assert_eq!(by_category[0]["title"], "Borrow checker puzzle");

    let by_title: Value = app
        .client
        .get(format!("{}/api/questions/by-title/borrow", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_title.as_array().unwrap().len(), 1);

    app.cleanup().await;
}
