//! Answer lifecycle and acceptance integration tests.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn answering_notifies_the_question_author() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Needs an answer")
        .await;
    app.create_answer(&answerer_token, question_id).await;

    let notifications: Value = app
        .client
        .get(format!("{}/api/notifications", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let items = notifications["items"].as_array().unwrap();
    assert!(items
        .iter()
        .any(|n| n["type"] == "answer_posted" && n["is_read"] == false));

    app.cleanup().await;
}

#[tokio::test]
async fn answering_your_own_question_does_not_notify() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Self answered")
        .await;
    app.create_answer(&asker_token, question_id).await;

    let notifications: Value = app
        .client
        .get(format!("{}/api/notifications", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let items = notifications["items"].as_array().unwrap();
    assert!(!items.iter().any(|n| n["type"] == "answer_posted"));

    app.cleanup().await;
}

#[tokio::test]
async fn answer_is_fetchable_by_id() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (answerer_id, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Fetch my answer")
        .await;
    let answer_id = app.create_answer(&answerer_token, question_id).await;

    let response = app
        .client
        .get(format!("{}/api/answers/{}", app.address, answer_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"].as_str().unwrap(), answer_id.to_string());
    assert_eq!(
        body["author"]["id"].as_str().unwrap(),
        answerer_id.to_string()
    );
    assert_eq!(body["is_accepted"], false);

    let missing = app
        .client
        .get(format!(
            "{}/api/answers/{}",
            app.address,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn answer_counter_is_a_plain_series() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Counted once")
        .await;
    app.create_answer(&answerer_token, question_id).await;

    let body = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(
        body.lines()
            .any(|l| l.starts_with("qa_answers_created_total ")),
        "answer counter should be exposed without labels"
    );
    assert!(
        !body.contains("qa_answers_created_total{"),
        "answer counter should not carry a label dimension"
    );

    app.cleanup().await;
}

#[tokio::test]
async fn accepting_an_answer_clears_the_previous_one() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, first_token) = app.register_and_login("first").await;
    let (_, second_token) = app.register_and_login("second").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Two answers")
        .await;
    let first_answer = app.create_answer(&first_token, question_id).await;
    let second_answer = app.create_answer(&second_token, question_id).await;

    let accept = |id| {
        app.client
            .post(format!("{}/api/answers/{}/accept", app.address, id))
            .bearer_auth(&asker_token)
            .send()
    };

    let response = accept(first_answer).await.unwrap();
    assert_eq!(response.status(), 200);

    let response = accept(second_answer).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_accepted"], true);

    // Accepted answers sort first; only one may be accepted at a time.
    let answers: Value = app
        .client
        .get(format!("{}/api/questions/{}/answers", app.address, question_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let accepted: Vec<_> = answers
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["is_accepted"] == true)
        .collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0]["id"].as_str().unwrap(), second_answer.to_string());

    app.cleanup().await;
}

#[tokio::test]
async fn only_the_question_author_can_accept() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Accept rights")
        .await;
    let answer_id = app.create_answer(&answerer_token, question_id).await;

    let response = app
        .client
        .post(format!("{}/api/answers/{}/accept", app.address, answer_id))
        .bearer_auth(&answerer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn acceptance_notifies_the_answer_author() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Will be accepted")
        .await;
    let answer_id = app.create_answer(&answerer_token, question_id).await;

    app.client
        .post(format!("{}/api/answers/{}/accept", app.address, answer_id))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap();

    let notifications: Value = app
        .client
        .get(format!("{}/api/notifications", app.address))
        .bearer_auth(&answerer_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let items = notifications["items"].as_array().unwrap();
    assert!(items.iter().any(|n| n["type"] == "answer_accepted"));

    app.cleanup().await;
}

#[tokio::test]
async fn answer_update_is_owner_scoped() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;
    let (_, other_token) = app.register_and_login("other").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Edit scoping")
        .await;
    let answer_id = app.create_answer(&answerer_token, question_id).await;

    let forbidden = app
        .client
        .put(format!("{}/api/answers/{}", app.address, answer_id))
        .bearer_auth(&other_token)
        .json(&json!({ "body": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let allowed = app
        .client
        .put(format!("{}/api/answers/{}", app.address, answer_id))
        .bearer_auth(&answerer_token)
        .json(&json!({ "body": "Edited body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    let body: Value = allowed.json().await.unwrap();
    assert_eq!(body["body"], "Edited body");

    app.cleanup().await;
}
