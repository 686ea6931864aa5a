//! Voting and reputation integration tests.

mod common;

use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

async fn reputation_of(app: &TestApp, user_id: Uuid) -> i64 {
    let body: Value = app
        .client
        .get(format!("{}/api/users/{}", app.address, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["reputation"].as_i64().unwrap()
}

#[tokio::test]
async fn upvoting_a_question_raises_author_reputation() {
    let app = TestApp::spawn().await;

    let (author_id, author_token) = app.register_with_role("author", "moderator").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Vote on me")
        .await;

    let response = app
        .client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "created");
    assert_eq!(body["upvotes"], 1);
    assert_eq!(body["score"], 1);

    assert_eq!(reputation_of(&app, author_id).await, 5);

    app.cleanup().await;
}

#[tokio::test]
async fn repeating_the_same_vote_changes_nothing() {
    let app = TestApp::spawn().await;

    let (author_id, author_token) = app.register_with_role("author", "moderator").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Idempotent votes")
        .await;

    let vote = || {
        app.client
            .post(format!("{}/api/questions/{}/vote", app.address, question_id))
            .bearer_auth(&voter_token)
            .json(&json!({ "vote": "up" }))
            .send()
    };

    vote().await.unwrap();
    let second: Value = vote().await.unwrap().json().await.unwrap();
    assert_eq!(second["outcome"], "unchanged");
    assert_eq!(second["upvotes"], 1);

    assert_eq!(reputation_of(&app, author_id).await, 5);

    app.cleanup().await;
}

#[tokio::test]
async fn opposite_vote_flips_and_adjusts_reputation() {
    let app = TestApp::spawn().await;

    let (author_id, author_token) = app.register_with_role("author", "moderator").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Flip me")
        .await;

    app.client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "up" }))
        .send()
        .await
        .unwrap();

    let flipped: Value = app
        .client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "down" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(flipped["outcome"], "flipped");
    assert_eq!(flipped["upvotes"], 0);
    assert_eq!(flipped["downvotes"], 1);
    assert_eq!(flipped["score"], -1);

    // +5 reversed, then -1: clamped arithmetic lands at 0.
    assert_eq!(reputation_of(&app, author_id).await, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn reputation_never_goes_negative() {
    let app = TestApp::spawn().await;

    let (author_id, author_token) = app.register_with_role("author", "moderator").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Downvoted hard")
        .await;

    app.client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "down" }))
        .send()
        .await
        .unwrap();

    assert_eq!(reputation_of(&app, author_id).await, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn self_voting_is_rejected() {
    let app = TestApp::spawn().await;

    let (_, author_token) = app.register_with_role("author", "moderator").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "My own question")
        .await;

    let response = app
        .client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&author_token)
        .json(&json!({ "vote": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn retracting_a_vote_reverses_reputation() {
    let app = TestApp::spawn().await;

    let (author_id, author_token) = app.register_with_role("author", "moderator").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Retractable")
        .await;

    app.client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reputation_of(&app, author_id).await, 5);

    let response = app
        .client
        .delete(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["retracted"], true);
    assert_eq!(body["score"], 0);

    assert_eq!(reputation_of(&app, author_id).await, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn answer_upvote_uses_the_answer_delta() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (answerer_id, answerer_token) = app.register_and_login("answerer").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Answer votes")
        .await;
    let answer_id = app.create_answer(&answerer_token, question_id).await;

    let response = app
        .client
        .post(format!("{}/api/answers/{}/vote", app.address, answer_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "up" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert_eq!(reputation_of(&app, answerer_id).await, 10);

    app.cleanup().await;
}

#[tokio::test]
async fn tally_endpoint_lists_individual_voters() {
    let app = TestApp::spawn().await;

    let (_, author_token) = app.register_with_role("author", "moderator").await;
    let (up_id, up_token) = app.register_and_login("upvoter").await;
    let (down_id, down_token) = app.register_and_login("downvoter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "Who voted here?")
        .await;

    for (token, direction) in [(&up_token, "up"), (&down_token, "down")] {
        app.client
            .post(format!("{}/api/questions/{}/vote", app.address, question_id))
            .bearer_auth(token)
            .json(&json!({ "vote": direction }))
            .send()
            .await
            .unwrap();
    }

    let tally: Value = app
        .client
        .get(format!("{}/api/questions/{}/votes", app.address, question_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tally["upvotes"], 1);
    assert_eq!(tally["downvotes"], 1);
    assert_eq!(tally["score"], 0);

    let voters = tally["votes"].as_array().unwrap();
    assert_eq!(voters.len(), 2);
    let vote_of = |id: Uuid| {
        voters
            .iter()
            .find(|v| v["user_id"].as_str() == Some(&id.to_string()))
            .map(|v| v["vote_value"].as_i64().unwrap())
    };
    assert_eq!(vote_of(up_id), Some(1));
    assert_eq!(vote_of(down_id), Some(-1));

    app.cleanup().await;
}

#[tokio::test]
async fn my_vote_endpoint_reports_current_state() {
    let app = TestApp::spawn().await;

    let (_, author_token) = app.register_with_role("author", "moderator").await;
    let (_, voter_token) = app.register_and_login("voter").await;

    let category_id = app.create_category(&author_token, "General").await;
    let question_id = app
        .create_question(&author_token, category_id, "What did I vote?")
        .await;

    let before: Value = app
        .client
        .get(format!("{}/api/questions/{}/votes/me", app.address, question_id))
        .bearer_auth(&voter_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(before["my_vote"].is_null());

    app.client
        .post(format!("{}/api/questions/{}/vote", app.address, question_id))
        .bearer_auth(&voter_token)
        .json(&json!({ "vote": "down" }))
        .send()
        .await
        .unwrap();

    let after: Value = app
        .client
        .get(format!("{}/api/questions/{}/votes/me", app.address, question_id))
        .bearer_auth(&voter_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["my_vote"], "down");

    app.cleanup().await;
}
