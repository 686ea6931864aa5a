//! Badge definition and automatic award integration tests.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn seeded_badges_are_listed_publicly() {
    let app = TestApp::spawn().await;

    let badges: Value = app
        .client
        .get(format!("{}/api/badges", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let names: Vec<&str> = badges
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"First Answer"));
    assert!(names.contains(&"100 Reputation"));

    app.cleanup().await;
}

#[tokio::test]
async fn badge_list_supports_category_and_level_filters() {
    let app = TestApp::spawn().await;

    let quality: Value = app
        .client
        .get(format!("{}/api/badges?category=quality", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = quality
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["10 Approved Answers", "First Approval"]);

    let gold_quality: Value = app
        .client
        .get(format!(
            "{}/api/badges?category=quality&level=gold",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = gold_quality
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["10 Approved Answers"]);

    app.cleanup().await;
}

#[tokio::test]
async fn first_answer_badge_is_awarded_automatically() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (answerer_id, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Badge bait")
        .await;
    app.create_answer(&answerer_token, question_id).await;

    let badges: Value = app
        .client
        .get(format!("{}/api/users/{}/badges", app.address, answerer_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let names: Vec<&str> = badges
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"First Answer"));

    // The award also lands in the notification inbox.
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
    assert!(notifications["items"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["type"] == "badge_earned"));

    app.cleanup().await;
}

#[tokio::test]
async fn badge_is_never_awarded_twice() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (answerer_id, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Two answers, one badge")
        .await;
    app.create_answer(&answerer_token, question_id).await;
    app.create_answer(&answerer_token, question_id).await;

    let badges: Value = app
        .client
        .get(format!("{}/api/users/{}/badges", app.address, answerer_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let first_answer_count = badges
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["name"] == "First Answer")
        .count();
    assert_eq!(first_answer_count, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn badge_management_is_admin_only() {
    let app = TestApp::spawn().await;

    let (_, user_token) = app.register_and_login("plainuser").await;
    let (_, admin_token) = app.register_with_role("admin", "admin").await;

    let badge = json!({
        "name": "Night Owl",
        "description": "Posted 50 answers.",
        "criteria": { "type": "answers_posted", "threshold": 50 },
        "category": "participation",
        "level": "gold",
    });

    let forbidden = app
        .client
        .post(format!("{}/api/badges", app.address))
        .bearer_auth(&user_token)
        .json(&badge)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let created = app
        .client
        .post(format!("{}/api/badges", app.address))
        .bearer_auth(admin_token)
        .json(&badge)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let body: Value = created.json().await.unwrap();
    assert_eq!(body["name"], "Night Owl");
    assert_eq!(body["level"], "gold");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_criteria_shape_is_rejected() {
    let app = TestApp::spawn().await;

    let (_, admin_token) = app.register_with_role("admin", "admin").await;

    let response = app
        .client
        .post(format!("{}/api/badges", app.address))
        .bearer_auth(admin_token)
        .json(&json!({
            "name": "Mystery",
            "criteria": { "type": "phases_of_the_moon", "threshold": 3 },
            "category": "community",
            "level": "bronze",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}
