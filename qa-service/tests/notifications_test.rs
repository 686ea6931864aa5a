//! Notification inbox integration tests.

mod common;

use common::TestApp;
use serde_json::Value;
use uuid::Uuid;

/// Set up one answer_posted notification for the asker and return its id.
async fn seed_notification(app: &TestApp, asker_token: &str) -> Uuid {
    let notifications: Value = app
        .client
        .get(format!("{}/api/notifications", app.address))
        .bearer_auth(asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = notifications["items"][0]["id"].as_str().unwrap();
    Uuid::parse_str(id).unwrap()
}

#[tokio::test]
async fn unread_count_tracks_reads() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Inbox test")
        .await;
    app.create_answer(&answerer_token, question_id).await;

    let count: Value = app
        .client
        .get(format!("{}/api/notifications/unread-count", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["unread"], 1);

    let notification_id = seed_notification(&app, &asker_token).await;
    let response = app
        .client
        .put(format!(
            "{}/api/notifications/{}/read",
            app.address, notification_id
        ))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_read"], true);

    let count: Value = app
        .client
        .get(format!("{}/api/notifications/unread-count", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["unread"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn read_all_marks_everything() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, a_token) = app.register_and_login("helper_a").await;
    let (_, b_token) = app.register_and_login("helper_b").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Busy question")
        .await;
    app.create_answer(&a_token, question_id).await;
    app.create_answer(&b_token, question_id).await;

    let response: Value = app
        .client
        .put(format!("{}/api/notifications/read-all", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["marked_read"], 2);

    let count: Value = app
        .client
        .get(format!("{}/api/notifications/unread-count", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["unread"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn unread_only_filter_hides_read_items() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    for title in ["First inbox entry", "Second inbox entry"] {
        let question_id = app.create_question(&asker_token, category_id, title).await;
        app.create_answer(&answerer_token, question_id).await;
    }

    let notification_id = seed_notification(&app, &asker_token).await;
    app.client
        .put(format!(
            "{}/api/notifications/{}/read",
            app.address, notification_id
        ))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap();

    let unread: Value = app
        .client
        .get(format!(
            "{}/api/notifications?unread_only=true",
            app.address
        ))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread["total"], 1);
    assert_eq!(unread["items"].as_array().unwrap().len(), 1);
    assert_eq!(unread["items"][0]["is_read"], false);

    let all: Value = app
        .client
        .get(format!("{}/api/notifications", app.address))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["total"], 2);

    app.cleanup().await;
}

#[tokio::test]
async fn notifications_are_owner_scoped() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;
    let (_, snoop_token) = app.register_and_login("snoop").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Private inbox")
        .await;
    app.create_answer(&answerer_token, question_id).await;

    let notification_id = seed_notification(&app, &asker_token).await;

    // Another user cannot read or delete someone else's notification.
    let response = app
        .client
        .put(format!(
            "{}/api/notifications/{}/read",
            app.address, notification_id
        ))
        .bearer_auth(&snoop_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = app
        .client
        .delete(format!(
            "{}/api/notifications/{}",
            app.address, notification_id
        ))
        .bearer_auth(&snoop_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_a_notification_removes_it() {
    let app = TestApp::spawn().await;

    let (_, asker_token) = app.register_with_role("asker", "moderator").await;
    let (_, answerer_token) = app.register_and_login("answerer").await;

    let category_id = app.create_category(&asker_token, "General").await;
    let question_id = app
        .create_question(&asker_token, category_id, "Delete me")
        .await;
    app.create_answer(&answerer_token, question_id).await;

    let notification_id = seed_notification(&app, &asker_token).await;

    let response = app
        .client
        .delete(format!(
            "{}/api/notifications/{}",
            app.address, notification_id
        ))
        .bearer_auth(&asker_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

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
    assert_eq!(notifications["total"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn anonymous_access_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/api/notifications", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}
