use serde_json::json;

use crate::common::{TestApp, routes};

async fn register_device(app: &TestApp, name: &str, email: &str, gender: &str, device: &str) {
    let token = app.register_and_login(name, email).await;
    let res = app
        .patch_with_token(routes::PROFILE, &json!({"gender": gender}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let res = app
        .put_with_token(routes::DEVICE_TOKEN, &json!({"device_token": device}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn no_matching_devices_is_recorded_as_no_recipients() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    app.register_and_login("Asha", "asha@example.com").await;

    let res = app
        .post_with_token(
            routes::NOTIFICATIONS,
            &json!({"title": "Auditions open", "message": "New roles posted."}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["status"], "no_recipients");
    assert_eq!(res.data()["recipient_count"], 0);
    assert!(res.data()["sent_at"].is_null());
    assert!(app.notifier.pushes().is_empty());
}

#[tokio::test]
async fn push_goes_to_filtered_devices() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    register_device(&app, "Asha", "asha@example.com", "female", "device-asha").await;
    register_device(&app, "Ravi", "ravi@example.com", "male", "device-ravi").await;
    app.register_and_login("Kiran", "kiran@example.com").await;

    let res = app
        .post_with_token(
            routes::NOTIFICATIONS,
            &json!({
                "title": "Female lead wanted",
                "message": "Apply by Friday.",
                "filters": {"gender": "Female"},
            }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["status"], "sent");
    assert_eq!(res.data()["recipient_count"], 1);
    assert_eq!(res.data()["filters"]["gender"], "female");
    assert!(res.data()["sent_at"].is_string());

    let pushes = app.notifier.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].0, vec!["device-asha".to_string()]);
    assert_eq!(pushes[0].1, "Female lead wanted");

    let res = app
        .post_with_token(
            routes::NOTIFICATIONS,
            &json!({"title": "Everyone", "message": "Hello."}),
            &admin,
        )
        .await;
    assert_eq!(res.data()["recipient_count"], 2);
}

#[tokio::test]
async fn history_is_listed_and_deletable() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let id = app
        .post_with_token(
            routes::NOTIFICATIONS,
            &json!({"title": "Hello", "message": "World"}),
            &admin,
        )
        .await
        .id();

    let res = app.get_with_token(routes::NOTIFICATIONS, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["pagination"]["total"], 1);

    let res = app
        .get_with_token(&format!("{}?status=sent", routes::NOTIFICATIONS), &admin)
        .await;
    assert_eq!(res.data()["pagination"]["total"], 0);

    assert_eq!(app.get_with_token(&routes::notification(id), &admin).await.status, 200);
    assert_eq!(app.delete_with_token(&routes::notification(id), &admin).await.status, 200);
    assert_eq!(app.get_with_token(&routes::notification(id), &admin).await.status, 404);
}

#[tokio::test]
async fn applicants_cannot_broadcast() {
    let app = TestApp::spawn().await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let res = app
        .post_with_token(
            routes::NOTIFICATIONS,
            &json!({"title": "Spam", "message": "Spam"}),
            &actor,
        )
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let res = app
        .post_with_token(
            routes::NOTIFICATIONS,
            &json!({"title": " ", "message": "Body"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 422);
    assert!(res.data()["title"].is_array());
}
