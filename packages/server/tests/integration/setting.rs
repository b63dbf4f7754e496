use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn item<'a>(items: &'a Value, key: &str) -> &'a Value {
    items
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["key"] == key)
        .unwrap_or_else(|| panic!("setting '{key}' missing"))
}

#[tokio::test]
async fn defaults_are_seeded_and_secrets_masked() {
    let app = TestApp::spawn().await;
    let root = app.create_super_admin("root@example.com").await;
    app.set_setting("razorpay_key_secret", "rzp_secret_value").await;

    let res = app.get_with_token(routes::SETTINGS, &root).await;
    assert_eq!(res.status, 200, "{}", res.text);

    assert_eq!(item(res.data(), "site_name")["value"], "Casting Call");
    let secret = item(res.data(), "razorpay_key_secret");
    assert_eq!(secret["value"], "********");
    assert_eq!(secret["is_secret"], true);
    assert_eq!(secret["category"], "payment");
}

#[tokio::test]
async fn admin_role_cannot_manage_settings() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    assert_eq!(app.get_with_token(routes::SETTINGS, &admin).await.status, 403);
}

#[tokio::test]
async fn masked_value_round_trip_keeps_the_secret() {
    let app = TestApp::spawn().await;
    let root = app.create_super_admin("root@example.com").await;
    app.set_setting("razorpay_key_id", "rzp_test_key").await;
    app.set_setting("razorpay_key_secret", "rzp_secret_value").await;

    let res = app
        .put_with_token(
            routes::SETTINGS,
            &json!({"settings": {
                "site_name": "  Open Casting  ",
                "razorpay_key_secret": "********",
            }}),
            &root,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(item(res.data(), "site_name")["value"], "Open Casting");

    // The secret survived and still validates orders.
    let actor = app.register_and_login("Asha", "asha@example.com").await;
    let res = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 50000}), &actor)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
}

#[tokio::test]
async fn invalid_values_are_rejected() {
    let app = TestApp::spawn().await;
    let root = app.create_super_admin("root@example.com").await;

    let res = app
        .put_with_token(
            routes::SETTINGS,
            &json!({"settings": {"max_video_size_mb": "lots"}}),
            &root,
        )
        .await;
    assert_eq!(res.status, 422);

    let res = app
        .put_with_token(routes::SETTINGS, &json!({"settings": {}}), &root)
        .await;
    assert_eq!(res.status, 422);
}

#[tokio::test]
async fn public_settings_exclude_secrets() {
    let app = TestApp::spawn().await;
    app.set_setting("razorpay_key_id", "rzp_test_key").await;
    app.set_setting("razorpay_key_secret", "rzp_secret_value").await;

    let res = app.get_without_token(routes::PUBLIC_SETTINGS).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["razorpay_key_id"], "rzp_test_key");
    assert_eq!(res.data()["site_name"], "Casting Call");
    assert!(res.data().get("razorpay_key_secret").is_none());
    assert!(res.data().get("firebase_server_key").is_none());
    assert!(!res.text.contains("rzp_secret_value"));
}

#[tokio::test]
async fn oversized_upload_limit_is_rejected() {
    let app = TestApp::spawn().await;
    let root = app.create_super_admin("root@example.com").await;

    let res = app
        .put_with_token(
            routes::SETTINGS,
            &json!({"settings": {"max_video_size_mb": "17592186044416"}}),
            &root,
        )
        .await;
    assert_eq!(res.status, 422, "{}", res.text);
    assert!(res.body["data"]["max_video_size_mb"].is_array());
}

#[tokio::test]
async fn stored_out_of_range_limit_falls_back_to_config() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;
    app.set_setting("max_video_size_mb", "17592186044416").await;

    let movie_id = app
        .create_movie(&admin, "Monsoon Letters", 30, json!([{"role_type": "Lead"}]))
        .await;
    let res = app.submit_audition(&actor, movie_id, "Lead", "take1.mp4").await;
    assert_eq!(res.status, 201, "{}", res.text);
}
