use casting_server::services::payment::sign;
use serde_json::json;

use crate::common::{TestApp, routes};

const KEY_ID: &str = "rzp_test_key";
const KEY_SECRET: &str = "rzp_test_secret";

async fn configure_gateway(app: &TestApp) {
    app.set_setting("razorpay_key_id", KEY_ID).await;
    app.set_setting("razorpay_key_secret", KEY_SECRET).await;
}

#[tokio::test]
async fn orders_need_gateway_keys() {
    let app = TestApp::spawn().await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let res = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 50000}), &actor)
        .await;
    assert_eq!(res.status, 503);
    assert_eq!(res.body["code"], "GATEWAY_NOT_CONFIGURED");
}

#[tokio::test]
async fn create_order_returns_checkout_data() {
    let app = TestApp::spawn().await;
    configure_gateway(&app).await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let res = app
        .post_with_token(
            routes::PAYMENT_ORDERS,
            &json!({"amount": 50000, "currency": "inr", "notes": "Registration fee"}),
            &actor,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["key_id"], KEY_ID);
    assert_eq!(res.data()["currency"], "INR");
    assert_eq!(res.data()["amount"], 50000);
    assert!(res.data()["order_id"].as_str().unwrap().starts_with("order_"));
    assert!(res.data()["receipt"].as_str().unwrap().len() <= 40);
    assert!(!res.text.contains(KEY_SECRET));

    let res = app.get_with_token(routes::MY_PAYMENTS, &actor).await;
    assert_eq!(res.status, 200);
    let items = res.data()["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "created");
}

#[tokio::test]
async fn amount_below_minimum_is_rejected() {
    let app = TestApp::spawn().await;
    configure_gateway(&app).await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let res = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 5}), &actor)
        .await;
    assert_eq!(res.status, 422);
    assert!(res.data()["amount"].is_array());
}

#[tokio::test]
async fn valid_signature_marks_payment_paid() {
    let app = TestApp::spawn().await;
    configure_gateway(&app).await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let order = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 50000}), &actor)
        .await;
    let order_id = order.data()["order_id"].as_str().unwrap().to_string();
    let signature = sign(&order_id, "pay_001", KEY_SECRET);

    let body = json!({"order_id": order_id, "payment_id": "pay_001", "signature": signature});
    let res = app.post_with_token(routes::PAYMENT_VERIFY, &body, &actor).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["status"], "paid");
    assert_eq!(res.data()["payment_id"], "pay_001");

    // Verifying again is idempotent.
    let res = app.post_with_token(routes::PAYMENT_VERIFY, &body, &actor).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["status"], "paid");
}

#[tokio::test]
async fn invalid_signature_marks_payment_failed() {
    let app = TestApp::spawn().await;
    configure_gateway(&app).await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let order = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 50000}), &actor)
        .await;
    let order_id = order.data()["order_id"].as_str().unwrap().to_string();
    let forged = sign(&order_id, "pay_001", "not-the-secret");

    let res = app
        .post_with_token(
            routes::PAYMENT_VERIFY,
            &json!({"order_id": order_id, "payment_id": "pay_001", "signature": forged}),
            &actor,
        )
        .await;
    assert_eq!(res.status, 422);
    assert!(res.data()["signature"].is_array());

    let res = app.get_with_token(routes::MY_PAYMENTS, &actor).await;
    assert_eq!(res.data()["items"][0]["status"], "failed");
}

#[tokio::test]
async fn orders_of_other_users_are_not_found() {
    let app = TestApp::spawn().await;
    configure_gateway(&app).await;
    let asha = app.register_and_login("Asha", "asha@example.com").await;
    let ravi = app.register_and_login("Ravi", "ravi@example.com").await;

    let order = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 50000}), &asha)
        .await;
    let order_id = order.data()["order_id"].as_str().unwrap().to_string();
    let signature = sign(&order_id, "pay_001", KEY_SECRET);

    let res = app
        .post_with_token(
            routes::PAYMENT_VERIFY,
            &json!({"order_id": order_id, "payment_id": "pay_001", "signature": signature}),
            &ravi,
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn admin_lists_all_payments() {
    let app = TestApp::spawn().await;
    configure_gateway(&app).await;
    let admin = app.create_admin("admin@example.com").await;
    let asha = app.register_and_login("Asha", "asha@example.com").await;
    let ravi = app.register_and_login("Ravi", "ravi@example.com").await;

    for token in [&asha, &ravi] {
        let res = app
            .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 20000}), token)
            .await;
        assert_eq!(res.status, 201);
    }

    assert_eq!(app.get_with_token(routes::PAYMENTS, &asha).await.status, 403);

    let res = app.get_with_token(routes::PAYMENTS, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["pagination"]["total"], 2);

    let ravi_id = app.find_user("ravi@example.com").await.id;
    let res = app
        .get_with_token(&format!("{}?user_id={ravi_id}", routes::PAYMENTS), &admin)
        .await;
    assert_eq!(res.data()["pagination"]["total"], 1);
}
