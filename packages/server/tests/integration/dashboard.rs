use casting_server::services::payment::sign;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn applicants_cannot_view_dashboard() {
    let app = TestApp::spawn().await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    assert_eq!(app.get_with_token(routes::DASHBOARD, &actor).await.status, 403);
}

#[tokio::test]
async fn dashboard_counts_activity() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;
    app.set_setting("razorpay_key_id", "rzp_test_key").await;
    app.set_setting("razorpay_key_secret", "rzp_test_secret").await;

    let movie_id = app
        .create_movie(
            &admin,
            "Monsoon Letters",
            30,
            json!([{"role_type": "Lead"}, {"role_type": "Postman", "status": "closed"}]),
        )
        .await;
    app.create_movie(&admin, "Last Year", -10, json!([])).await;
    let res = app.submit_audition(&actor, movie_id, "Lead", "take.mp4").await;
    assert_eq!(res.status, 201, "{}", res.text);

    let order = app
        .post_with_token(routes::PAYMENT_ORDERS, &json!({"amount": 25000}), &actor)
        .await;
    let order_id = order.data()["order_id"].as_str().unwrap().to_string();
    let res = app
        .post_with_token(
            routes::PAYMENT_VERIFY,
            &json!({
                "order_id": &order_id,
                "payment_id": "pay_1",
                "signature": sign(&order_id, "pay_1", "rzp_test_secret"),
            }),
            &actor,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_with_token(routes::DASHBOARD, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let data = res.data();
    assert_eq!(data["users_total"], 2);
    assert_eq!(data["users_active"], 2);
    assert_eq!(data["movies_total"], 2);
    assert_eq!(data["movies_by_status"]["active"], 2);
    assert_eq!(data["movies_by_status"]["inactive"], 0);
    assert_eq!(data["open_roles"], 1);
    assert_eq!(data["auditions_total"], 1);
    assert_eq!(data["auditions_by_status"]["pending"], 1);
    assert_eq!(data["paid_payments_count"], 1);
    assert_eq!(data["paid_payments_amount"], 25000);
}
