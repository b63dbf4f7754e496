use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn plain_user_cannot_list_users() {
    let app = TestApp::spawn().await;
    let token = app.register_and_login("Asha", "asha@example.com").await;

    let res = app.get_with_token(routes::USERS, &token).await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn admin_lists_and_searches_users() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    app.register_and_login("Asha Verma", "asha@example.com").await;
    app.register_and_login("Ravi Kumar", "ravi@example.com").await;

    let res = app.get_with_token(routes::USERS, &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["pagination"]["total"], 3);

    let res = app
        .get_with_token(&format!("{}?search=verma", routes::USERS), &admin)
        .await;
    assert_eq!(res.status, 200);
    let items = res.data()["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["email"], "asha@example.com");
}

#[tokio::test]
async fn invalid_status_filter_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let res = app
        .get_with_token(&format!("{}?status=sleeping", routes::USERS), &admin)
        .await;
    assert_eq!(res.status, 422);
}

#[tokio::test]
async fn admin_creates_and_updates_user() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let user_role = app.db_role_id("User").await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "name": "Kiran",
                "email": "kiran@example.com",
                "password": "initial-secret",
                "role_id": user_role,
                "gender": "Female",
            }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();
    assert_eq!(res.data()["gender"], "female");

    let res = app
        .patch_with_token(&routes::user(id), &json!({"phone": "+91 98765 43210"}), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["phone"], "+91 98765 43210");

    let res = app
        .patch_with_token(&routes::user(id), &json!({"phone": null}), &admin)
        .await;
    assert_eq!(res.status, 200);
    assert!(res.data()["phone"].is_null());

    app.login("kiran@example.com", "initial-secret").await;
}

#[tokio::test]
async fn create_user_with_unknown_role_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "name": "Kiran",
                "email": "kiran@example.com",
                "password": "initial-secret",
                "role_id": 9999,
            }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 422);
    assert!(res.data()["role_id"].is_array());
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let id = app.find_user("admin@example.com").await.id;

    let res = app.delete_with_token(&routes::user(id), &admin).await;
    assert_eq!(res.status, 422);
}

#[tokio::test]
async fn admin_cannot_deactivate_self() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let id = app.find_user("admin@example.com").await.id;

    let res = app
        .patch_with_token(&routes::user_status(id), &json!({"status": "inactive"}), &admin)
        .await;
    assert_eq!(res.status, 422);
}

#[tokio::test]
async fn user_with_auditions_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;
    let actor_id = app.find_user("asha@example.com").await.id;

    let movie_id = app
        .create_movie(&admin, "Monsoon Letters", 30, json!([{"role_type": "Lead"}]))
        .await;
    let res = app.submit_audition(&actor, movie_id, "Lead", "take1.mp4").await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app.delete_with_token(&routes::user(actor_id), &admin).await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn delete_user_without_history() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    app.register_and_login("Asha", "asha@example.com").await;
    let id = app.find_user("asha@example.com").await.id;

    let res = app.delete_with_token(&routes::user(id), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_with_token(&routes::user(id), &admin).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn admin_cannot_promote_self_to_super_admin() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    let admin_id = app.find_user("admin@example.com").await.id;
    let super_admin_role = app.db_role_id("Super Admin").await;

    assert_eq!(app.get_with_token(routes::SETTINGS, &admin).await.status, 403);

    let res = app
        .patch_with_token(
            &routes::user(admin_id),
            &json!({"role_id": super_admin_role}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 422, "{}", res.text);
    assert!(res.data()["role_id"].is_array());

    assert_eq!(app.get_with_token(routes::SETTINGS, &admin).await.status, 403);
    let stored = app.find_user("admin@example.com").await;
    assert_eq!(stored.role_id, app.db_role_id("Admin").await);
}

#[tokio::test]
async fn super_admin_role_is_reserved_to_super_admins() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    app.register_and_login("Asha", "asha@example.com").await;
    let asha_id = app.find_user("asha@example.com").await.id;
    let super_admin_role = app.db_role_id("Super Admin").await;

    let res = app
        .patch_with_token(
            &routes::user(asha_id),
            &json!({"role_id": super_admin_role}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": "initial-secret",
                "role_id": super_admin_role,
            }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let root = app.create_super_admin("root@example.com").await;
    let res = app
        .patch_with_token(
            &routes::user(asha_id),
            &json!({"role_id": super_admin_role}),
            &root,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["role"], "Super Admin");
}

#[tokio::test]
async fn admin_cannot_manage_super_admin_accounts() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;
    app.create_super_admin("root@example.com").await;
    let root_id = app.find_user("root@example.com").await.id;

    let res = app
        .patch_with_token(&routes::user(root_id), &json!({"password": "taken-over-now"}), &admin)
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app
        .patch_with_token(&routes::user_status(root_id), &json!({"status": "inactive"}), &admin)
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app.delete_with_token(&routes::user(root_id), &admin).await;
    assert_eq!(res.status, 403, "{}", res.text);

    app.login("root@example.com", crate::common::PASSWORD).await;
}
