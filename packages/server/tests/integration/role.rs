use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn seeded_roles_are_listed_with_user_counts() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let res = app.get_with_token(routes::ROLES, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let roles = res.data().as_array().unwrap();
    let names: Vec<&str> = roles.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"Super Admin"));
    assert!(names.contains(&"Admin"));
    assert!(names.contains(&"User"));

    let super_admin = roles.iter().find(|r| r["name"] == "Super Admin").unwrap();
    assert_eq!(super_admin["users_count"], 1);
    assert_eq!(super_admin["is_protected"], true);
}

#[tokio::test]
async fn permission_catalogue_is_exposed() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let res = app.get_with_token(routes::PERMISSIONS, &token).await;
    assert_eq!(res.status, 200);
    assert!(
        res.data()
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["name"] == "manage_movies")
    );
}

#[tokio::test]
async fn plain_user_cannot_manage_roles() {
    let app = TestApp::spawn().await;
    let token = app.register_and_login("Asha", "asha@example.com").await;

    let res = app.get_with_token(routes::ROLES, &token).await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn admin_role_lacks_role_management() {
    let app = TestApp::spawn().await;
    let token = app.create_admin("admin@example.com").await;

    let res = app
        .post_with_token(routes::ROLES, &json!({"name": "Scout", "permissions": []}), &token)
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn create_update_and_delete_custom_role() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let res = app
        .post_with_token(
            routes::ROLES,
            &json!({"name": "Casting Director", "permissions": ["manage_auditions"]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();

    let res = app
        .patch_with_token(
            &routes::role(id),
            &json!({"permissions": ["manage_auditions", "view_dashboard"]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(
        res.data()["permissions"],
        json!(["manage_auditions", "view_dashboard"])
    );

    let res = app.delete_with_token(&routes::role(id), &token).await;
    assert_eq!(res.status, 200);

    let res = app.get_with_token(&routes::role(id), &token).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn unknown_permission_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let res = app
        .post_with_token(
            routes::ROLES,
            &json!({"name": "Scout", "permissions": ["launch_rockets"]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 422);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn duplicate_role_name_conflicts() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let res = app
        .post_with_token(routes::ROLES, &json!({"name": "Admin", "permissions": []}), &token)
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn protected_roles_cannot_be_deleted_or_renamed() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let roles = app.get_with_token(routes::ROLES, &token).await;
    let admin_id = roles
        .data()
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Admin")
        .unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    let res = app.delete_with_token(&routes::role(admin_id), &token).await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PROTECTED_ROLE");

    let res = app
        .patch_with_token(&routes::role(admin_id), &json!({"name": "Boss"}), &token)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PROTECTED_ROLE");
}

#[tokio::test]
async fn role_with_users_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let token = app.create_super_admin("root@example.com").await;

    let res = app
        .post_with_token(routes::ROLES, &json!({"name": "Scout", "permissions": []}), &token)
        .await;
    let role_id = res.id();

    app.create_user_with_role("Ravi", "ravi@example.com", "Scout").await;

    let res = app.delete_with_token(&routes::role(role_id), &token).await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn custom_role_grants_its_permissions() {
    let app = TestApp::spawn().await;
    let root = app.create_super_admin("root@example.com").await;

    app.post_with_token(
        routes::ROLES,
        &json!({"name": "Analyst", "permissions": ["view_dashboard"]}),
        &root,
    )
    .await;
    let token = app
        .create_user_with_role("Mira", "mira@example.com", "Analyst")
        .await;

    assert_eq!(app.get_with_token(routes::DASHBOARD, &token).await.status, 200);
    assert_eq!(app.get_with_token(routes::USERS, &token).await.status, 403);
}
