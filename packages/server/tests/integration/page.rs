use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn slug_is_derived_from_title() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let res = app
        .post_with_token(
            routes::PAGES,
            &json!({"title": "Terms & Conditions", "content": "<p>Be kind.</p>"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.data()["slug"], "terms-conditions");
    assert_eq!(res.data()["status"], "draft");
    assert!(res.data()["created_by"].is_number());
}

#[tokio::test]
async fn duplicate_slug_conflicts() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let first = app
        .post_with_token(
            routes::PAGES,
            &json!({"title": "About", "content": "Us"}),
            &admin,
        )
        .await;
    assert_eq!(first.status, 201);

    let res = app
        .post_with_token(
            routes::PAGES,
            &json!({"title": "About us", "slug": "about", "content": "Again"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 409);

    let other = app
        .post_with_token(
            routes::PAGES,
            &json!({"title": "Contact", "content": "Mail us"}),
            &admin,
        )
        .await;
    let res = app
        .patch_with_token(&routes::page(other.id()), &json!({"slug": "about"}), &admin)
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn only_published_pages_are_public() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let res = app
        .post_with_token(
            routes::PAGES,
            &json!({"title": "Privacy", "content": "We keep little.", "status": "published"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let draft = app
        .post_with_token(
            routes::PAGES,
            &json!({"title": "Roadmap", "content": "Soon."}),
            &admin,
        )
        .await;
    assert_eq!(draft.status, 201);

    let res = app.get_without_token(&routes::page_by_slug("privacy")).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["content"], "We keep little.");

    assert_eq!(app.get_without_token(&routes::page_by_slug("roadmap")).await.status, 404);

    let res = app
        .patch_with_token(&routes::page(draft.id()), &json!({"status": "published"}), &admin)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(app.get_without_token(&routes::page_by_slug("roadmap")).await.status, 200);
}

#[tokio::test]
async fn menu_lists_published_menu_pages_in_order() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    for (title, status, show, order) in [
        ("Contact", "published", true, 2),
        ("About", "published", true, 1),
        ("Hidden", "published", false, 0),
        ("Draft", "draft", true, 0),
    ] {
        let res = app
            .post_with_token(
                routes::PAGES,
                &json!({
                    "title": title,
                    "content": "x",
                    "status": status,
                    "show_in_menu": show,
                    "menu_order": order,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app.get_without_token(routes::PAGE_MENU).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let slugs: Vec<&str> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["about", "contact"]);
}

#[tokio::test]
async fn applicants_cannot_manage_pages() {
    let app = TestApp::spawn().await;
    let actor = app.register_and_login("Asha", "asha@example.com").await;

    let res = app
        .post_with_token(routes::PAGES, &json!({"title": "Mine", "content": "x"}), &actor)
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn delete_page() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("admin@example.com").await;

    let id = app
        .post_with_token(routes::PAGES, &json!({"title": "Old", "content": "x"}), &admin)
        .await
        .id();

    assert_eq!(app.delete_with_token(&routes::page(id), &admin).await.status, 200);
    assert_eq!(app.delete_with_token(&routes::page(id), &admin).await.status, 404);
}
