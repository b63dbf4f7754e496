use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn role_ids(movie: &Value) -> Vec<i64> {
    movie["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn expired_and_inactive_movies_are_hidden_from_applicants() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let actor = app.register_and_login("Asha", "asha@example.com").await;

        let open = app.create_movie(&admin, "Open Call", 10, json!([])).await;
        let expired = app.create_movie(&admin, "Last Year", -1, json!([])).await;
        let inactive = app.create_movie(&admin, "Shelved", 10, json!([])).await;
        let res = app
            .patch_with_token(&routes::movie(inactive), &json!({"status": "inactive"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_with_token(routes::MOVIES, &actor).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let ids: Vec<i64> = res.data()["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![open as i64]);

        assert_eq!(app.get_with_token(&routes::movie(expired), &actor).await.status, 404);
        assert_eq!(app.get_with_token(&routes::movie(inactive), &actor).await.status, 404);

        let res = app.get_with_token(routes::MOVIES, &admin).await;
        assert_eq!(res.data()["pagination"]["total"], 3);
        let res = app.get_with_token(&routes::movie(expired), &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.data()["is_open"], false);
    }

    #[tokio::test]
    async fn movie_ending_today_is_still_visible() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let actor = app.register_and_login("Asha", "asha@example.com").await;

        let id = app.create_movie(&admin, "Final Day", 0, json!([])).await;

        let res = app.get_with_token(&routes::movie(id), &actor).await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn filters_by_search_and_genre() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        app.create_movie(&admin, "Monsoon Letters", 10, json!([])).await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({
                    "title": "Neon Alley",
                    "description": "A heist.",
                    "genre": ["Thriller", "Crime"],
                    "end_date": "2099-01-01",
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .get_with_token(&format!("{}?search=monsoon", routes::MOVIES), &admin)
            .await;
        let items = res.data()["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Monsoon Letters");

        let res = app
            .get_with_token(&format!("{}?genre=thriller", routes::MOVIES), &admin)
            .await;
        let items = res.data()["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Neon Alley");

        let res = app
            .get_with_token(&format!("{}?status=archived", routes::MOVIES), &admin)
            .await;
        assert_eq!(res.status, 422);
    }
}

mod management {
    use super::*;

    #[tokio::test]
    async fn applicant_cannot_create_movie() {
        let app = TestApp::spawn().await;
        let actor = app.register_and_login("Asha", "asha@example.com").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({"title": "Mine", "description": "x", "end_date": "2099-01-01"}),
                &actor,
            )
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn create_with_roles_skips_blank_rows() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;

        let id = app
            .create_movie(
                &admin,
                "Monsoon Letters",
                30,
                json!([
                    {"role_type": "Lead", "gender": "Female", "age_range": "20-30"},
                    {"role_type": "Postman"},
                    {"role_type": "   "},
                ]),
            )
            .await;

        let res = app.get_with_token(&routes::movie(id), &admin).await;
        assert_eq!(res.status, 200);
        let roles = res.data()["roles"].as_array().unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0]["gender"], "female");
        assert_eq!(roles[1]["gender"], "any");
        assert_eq!(roles[1]["status"], "open");
    }

    #[tokio::test]
    async fn invalid_payload_is_reported_per_field() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({
                    "title": "",
                    "description": "x",
                    "genre": ["Drama", "drama"],
                    "end_date": "2099-01-01",
                    "budget": -5,
                    "roles": [{"role_type": "Lead", "gender": "robot"}],
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 422);
        assert!(res.data()["title"].is_array());
        assert!(res.data()["genre"].is_array());
        assert!(res.data()["budget"].is_array());
        assert!(res.data()["roles.0.gender"].is_array());
    }

    #[tokio::test]
    async fn update_reconciles_roles_by_id() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let id = app
            .create_movie(
                &admin,
                "Monsoon Letters",
                30,
                json!([{"role_type": "Lead"}, {"role_type": "Villain"}, {"role_type": "Mentor"}]),
            )
            .await;

        let before = app.get_with_token(&routes::movie(id), &admin).await;
        let ids = role_ids(before.data());
        let (lead, villain, mentor) = (ids[0], ids[1], ids[2]);

        let res = app
            .patch_with_token(
                &routes::movie(id),
                &json!({"roles": [
                    {"id": lead, "role_type": "Lead", "status": "closed"},
                    {"id": villain, "role_type": "Villain", "deleted": true},
                    {"role_type": "Sidekick"},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let after = app.get_with_token(&routes::movie(id), &admin).await;
        let roles = after.data()["roles"].as_array().unwrap();
        let ids = role_ids(after.data());
        assert_eq!(roles.len(), 2);
        assert!(ids.contains(&lead));
        assert!(!ids.contains(&villain));
        assert!(!ids.contains(&mentor));

        let lead_row = roles.iter().find(|r| r["id"] == lead).unwrap();
        assert_eq!(lead_row["status"], "closed");
        assert!(roles.iter().any(|r| r["role_type"] == "Sidekick"));

        // Only open roles are offered to applicants.
        let open = app.get_with_token(&routes::movie_roles(id), &admin).await;
        let open = open.data().as_array().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0]["role_type"], "Sidekick");
    }

    #[tokio::test]
    async fn update_without_roles_keeps_them() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let id = app
            .create_movie(&admin, "Monsoon Letters", 30, json!([{"role_type": "Lead"}]))
            .await;

        let res = app
            .patch_with_token(&routes::movie(id), &json!({"director": null, "budget": 500000}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_with_token(&routes::movie(id), &admin).await;
        assert!(res.data()["director"].is_null());
        assert_eq!(res.data()["budget"], 500000);
        assert_eq!(res.data()["roles"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn role_id_from_another_movie_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let first = app
            .create_movie(&admin, "First", 30, json!([{"role_type": "Lead"}]))
            .await;
        let second = app
            .create_movie(&admin, "Second", 30, json!([{"role_type": "Lead"}]))
            .await;

        let res = app.get_with_token(&routes::movie(first), &admin).await;
        let foreign = role_ids(res.data())[0];

        let res = app
            .patch_with_token(
                &routes::movie(second),
                &json!({"roles": [{"id": foreign, "role_type": "Hijack"}]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 422);
        assert!(res.data()["roles"].is_array());

        // Nothing changed on either movie.
        let res = app.get_with_token(&routes::movie(first), &admin).await;
        assert_eq!(res.data()["roles"][0]["role_type"], "Lead");
    }

    #[tokio::test]
    async fn delete_movie_without_auditions() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let id = app
            .create_movie(&admin, "Monsoon Letters", 30, json!([{"role_type": "Lead"}]))
            .await;

        let res = app.delete_with_token(&routes::movie(id), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(app.get_with_token(&routes::movie(id), &admin).await.status, 404);
    }

    #[tokio::test]
    async fn movie_with_auditions_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.com").await;
        let actor = app.register_and_login("Asha", "asha@example.com").await;
        let id = app
            .create_movie(&admin, "Monsoon Letters", 30, json!([{"role_type": "Lead"}]))
            .await;

        let res = app.submit_audition(&actor, id, "Lead", "take.mp4").await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.delete_with_token(&routes::movie(id), &admin).await;
        assert_eq!(res.status, 409);
    }
}
