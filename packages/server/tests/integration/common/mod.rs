use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::OtpPurpose;
use common::storage::filesystem::FilesystemMediaStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tempfile::TempDir;

use casting_server::config::{
    AppConfig, AuthConfig, BootstrapConfig, CorsConfig, DatabaseConfig, PaymentConfig,
    ServerConfig, StorageConfig,
};
use casting_server::entity::{role, user};
use casting_server::services::notifier::{Notifier, NotifyError};
use casting_server::services::payment::{
    GatewayCredentials, GatewayError, GatewayOrder, PaymentGateway,
};
use casting_server::services::settings;
use casting_server::state::AppState;

pub const PASSWORD: &str = "correct-horse-battery";
pub const PUBLIC_URL: &str = "http://media.test/storage";

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const VERIFY_EMAIL: &str = "/api/v1/auth/verify-email";
    pub const RESEND_OTP: &str = "/api/v1/auth/resend-otp";
    pub const FORGOT_PASSWORD: &str = "/api/v1/auth/forgot-password";
    pub const RESET_PASSWORD: &str = "/api/v1/auth/reset-password";
    pub const ME: &str = "/api/v1/auth/me";
    pub const CHANGE_PASSWORD: &str = "/api/v1/auth/change-password";

    pub const PROFILE: &str = "/api/v1/profile";
    pub const DEVICE_TOKEN: &str = "/api/v1/profile/device-token";
    pub const PROFILE_PHOTO: &str = "/api/v1/profile/photo";
    pub const GALLERY: &str = "/api/v1/profile/gallery";

    pub const USERS: &str = "/api/v1/users";
    pub const ROLES: &str = "/api/v1/roles";
    pub const PERMISSIONS: &str = "/api/v1/roles/permissions";
    pub const MOVIES: &str = "/api/v1/movies";
    pub const AUDITIONS: &str = "/api/v1/auditions";
    pub const MY_AUDITIONS: &str = "/api/v1/auditions/mine";
    pub const SETTINGS: &str = "/api/v1/settings";
    pub const PUBLIC_SETTINGS: &str = "/api/v1/settings/public";
    pub const PAGES: &str = "/api/v1/pages";
    pub const PAGE_MENU: &str = "/api/v1/pages/menu";
    pub const NOTIFICATIONS: &str = "/api/v1/notifications";
    pub const PAYMENT_ORDERS: &str = "/api/v1/payments/orders";
    pub const PAYMENT_VERIFY: &str = "/api/v1/payments/verify";
    pub const PAYMENTS: &str = "/api/v1/payments";
    pub const MY_PAYMENTS: &str = "/api/v1/payments/mine";
    pub const DASHBOARD: &str = "/api/v1/dashboard";

    pub fn user(id: i32) -> String {
        format!("/api/v1/users/{id}")
    }

    pub fn user_status(id: i32) -> String {
        format!("/api/v1/users/{id}/status")
    }

    pub fn role(id: i32) -> String {
        format!("/api/v1/roles/{id}")
    }

    pub fn movie(id: i32) -> String {
        format!("/api/v1/movies/{id}")
    }

    pub fn movie_roles(id: i32) -> String {
        format!("/api/v1/movies/{id}/roles")
    }

    pub fn audition(id: i32) -> String {
        format!("/api/v1/auditions/{id}")
    }

    pub fn audition_remove_video(id: i32) -> String {
        format!("/api/v1/auditions/{id}/remove-video")
    }

    pub fn audition_status(id: i32) -> String {
        format!("/api/v1/auditions/{id}/status")
    }

    pub fn page(id: i32) -> String {
        format!("/api/v1/pages/{id}")
    }

    pub fn page_by_slug(slug: &str) -> String {
        format!("/api/v1/pages/slug/{slug}")
    }

    pub fn notification(id: i32) -> String {
        format!("/api/v1/notifications/{id}")
    }
}

/// Records every OTP and push instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    otps: Mutex<HashMap<String, String>>,
    pushes: Mutex<Vec<(Vec<String>, String)>>,
}

impl RecordingNotifier {
    pub fn last_otp(&self, email: &str) -> Option<String> {
        self.otps.lock().unwrap().get(email).cloned()
    }

    pub fn pushes(&self) -> Vec<(Vec<String>, String)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_otp(&self, email: &str, code: &str, _purpose: OtpPurpose) -> Result<(), NotifyError> {
        self.otps
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }

    async fn push(&self, tokens: &[String], title: &str, _message: &str) -> Result<usize, NotifyError> {
        self.pushes
            .lock()
            .unwrap()
            .push((tokens.to_vec(), title.to_string()));
        Ok(tokens.len())
    }
}

/// Hands out sequential order ids without any network traffic.
#[derive(Default)]
pub struct FakeGateway {
    counter: AtomicU32,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        _credentials: &GatewayCredentials,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(GatewayOrder {
            id: format!("order_test{n:04}"),
            amount,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
        })
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub notifier: Arc<RecordingNotifier>,
    pub public_dir: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let public_dir = dir.path().join("public");

        let db = casting_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");
        casting_server::seed::run(&db, &BootstrapConfig::default())
            .await
            .expect("Failed to seed test database");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests-0123456789".to_string(),
                token_ttl_hours: 1,
                otp_ttl_minutes: 10,
            },
            storage: StorageConfig {
                public_dir: public_dir.display().to_string(),
                public_url: PUBLIC_URL.to_string(),
                max_video_size: 1024 * 1024,
                max_image_size: 1024 * 1024,
            },
            payment: PaymentConfig {
                razorpay_api_base: "http://127.0.0.1:9/v1".to_string(),
            },
            bootstrap: BootstrapConfig::default(),
        };

        let media = FilesystemMediaStore::new(public_dir.clone(), PUBLIC_URL)
            .await
            .expect("Failed to create media store");
        let notifier = Arc::new(RecordingNotifier::default());

        let state = AppState {
            db: db.clone(),
            config: app_config,
            media: Arc::new(media),
            notifier: notifier.clone(),
            payments: Arc::new(FakeGateway::default()),
        };

        let app = casting_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            notifier,
            public_dir,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_json_with_token(
        &self,
        path: &str,
        body: &Value,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn multipart_with_token(&self, path: &str, form: Form, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Register an account and log in, returning the auth token.
    pub async fn register_and_login(&self, name: &str, email: &str) -> String {
        let reg = self
            .post_without_token(
                routes::REGISTER,
                &json!({"name": name, "email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);
        self.login(email, PASSWORD).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .post_without_token(routes::LOGIN, &json!({"email": email, "password": password}))
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["data"]["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Register an account, move it to `role_name`, then log in.
    pub async fn create_user_with_role(&self, name: &str, email: &str, role_name: &str) -> String {
        self.register_and_login(name, email).await;

        let role_id = self.db_role_id(role_name).await;
        let db_user = self.find_user(email).await;

        let mut active: user::ActiveModel = db_user.into();
        active.role_id = Set(role_id);
        user::Entity::update(active)
            .exec(&self.db)
            .await
            .expect("Failed to update user role");

        self.login(email, PASSWORD).await
    }

    pub async fn create_super_admin(&self, email: &str) -> String {
        self.create_user_with_role("Root", email, "Super Admin").await
    }

    pub async fn create_admin(&self, email: &str) -> String {
        self.create_user_with_role("Admin", email, "Admin").await
    }

    pub async fn db_role_id(&self, name: &str) -> i32 {
        role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("Role not found")
            .id
    }

    pub async fn find_user(&self, email: &str) -> user::Model {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found")
    }

    /// Create a movie via the API and return its `id`.
    pub async fn create_movie(&self, token: &str, title: &str, end_in_days: i64, roles: Value) -> i32 {
        let end_date = (Utc::now() + Duration::days(end_in_days)).date_naive();
        let res = self
            .post_with_token(
                routes::MOVIES,
                &json!({
                    "title": title,
                    "description": "A story told through letters.",
                    "genre": ["Drama"],
                    "end_date": end_date.to_string(),
                    "director": "R. Sen",
                    "roles": roles,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_movie failed: {}", res.text);
        res.id()
    }

    /// Submit an audition with a small fake video and return the response.
    pub async fn submit_audition(
        &self,
        token: &str,
        movie_id: i32,
        role: &str,
        file_name: &str,
    ) -> TestResponse {
        let form = audition_form(movie_id, role, "Asha Verma").part("video", video_part(file_name));
        self.multipart_with_token(routes::AUDITIONS, form, token).await
    }

    /// Whether the file behind a public media URL exists on disk.
    pub fn media_exists(&self, url: &str) -> bool {
        let rel = url
            .strip_prefix(PUBLIC_URL)
            .expect("URL should be on the public disk")
            .trim_start_matches('/');
        self.public_dir.join(Path::new(rel)).exists()
    }

    /// Number of files stored under a public disk folder.
    pub fn stored_file_count(&self, folder: &str) -> usize {
        std::fs::read_dir(self.public_dir.join(folder))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Write a setting straight to the database.
    pub async fn set_setting(&self, key: &str, value: &str) {
        settings::upsert(&self.db, key, value)
            .await
            .expect("Failed to write setting");
    }
}

pub fn audition_form(movie_id: i32, role: &str, applicant_name: &str) -> Form {
    Form::new()
        .text("movie_id", movie_id.to_string())
        .text("role", role.to_string())
        .text("applicant_name", applicant_name.to_string())
}

pub fn video_part(file_name: &str) -> Part {
    Part::bytes(b"\x00\x00\x00\x18ftypmp42 fake video".to_vec())
        .file_name(file_name.to_string())
        .mime_str("video/mp4")
        .expect("Failed to set MIME type")
}

pub fn image_part(file_name: &str) -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\n fake image".to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("Failed to set MIME type")
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> i32 {
        self.body["data"]["id"]
            .as_i64()
            .expect("response body should contain 'data.id'") as i32
    }
}
