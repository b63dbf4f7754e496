use std::collections::BTreeMap;

use sea_orm::*;

use crate::config::StorageConfig;
use crate::entity::system_setting;
use crate::services::payment::GatewayCredentials;

/// Placeholder returned in place of secret values.
pub const MASK: &str = "********";

/// Upper bound accepted for `*_mb` size settings (10 GiB).
pub const MAX_SIZE_MB: u64 = 10_240;

pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub category: &'static str,
    pub secret: bool,
    /// Exposed through the unauthenticated public endpoint.
    pub public: bool,
}

const fn def(
    key: &'static str,
    default: &'static str,
    category: &'static str,
    secret: bool,
    public: bool,
) -> SettingDef {
    SettingDef {
        key,
        default,
        category,
        secret,
        public,
    }
}

pub const DEFAULTS: &[SettingDef] = &[
    def("site_name", "Casting Call", "general", false, true),
    def("site_email", "", "general", false, true),
    def("razorpay_key_id", "", "payment", false, true),
    def("razorpay_key_secret", "", "payment", true, false),
    def("firebase_project_id", "", "firebase", false, false),
    def("firebase_server_key", "", "firebase", true, false),
    def("max_video_size_mb", "100", "upload", false, true),
    def("max_image_size_mb", "5", "upload", false, true),
    def(
        "allowed_video_extensions",
        DEFAULT_VIDEO_EXTENSIONS,
        "upload",
        false,
        true,
    ),
];

pub const DEFAULT_VIDEO_EXTENSIONS: &str = "mp4,mov,avi,webm,mkv";

fn known(key: &str) -> Option<&'static SettingDef> {
    DEFAULTS.iter().find(|d| d.key == key)
}

/// Secret keys are masked on read. Unknown keys are judged by name.
pub fn is_secret(key: &str) -> bool {
    match known(key) {
        Some(d) => d.secret,
        None => ["_secret", "_server_key", "_password", "_token"]
            .iter()
            .any(|suffix| key.ends_with(suffix)),
    }
}

pub fn is_public(key: &str) -> bool {
    known(key).is_some_and(|d| d.public)
}

/// Category for a key written through the bulk update.
pub fn category_of(key: &str) -> &'static str {
    known(key).map_or("custom", |d| d.category)
}

/// `[a-z0-9_]{1,64}`
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 64
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Value as shown to administrators.
pub fn masked(key: &str, value: &str) -> String {
    if is_secret(key) && !value.is_empty() {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

pub async fn load_all<C: ConnectionTrait>(db: &C) -> Result<BTreeMap<String, String>, DbErr> {
    Ok(system_setting::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect())
}

pub async fn get<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<String>, DbErr> {
    Ok(system_setting::Entity::find_by_id(key.to_string())
        .one(db)
        .await?
        .map(|s| s.value))
}

/// Megabyte setting converted to bytes, or `fallback` when unset, unparsable or out of range.
fn megabytes(value: Option<&str>, fallback: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|mb| (1..=MAX_SIZE_MB).contains(mb))
        .and_then(|mb| mb.checked_mul(1024 * 1024))
        .unwrap_or(fallback)
}

/// Parse a comma-separated extension list (`".MP4, mov"` → `["mp4", "mov"]`).
pub fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Upload limits in effect, settings overriding the static config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_video_bytes: u64,
    pub max_image_bytes: u64,
    pub video_extensions: Vec<String>,
}

pub async fn upload_limits<C: ConnectionTrait>(
    db: &C,
    storage: &StorageConfig,
) -> Result<UploadLimits, DbErr> {
    let all = load_all(db).await?;
    let mut video_extensions = parse_extensions(
        all.get("allowed_video_extensions")
            .map(String::as_str)
            .unwrap_or(DEFAULT_VIDEO_EXTENSIONS),
    );
    if video_extensions.is_empty() {
        video_extensions = parse_extensions(DEFAULT_VIDEO_EXTENSIONS);
    }

    Ok(UploadLimits {
        max_video_bytes: megabytes(
            all.get("max_video_size_mb").map(String::as_str),
            storage.max_video_size,
        ),
        max_image_bytes: megabytes(
            all.get("max_image_size_mb").map(String::as_str),
            storage.max_image_size,
        ),
        video_extensions,
    })
}

/// Gateway key pair, `None` until both halves are configured.
pub async fn razorpay_credentials<C: ConnectionTrait>(
    db: &C,
) -> Result<Option<GatewayCredentials>, DbErr> {
    let key_id = get(db, "razorpay_key_id").await?.unwrap_or_default();
    let key_secret = get(db, "razorpay_key_secret").await?.unwrap_or_default();
    if key_id.trim().is_empty() || key_secret.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(GatewayCredentials {
        key_id: key_id.trim().to_string(),
        key_secret: key_secret.trim().to_string(),
    }))
}

/// Insert or overwrite a single setting.
pub async fn upsert<C: ConnectionTrait>(db: &C, key: &str, value: &str) -> Result<(), DbErr> {
    let model = system_setting::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        category: Set(category_of(key).to_string()),
        updated_at: Set(chrono::Utc::now()),
    };
    system_setting::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(system_setting::Column::Key)
                .update_columns([
                    system_setting::Column::Value,
                    system_setting::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}
