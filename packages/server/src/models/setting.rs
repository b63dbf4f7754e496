use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::FieldCheck;
use crate::services::settings;

#[derive(Serialize, utoipa::ToSchema)]
pub struct SettingItem {
    #[schema(example = "razorpay_key_secret")]
    pub key: String,
    /// Secret values are replaced by `********`.
    #[schema(example = "********")]
    pub value: String,
    #[schema(example = "payment")]
    pub category: String,
    pub is_secret: bool,
}

/// Bulk update body. Keys are created when missing.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSettingsRequest {
    #[schema(example = json!({"site_name": "Casting Call", "max_video_size_mb": "200"}))]
    pub settings: BTreeMap<String, String>,
}

pub fn validate_update_settings(payload: &UpdateSettingsRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check.check(
        payload.settings.is_empty(),
        "settings",
        "At least one setting is required.",
    );
    for (key, value) in &payload.settings {
        check.check(
            !settings::is_valid_key(key),
            "settings",
            format!("Invalid setting key '{key}'."),
        );
        check.check(
            value.chars().count() > 10_000,
            key,
            "The value may not be greater than 10000 characters.",
        );
        if key.ends_with("_mb") && !value.trim().is_empty() {
            check.check(
                value
                    .trim()
                    .parse::<u64>()
                    .map_or(true, |mb| !(1..=settings::MAX_SIZE_MB).contains(&mb)),
                key,
                format!(
                    "The value must be a whole number between 1 and {}.",
                    settings::MAX_SIZE_MB
                ),
            );
        }
    }
    check.finish()
}

/// The mask returned for secrets; submitting it leaves the stored value unchanged.
pub fn is_placeholder(value: &str) -> bool {
    value == settings::MASK
}
