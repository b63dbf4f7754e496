use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::shared::{FieldCheck, double_option};
use crate::models::user::validate_gender;

/// Most images a user's gallery may hold.
pub const MAX_GALLERY_IMAGES: usize = 10;

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<Option<NaiveDate>>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    if let Some(ref name) = payload.name {
        check.text("name", name, 255);
    }
    check
        .optional_text("phone", payload.phone.as_ref().and_then(|p| p.as_deref()), 32)
        .optional_text(
            "address",
            payload.address.as_ref().and_then(|a| a.as_deref()),
            500,
        );
    validate_gender(&mut check, payload.gender.as_ref().and_then(|g| g.as_deref()));
    if let Some(Some(dob)) = payload.date_of_birth {
        check.check(
            dob >= chrono::Utc::now().date_naive(),
            "date_of_birth",
            "The date of birth must be a date before today.",
        );
    }
    check.finish()
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeviceTokenRequest {
    /// Push token of the current device; null or empty clears it.
    pub device_token: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RemoveGalleryImageRequest {
    /// Relative path (or public URL) of the gallery image.
    #[schema(example = "gallery/0192f0c1-7d3a-7c4e-9b1e-5f6a7b8c9d0e.jpg")]
    pub path: String,
}
