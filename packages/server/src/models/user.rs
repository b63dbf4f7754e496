use chrono::{DateTime, NaiveDate, Utc};
use common::UserStatus;
use common::storage::MediaStore;
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;
use crate::models::shared::{FieldCheck, double_option, json_string_list};

/// Accepted values for user and casting-role gender fields.
pub const GENDERS: &[&str] = &["male", "female", "other"];

pub fn validate_gender(check: &mut FieldCheck, gender: Option<&str>) {
    if let Some(g) = gender
        && !g.trim().is_empty()
    {
        check.check(
            !GENDERS.contains(&g.trim().to_lowercase().as_str()),
            "gender",
            format!("The gender must be one of: {}.", GENDERS.join(", ")),
        );
    }
}

/// Gender normalized to lowercase; blank becomes `None`.
pub fn normalize_gender(gender: Option<String>) -> Option<String> {
    gender
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
}

/// A stored image with its public URL.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MediaRef {
    #[schema(example = "gallery/0192f0c1-7d3a-7c4e-9b1e-5f6a7b8c9d0e.jpg")]
    pub path: String,
    #[schema(example = "http://127.0.0.1:3000/storage/gallery/0192f0c1-7d3a-7c4e-9b1e-5f6a7b8c9d0e.jpg")]
    pub url: String,
}

impl MediaRef {
    pub fn new(path: String, media: &dyn MediaStore) -> Self {
        Self {
            url: media.url_for(&path),
            path,
        }
    }
}

/// User account as exposed by the API.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub role_id: i32,
    #[schema(example = "User")]
    pub role: Option<String>,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<NaiveDate>,
    pub device_token: Option<String>,
    pub profile_photo: Option<MediaRef>,
    pub gallery: Vec<MediaRef>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: user::Model, role: Option<String>, media: &dyn MediaStore) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
            role,
            status: user.status,
            phone: user.phone,
            address: user.address,
            gender: user.gender,
            date_of_birth: user.date_of_birth,
            device_token: user.device_token,
            profile_photo: user.profile_photo.map(|p| MediaRef::new(p, media)),
            gallery: json_string_list(&user.gallery)
                .into_iter()
                .map(|p| MediaRef::new(p, media))
                .collect(),
            email_verified: user.email_verified_at.is_some(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub role_id: Option<i32>,
    /// `active` or `inactive`.
    pub status: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Ravi Kumar")]
    pub name: String,
    #[schema(example = "ravi@example.com")]
    pub email: String,
    pub password: String,
    pub role_id: i32,
    pub status: Option<UserStatus>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<NaiveDate>,
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .text("name", &payload.name, 255)
        .email("email", &payload.email)
        .password("password", &payload.password)
        .optional_text("phone", payload.phone.as_deref(), 32)
        .optional_text("address", payload.address.as_deref(), 500);
    validate_gender(&mut check, payload.gender.as_deref());
    check.finish()
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// New password; omit to keep the current one.
    pub password: Option<String>,
    pub role_id: Option<i32>,
    pub status: Option<UserStatus>,
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

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    if let Some(ref name) = payload.name {
        check.text("name", name, 255);
    }
    if let Some(ref email) = payload.email {
        check.email("email", email);
    }
    if let Some(ref password) = payload.password {
        check.password("password", password);
    }
    check
        .optional_text("phone", payload.phone.as_ref().and_then(|p| p.as_deref()), 32)
        .optional_text(
            "address",
            payload.address.as_ref().and_then(|a| a.as_deref()),
            500,
        );
    validate_gender(&mut check, payload.gender.as_ref().and_then(|g| g.as_deref()));
    check.finish()
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}
