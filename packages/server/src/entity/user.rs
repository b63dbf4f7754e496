use common::{OtpPurpose, UserStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,

    pub role_id: i32,
    #[sea_orm(belongs_to, from = "role_id", to = "id")]
    pub role: HasOne<super::role::Entity>,

    pub status: UserStatus,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<Date>,
    /// Push-notification device token.
    pub device_token: Option<String>,
    /// Relative path on the public disk.
    pub profile_photo: Option<String>,
    /// JSON array of relative paths on the public disk.
    #[sea_orm(column_type = "JsonBinary")]
    pub gallery: serde_json::Value,

    /// SHA-256 hex digest of the outstanding OTP, if any.
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,
    pub otp_purpose: Option<OtpPurpose>,
    pub otp_expires_at: Option<DateTimeUtc>,
    /// Wrong guesses against the outstanding OTP.
    #[sea_orm(default_value = 0)]
    pub otp_attempts: i32,
    pub email_verified_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub auditions: HasMany<super::audition::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
