use chrono::{DateTime, Utc};
use common::{NotificationStatus, UserStatus};
use serde::{Deserialize, Serialize};

use crate::entity::notification;
use crate::error::AppError;
use crate::models::shared::FieldCheck;
use crate::models::user::validate_gender;

/// Recipient criteria; absent fields match everyone.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct NotificationFilters {
    pub role_id: Option<i32>,
    pub status: Option<UserStatus>,
    #[schema(example = "female")]
    pub gender: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendNotificationRequest {
    #[schema(example = "Auditions open")]
    pub title: String,
    #[schema(example = "New roles were posted for Monsoon Letters.")]
    pub message: String,
    #[serde(default)]
    pub filters: NotificationFilters,
}

pub fn validate_send_notification(payload: &SendNotificationRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .text("title", &payload.title, 255)
        .text("message", &payload.message, 2000);
    validate_gender(&mut check, payload.filters.gender.as_deref());
    check.finish()
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub title: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub filters: serde_json::Value,
    pub recipient_count: i32,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            message: m.message,
            filters: m.filters,
            recipient_count: m.recipient_count,
            status: m.status,
            sent_at: m.sent_at,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `sent`, `failed` or `no_recipients`.
    pub status: Option<String>,
}
