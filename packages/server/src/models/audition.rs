use chrono::{DateTime, Utc};
use common::AuditionStatus;
use serde::{Deserialize, Serialize};

use crate::entity::audition;
use crate::error::AppError;
use crate::models::shared::{FieldCheck, json_string_list};

#[derive(Serialize, utoipa::ToSchema)]
pub struct AuditionResponse {
    #[schema(example = 12)]
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    #[schema(example = "Monsoon Letters")]
    pub movie_title: Option<String>,
    #[schema(example = "Lead")]
    pub role: String,
    #[schema(example = "Asha Verma")]
    pub applicant_name: String,
    /// At most one URL: the current audition video.
    pub uploaded_videos: Vec<String>,
    /// URLs of replaced or removed videos.
    pub old_video_backups: Vec<String>,
    pub notes: Option<String>,
    pub status: AuditionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditionResponse {
    pub fn new(m: audition::Model, movie_title: Option<String>) -> Self {
        Self {
            uploaded_videos: json_string_list(&m.uploaded_videos),
            old_video_backups: json_string_list(&m.old_video_backups),
            id: m.id,
            user_id: m.user_id,
            movie_id: m.movie_id,
            movie_title,
            role: m.role,
            applicant_name: m.applicant_name,
            notes: m.notes,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditionListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub movie_id: Option<i32>,
    pub user_id: Option<i32>,
    /// `pending`, `viewed`, `shortlisted` or `rejected`.
    pub status: Option<String>,
    /// Case-insensitive match on applicant name.
    pub search: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyAuditionsQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RemoveVideoRequest {
    /// Current video URL to retire.
    pub url: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateAuditionStatusRequest {
    pub status: AuditionStatus,
}

/// Text fields collected from the multipart submission form.
#[derive(Default, Debug)]
pub struct AuditionFields {
    pub movie_id: Option<String>,
    pub role: Option<String>,
    pub applicant_name: Option<String>,
    pub notes: Option<String>,
}

/// Validated fields of a new submission.
#[derive(Debug, PartialEq, Eq)]
pub struct NewAudition {
    pub movie_id: i32,
    pub role: String,
    pub applicant_name: String,
    pub notes: Option<String>,
}

pub fn validate_new_audition(fields: AuditionFields, has_video: bool) -> Result<NewAudition, AppError> {
    let movie_id = fields
        .movie_id
        .as_deref()
        .map(str::trim)
        .and_then(|v| v.parse::<i32>().ok());
    let role = fields.role.unwrap_or_default().trim().to_string();
    let applicant_name = fields.applicant_name.unwrap_or_default().trim().to_string();
    let notes = fields
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    FieldCheck::new()
        .check(movie_id.is_none(), "movie_id", "The movie id field is required.")
        .text("role", &role, 255)
        .text("applicant_name", &applicant_name, 255)
        .optional_text("notes", notes.as_deref(), 5000)
        .check(!has_video, "video", "The video field is required.")
        .finish()?;

    Ok(NewAudition {
        movie_id: movie_id.unwrap_or_default(),
        role,
        applicant_name,
        notes,
    })
}

pub fn validate_audition_update(fields: &AuditionFields) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    if let Some(ref name) = fields.applicant_name {
        check.text("applicant_name", name, 255);
    }
    check.optional_text("notes", fields.notes.as_deref(), 5000);
    check.finish()
}
