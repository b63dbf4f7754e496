use common::AuditionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audition")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub movie_id: i32,
    #[sea_orm(belongs_to, from = "movie_id", to = "id")]
    pub movie: HasOne<super::movie::Entity>,

    /// Free-text role name; not a reference to `movie_role`.
    pub role: String,
    pub applicant_name: String,

    /// JSON array holding at most one current video URL.
    #[sea_orm(column_type = "JsonBinary")]
    pub uploaded_videos: serde_json::Value,
    /// JSON array of superseded or removed video URLs.
    #[sea_orm(column_type = "JsonBinary")]
    pub old_video_backups: serde_json::Value,

    #[sea_orm(column_type = "Text")]
    pub notes: Option<String>,
    pub status: AuditionStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
