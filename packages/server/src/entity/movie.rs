use common::MovieStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// JSON array of genre names.
    #[sea_orm(column_type = "JsonBinary")]
    pub genre: serde_json::Value,
    /// Last day auditions are accepted.
    pub end_date: Date,
    pub director: Option<String>,
    pub budget: Option<i64>,
    pub status: MovieStatus,

    #[sea_orm(has_many)]
    pub roles: HasMany<super::movie_role::Entity>,

    #[sea_orm(has_many)]
    pub auditions: HasMany<super::audition::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
