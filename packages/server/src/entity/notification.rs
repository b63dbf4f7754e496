use common::NotificationStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Recipient filters as submitted, kept for the audit trail.
    #[sea_orm(column_type = "JsonBinary")]
    pub filters: serde_json::Value,
    pub recipient_count: i32,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTimeUtc>,

    pub created_by: i32,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
