use common::PageStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "page")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub status: PageStatus,

    pub meta_title: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,

    pub show_in_menu: bool,
    pub menu_order: i32,

    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
