use common::PaymentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Gateway order id (`order_...`).
    #[sea_orm(unique)]
    pub order_id: String,
    /// Gateway payment id, set once checkout completes.
    pub payment_id: Option<String>,
    pub receipt: String,
    /// Amount in the currency's smallest unit (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    #[sea_orm(column_type = "Text")]
    pub notes: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
