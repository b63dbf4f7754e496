use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The role assigned to newly registered users.
pub const DEFAULT_ROLE: &str = "User";

/// Roles that can never be deleted or renamed.
pub const PROTECTED_ROLES: &[&str] = &["Super Admin", "Admin", DEFAULT_ROLE];

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,
    /// JSON array of permission strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub permissions: serde_json::Value,

    #[sea_orm(has_many)]
    pub users: HasMany<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Whether `name` is one of the built-in roles.
pub fn is_protected(name: &str) -> bool {
    PROTECTED_ROLES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name.trim()))
}
