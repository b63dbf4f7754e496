use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::role;
use crate::error::AppError;
use crate::models::shared::{FieldCheck, double_option, json_string_list};
use crate::permissions;

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Casting Director")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = json!(["manage_movies", "manage_auditions"]))]
    pub permissions: Vec<String>,
    /// Built-in roles cannot be renamed or deleted.
    pub is_protected: bool,
    /// Number of users holding this role.
    pub users_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleResponse {
    pub fn new(m: role::Model, users_count: u64) -> Self {
        Self {
            is_protected: role::is_protected(&m.name),
            permissions: json_string_list(&m.permissions),
            id: m.id,
            name: m.name,
            description: m.description,
            users_count,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PermissionInfo {
    #[schema(example = "manage_movies")]
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRoleRequest {
    #[schema(example = "Casting Director")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["manage_movies"]))]
    pub permissions: Vec<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub permissions: Option<Vec<String>>,
}

fn validate_permissions(check: &mut FieldCheck, perms: &[String]) {
    let mut seen = HashSet::new();
    for p in perms {
        check.check(
            !permissions::is_known(p),
            "permissions",
            format!("Unknown permission '{p}'."),
        );
        check.check(
            !seen.insert(p.as_str()),
            "permissions",
            format!("Permission '{p}' is listed more than once."),
        );
    }
}

pub fn validate_create_role(payload: &CreateRoleRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .text("name", &payload.name, 100)
        .optional_text("description", payload.description.as_deref(), 1000);
    validate_permissions(&mut check, &payload.permissions);
    check.finish()
}

pub fn validate_update_role(payload: &UpdateRoleRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    if let Some(ref name) = payload.name {
        check.text("name", name, 100);
    }
    check.optional_text(
        "description",
        payload.description.as_ref().and_then(|d| d.as_deref()),
        1000,
    );
    if let Some(ref perms) = payload.permissions {
        validate_permissions(&mut check, perms);
    }
    check.finish()
}
