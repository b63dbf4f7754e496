use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::role::*;
use crate::models::shared::{ApiResponse, MessageResponse, message, ok, ok_with};
use crate::permissions::{self, MANAGE_ROLES};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Roles",
    operation_id = "listRoles",
    summary = "List roles",
    description = "All roles ordered by name, with user counts. Requires `manage_roles`.",
    responses(
        (status = 200, description = "Roles", body = ApiResponse<Vec<RoleResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_roles(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RoleResponse>>>, AppError> {
    auth_user.require_permission(MANAGE_ROLES)?;

    let roles = role::Entity::find()
        .order_by_asc(role::Column::Name)
        .all(&state.db)
        .await?;

    let mut items = Vec::with_capacity(roles.len());
    for r in roles {
        let count = users_with_role(&state.db, r.id).await?;
        items.push(RoleResponse::new(r, count));
    }

    Ok(ok(items))
}

#[utoipa::path(
    get,
    path = "/permissions",
    tag = "Roles",
    operation_id = "listPermissions",
    summary = "Permission catalogue",
    description = "Every permission a role can hold. Requires `manage_roles`.",
    responses(
        (status = 200, description = "Known permissions", body = ApiResponse<Vec<PermissionInfo>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user))]
pub async fn list_permissions(
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<PermissionInfo>>>, AppError> {
    auth_user.require_permission(MANAGE_ROLES)?;

    Ok(ok(permissions::ALL
        .iter()
        .map(|&(name, description)| PermissionInfo { name, description })
        .collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Roles",
    operation_id = "getRole",
    summary = "Get a role by ID",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role", body = ApiResponse<RoleResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Role not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RoleResponse>>, AppError> {
    auth_user.require_permission(MANAGE_ROLES)?;

    let model = find_role(&state.db, id).await?;
    let count = users_with_role(&state.db, id).await?;
    Ok(ok(RoleResponse::new(model, count)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Roles",
    operation_id = "createRole",
    summary = "Create a role",
    description = "Requires `manage_roles`. Permissions must come from the catalogue.",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = ApiResponse<RoleResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Role name taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(MANAGE_ROLES)?;
    validate_create_role(&payload)?;

    let name = payload.name.trim().to_string();
    ensure_name_free(&state.db, &name, None).await?;

    let now = Utc::now();
    let model = role::ActiveModel {
        name: Set(name),
        description: Set(payload
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        permissions: Set(serde_json::json!(payload.permissions)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_name_conflict)?;

    tracing::info!(role_id = model.id, "Role created");
    Ok((
        StatusCode::CREATED,
        ok_with("Role created", RoleResponse::new(model, 0)),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Roles",
    operation_id = "updateRole",
    summary = "Update a role",
    description = "Partially updates a role. Built-in roles keep their name (403 PROTECTED_ROLE) but their permissions may change. Requires `manage_roles`.",
    params(("id" = i32, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<RoleResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, PROTECTED_ROLE)", body = ErrorBody),
        (status = 404, description = "Role not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Role name taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<RoleResponse>>, AppError> {
    auth_user.require_permission(MANAGE_ROLES)?;
    validate_update_role(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_role_for_update(&txn, id).await?;

    let mut active: role::ActiveModel = existing.clone().into();
    if let Some(ref name) = payload.name {
        let name = name.trim();
        if name != existing.name {
            if role::is_protected(&existing.name) {
                return Err(AppError::ProtectedRole(existing.name));
            }
            ensure_name_free(&txn, name, Some(id)).await?;
            active.name = Set(name.to_string());
        }
    }
    if let Some(description) = payload.description {
        active.description = Set(description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()));
    }
    if let Some(perms) = payload.permissions {
        active.permissions = Set(serde_json::json!(perms));
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await.map_err(map_name_conflict)?;
    let count = users_with_role(&txn, id).await?;
    txn.commit().await?;

    Ok(ok_with("Role updated", RoleResponse::new(model, count)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Roles",
    operation_id = "deleteRole",
    summary = "Delete a role",
    description = "Requires `manage_roles`. Built-in roles (`Super Admin`, `Admin`, `User`) cannot be deleted, and a role still assigned to users is rejected with 409.",
    params(("id" = i32, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, PROTECTED_ROLE)", body = ErrorBody),
        (status = 404, description = "Role not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Role has users (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission(MANAGE_ROLES)?;

    let txn = state.db.begin().await?;
    let existing = find_role_for_update(&txn, id).await?;

    if role::is_protected(&existing.name) {
        return Err(AppError::ProtectedRole(existing.name));
    }
    if users_with_role(&txn, id).await? > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a role that is assigned to users".into(),
        ));
    }

    role::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(role_id = id, "Role deleted");
    Ok(message("Role deleted"))
}

async fn find_role<C: ConnectionTrait>(db: &C, id: i32) -> Result<role::Model, AppError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".into()))
}

async fn find_role_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<role::Model, AppError> {
    role::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".into()))
}

async fn users_with_role<C: ConnectionTrait>(db: &C, role_id: i32) -> Result<u64, DbErr> {
    user::Entity::find()
        .filter(user::Column::RoleId.eq(role_id))
        .count(db)
        .await
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = role::Entity::find().filter(role::Column::Name.eq(name));
    if let Some(id) = except_id {
        select = select.filter(role::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(format!("Role '{name}' already exists")));
    }
    Ok(())
}

fn map_name_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Role name already exists".into())
        }
        _ => AppError::from(e),
    }
}
