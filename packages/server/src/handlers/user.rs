use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::UserStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{audition, payment, role, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, SUPER_ADMIN};
use crate::extractors::json::AppJson;
use crate::models::auth::MeResponse;
use crate::models::shared::{
    ApiResponse, MessageResponse, Paginated, Pagination, escape_like, json_string_list, message,
    non_empty, normalize_email, ok, ok_with, page_params,
};
use crate::models::user::*;
use crate::permissions::MANAGE_USERS;
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Paginated user list, newest first. Requires `manage_users`.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = ApiResponse<Paginated<UserResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Paginated<UserResponse>>>, AppError> {
    auth_user.require_permission(MANAGE_USERS)?;

    let (page, per_page) = page_params(query.page, query.per_page);
    let mut select = user::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Name)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }
    if let Some(role_id) = query.role_id {
        select = select.filter(user::Column::RoleId.eq(role_id));
    }
    if let Some(ref status) = query.status {
        let status: UserStatus = status.parse()?;
        select = select.filter(user::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let rows = select
        .find_also_related(role::Entity)
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let items = rows
        .into_iter()
        .map(|(u, r)| UserResponse::new(u, r.map(|r| r.name), &*state.media))
        .collect();

    Ok(ok(Paginated {
        items,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    auth_user.require_permission(MANAGE_USERS)?;

    let model = find_user(&state.db, id).await?;
    Ok(ok(user_response(&state, model).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates an account with any role. The email is marked verified. Requires `manage_users`; only a Super Admin may assign the Super Admin role.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(MANAGE_USERS)?;
    validate_create_user(&payload)?;

    let target_role = ensure_role_exists(&state.db, payload.role_id).await?;
    require_super_admin_for(&auth_user, &target_role.name)?;
    let email = normalize_email(&payload.email);
    ensure_email_free(&state.db, &email, None).await?;

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = Utc::now();
    let model = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password: Set(password),
        role_id: Set(payload.role_id),
        status: Set(payload.status.unwrap_or_default()),
        phone: Set(non_empty(payload.phone)),
        address: Set(non_empty(payload.address)),
        gender: Set(normalize_gender(payload.gender)),
        date_of_birth: Set(payload.date_of_birth),
        gallery: Set(serde_json::json!([])),
        email_verified_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_email_conflict)?;

    tracing::info!(user_id = model.id, "User created");

    Ok((
        StatusCode::CREATED,
        ok_with("User created", user_response(&state, model).await?),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partially updates a user. Nullable profile fields accept `null` to clear. Requires `manage_users`. Your own role cannot be changed, and Super Admin accounts and the Super Admin role are reserved to Super Admins.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    auth_user.require_permission(MANAGE_USERS)?;
    validate_update_user(&payload)?;

    if payload == UpdateUserRequest::default() {
        let existing = find_user(&state.db, id).await?;
        return Ok(ok(user_response(&state, existing).await?));
    }

    if id == auth_user.user_id && payload.status == Some(UserStatus::Inactive) {
        return Err(AppError::Validation(
            "You cannot deactivate your own account".into(),
        ));
    }
    if id == auth_user.user_id
        && payload.role_id.is_some_and(|role_id| role_id != auth_user.role_id)
    {
        return Err(AppError::field("role_id", "You cannot change your own role."));
    }

    let txn = state.db.begin().await?;
    let existing = find_user_for_update(&txn, id).await?;
    guard_target(&txn, &auth_user, &existing).await?;

    if let Some(role_id) = payload.role_id {
        let target_role = ensure_role_exists(&txn, role_id).await?;
        require_super_admin_for(&auth_user, &target_role.name)?;
    }

    let mut active: user::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref email) = payload.email {
        let email = normalize_email(email);
        ensure_email_free(&txn, &email, Some(id)).await?;
        active.email = Set(email);
    }
    if let Some(ref password) = payload.password {
        let hashed = hash::hash_password(password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
        active.password = Set(hashed);
    }
    if let Some(role_id) = payload.role_id {
        active.role_id = Set(role_id);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(non_empty(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(non_empty(address));
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(normalize_gender(gender));
    }
    if let Some(dob) = payload.date_of_birth {
        active.date_of_birth = Set(dob);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await.map_err(map_email_conflict)?;
    txn.commit().await?;

    Ok(ok_with("User updated", user_response(&state, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "Users",
    operation_id = "updateUserStatus",
    summary = "Activate or deactivate a user",
    description = "Inactive users cannot log in and their existing tokens stop working. Requires `manage_users`.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Own account or bad status (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserStatusRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    auth_user.require_permission(MANAGE_USERS)?;

    if id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot change the status of your own account".into(),
        ));
    }

    let existing = find_user(&state.db, id).await?;
    guard_target(&state.db, &auth_user, &existing).await?;
    let mut active: user::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(user_id = id, status = %payload.status, "User status changed");
    Ok(ok_with("Status updated", user_response(&state, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Deletes a user and their stored images. Requires `manage_users`. You cannot delete yourself, and users with auditions or payments cannot be deleted (409).",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "User has auditions or payments (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Attempt to delete own account (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission(MANAGE_USERS)?;

    if id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot delete your own account".into(),
        ));
    }

    let txn = state.db.begin().await?;
    let existing = find_user_for_update(&txn, id).await?;
    guard_target(&txn, &auth_user, &existing).await?;

    let audition_count = audition::Entity::find()
        .filter(audition::Column::UserId.eq(id))
        .count(&txn)
        .await?;
    if audition_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a user who has submitted auditions".into(),
        ));
    }

    let payment_count = payment::Entity::find()
        .filter(payment::Column::UserId.eq(id))
        .count(&txn)
        .await?;
    if payment_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a user with payment records".into(),
        ));
    }

    user::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    let mut files = json_string_list(&existing.gallery);
    files.extend(existing.profile_photo);
    delete_files(&state, &files).await;

    tracing::info!(user_id = id, "User deleted");
    Ok(message("User deleted"))
}

/// Load a user by id, or `NotFound`.
pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Load a user with a row lock (no-op on SQLite).
pub async fn find_user_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn role_of<C: ConnectionTrait>(db: &C, role_id: i32) -> Result<Option<role::Model>, DbErr> {
    role::Entity::find_by_id(role_id).one(db).await
}

/// API view of `model`, with its role name resolved.
pub async fn user_response(state: &AppState, model: user::Model) -> Result<UserResponse, AppError> {
    let role = role_of(&state.db, model.role_id).await?;
    Ok(UserResponse::new(model, role.map(|r| r.name), &*state.media))
}

/// [`user_response`] plus the role's permissions.
pub async fn me_response(state: &AppState, model: user::Model) -> Result<MeResponse, AppError> {
    let role = role_of(&state.db, model.role_id).await?;
    let permissions = match role {
        Some(ref r) if r.name == SUPER_ADMIN => crate::permissions::ALL
            .iter()
            .map(|(p, _)| String::from(*p))
            .collect(),
        Some(ref r) => json_string_list(&r.permissions),
        None => Vec::new(),
    };
    Ok(MeResponse {
        user: UserResponse::new(model, role.map(|r| r.name), &*state.media),
        permissions,
    })
}

async fn ensure_role_exists<C: ConnectionTrait>(
    db: &C,
    role_id: i32,
) -> Result<role::Model, AppError> {
    role_of(db, role_id)
        .await?
        .ok_or_else(|| AppError::field("role_id", "The selected role is invalid."))
}

/// Only a Super Admin may hand out or manage the Super Admin role.
fn require_super_admin_for(auth_user: &AuthUser, role_name: &str) -> Result<(), AppError> {
    if role_name == SUPER_ADMIN && !auth_user.is_super_admin() {
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

async fn guard_target<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    target: &user::Model,
) -> Result<(), AppError> {
    if auth_user.is_super_admin() {
        return Ok(());
    }
    match role_of(db, target.role_id).await? {
        Some(r) => require_super_admin_for(auth_user, &r.name),
        None => Ok(()),
    }
}

async fn ensure_email_free<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except_id {
        select = select.filter(user::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::EmailTaken);
    }
    Ok(())
}

fn map_email_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::from(e),
    }
}

/// Remove stored files, logging failures.
pub(crate) async fn delete_files(state: &AppState, paths: &[String]) {
    for path in paths {
        if let Err(e) = state.media.delete(path).await {
            tracing::warn!(%path, error = %e, "Failed to delete stored file");
        }
    }
}
