use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::NotificationStatus;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{notification, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::notification::*;
use crate::models::shared::{
    ApiResponse, MessageResponse, Paginated, Pagination, message, ok, ok_with, page_params,
};
use crate::permissions::MANAGE_NOTIFICATIONS;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Notifications",
    operation_id = "sendNotification",
    summary = "Broadcast a push notification",
    description = "Pushes to every user with a device token matching the filters and records the outcome. Requires `manage_notifications`.",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Notification recorded (status `sent`, `failed` or `no_recipients`)", body = ApiResponse<NotificationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn send_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(MANAGE_NOTIFICATIONS)?;
    validate_send_notification(&payload)?;

    let mut filters = payload.filters.clone();
    filters.gender = filters
        .gender
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty());

    let tokens = recipient_tokens(&state.db, &filters).await?;
    let title = payload.title.trim();
    let body = payload.message.trim();

    let (status, sent_at) = if tokens.is_empty() {
        (NotificationStatus::NoRecipients, None)
    } else {
        match state.notifier.push(&tokens, title, body).await {
            Ok(delivered) => {
                tracing::info!(recipients = tokens.len(), delivered, "Notification pushed");
                (NotificationStatus::Sent, Some(Utc::now()))
            }
            Err(e) => {
                tracing::warn!(recipients = tokens.len(), error = %e, "Notification push failed");
                (NotificationStatus::Failed, None)
            }
        }
    };

    let model = notification::ActiveModel {
        title: Set(title.to_string()),
        message: Set(body.to_string()),
        filters: Set(serde_json::to_value(&filters)
            .map_err(|e| AppError::Internal(format!("Failed to encode filters: {e}")))?),
        recipient_count: Set(i32::try_from(tokens.len()).unwrap_or(i32::MAX)),
        status: Set(status),
        sent_at: Set(sent_at),
        created_by: Set(auth_user.user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        ok_with("Notification processed", NotificationResponse::from(model)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "List sent notifications",
    description = "Requires `manage_notifications`.",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = ApiResponse<Paginated<NotificationResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<Paginated<NotificationResponse>>>, AppError> {
    auth_user.require_permission(MANAGE_NOTIFICATIONS)?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = notification::Entity::find();
    if let Some(ref status) = query.status {
        let status: NotificationStatus = status.parse()?;
        select = select.filter(notification::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let items = select
        .order_by_desc(notification::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ok(Paginated {
        items,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Notifications",
    operation_id = "getNotification",
    summary = "Get a notification record",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = ApiResponse<NotificationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<NotificationResponse>>, AppError> {
    auth_user.require_permission(MANAGE_NOTIFICATIONS)?;
    let model = notification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(not_found)?;
    Ok(ok(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Notifications",
    operation_id = "deleteNotification",
    summary = "Delete a notification record",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_notification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission(MANAGE_NOTIFICATIONS)?;
    let result = notification::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(message("Notification deleted"))
}

/// Device tokens of users matching `filters`.
async fn recipient_tokens<C: ConnectionTrait>(
    db: &C,
    filters: &NotificationFilters,
) -> Result<Vec<String>, DbErr> {
    let mut select = user::Entity::find()
        .select_only()
        .column(user::Column::DeviceToken)
        .filter(user::Column::DeviceToken.is_not_null())
        .filter(user::Column::DeviceToken.ne(""));
    if let Some(role_id) = filters.role_id {
        select = select.filter(user::Column::RoleId.eq(role_id));
    }
    if let Some(status) = filters.status {
        select = select.filter(user::Column::Status.eq(status));
    }
    if let Some(ref gender) = filters.gender {
        select = select.filter(user::Column::Gender.eq(gender.as_str()));
    }

    let tokens: Vec<Option<String>> = select
        .order_by_asc(user::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    Ok(tokens.into_iter().flatten().collect())
}

fn not_found() -> AppError {
    AppError::NotFound("Notification not found".into())
}
