use std::collections::BTreeMap;

use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::setting::*;
use crate::models::shared::{ApiResponse, ok, ok_with};
use crate::permissions::MANAGE_SETTINGS;
use crate::services::settings;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Settings",
    operation_id = "listSettings",
    summary = "List all settings",
    description = "Requires `manage_settings`. Secret values are masked.",
    responses(
        (status = 200, description = "Settings ordered by key", body = ApiResponse<Vec<SettingItem>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SettingItem>>>, AppError> {
    auth_user.require_permission(MANAGE_SETTINGS)?;
    Ok(ok(setting_items(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/",
    tag = "Settings",
    operation_id = "updateSettings",
    summary = "Bulk update settings",
    description = "Upserts every key in `settings`. Values equal to the mask `********` are skipped so a masked secret can be sent back unchanged. Requires `manage_settings`.",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<Vec<SettingItem>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, count = payload.settings.len()))]
pub async fn update_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<Vec<SettingItem>>>, AppError> {
    auth_user.require_permission(MANAGE_SETTINGS)?;
    validate_update_settings(&payload)?;

    let txn = state.db.begin().await?;
    let mut written = 0;
    for (key, value) in &payload.settings {
        if is_placeholder(value) {
            continue;
        }
        settings::upsert(&txn, key, value.trim()).await?;
        written += 1;
    }
    txn.commit().await?;

    tracing::info!(written, "Settings updated");
    Ok(ok_with("Settings updated", setting_items(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/public",
    tag = "Settings",
    operation_id = "publicSettings",
    summary = "Public settings",
    description = "Non-secret settings a client needs before sign-in: site name, upload limits, the payment key id.",
    responses(
        (status = 200, description = "Key/value map", body = ApiResponse<BTreeMap<String, String>>),
    ),
)]
#[instrument(skip(state))]
pub async fn public_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>, AppError> {
    let public = settings::load_all(&state.db)
        .await?
        .into_iter()
        .filter(|(key, _)| settings::is_public(key))
        .collect();
    Ok(ok(public))
}

async fn setting_items<C: ConnectionTrait>(db: &C) -> Result<Vec<SettingItem>, DbErr> {
    Ok(settings::load_all(db)
        .await?
        .into_iter()
        .map(|(key, value)| SettingItem {
            value: settings::masked(&key, &value),
            category: settings::category_of(&key).to_string(),
            is_secret: settings::is_secret(&key),
            key,
        })
        .collect())
}
