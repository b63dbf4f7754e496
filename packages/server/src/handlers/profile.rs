use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, State},
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::user::{delete_files, find_user, find_user_for_update, user_response};
use crate::models::profile::*;
use crate::models::shared::{ApiResponse, json_string_list, non_empty, ok_with, to_json_list};
use crate::models::user::{UserResponse, normalize_gender};
use crate::services::settings;
use crate::state::AppState;
use crate::utils::{filename, upload};

/// Body limit for image upload routes (a full gallery batch plus form overhead).
pub fn image_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024)
}

#[utoipa::path(
    patch,
    path = "/",
    tag = "Profile",
    operation_id = "updateProfile",
    summary = "Update the current user's profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    validate_update_profile(&payload)?;

    let existing = find_user(&state.db, auth_user.user_id).await?;
    if payload == UpdateProfileRequest::default() {
        return Ok(ok_with("Profile unchanged", user_response(&state, existing).await?));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
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
    let model = active.update(&state.db).await?;

    Ok(ok_with("Profile updated", user_response(&state, model).await?))
}

#[utoipa::path(
    put,
    path = "/device-token",
    tag = "Profile",
    operation_id = "updateDeviceToken",
    summary = "Register or clear the push device token",
    request_body = DeviceTokenRequest,
    responses(
        (status = 200, description = "Device token saved", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_device_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeviceTokenRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let token = non_empty(payload.device_token);
    if token.as_ref().is_some_and(|t| t.len() > 512) {
        return Err(AppError::field(
            "device_token",
            "The device token may not be greater than 512 characters.",
        ));
    }

    let existing = find_user(&state.db, auth_user.user_id).await?;
    let mut active: user::ActiveModel = existing.into();
    active.device_token = Set(token);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    Ok(ok_with("Device token updated", user_response(&state, model).await?))
}

#[utoipa::path(
    post,
    path = "/photo",
    tag = "Profile",
    operation_id = "uploadProfilePhoto",
    summary = "Upload a profile photo",
    description = "Replaces the current profile photo. The `photo` multipart field must be an image within the `max_image_size_mb` setting.",
    request_body(content_type = "multipart/form-data", description = "`photo`: image file"),
    responses(
        (status = 200, description = "Photo updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Missing, oversized or non-image file (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_photo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let limits = settings::upload_limits(&state.db, &state.config.storage).await?;

    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("photo") || stored.is_some() {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let ext = filename::image_extension(&name)
            .map_err(|e| AppError::field("photo", e.message()))?;
        stored = Some(
            upload::store_field(field, &*state.media, "profile-photos", &ext, limits.max_image_bytes)
                .await?,
        );
    }
    let stored = stored.ok_or_else(|| AppError::field("photo", "The photo field is required."))?;

    let result = async {
        let existing = find_user(&state.db, auth_user.user_id).await?;
        let previous = existing.profile_photo.clone();
        let mut active: user::ActiveModel = existing.into();
        active.profile_photo = Set(Some(stored.path.clone()));
        active.updated_at = Set(Utc::now());
        let model = active.update(&state.db).await?;
        Ok::<_, AppError>((model, previous))
    }
    .await;

    let (model, previous) = match result {
        Ok(v) => v,
        Err(e) => {
            upload::discard(&*state.media, &stored).await;
            return Err(e);
        }
    };
    if let Some(previous) = previous {
        delete_files(&state, &[previous]).await;
    }

    Ok(ok_with("Profile photo updated", user_response(&state, model).await?))
}

#[utoipa::path(
    post,
    path = "/gallery",
    tag = "Profile",
    operation_id = "uploadGalleryImages",
    summary = "Add images to the gallery",
    description = "Appends one or more `images` fields to the gallery. The gallery holds at most 10 images; a batch that would exceed it is rejected as a whole.",
    request_body(content_type = "multipart/form-data", description = "`images`: one or more image files"),
    responses(
        (status = 200, description = "Gallery updated", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Invalid images or gallery full (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_gallery(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let limits = settings::upload_limits(&state.db, &state.config.storage).await?;
    let current = json_string_list(&find_user(&state.db, auth_user.user_id).await?.gallery);

    let mut stored = Vec::new();
    let outcome = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            if !matches!(field.name(), Some("images") | Some("images[]")) {
                continue;
            }
            if current.len() + stored.len() >= MAX_GALLERY_IMAGES {
                return Err(gallery_full());
            }
            let name = field.file_name().unwrap_or_default().to_string();
            let ext = filename::image_extension(&name)
                .map_err(|e| AppError::field("images", e.message()))?;
            stored.push(
                upload::store_field(field, &*state.media, "gallery", &ext, limits.max_image_bytes)
                    .await?,
            );
        }
        if stored.is_empty() {
            return Err(AppError::field("images", "At least one image is required."));
        }

        let txn = state.db.begin().await?;
        let existing = find_user_for_update(&txn, auth_user.user_id).await?;
        let mut gallery = json_string_list(&existing.gallery);
        if gallery.len() + stored.len() > MAX_GALLERY_IMAGES {
            return Err(gallery_full());
        }
        gallery.extend(stored.iter().map(|s| s.path.clone()));

        let mut active: user::ActiveModel = existing.into();
        active.gallery = Set(to_json_list(&gallery));
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    let model = match outcome {
        Ok(model) => model,
        Err(e) => {
            for s in &stored {
                upload::discard(&*state.media, s).await;
            }
            return Err(e);
        }
    };

    Ok(ok_with("Gallery updated", user_response(&state, model).await?))
}

#[utoipa::path(
    delete,
    path = "/gallery",
    tag = "Profile",
    operation_id = "removeGalleryImage",
    summary = "Remove a gallery image",
    description = "Removes one image from the gallery and deletes the stored file. Accepts the relative path or the public URL.",
    request_body = RemoveGalleryImageRequest,
    responses(
        (status = 200, description = "Image removed", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not in gallery (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn remove_gallery_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RemoveGalleryImageRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let requested = payload.path.trim();
    let path = state
        .media
        .path_from_url(requested)
        .unwrap_or_else(|| requested.to_string());

    let txn = state.db.begin().await?;
    let existing = find_user_for_update(&txn, auth_user.user_id).await?;
    let mut gallery = json_string_list(&existing.gallery);
    let Some(pos) = gallery.iter().position(|p| *p == path) else {
        return Err(AppError::NotFound("Image not found in gallery".into()));
    };
    gallery.remove(pos);

    let mut active: user::ActiveModel = existing.into();
    active.gallery = Set(to_json_list(&gallery));
    active.updated_at = Set(Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    delete_files(&state, &[path]).await;

    Ok(ok_with("Image removed", user_response(&state, model).await?))
}

fn gallery_full() -> AppError {
    AppError::field(
        "images",
        format!("The gallery may not have more than {MAX_GALLERY_IMAGES} images."),
    )
}
