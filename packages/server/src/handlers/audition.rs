use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::AuditionStatus;
use common::storage::StoredMedia;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{audition, movie};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::movie::find_visible_movie;
use crate::models::audition::*;
use crate::models::shared::{
    ApiResponse, MessageResponse, Paginated, Pagination, escape_like, json_string_list, message,
    non_empty, ok, ok_with, page_params,
};
use crate::permissions::MANAGE_AUDITIONS;
use crate::services::settings::{self, UploadLimits};
use crate::state::AppState;
use crate::utils::video::VideoSlots;
use crate::utils::{filename, upload};

/// Text form fields are small; the video itself is bounded by the `max_video_size_mb` setting.
const MAX_TEXT_FIELD: usize = 16 * 1024;

/// Video routes stream straight to disk and enforce the configured size while doing so.
pub fn video_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::disable()
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Auditions",
    operation_id = "submitAudition",
    summary = "Submit an audition",
    description = "Multipart submission for a movie the caller can see. A caller may audition only once per movie and role (409 DUPLICATE_AUDITION). The video extension must be listed in `allowed_video_extensions` and the file must fit `max_video_size_mb`.",
    request_body(content_type = "multipart/form-data", description = "`movie_id`, `role`, `applicant_name`, optional `notes`, and a `video` file"),
    responses(
        (status = 201, description = "Audition submitted", body = ApiResponse<AuditionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already auditioned for this role (DUPLICATE_AUDITION)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_audition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limits = settings::upload_limits(&state.db, &state.config.storage).await?;

    let mut stored = None;
    let outcome = async {
        let fields = read_form(&state, multipart, &limits, &mut stored).await?;
        let input = validate_new_audition(fields, stored.is_some())?;
        let Some(video) = stored.as_ref() else {
            return Err(AppError::field("video", "The video field is required."));
        };

        let movie = find_visible_movie(&state.db, &auth_user, input.movie_id).await?;

        let duplicates = audition::Entity::find()
            .filter(audition::Column::UserId.eq(auth_user.user_id))
            .filter(audition::Column::MovieId.eq(movie.id))
            .filter(
                Expr::expr(Func::lower(Expr::col(audition::Column::Role)))
                    .eq(input.role.to_lowercase()),
            )
            .count(&state.db)
            .await?;
        if duplicates > 0 {
            return Err(AppError::DuplicateAudition);
        }

        let now = Utc::now();
        let model = audition::ActiveModel {
            user_id: Set(auth_user.user_id),
            movie_id: Set(movie.id),
            role: Set(input.role),
            applicant_name: Set(input.applicant_name),
            uploaded_videos: Set(serde_json::json!([video.url])),
            old_video_backups: Set(serde_json::json!([])),
            notes: Set(input.notes),
            status: Set(AuditionStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&state.db)
        .await?;
        Ok::<_, AppError>((model, movie.title))
    }
    .await;

    let (model, title) = match outcome {
        Ok(v) => v,
        Err(e) => {
            if let Some(ref s) = stored {
                upload::discard(&*state.media, s).await;
            }
            return Err(e);
        }
    };

    tracing::info!(audition_id = model.id, movie_id = model.movie_id, "Audition submitted");
    Ok((
        StatusCode::CREATED,
        ok_with("Audition submitted", AuditionResponse::new(model, Some(title))),
    ))
}

#[utoipa::path(
    get,
    path = "/mine",
    tag = "Auditions",
    operation_id = "listMyAuditions",
    summary = "List the caller's auditions",
    params(MyAuditionsQuery),
    responses(
        (status = 200, description = "Auditions, newest first", body = ApiResponse<Paginated<AuditionResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_my_auditions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MyAuditionsQuery>,
) -> Result<Json<ApiResponse<Paginated<AuditionResponse>>>, AppError> {
    let select = audition::Entity::find().filter(audition::Column::UserId.eq(auth_user.user_id));
    let page = paginate_auditions(&state.db, select, query.page, query.per_page).await?;
    Ok(ok(page))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Auditions",
    operation_id = "listAuditions",
    summary = "List all auditions",
    description = "Requires `manage_auditions`.",
    params(AuditionListQuery),
    responses(
        (status = 200, description = "Auditions, newest first", body = ApiResponse<Paginated<AuditionResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_auditions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AuditionListQuery>,
) -> Result<Json<ApiResponse<Paginated<AuditionResponse>>>, AppError> {
    auth_user.require_permission(MANAGE_AUDITIONS)?;

    let mut select = audition::Entity::find();
    if let Some(movie_id) = query.movie_id {
        select = select.filter(audition::Column::MovieId.eq(movie_id));
    }
    if let Some(user_id) = query.user_id {
        select = select.filter(audition::Column::UserId.eq(user_id));
    }
    if let Some(ref status) = query.status {
        let status: AuditionStatus = status.parse()?;
        select = select.filter(audition::Column::Status.eq(status));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((
                    audition::Entity,
                    audition::Column::ApplicantName,
                ))))
                .like(LikeExpr::new(pattern).escape('\\')),
            );
        }
    }

    let page = paginate_auditions(&state.db, select, query.page, query.per_page).await?;
    Ok(ok(page))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Auditions",
    operation_id = "getAudition",
    summary = "Get an audition",
    description = "Visible to its owner and to holders of `manage_auditions`.",
    params(("id" = i32, Path, description = "Audition ID")),
    responses(
        (status = 200, description = "Audition", body = ApiResponse<AuditionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Audition not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_audition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AuditionResponse>>, AppError> {
    let (model, movie) = audition::Entity::find_by_id(id)
        .find_also_related(movie::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(not_found)?;

    if model.user_id != auth_user.user_id && !auth_user.has_permission(MANAGE_AUDITIONS) {
        return Err(not_found());
    }
    Ok(ok(AuditionResponse::new(model, movie.map(|m| m.title))))
}

#[utoipa::path(
    post,
    path = "/{id}",
    tag = "Auditions",
    operation_id = "updateAudition",
    summary = "Update an own audition",
    description = "Updates `applicant_name` and `notes`. A new `video` becomes the current video and the previous one is kept in `old_video_backups`.",
    params(("id" = i32, Path, description = "Audition ID")),
    request_body(content_type = "multipart/form-data", description = "Optional `applicant_name`, `notes` and `video` file"),
    responses(
        (status = 200, description = "Audition updated", body = ApiResponse<AuditionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Audition not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id, user_id = auth_user.user_id))]
pub async fn update_audition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<AuditionResponse>>, AppError> {
    // Reject strangers before accepting any upload.
    ensure_owner(&auth_user, &find_audition(&state.db, id).await?)?;
    let limits = settings::upload_limits(&state.db, &state.config.storage).await?;

    let mut stored = None;
    let outcome = async {
        let fields = read_form(&state, multipart, &limits, &mut stored).await?;
        validate_audition_update(&fields)?;

        let txn = state.db.begin().await?;
        let existing = find_audition_for_update(&txn, id).await?;
        ensure_owner(&auth_user, &existing)?;

        if fields.applicant_name.is_none() && fields.notes.is_none() && stored.is_none() {
            return Ok(existing);
        }

        let mut slots = VideoSlots::from_json(&existing.uploaded_videos, &existing.old_video_backups);
        let mut active: audition::ActiveModel = existing.into();
        if let Some(name) = fields.applicant_name {
            active.applicant_name = Set(name.trim().to_string());
        }
        if fields.notes.is_some() {
            active.notes = Set(non_empty(fields.notes));
        }
        if let Some(ref video) = stored {
            slots.replace(video.url.clone());
            let (current, backups) = slots.to_json();
            active.uploaded_videos = Set(current);
            active.old_video_backups = Set(backups);
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    let model = match outcome {
        Ok(model) => model,
        Err(e) => {
            if let Some(ref s) = stored {
                upload::discard(&*state.media, s).await;
            }
            return Err(e);
        }
    };

    let title = movie_title(&state.db, model.movie_id).await?;
    Ok(ok_with("Audition updated", AuditionResponse::new(model, title)))
}

#[utoipa::path(
    post,
    path = "/{id}/remove-video",
    tag = "Auditions",
    operation_id = "removeAuditionVideo",
    summary = "Retire the current video",
    description = "Moves the given URL from `uploaded_videos` to `old_video_backups`. The file itself is kept.",
    params(("id" = i32, Path, description = "Audition ID")),
    request_body = RemoveVideoRequest,
    responses(
        (status = 200, description = "Video removed", body = ApiResponse<AuditionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Audition or video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn remove_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RemoveVideoRequest>,
) -> Result<Json<ApiResponse<AuditionResponse>>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_audition_for_update(&txn, id).await?;
    ensure_owner(&auth_user, &existing)?;

    let mut slots = VideoSlots::from_json(&existing.uploaded_videos, &existing.old_video_backups);
    if !slots.remove(payload.url.trim()) {
        return Err(AppError::NotFound("Video not found on this audition".into()));
    }
    let (current, backups) = slots.to_json();

    let mut active: audition::ActiveModel = existing.into();
    active.uploaded_videos = Set(current);
    active.old_video_backups = Set(backups);
    active.updated_at = Set(Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    let title = movie_title(&state.db, model.movie_id).await?;
    Ok(ok_with("Video removed", AuditionResponse::new(model, title)))
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "Auditions",
    operation_id = "updateAuditionStatus",
    summary = "Set the review status",
    description = "Requires `manage_auditions`.",
    params(("id" = i32, Path, description = "Audition ID")),
    request_body = UpdateAuditionStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<AuditionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Audition not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, status = %payload.status))]
pub async fn update_audition_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAuditionStatusRequest>,
) -> Result<Json<ApiResponse<AuditionResponse>>, AppError> {
    auth_user.require_permission(MANAGE_AUDITIONS)?;

    let existing = find_audition(&state.db, id).await?;
    let mut active: audition::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    let title = movie_title(&state.db, model.movie_id).await?;
    Ok(ok_with("Audition status updated", AuditionResponse::new(model, title)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Auditions",
    operation_id = "deleteAudition",
    summary = "Delete an audition",
    description = "Owners may withdraw a pending audition; holders of `manage_auditions` may delete any. All stored videos of the audition are removed.",
    params(("id" = i32, Path, description = "Audition ID")),
    responses(
        (status = 200, description = "Audition deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Audition not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_audition(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_audition_for_update(&txn, id).await?;

    if !auth_user.has_permission(MANAGE_AUDITIONS) {
        if existing.user_id != auth_user.user_id {
            return Err(not_found());
        }
        if existing.status != AuditionStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending auditions can be withdrawn".into(),
            ));
        }
    }

    let mut urls = json_string_list(&existing.uploaded_videos);
    urls.extend(json_string_list(&existing.old_video_backups));

    audition::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    for url in &urls {
        upload::delete_by_url(&*state.media, url).await;
    }

    tracing::info!(audition_id = id, files = urls.len(), "Audition deleted");
    Ok(message("Audition deleted"))
}

/// Drain the multipart form into text fields plus at most one stored video.
///
/// The video is written as soon as it is seen; `stored` is filled before any
/// later field fails so the caller can discard it.
async fn read_form(
    state: &AppState,
    mut multipart: Multipart,
    limits: &UploadLimits,
    stored: &mut Option<StoredMedia>,
) -> Result<AuditionFields, AppError> {
    let mut fields = AuditionFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                if stored.is_some() {
                    return Err(AppError::field("video", "Only one video may be uploaded."));
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                let ext = filename::allowed_extension(&file_name, &limits.video_extensions)
                    .map_err(|e| AppError::field("video", e.message()))?;
                *stored = Some(
                    upload::store_field(
                        field,
                        &*state.media,
                        "videos",
                        &ext,
                        limits.max_video_bytes,
                    )
                    .await?,
                );
            }
            "movie_id" => fields.movie_id = Some(upload::text_field(field, 32).await?),
            "role" => fields.role = Some(upload::text_field(field, MAX_TEXT_FIELD).await?),
            "applicant_name" => {
                fields.applicant_name = Some(upload::text_field(field, MAX_TEXT_FIELD).await?)
            }
            "notes" => fields.notes = Some(upload::text_field(field, MAX_TEXT_FIELD).await?),
            _ => {}
        }
    }
    Ok(fields)
}

async fn paginate_auditions<C: ConnectionTrait>(
    db: &C,
    select: Select<audition::Entity>,
    page: Option<u64>,
    per_page: Option<u64>,
) -> Result<Paginated<AuditionResponse>, AppError> {
    let (page, per_page) = page_params(page, per_page);
    let total = select.clone().paginate(db, per_page).num_items().await?;

    let items = select
        .find_also_related(movie::Entity)
        .order_by_desc(audition::Column::CreatedAt)
        .order_by_desc(audition::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(db)
        .await?
        .into_iter()
        .map(|(a, m)| AuditionResponse::new(a, m.map(|m| m.title)))
        .collect();

    Ok(Paginated {
        items,
        pagination: Pagination::new(page, per_page, total),
    })
}

fn ensure_owner(auth_user: &AuthUser, model: &audition::Model) -> Result<(), AppError> {
    if model.user_id == auth_user.user_id {
        Ok(())
    } else if auth_user.has_permission(MANAGE_AUDITIONS) {
        Err(AppError::PermissionDenied)
    } else {
        Err(not_found())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Audition not found".into())
}

async fn movie_title<C: ConnectionTrait>(db: &C, movie_id: i32) -> Result<Option<String>, DbErr> {
    Ok(movie::Entity::find_by_id(movie_id)
        .one(db)
        .await?
        .map(|m| m.title))
}

async fn find_audition<C: ConnectionTrait>(db: &C, id: i32) -> Result<audition::Model, AppError> {
    audition::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)
}

async fn find_audition_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<audition::Model, AppError> {
    audition::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(not_found)
}
