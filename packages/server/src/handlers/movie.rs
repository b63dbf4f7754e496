use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::{MovieRoleStatus, MovieStatus};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{audition, movie, movie_role};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::movie::*;
use crate::models::shared::{
    ApiResponse, MessageResponse, Paginated, Pagination, escape_like, message, ok, ok_with,
    page_params,
};
use crate::permissions::MANAGE_MOVIES;
use crate::state::AppState;
use crate::utils::reconcile::{self, ReconcileError};

#[utoipa::path(
    get,
    path = "/",
    tag = "Movies",
    operation_id = "listMovies",
    summary = "List movies",
    description = "Paginated movie list ordered by end date. Without `manage_movies` only movies that are still open (end date today or later) and not `inactive` are listed.",
    params(MovieListQuery),
    responses(
        (status = 200, description = "Movies", body = ApiResponse<Paginated<MovieResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_movies(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<ApiResponse<Paginated<MovieResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);
    let mut select = movie::Entity::find();

    if !auth_user.has_permission(MANAGE_MOVIES) {
        select = select.filter(visible_condition());
    }

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(movie::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(movie::Column::Director)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }
    if let Some(ref status) = query.status {
        let status: MovieStatus = status.parse()?;
        select = select.filter(movie::Column::Status.eq(status));
    }
    if let Some(ref genre) = query.genre {
        let genre = genre.trim();
        if !genre.is_empty() {
            // JSON arrays serialize each entry as a quoted string on every backend.
            let pattern = format!("%\"{}\"%", escape_like(&genre.to_lowercase()));
            select = select.filter(Expr::cust_with_values(
                r#"LOWER(CAST("genre" AS TEXT)) LIKE ? ESCAPE '\'"#,
                [pattern],
            ));
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let items = select
        .order_by_asc(movie::Column::EndDate)
        .order_by_asc(movie::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|m| MovieResponse::new(m, None))
        .collect();

    Ok(ok(Paginated {
        items,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Movies",
    operation_id = "getMovie",
    summary = "Get a movie with its roles",
    description = "Returns the movie and its non-deleted casting roles. Movies hidden from the caller (expired or inactive, without `manage_movies`) are reported as not found.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie", body = ApiResponse<MovieResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MovieResponse>>, AppError> {
    let model = find_visible_movie(&state.db, &auth_user, id).await?;
    let roles = active_roles(&state.db, id).await?;
    Ok(ok(MovieResponse::new(model, Some(roles))))
}

#[utoipa::path(
    get,
    path = "/{id}/roles",
    tag = "Movies",
    operation_id = "listMovieRoles",
    summary = "Open casting roles of a movie",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Open roles", body = ApiResponse<Vec<MovieRoleResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_movie_roles(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<MovieRoleResponse>>>, AppError> {
    find_visible_movie(&state.db, &auth_user, id).await?;

    let roles = movie_role::Entity::find()
        .filter(movie_role::Column::MovieId.eq(id))
        .filter(movie_role::Column::DeletedAt.is_null())
        .filter(movie_role::Column::Status.eq(MovieRoleStatus::Open))
        .order_by_asc(movie_role::Column::Id)
        .all(&state.db)
        .await?;

    Ok(ok(roles.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Movies",
    operation_id = "createMovie",
    summary = "Create a movie",
    description = "Creates a movie and its initial casting roles. Blank or `deleted` role entries are ignored. Requires `manage_movies`.",
    request_body = CreateMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = ApiResponse<MovieResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(MANAGE_MOVIES)?;
    validate_create_movie(&payload)?;

    let plan = reconcile::plan(&[], &payload.roles).map_err(roles_error)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let model = movie::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        genre: Set(serde_json::json!(clean_genre(&payload.genre))),
        end_date: Set(payload.end_date),
        director: Set(payload
            .director
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        budget: Set(payload.budget),
        status: Set(payload.status.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for entry in plan.create {
        insert_role(&txn, model.id, entry).await?;
    }

    let roles = active_roles(&txn, model.id).await?;
    txn.commit().await?;

    tracing::info!(movie_id = model.id, roles = roles.len(), "Movie created");
    Ok((
        StatusCode::CREATED,
        ok_with("Movie created", MovieResponse::new(model, Some(roles))),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Movies",
    operation_id = "updateMovie",
    summary = "Update a movie",
    description = "Partially updates a movie. When `roles` is present it is the complete desired role list: entries with an `id` update that role (or remove it when `deleted` or blank), entries without an `id` are created, and roles left out are removed. Requires `manage_movies`.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body = UpdateMovieRequest,
    responses(
        (status = 200, description = "Movie updated", body = ApiResponse<MovieResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error or foreign role id (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateMovieRequest>,
) -> Result<Json<ApiResponse<MovieResponse>>, AppError> {
    auth_user.require_permission(MANAGE_MOVIES)?;
    validate_update_movie(&payload)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let existing = find_movie_for_update(&txn, id).await?;

    let mut active: movie::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(ref description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(ref genre) = payload.genre {
        active.genre = Set(serde_json::json!(clean_genre(genre)));
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    match payload.director {
        Some(Some(ref d)) if !d.trim().is_empty() => {
            active.director = Set(Some(d.trim().to_string()))
        }
        Some(_) => active.director = Set(None),
        None => {}
    }
    if let Some(budget) = payload.budget {
        active.budget = Set(budget);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(now);
    let model = active.update(&txn).await?;

    if let Some(ref roles) = payload.roles {
        sync_roles(&txn, id, roles).await?;
    }

    let roles = active_roles(&txn, id).await?;
    txn.commit().await?;

    Ok(ok_with("Movie updated", MovieResponse::new(model, Some(roles))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Movies",
    operation_id = "deleteMovie",
    summary = "Delete a movie",
    description = "Deletes a movie and its casting roles. Requires `manage_movies`. Movies with auditions cannot be deleted (409).",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Movie has auditions (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission(MANAGE_MOVIES)?;

    let txn = state.db.begin().await?;
    find_movie_for_update(&txn, id).await?;

    let audition_count = audition::Entity::find()
        .filter(audition::Column::MovieId.eq(id))
        .count(&txn)
        .await?;
    if audition_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a movie that has auditions".into(),
        ));
    }

    movie_role::Entity::delete_many()
        .filter(movie_role::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    movie::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(movie_id = id, "Movie deleted");
    Ok(message("Movie deleted"))
}

/// Apply a full desired role list to a movie. Removed roles are soft-deleted.
async fn sync_roles<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    submitted: &[MovieRoleInput],
) -> Result<(), AppError> {
    let existing: Vec<i32> = movie_role::Entity::find()
        .select_only()
        .column(movie_role::Column::Id)
        .filter(movie_role::Column::MovieId.eq(movie_id))
        .filter(movie_role::Column::DeletedAt.is_null())
        .into_tuple()
        .all(db)
        .await?;

    let plan = reconcile::plan(&existing, submitted).map_err(roles_error)?;
    if plan.is_noop() {
        return Ok(());
    }
    let now = Utc::now();

    for (role_id, entry) in &plan.update {
        movie_role::ActiveModel {
            id: Unchanged(*role_id),
            role_type: Set(entry.role_type.trim().to_string()),
            gender: Set(entry.gender_value()),
            age_range: Set(trimmed(entry.age_range.as_deref())),
            dialogue_sample: Set(trimmed(entry.dialogue_sample.as_deref())),
            status: Set(entry.status.unwrap_or_default()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(db)
        .await?;
    }

    if !plan.delete.is_empty() {
        movie_role::Entity::update_many()
            .col_expr(movie_role::Column::DeletedAt, Expr::value(now))
            .col_expr(movie_role::Column::UpdatedAt, Expr::value(now))
            .filter(movie_role::Column::Id.is_in(plan.delete.clone()))
            .exec(db)
            .await?;
    }

    for entry in &plan.create {
        insert_role(db, movie_id, entry).await?;
    }

    tracing::debug!(
        movie_id,
        created = plan.create.len(),
        updated = plan.update.len(),
        deleted = plan.delete.len(),
        "Synchronized movie roles"
    );
    Ok(())
}

async fn insert_role<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    entry: &MovieRoleInput,
) -> Result<movie_role::Model, DbErr> {
    let now = Utc::now();
    movie_role::ActiveModel {
        movie_id: Set(movie_id),
        role_type: Set(entry.role_type.trim().to_string()),
        gender: Set(entry.gender_value()),
        age_range: Set(trimmed(entry.age_range.as_deref())),
        dialogue_sample: Set(trimmed(entry.dialogue_sample.as_deref())),
        status: Set(entry.status.unwrap_or_default()),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn roles_error(e: ReconcileError) -> AppError {
    AppError::field("roles", e.to_string())
}

/// Open for auditions: end date not passed and not switched off.
fn visible_condition() -> Condition {
    Condition::all()
        .add(movie::Column::EndDate.gte(Utc::now().date_naive()))
        .add(movie::Column::Status.ne(MovieStatus::Inactive))
}

pub fn is_visible(model: &movie::Model) -> bool {
    model.end_date >= Utc::now().date_naive() && model.status != MovieStatus::Inactive
}

/// Load a movie the caller may see; hidden movies are `NotFound` for non-admins.
pub async fn find_visible_movie<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: i32,
) -> Result<movie::Model, AppError> {
    let model = find_movie(db, id).await?;
    if !auth_user.has_permission(MANAGE_MOVIES) && !is_visible(&model) {
        return Err(AppError::NotFound("Movie not found".into()));
    }
    Ok(model)
}

pub async fn find_movie<C: ConnectionTrait>(db: &C, id: i32) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

async fn find_movie_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

async fn active_roles<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
) -> Result<Vec<movie_role::Model>, DbErr> {
    movie_role::Entity::find()
        .filter(movie_role::Column::MovieId.eq(movie_id))
        .filter(movie_role::Column::DeletedAt.is_null())
        .order_by_asc(movie_role::Column::Id)
        .all(db)
        .await
}
