use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::PageStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::page;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::page::*;
use crate::models::shared::{
    ApiResponse, MessageResponse, Paginated, Pagination, escape_like, message, non_empty, ok,
    ok_with, page_params,
};
use crate::permissions::MANAGE_PAGES;
use crate::state::AppState;
use crate::utils::slug::slugify;

#[utoipa::path(
    get,
    path = "/",
    tag = "Pages",
    operation_id = "listPages",
    summary = "List CMS pages",
    description = "Requires `manage_pages`.",
    params(PageListQuery),
    responses(
        (status = 200, description = "Pages", body = ApiResponse<Paginated<PageResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_pages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageListQuery>,
) -> Result<Json<ApiResponse<Paginated<PageResponse>>>, AppError> {
    auth_user.require_permission(MANAGE_PAGES)?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = page::Entity::find();
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(page::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(page::Column::Slug.like(LikeExpr::new(pattern).escape('\\'))),
            );
        }
    }
    if let Some(ref status) = query.status {
        let status: PageStatus = status.parse()?;
        select = select.filter(page::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let items = select
        .order_by_asc(page::Column::MenuOrder)
        .order_by_asc(page::Column::Id)
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
    tag = "Pages",
    operation_id = "getPage",
    summary = "Get a page by id",
    description = "Requires `manage_pages`. Returns drafts and archived pages too.",
    params(("id" = i32, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Page", body = ApiResponse<PageResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PageResponse>>, AppError> {
    auth_user.require_permission(MANAGE_PAGES)?;
    Ok(ok(find_page(&state.db, id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Pages",
    operation_id = "createPage",
    summary = "Create a page",
    description = "Requires `manage_pages`. When `slug` is omitted it is derived from the title.",
    request_body = CreatePageRequest,
    responses(
        (status = 201, description = "Page created", body = ApiResponse<PageResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePageRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(MANAGE_PAGES)?;
    validate_create_page(&payload)?;

    let slug = match payload.slug.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => slugify(&payload.title),
    };
    ensure_slug_free(&state.db, &slug, None).await?;

    let now = Utc::now();
    let model = page::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        content: Set(payload.content),
        status: Set(payload.status.unwrap_or_default()),
        meta_title: Set(non_empty(payload.meta_title)),
        meta_description: Set(non_empty(payload.meta_description)),
        meta_keywords: Set(non_empty(payload.meta_keywords)),
        show_in_menu: Set(payload.show_in_menu),
        menu_order: Set(payload.menu_order),
        created_by: Set(Some(auth_user.user_id)),
        updated_by: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_slug_conflict)?;

    tracing::info!(page_id = model.id, slug = %model.slug, "Page created");
    Ok((
        StatusCode::CREATED,
        ok_with("Page created", PageResponse::from(model)),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Pages",
    operation_id = "updatePage",
    summary = "Update a page",
    description = "Requires `manage_pages`. Send `null` for a meta field to clear it.",
    params(("id" = i32, Path, description = "Page ID")),
    request_body = UpdatePageRequest,
    responses(
        (status = 200, description = "Page updated", body = ApiResponse<PageResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePageRequest>,
) -> Result<Json<ApiResponse<PageResponse>>, AppError> {
    auth_user.require_permission(MANAGE_PAGES)?;
    validate_update_page(&payload)?;

    let existing = find_page(&state.db, id).await?;
    if payload == UpdatePageRequest::default() {
        return Ok(ok_with("Page unchanged", existing.into()));
    }

    let mut active: page::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(slug) = payload.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        ensure_slug_free(&state.db, slug, Some(id)).await?;
        active.slug = Set(slug.to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(v) = payload.meta_title {
        active.meta_title = Set(non_empty(v));
    }
    if let Some(v) = payload.meta_description {
        active.meta_description = Set(non_empty(v));
    }
    if let Some(v) = payload.meta_keywords {
        active.meta_keywords = Set(non_empty(v));
    }
    if let Some(v) = payload.show_in_menu {
        active.show_in_menu = Set(v);
    }
    if let Some(v) = payload.menu_order {
        active.menu_order = Set(v);
    }
    active.updated_by = Set(Some(auth_user.user_id));
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await.map_err(map_slug_conflict)?;

    Ok(ok_with("Page updated", model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Pages",
    operation_id = "deletePage",
    summary = "Delete a page",
    description = "Requires `manage_pages`.",
    params(("id" = i32, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Page deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_user.require_permission(MANAGE_PAGES)?;

    let result = page::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(message("Page deleted"))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Pages",
    operation_id = "getPublishedPage",
    summary = "Get a published page by slug",
    params(("slug" = String, Path, description = "Page slug")),
    responses(
        (status = 200, description = "Page", body = ApiResponse<PageResponse>),
        (status = 404, description = "No published page with this slug (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_published_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PageResponse>>, AppError> {
    let model = page::Entity::find()
        .filter(page::Column::Slug.eq(slug))
        .filter(page::Column::Status.eq(PageStatus::Published))
        .one(&state.db)
        .await?
        .ok_or_else(not_found)?;
    Ok(ok(model.into()))
}

#[utoipa::path(
    get,
    path = "/menu",
    tag = "Pages",
    operation_id = "pageMenu",
    summary = "Navigation menu",
    description = "Published pages flagged `show_in_menu`, ordered by `menu_order`.",
    responses(
        (status = 200, description = "Menu entries", body = ApiResponse<Vec<MenuItem>>),
    ),
)]
#[instrument(skip(state))]
pub async fn page_menu(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MenuItem>>>, AppError> {
    let items = page::Entity::find()
        .filter(page::Column::Status.eq(PageStatus::Published))
        .filter(page::Column::ShowInMenu.eq(true))
        .order_by_asc(page::Column::MenuOrder)
        .order_by_asc(page::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| MenuItem {
            title: p.title,
            slug: p.slug,
            menu_order: p.menu_order,
        })
        .collect();
    Ok(ok(items))
}

fn not_found() -> AppError {
    AppError::NotFound("Page not found".into())
}

async fn find_page<C: ConnectionTrait>(db: &C, id: i32) -> Result<page::Model, AppError> {
    page::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = page::Entity::find().filter(page::Column::Slug.eq(slug));
    if let Some(id) = except_id {
        select = select.filter(page::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(format!("Slug '{slug}' is already in use")));
    }
    Ok(())
}

fn map_slug_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Slug is already in use".into())
        }
        _ => AppError::from(e),
    }
}
