use chrono::{DateTime, Utc};
use common::PageStatus;
use serde::{Deserialize, Serialize};

use crate::entity::page;
use crate::error::AppError;
use crate::models::shared::{FieldCheck, double_option};
use crate::utils::slug;

#[derive(Serialize, utoipa::ToSchema)]
pub struct PageResponse {
    pub id: i32,
    #[schema(example = "Privacy Policy")]
    pub title: String,
    #[schema(example = "privacy-policy")]
    pub slug: String,
    pub content: String,
    pub status: PageStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub show_in_menu: bool,
    pub menu_order: i32,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<page::Model> for PageResponse {
    fn from(m: page::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            content: m.content,
            status: m.status,
            meta_title: m.meta_title,
            meta_description: m.meta_description,
            meta_keywords: m.meta_keywords,
            show_in_menu: m.show_in_menu,
            menu_order: m.menu_order,
            created_by: m.created_by,
            updated_by: m.updated_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Entry of the public navigation menu.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MenuItem {
    pub title: String,
    pub slug: String,
    pub menu_order: i32,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive match on title or slug.
    pub search: Option<String>,
    /// `draft`, `published` or `archived`.
    pub status: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePageRequest {
    #[schema(example = "Privacy Policy")]
    pub title: String,
    /// Derived from the title when omitted.
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    pub status: Option<PageStatus>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub show_in_menu: bool,
    #[serde(default)]
    pub menu_order: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdatePageRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub status: Option<PageStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_keywords: Option<Option<String>>,
    pub show_in_menu: Option<bool>,
    pub menu_order: Option<i32>,
}

fn validate_slug(check: &mut FieldCheck, value: Option<&str>) {
    if let Some(s) = value
        && !s.trim().is_empty()
    {
        check.check(
            !slug::is_valid_slug(s.trim()),
            "slug",
            "The slug may only contain lowercase letters, digits and single dashes.",
        );
    }
}

pub fn validate_create_page(payload: &CreatePageRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .text("title", &payload.title, 255)
        .optional_text("meta_title", payload.meta_title.as_deref(), 255)
        .optional_text("meta_keywords", payload.meta_keywords.as_deref(), 255)
        .check(
            slug::slugify(
                payload
                    .slug
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(&payload.title),
            )
            .is_empty(),
            "slug",
            "A slug could not be derived from the title.",
        );
    validate_slug(&mut check, payload.slug.as_deref());
    check.finish()
}

pub fn validate_update_page(payload: &UpdatePageRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    if let Some(ref title) = payload.title {
        check.text("title", title, 255);
    }
    check
        .optional_text(
            "meta_title",
            payload.meta_title.as_ref().and_then(|v| v.as_deref()),
            255,
        )
        .optional_text(
            "meta_keywords",
            payload.meta_keywords.as_ref().and_then(|v| v.as_deref()),
            255,
        );
    validate_slug(&mut check, payload.slug.as_deref());
    check.finish()
}
