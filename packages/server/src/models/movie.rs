use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use common::{MovieRoleStatus, MovieStatus};
use serde::{Deserialize, Serialize};

use crate::entity::{movie, movie_role};
use crate::error::AppError;
use crate::models::shared::{FieldCheck, double_option, json_string_list};
use crate::models::user::GENDERS;
use crate::utils::reconcile::ChildEntry;

/// Casting-role gender values: any person gender plus `any`.
pub fn is_valid_role_gender(gender: &str) -> bool {
    let g = gender.trim().to_lowercase();
    g == "any" || GENDERS.contains(&g.as_str())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieRoleResponse {
    pub id: i32,
    pub movie_id: i32,
    #[schema(example = "Lead")]
    pub role_type: String,
    #[schema(example = "female")]
    pub gender: String,
    #[schema(example = "20-30")]
    pub age_range: Option<String>,
    pub dialogue_sample: Option<String>,
    pub status: MovieRoleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<movie_role::Model> for MovieRoleResponse {
    fn from(m: movie_role::Model) -> Self {
        Self {
            id: m.id,
            movie_id: m.movie_id,
            role_type: m.role_type,
            gender: m.gender,
            age_range: m.age_range,
            dialogue_sample: m.dialogue_sample,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Monsoon Letters")]
    pub title: String,
    pub description: String,
    #[schema(example = json!(["drama", "romance"]))]
    pub genre: Vec<String>,
    /// Last day auditions are accepted.
    #[schema(value_type = String, format = Date, example = "2026-12-31")]
    pub end_date: NaiveDate,
    pub director: Option<String>,
    /// Budget in whole currency units.
    pub budget: Option<i64>,
    pub status: MovieStatus,
    /// `end_date` is today or later.
    pub is_open: bool,
    /// Present on single-movie responses; omitted from lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<MovieRoleResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MovieResponse {
    pub fn new(m: movie::Model, roles: Option<Vec<movie_role::Model>>) -> Self {
        Self {
            is_open: m.end_date >= Utc::now().date_naive(),
            genre: json_string_list(&m.genre),
            id: m.id,
            title: m.title,
            description: m.description,
            end_date: m.end_date,
            director: m.director,
            budget: m.budget,
            status: m.status,
            roles: roles.map(|rs| rs.into_iter().map(Into::into).collect()),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive match on title or director.
    pub search: Option<String>,
    /// `active`, `inactive` or `upcoming`.
    pub status: Option<String>,
    /// Movies whose genre list contains this value.
    pub genre: Option<String>,
}

/// One submitted casting role. Without `id` it is created; with `id` it updates
/// that role, or deletes it when `deleted` is set or `role_type` is blank.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, utoipa::ToSchema)]
pub struct MovieRoleInput {
    pub id: Option<i32>,
    #[serde(default)]
    #[schema(example = "Lead")]
    pub role_type: String,
    #[serde(default)]
    #[schema(example = "any")]
    pub gender: String,
    pub age_range: Option<String>,
    pub dialogue_sample: Option<String>,
    pub status: Option<MovieRoleStatus>,
    #[serde(default)]
    pub deleted: bool,
}

impl ChildEntry for MovieRoleInput {
    fn id(&self) -> Option<i32> {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn is_blank(&self) -> bool {
        self.role_type.trim().is_empty()
    }
}

impl MovieRoleInput {
    /// Gender to store; blank means `any`.
    pub fn gender_value(&self) -> String {
        let g = self.gender.trim().to_lowercase();
        if g.is_empty() { "any".into() } else { g }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateMovieRequest {
    #[schema(example = "Monsoon Letters")]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[schema(value_type = String, format = Date, example = "2026-12-31")]
    pub end_date: NaiveDate,
    pub director: Option<String>,
    pub budget: Option<i64>,
    pub status: Option<MovieStatus>,
    #[serde(default)]
    pub roles: Vec<MovieRoleInput>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<Vec<String>>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub director: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub budget: Option<Option<i64>>,
    pub status: Option<MovieStatus>,
    /// Complete desired role list. Roles not listed are removed.
    pub roles: Option<Vec<MovieRoleInput>>,
}

fn validate_genre(check: &mut FieldCheck, genre: &[String]) {
    let mut seen = HashSet::new();
    for g in genre {
        let g = g.trim();
        check.check(
            g.is_empty() || g.chars().count() > 50,
            "genre",
            "Each genre must be 1-50 characters.",
        );
        check.check(
            !seen.insert(g.to_lowercase()),
            "genre",
            format!("Genre '{g}' is listed more than once."),
        );
    }
}

fn validate_roles(check: &mut FieldCheck, roles: &[MovieRoleInput]) {
    for (i, role) in roles.iter().enumerate() {
        if role.is_deleted() || role.is_blank() {
            continue;
        }
        let field = format!("roles.{i}");
        check.check(
            role.role_type.trim().chars().count() > 255,
            &format!("{field}.role_type"),
            "The role type may not be greater than 255 characters.",
        );
        check.check(
            !role.gender.trim().is_empty() && !is_valid_role_gender(&role.gender),
            &format!("{field}.gender"),
            "The gender must be one of: male, female, other, any.",
        );
        check.optional_text(&format!("{field}.age_range"), role.age_range.as_deref(), 50);
    }
}

fn validate_budget(check: &mut FieldCheck, budget: Option<i64>) {
    check.check(
        budget.is_some_and(|b| b < 0),
        "budget",
        "The budget must be at least 0.",
    );
}

pub fn validate_create_movie(payload: &CreateMovieRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .text("title", &payload.title, 255)
        .text("description", &payload.description, 10_000)
        .optional_text("director", payload.director.as_deref(), 255);
    validate_genre(&mut check, &payload.genre);
    validate_budget(&mut check, payload.budget);
    validate_roles(&mut check, &payload.roles);
    check.finish()
}

pub fn validate_update_movie(payload: &UpdateMovieRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    if let Some(ref title) = payload.title {
        check.text("title", title, 255);
    }
    if let Some(ref description) = payload.description {
        check.text("description", description, 10_000);
    }
    check.optional_text(
        "director",
        payload.director.as_ref().and_then(|d| d.as_deref()),
        255,
    );
    if let Some(ref genre) = payload.genre {
        validate_genre(&mut check, genre);
    }
    validate_budget(&mut check, payload.budget.flatten());
    if let Some(ref roles) = payload.roles {
        validate_roles(&mut check, roles);
    }
    check.finish()
}

/// Trimmed genre list with blanks dropped.
pub fn clean_genre(genre: &[String]) -> Vec<String> {
    genre
        .iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}
