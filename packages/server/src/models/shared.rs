use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, FieldErrors};

/// Success envelope returned by all endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "OK")]
    pub message: String,
    pub data: T,
}

/// Wrap `data` in a success envelope with the default message.
pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    ok_with("OK", data)
}

pub fn ok_with<T>(message: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: message.into(),
        data,
    })
}

/// Success envelope carrying only a message (`data` is always null).
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Deleted")]
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

pub fn message(message: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: message.into(),
        data: None,
    })
}

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// One page of `items`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Largest page number accepted; keeps `(page - 1) * per_page` within `u64`.
const MAX_PAGE: u64 = u32::MAX as u64;

/// Clamp query paging to `1 <= page <= MAX_PAGE` and `1 <= per_page <= 100` (default 20).
pub fn page_params(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).clamp(1, MAX_PAGE),
        per_page.unwrap_or(20).clamp(1, 100),
    )
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// String entries of a JSON array column; anything else yields an empty list.
pub fn json_string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn to_json_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Trim, and map empty strings to `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accumulates per-field validation messages.
#[derive(Default)]
pub struct FieldCheck {
    errors: FieldErrors,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` when `failed` is true.
    pub fn check(&mut self, failed: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if failed {
            self.errors
                .entry(field.to_string())
                .or_default()
                .push(message.into());
        }
        self
    }

    /// Required string: non-blank and at most `max` characters.
    pub fn text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        self.check(len == 0, field, format!("The {field} field is required."));
        self.check(
            len > max,
            field,
            format!("The {field} may not be greater than {max} characters."),
        )
    }

    /// Optional string: at most `max` characters when present.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        let too_long = value.is_some_and(|v| v.trim().chars().count() > max);
        self.check(
            too_long,
            field,
            format!("The {field} may not be greater than {max} characters."),
        )
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            !is_valid_email(value),
            field,
            format!("The {field} must be a valid email address."),
        )
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.chars().count();
        self.check(
            !(8..=128).contains(&len),
            field,
            format!("The {field} must be between 8 and 128 characters."),
        )
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(std::mem::take(&mut self.errors)))
        }
    }
}

/// Minimal `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 191 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
