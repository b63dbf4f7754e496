use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::ParseStatusError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::services::payment::GatewayError;

/// Field name → validation messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failure envelope returned by all endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `ACCOUNT_INACTIVE`,
    /// `PERMISSION_DENIED`, `PROTECTED_ROLE`, `NOT_FOUND`, `CONFLICT`,
    /// `EMAIL_TAKEN`, `DUPLICATE_AUDITION`, `GATEWAY_NOT_CONFIGURED`,
    /// `GATEWAY_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "The given data was invalid")]
    pub message: String,
    /// Field-level validation messages, present for `VALIDATION_ERROR` with field detail.
    #[schema(example = json!({"email": ["The email field is required."]}))]
    pub data: Option<FieldErrors>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidFields(FieldErrors),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    AccountInactive,
    PermissionDenied,
    ProtectedRole(String),
    NotFound(String),
    Conflict(String),
    EmailTaken,
    DuplicateAudition,
    GatewayNotConfigured,
    Gateway(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, data) = match self {
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg,
                None,
            ),
            AppError::InvalidFields(fields) => {
                let message = fields
                    .values()
                    .flatten()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| "The given data was invalid".into());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    message,
                    Some(fields),
                )
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
                None,
            ),
            AppError::AccountInactive => (
                StatusCode::FORBIDDEN,
                "ACCOUNT_INACTIVE",
                "This account has been deactivated".into(),
                None,
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
                None,
            ),
            AppError::ProtectedRole(name) => (
                StatusCode::FORBIDDEN,
                "PROTECTED_ROLE",
                format!("Role '{name}' is protected and cannot be modified this way"),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "The email has already been taken".into(),
                None,
            ),
            AppError::DuplicateAudition => (
                StatusCode::CONFLICT,
                "DUPLICATE_AUDITION",
                "You have already auditioned for this role".into(),
                None,
            ),
            AppError::GatewayNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "GATEWAY_NOT_CONFIGURED",
                "Payment gateway is not configured".into(),
                None,
            ),
            AppError::Gateway(detail) => {
                tracing::warn!("Payment gateway error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "GATEWAY_ERROR",
                    "Payment gateway request failed".into(),
                    None,
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };

        (
            status,
            ErrorBody {
                success: false,
                code,
                message,
                data,
            },
        )
    }

    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        AppError::InvalidFields(fields)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => AppError::Validation(format!(
                "File exceeds maximum size of {} KB",
                limit / 1024
            )),
            StorageError::InvalidPath(msg) => AppError::Validation(msg),
            StorageError::NotFound(path) => AppError::NotFound(format!("File '{path}' not found")),
            StorageError::Io(e) => AppError::Internal(format!("Storage IO error: {e}")),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

impl From<ParseStatusError> for AppError {
    fn from(err: ParseStatusError) -> Self {
        AppError::Validation(err.to_string())
    }
}
