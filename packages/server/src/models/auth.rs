use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::FieldCheck;
use crate::models::user::{UserResponse, validate_gender};

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Asha Verma")]
    pub name: String,
    /// Unique email address, compared case-insensitively.
    #[schema(example = "asha@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "+91 98765 43210")]
    pub phone: Option<String>,
    /// `male`, `female` or `other`.
    #[schema(example = "female")]
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1998-04-12")]
    pub date_of_birth: Option<NaiveDate>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .text("name", &payload.name, 255)
        .email("email", &payload.email)
        .password("password", &payload.password)
        .optional_text("phone", payload.phone.as_deref(), 32);
    validate_gender(&mut check, payload.gender.as_deref());
    check.finish()
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    FieldCheck::new()
        .check(payload.email.trim().is_empty(), "email", "The email field is required.")
        .check(payload.password.is_empty(), "password", "The password field is required.")
        .finish()
}

/// Issued bearer token plus the caller's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIs...")]
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    #[schema(example = 604800)]
    pub expires_in: i64,
    pub user: MeResponse,
}

/// The authenticated user's profile with role permissions.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[schema(example = json!(["manage_movies"]))]
    pub permissions: Vec<String>,
}

/// Body carrying only an email address (resend OTP, forgot password).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct EmailRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyEmailRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    /// 6-digit code from the registration mail.
    #[schema(example = "482913")]
    pub otp: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "482913")]
    pub otp: String,
    #[schema(example = "n3w_P@ssword")]
    pub password: String,
}

pub fn validate_reset_password(payload: &ResetPasswordRequest) -> Result<(), AppError> {
    let mut check = FieldCheck::new();
    check
        .email("email", &payload.email)
        .password("password", &payload.password);
    validate_otp_format(&mut check, &payload.otp);
    check.finish()
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[schema(example = "n3w_P@ssword")]
    pub new_password: String,
}

pub fn validate_change_password(payload: &ChangePasswordRequest) -> Result<(), AppError> {
    FieldCheck::new()
        .check(
            payload.current_password.is_empty(),
            "current_password",
            "The current password field is required.",
        )
        .password("new_password", &payload.new_password)
        .check(
            payload.new_password == payload.current_password,
            "new_password",
            "The new password must be different from the current password.",
        )
        .finish()
}

pub fn validate_otp_format(check: &mut FieldCheck, otp: &str) {
    let otp = otp.trim();
    check.check(
        otp.len() != 6 || !otp.bytes().all(|b| b.is_ascii_digit()),
        "otp",
        "The otp must be 6 digits.",
    );
}
