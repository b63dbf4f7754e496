use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Duration, Utc};
use common::{OtpPurpose, UserStatus};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::user::{me_response, user_response};
use crate::models::auth::*;
use crate::models::shared::{
    ApiResponse, FieldCheck, MessageResponse, message, non_empty, normalize_email, ok, ok_with,
};
use crate::models::user::{UserResponse, normalize_gender};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Message returned by OTP endpoints whether or not the account exists.
const OTP_SENT: &str = "If the account exists, a verification code has been sent";

/// Wrong guesses allowed before an outstanding OTP is discarded.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates an active account with the default `User` role and emails a 6-digit verification code.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserResponse>),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = normalize_email(&payload.email);
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .count(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::EmailTaken);
    }

    let default_role = role::Entity::find()
        .filter(role::Column::Name.eq(role::DEFAULT_ROLE))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Default role is missing".into()))?;

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password: Set(password),
        role_id: Set(default_role.id),
        status: Set(UserStatus::Active),
        phone: Set(non_empty(payload.phone)),
        gender: Set(normalize_gender(payload.gender)),
        date_of_birth: Set(payload.date_of_birth),
        gallery: Set(serde_json::json!([])),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::EmailTaken
        }
        _ => AppError::from(e),
    })?;

    let model = issue_otp(&state, model, OtpPurpose::Registration).await?;

    Ok((
        StatusCode::CREATED,
        ok_with(
            "Registration successful. Please verify your email.",
            user_response(&state, model).await?,
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    description = "Returns a bearer token together with the caller's profile and permissions.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Account deactivated (ACCOUNT_INACTIVE)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }
    if user.status != UserStatus::Active {
        return Err(AppError::AccountInactive);
    }

    let ttl_hours = state.config.auth.token_ttl_hours;
    let token = jwt::sign(user.id, &user.email, &state.config.auth.jwt_secret, ttl_hours)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(ok_with(
        "Login successful",
        LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: ttl_hours * 3600,
            user: me_response(&state, user).await?,
        },
    ))
}

#[utoipa::path(
    post,
    path = "/verify-email",
    tag = "Auth",
    operation_id = "verifyEmail",
    summary = "Verify an email address with the registration code",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 422, description = "Invalid or expired code (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut check = FieldCheck::new();
    check.email("email", &payload.email);
    validate_otp_format(&mut check, &payload.otp);
    check.finish()?;

    let user = find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid_otp)?;

    if user.email_verified_at.is_some() {
        return Ok(message("Email is already verified"));
    }

    let mut active = consume_otp(&state.db, user, &payload.otp, OtpPurpose::Registration).await?;
    active.email_verified_at = Set(Some(Utc::now()));
    active.update(&state.db).await?;

    Ok(message("Email verified successfully"))
}

#[utoipa::path(
    post,
    path = "/resend-otp",
    tag = "Auth",
    operation_id = "resendOtp",
    summary = "Send a fresh registration code",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent if the account exists", body = MessageResponse),
        (status = 422, description = "Validation error or already verified (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn resend_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    FieldCheck::new().email("email", &payload.email).finish()?;

    let Some(user) = find_by_email(&state.db, &payload.email).await? else {
        return Ok(message(OTP_SENT));
    };
    if user.email_verified_at.is_some() {
        return Err(AppError::field("email", "This email is already verified."));
    }

    issue_otp(&state, user, OtpPurpose::Registration).await?;
    Ok(message(OTP_SENT))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = "Auth",
    operation_id = "forgotPassword",
    summary = "Request a password-reset code",
    description = "Always responds with the same message so account existence is not disclosed.",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent if the account exists", body = MessageResponse),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    FieldCheck::new().email("email", &payload.email).finish()?;

    if let Some(user) = find_by_email(&state.db, &payload.email).await?
        && user.status == UserStatus::Active
    {
        issue_otp(&state, user, OtpPurpose::PasswordReset).await?;
    }

    Ok(message(OTP_SENT))
}

#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "Auth",
    operation_id = "resetPassword",
    summary = "Set a new password with a reset code",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 422, description = "Invalid or expired code (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_reset_password(&payload)?;

    let user = find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid_otp)?;

    let mut active = consume_otp(&state.db, user, &payload.otp, OtpPurpose::PasswordReset).await?;
    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
    active.password = Set(password);
    let model = active.update(&state.db).await?;

    tracing::info!(user_id = model.id, "Password reset");
    Ok(message("Password has been reset"))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    description = "Returns the authenticated user's profile, role and permissions.",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<MeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MeResponse>>, AppError> {
    let user = crate::handlers::user::find_user(&state.db, auth_user.user_id).await?;
    Ok(ok(me_response(&state, user).await?))
}

#[utoipa::path(
    post,
    path = "/change-password",
    tag = "Auth",
    operation_id = "changePassword",
    summary = "Change the current user's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Wrong current password or invalid new password (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_change_password(&payload)?;

    let user = crate::handlers::user::find_user(&state.db, auth_user.user_id).await?;
    let is_valid = hash::verify_password(&payload.current_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::field(
            "current_password",
            "The current password is incorrect.",
        ));
    }

    let password = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
    let mut active: user::ActiveModel = user.into();
    active.password = Set(password);
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    Ok(message("Password changed successfully"))
}

async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
}

fn invalid_otp() -> AppError {
    AppError::field("otp", "The code is invalid or has expired.")
}

/// Store a fresh OTP digest on the user and send the code.
async fn issue_otp(
    state: &AppState,
    user: user::Model,
    purpose: OtpPurpose,
) -> Result<user::Model, AppError> {
    let code = hash::generate_otp();
    let email = user.email.clone();

    let mut active: user::ActiveModel = user.into();
    active.otp_hash = Set(Some(hash::digest_code(&code)));
    active.otp_purpose = Set(Some(purpose));
    active.otp_expires_at = Set(Some(
        Utc::now() + Duration::minutes(state.config.auth.otp_ttl_minutes),
    ));
    active.otp_attempts = Set(0);
    let model = active.update(&state.db).await?;

    if let Err(e) = state.notifier.send_otp(&email, &code, purpose).await {
        tracing::warn!(error = %e, %purpose, "Failed to deliver OTP");
    }

    Ok(model)
}

/// Check `otp` against the stored digest and clear it. Codes are single use.
///
/// Every attempt claims one of [`MAX_OTP_ATTEMPTS`] slots before the digest
/// is compared, so concurrent guesses share the same allowance. Once the
/// slots are used up the code is discarded and a new one has to be requested.
async fn consume_otp<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    otp: &str,
    purpose: OtpPurpose,
) -> Result<user::ActiveModel, AppError> {
    let outstanding = user.otp_purpose == Some(purpose)
        && user.otp_expires_at.is_some_and(|exp| exp > Utc::now());
    let Some(stored) = user.otp_hash.as_deref().filter(|_| outstanding) else {
        return Err(invalid_otp());
    };

    if !claim_otp_attempt(db, user.id).await? {
        return Err(invalid_otp());
    }
    if stored != hash::digest_code(otp.trim()) {
        discard_exhausted_otp(db, user.id).await?;
        return Err(invalid_otp());
    }

    let mut active: user::ActiveModel = user.into();
    active.otp_hash = Set(None);
    active.otp_purpose = Set(None);
    active.otp_expires_at = Set(None);
    active.otp_attempts = Set(0);
    active.updated_at = Set(Utc::now());
    Ok(active)
}

/// Bump the attempt counter unless the allowance is spent. `false` when no slot was left.
async fn claim_otp_attempt<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<bool, DbErr> {
    let claimed = user::Entity::update_many()
        .col_expr(
            user::Column::OtpAttempts,
            Expr::col(user::Column::OtpAttempts).add(1),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::OtpHash.is_not_null())
        .filter(user::Column::OtpAttempts.lt(MAX_OTP_ATTEMPTS))
        .exec(db)
        .await?;
    Ok(claimed.rows_affected > 0)
}

async fn discard_exhausted_otp<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<(), DbErr> {
    let discarded = user::Entity::update_many()
        .col_expr(user::Column::OtpHash, Expr::value(Option::<String>::None))
        .col_expr(
            user::Column::OtpPurpose,
            Expr::value(Option::<OtpPurpose>::None),
        )
        .col_expr(
            user::Column::OtpExpiresAt,
            Expr::value(Option::<DateTime<Utc>>::None),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::OtpAttempts.gte(MAX_OTP_ATTEMPTS))
        .exec(db)
        .await?;
    if discarded.rows_affected > 0 {
        tracing::warn!(user_id, "OTP discarded after too many wrong attempts");
    }
    Ok(())
}
