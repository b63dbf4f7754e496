use axum::{extract::FromRequestParts, http::request::Parts};
use common::UserStatus;
use sea_orm::*;

use crate::entity::{role, user};
use crate::error::AppError;
use crate::models::shared::json_string_list;
use crate::state::AppState;
use crate::utils::jwt;

/// Role name that implicitly holds every permission.
pub const SUPER_ADMIN: &str = "Super Admin";

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// The user row and its role are loaded on every request, so permission and
/// status changes take effect without re-issuing tokens. Inactive accounts are
/// rejected here.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub role_id: i32,
    pub role: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == SUPER_ADMIN
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_super_admin() || self.permissions.iter().any(|p| p == permission)
    }

    /// Returns `Ok(())` if the user has the given permission, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let (user, role) = user::Entity::find_by_id(claims.uid)
            .find_also_related(role::Entity)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        if user.email != claims.sub {
            return Err(AppError::TokenInvalid);
        }
        if user.status != UserStatus::Active {
            return Err(AppError::AccountInactive);
        }

        let (role_name, permissions) = match role {
            Some(r) => (r.name, json_string_list(&r.permissions)),
            None => (String::new(), Vec::new()),
        };

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role_id: user.role_id,
            role: role_name,
            permissions,
        })
    }
}
