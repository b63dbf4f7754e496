use std::collections::BTreeMap;

use axum::{Json, extract::State};
use common::{AuditionStatus, MovieRoleStatus, MovieStatus, PaymentStatus, UserStatus};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{audition, movie, movie_role, payment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::dashboard::DashboardResponse;
use crate::models::shared::{ApiResponse, ok};
use crate::permissions::VIEW_DASHBOARD;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Dashboard",
    operation_id = "getDashboard",
    summary = "Headline counts",
    description = "Requires `view_dashboard`.",
    responses(
        (status = 200, description = "Counts", body = ApiResponse<DashboardResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    auth_user.require_permission(VIEW_DASHBOARD)?;
    let db = &state.db;

    let users_total = user::Entity::find().count(db).await?;
    let users_active = user::Entity::find()
        .filter(user::Column::Status.eq(UserStatus::Active))
        .count(db)
        .await?;

    let mut movies_by_status = BTreeMap::new();
    for status in MovieStatus::ALL {
        let n = movie::Entity::find()
            .filter(movie::Column::Status.eq(*status))
            .count(db)
            .await?;
        movies_by_status.insert(status.to_string(), n);
    }

    let open_roles = movie_role::Entity::find()
        .filter(movie_role::Column::Status.eq(MovieRoleStatus::Open))
        .filter(movie_role::Column::DeletedAt.is_null())
        .count(db)
        .await?;

    let mut auditions_by_status = BTreeMap::new();
    for status in AuditionStatus::ALL {
        let n = audition::Entity::find()
            .filter(audition::Column::Status.eq(*status))
            .count(db)
            .await?;
        auditions_by_status.insert(status.to_string(), n);
    }

    let paid = payment::Entity::find().filter(payment::Column::Status.eq(PaymentStatus::Paid));
    let paid_payments_count = paid.clone().count(db).await?;
    // SUM(bigint) is NUMERIC on Postgres; cast back so both backends decode an i64.
    let paid_payments_amount: Option<i64> = paid
        .select_only()
        .column_as(
            Expr::cust(r#"CAST(COALESCE(SUM("amount"), 0) AS BIGINT)"#),
            "total",
        )
        .into_tuple()
        .one(db)
        .await?;

    Ok(ok(DashboardResponse {
        users_total,
        users_active,
        movies_total: movies_by_status.values().sum(),
        movies_by_status,
        open_roles,
        auditions_total: auditions_by_status.values().sum(),
        auditions_by_status,
        paid_payments_count,
        paid_payments_amount: paid_payments_amount.unwrap_or(0),
    }))
}
