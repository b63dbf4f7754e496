use std::collections::BTreeMap;

use serde::Serialize;

/// Headline counts for the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub users_total: u64,
    pub users_active: u64,
    pub movies_total: u64,
    /// Keyed by movie status; every status is present.
    #[schema(example = json!({"active": 4, "inactive": 1, "upcoming": 2}))]
    pub movies_by_status: BTreeMap<String, u64>,
    /// Open, non-deleted casting roles.
    pub open_roles: u64,
    pub auditions_total: u64,
    #[schema(example = json!({"pending": 10, "viewed": 3, "shortlisted": 2, "rejected": 1}))]
    pub auditions_by_status: BTreeMap<String, u64>,
    pub paid_payments_count: u64,
    /// Sum of paid amounts in the smallest currency unit.
    pub paid_payments_amount: i64,
}
