use chrono::{DateTime, Utc};
use common::PaymentStatus;
use serde::{Deserialize, Serialize};

use crate::entity::payment;
use crate::error::AppError;
use crate::models::shared::FieldCheck;

/// Smallest order the gateway accepts, in paise.
pub const MIN_AMOUNT: i64 = 100;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    /// Amount in the currency's smallest unit (paise for INR).
    #[schema(example = 49900)]
    pub amount: i64,
    /// ISO 4217 code, default `INR`.
    #[schema(example = "INR")]
    pub currency: Option<String>,
    pub notes: Option<String>,
}

pub fn validate_create_order(payload: &CreateOrderRequest) -> Result<(), AppError> {
    let currency_ok = payload
        .currency
        .as_deref()
        .is_none_or(|c| c.len() == 3 && c.bytes().all(|b| b.is_ascii_alphabetic()));
    FieldCheck::new()
        .check(
            payload.amount < MIN_AMOUNT,
            "amount",
            format!("The amount must be at least {MIN_AMOUNT}."),
        )
        .check(!currency_ok, "currency", "The currency must be a 3-letter code.")
        .optional_text("notes", payload.notes.as_deref(), 1000)
        .finish()
}

/// Data the client needs to open the checkout widget.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OrderResponse {
    #[schema(example = "order_N5kQ0mHh0yXnO2")]
    pub order_id: String,
    #[schema(example = 49900)]
    pub amount: i64,
    #[schema(example = "INR")]
    pub currency: String,
    /// Public gateway key id.
    #[schema(example = "rzp_test_1DP5mmOlF5G5ag")]
    pub key_id: String,
    pub receipt: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyPaymentRequest {
    #[schema(example = "order_N5kQ0mHh0yXnO2")]
    pub order_id: String,
    #[schema(example = "pay_N5kR3b1Jq9bYQm")]
    pub payment_id: String,
    /// Hex HMAC-SHA256 reported by the checkout widget.
    pub signature: String,
}

pub fn validate_verify_payment(payload: &VerifyPaymentRequest) -> Result<(), AppError> {
    FieldCheck::new()
        .text("order_id", &payload.order_id, 64)
        .text("payment_id", &payload.payment_id, 64)
        .text("signature", &payload.signature, 128)
        .finish()
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub user_id: i32,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub receipt: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(m: payment::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            order_id: m.order_id,
            payment_id: m.payment_id,
            receipt: m.receipt,
            amount: m.amount,
            currency: m.currency,
            status: m.status,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `created`, `paid` or `failed`.
    pub status: Option<String>,
    pub user_id: Option<i32>,
}
