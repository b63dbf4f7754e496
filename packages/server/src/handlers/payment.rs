use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::PaymentStatus;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::payment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::payment::*;
use crate::models::shared::{
    ApiResponse, Paginated, Pagination, non_empty, ok, ok_with, page_params,
};
use crate::permissions::MANAGE_PAYMENTS;
use crate::services::payment::verify_signature;
use crate::services::settings;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/orders",
    tag = "Payments",
    operation_id = "createPaymentOrder",
    summary = "Create a gateway order",
    description = "Creates an order at the payment gateway with the key pair from settings and records it as `created`. The response carries everything the checkout widget needs.",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Gateway rejected the order (GATEWAY_ERROR)", body = ErrorBody),
        (status = 503, description = "Gateway keys missing (GATEWAY_NOT_CONFIGURED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, amount = payload.amount))]
pub async fn create_order(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_order(&payload)?;

    let credentials = settings::razorpay_credentials(&state.db)
        .await?
        .ok_or(AppError::GatewayNotConfigured)?;
    let currency = payload
        .currency
        .as_deref()
        .map(str::trim)
        .unwrap_or("INR")
        .to_ascii_uppercase();
    let receipt = receipt_for(auth_user.user_id);

    let order = state
        .payments
        .create_order(&credentials, payload.amount, &currency, &receipt)
        .await?;

    let now = Utc::now();
    let model = payment::ActiveModel {
        user_id: Set(auth_user.user_id),
        order_id: Set(order.id),
        payment_id: Set(None),
        receipt: Set(receipt),
        amount: Set(order.amount),
        currency: Set(order.currency),
        status: Set(PaymentStatus::Created),
        notes: Set(non_empty(payload.notes)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(order_id = %model.order_id, "Payment order created");
    Ok((
        StatusCode::CREATED,
        ok_with(
            "Order created",
            OrderResponse {
                order_id: model.order_id,
                amount: model.amount,
                currency: model.currency,
                key_id: credentials.key_id,
                receipt: model.receipt,
            },
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/verify",
    tag = "Payments",
    operation_id = "verifyPayment",
    summary = "Verify a completed checkout",
    description = "Checks the HMAC-SHA256 signature of `order_id|payment_id` against the gateway secret. A valid signature marks the payment `paid`; an invalid one marks it `failed` and returns 422.",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified", body = ApiResponse<PaymentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Order not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Invalid signature (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Gateway keys missing (GATEWAY_NOT_CONFIGURED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, order_id = %payload.order_id))]
pub async fn verify_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, AppError> {
    validate_verify_payment(&payload)?;
    let order_id = payload.order_id.trim();
    let payment_id = payload.payment_id.trim();

    let credentials = settings::razorpay_credentials(&state.db)
        .await?
        .ok_or(AppError::GatewayNotConfigured)?;

    let txn = state.db.begin().await?;
    let existing = payment::Entity::find()
        .filter(payment::Column::OrderId.eq(order_id))
        .filter(payment::Column::UserId.eq(auth_user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if existing.status == PaymentStatus::Paid {
        return Ok(ok_with("Payment already verified", existing.into()));
    }

    let valid = verify_signature(
        order_id,
        payment_id,
        payload.signature.trim(),
        &credentials.key_secret,
    );

    let mut active: payment::ActiveModel = existing.into();
    active.payment_id = Set(Some(payment_id.to_string()));
    active.status = Set(if valid {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    });
    active.updated_at = Set(Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    if !valid {
        tracing::warn!(order_id, "Payment signature mismatch");
        return Err(AppError::field("signature", "The payment signature is invalid."));
    }

    tracing::info!(order_id, "Payment verified");
    Ok(ok_with("Payment verified", model.into()))
}

#[utoipa::path(
    get,
    path = "/mine",
    tag = "Payments",
    operation_id = "listMyPayments",
    summary = "List the caller's payments",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<Paginated<PaymentResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_my_payments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<ApiResponse<Paginated<PaymentResponse>>>, AppError> {
    let select = payment::Entity::find().filter(payment::Column::UserId.eq(auth_user.user_id));
    Ok(ok(paginate_payments(&state.db, select, &query).await?))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Payments",
    operation_id = "listPayments",
    summary = "List all payments",
    description = "Requires `manage_payments`.",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<Paginated<PaymentResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_payments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<ApiResponse<Paginated<PaymentResponse>>>, AppError> {
    auth_user.require_permission(MANAGE_PAYMENTS)?;

    let mut select = payment::Entity::find();
    if let Some(user_id) = query.user_id {
        select = select.filter(payment::Column::UserId.eq(user_id));
    }
    Ok(ok(paginate_payments(&state.db, select, &query).await?))
}

async fn paginate_payments<C: ConnectionTrait>(
    db: &C,
    mut select: Select<payment::Entity>,
    query: &PaymentListQuery,
) -> Result<Paginated<PaymentResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);
    if let Some(ref status) = query.status {
        let status: PaymentStatus = status.parse()?;
        select = select.filter(payment::Column::Status.eq(status));
    }

    let total = select.clone().paginate(db, per_page).num_items().await?;
    let items = select
        .order_by_desc(payment::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Paginated {
        items,
        pagination: Pagination::new(page, per_page, total),
    })
}

/// Gateway receipts are capped at 40 characters.
fn receipt_for(user_id: i32) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("rcpt_{user_id}_{}", &suffix[..16])
}
