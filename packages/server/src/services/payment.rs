use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Gateway API key pair, read from the settings table.
#[derive(Clone)]
pub struct GatewayCredentials {
    pub key_id: String,
    pub key_secret: String,
}

impl std::fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

/// An order as created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for `amount` in the currency's smallest unit.
    async fn create_order(
        &self,
        credentials: &GatewayCredentials,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay Orders API client.
pub struct RazorpayGateway {
    client: reqwest::Client,
    api_base: String,
}

impl RazorpayGateway {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        credentials: &GatewayCredentials,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let resp = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order = resp.json::<GatewayOrder>().await?;
        tracing::info!(order_id = %order.id, amount, "Created gateway order");
        Ok(order)
    }
}

type HmacSha256 = Hmac<Sha256>;

fn mac_for(order_id: &str, payment_id: &str, secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 of `order_id|payment_id`, as the checkout widget reports it.
pub fn sign(order_id: &str, payment_id: &str, secret: &str) -> String {
    mac_for(order_id, payment_id, secret)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Constant-time check of a checkout signature.
pub fn verify_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    match mac_for(order_id, payment_id, secret) {
        Some(mac) => mac.verify_slice(&expected).is_ok(),
        None => false,
    }
}
