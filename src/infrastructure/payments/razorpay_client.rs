use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

/// Minimal Razorpay orders client built on reqwest. Holds the API secret;
/// nothing here ever logs it or echoes it into a response.
pub struct RazorpayClient {
    http: reqwest::Client,
    api_base_url: String,
    key_id: String,
    key_secret: String,
}

/// The gateway's order shape, mapped strictly at the boundary: a response
/// missing any of these fields is a deserialization error, not something
/// downstream code probes for.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    #[serde(rename = "amount")]
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorEnvelope {
    error: RazorpayErrorDetails,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetails {
    code: Option<String>,
    description: Option<String>,
    source: Option<String>,
    step: Option<String>,
    reason: Option<String>,
}

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_RETRIES: u32 = 2;

impl RazorpayClient {
    pub fn new(api_base_url: String, key_id: String, key_secret: String) -> Result<Self> {
        // Bounded timeout: a wedged gateway surfaces as an error, never a
        // hung request.
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base_url,
            key_id,
            key_secret,
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (error_code, error_description, error_source, error_step, error_reason) =
            match serde_json::from_str::<RazorpayErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (
                        details.code,
                        details.description,
                        details.source,
                        details.step,
                        details.reason,
                    )
                }
                Err(_) => (None, None, None, None, None),
            };

        error!(
            status = %status,
            gateway_error_code = ?error_code,
            gateway_error_description = ?error_description,
            gateway_error_source = ?error_source,
            gateway_error_step = ?error_step,
            gateway_error_reason = ?error_reason,
            context = %context,
            "razorpay api request failed"
        );

        anyhow::bail!("Razorpay API request failed: {} (status {})", context, status);
    }

    /// Creates an order at the gateway. One attempt only; a duplicate create
    /// could double-submit.
    ///
    /// https://razorpay.com/docs/api/orders/create
    pub async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder> {
        let body = json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
        });

        let resp = self
            .http
            .post(format!("{}/v1/orders", self.api_base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await?;

        let resp = Self::ensure_success(resp, "create order").await?;
        let order = resp.json::<GatewayOrder>().await?;
        Ok(order)
    }

    /// Read-only order lookup with a small bounded retry on transport
    /// errors. Used by operators to reconcile gateway orders that have no
    /// local row.
    ///
    /// https://razorpay.com/docs/api/orders/fetch-with-id
    pub async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrder> {
        let url = format!("{}/v1/orders/{}", self.api_base_url, order_id);

        let mut attempt = 0;
        loop {
            let result = self
                .http
                .get(&url)
                .basic_auth(&self.key_id, Some(&self.key_secret))
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let resp = Self::ensure_success(resp, "fetch order").await?;
                    return Ok(resp.json::<GatewayOrder>().await?);
                }
                Err(err) if attempt < FETCH_RETRIES => {
                    attempt += 1;
                    warn!(
                        order_id,
                        attempt,
                        error = %err,
                        "razorpay: transient error fetching order, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
