//! Payment gateway boundary.
//!
//! The gateway is treated as an unreliable remote dependency: any transport
//! error, malformed response, or non-2xx result surfaces as
//! [`Error::Gateway`] and never panics past this boundary. The client holds
//! only credentials and performs no retries - retry policy, if any, belongs
//! to the caller. Status strings are modeled as a closed enumeration for the
//! values the reconciliation engine branches on, plus an explicit
//! pass-through variant carrying anything else the gateway invents.

use crate::config::gateway::GatewayConfig;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Gateway-reported payment status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    /// Payment created, awaiting payer action
    Pending,
    /// Payment completed; the ledger commit may proceed
    Succeeded,
    /// Payment canceled by the payer or the gateway
    Canceled,
    /// Any other status value, passed through verbatim
    Other(String),
}

impl GatewayStatus {
    /// Parses a raw gateway status string.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "succeeded" => Self::Succeeded,
            "canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    /// The raw string form, as stored on payment intents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Other(raw) => raw,
        }
    }
}

/// Metadata attached to a created intent so the payment can be traced back
/// to its (student, month, year, plan) slot.
#[derive(Debug, Clone, Serialize)]
pub struct IntentMetadata {
    /// Telegram id of the paying student
    pub student_id: String,
    /// Target month (1-12)
    pub month: i32,
    /// Target year
    pub year: i32,
    /// Pricing plan key resolved for the student's class
    pub pricing_plan: String,
}

/// Result of creating a payment intent on the gateway.
#[derive(Debug, Clone)]
pub struct CreatedIntent {
    /// Gateway-assigned payment id
    pub id: String,
    /// Initial status reported by the gateway
    pub status: GatewayStatus,
    /// Hosted checkout URL the payer must visit
    pub confirmation_url: Option<String>,
}

/// Result of querying an existing intent.
#[derive(Debug, Clone)]
pub struct IntentState {
    /// Current status reported by the gateway
    pub status: GatewayStatus,
    /// Payment-method details, present once the payer has acted
    pub payment_method: Option<serde_json::Value>,
}

/// Client boundary for the external payment service.
///
/// Implemented by [`YooKassaClient`] for production and by a scripted mock
/// in tests. Both operations are network-bound and bounded by the
/// transport's own timeout; no cancellation primitive beyond surfacing
/// failure.
pub trait PaymentGateway {
    /// Creates a payment intent and returns its id, status and checkout URL.
    fn create_intent(
        &self,
        amount: f64,
        description: &str,
        metadata: &IntentMetadata,
    ) -> impl Future<Output = Result<CreatedIntent>> + Send;

    /// Queries the current state of an existing intent.
    fn get_intent(&self, gateway_id: &str) -> impl Future<Output = Result<IntentState>> + Send;
}

#[derive(Debug, Deserialize)]
struct ConfirmationBody {
    confirmation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    id: String,
    status: String,
    confirmation: Option<ConfirmationBody>,
}

#[derive(Debug, Deserialize)]
struct PaymentInfoResponse {
    status: String,
    payment_method: Option<serde_json::Value>,
}

/// HTTP client for the YooKassa payments API.
#[derive(Debug, Clone)]
pub struct YooKassaClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl YooKassaClient {
    /// Creates a client from gateway credentials.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn read_success_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Gateway {
            message: format!("failed to read gateway response: {e}"),
        })?;
        if !status.is_success() {
            warn!("Gateway returned HTTP {}: {}", status, body);
            return Err(Error::Gateway {
                message: format!("gateway returned HTTP {status}"),
            });
        }
        Ok(body)
    }
}

impl PaymentGateway for YooKassaClient {
    async fn create_intent(
        &self,
        amount: f64,
        description: &str,
        metadata: &IntentMetadata,
    ) -> Result<CreatedIntent> {
        let url = format!("{}/payments", self.config.api_url);
        let body = serde_json::json!({
            "amount": {
                "value": format!("{amount:.2}"),
                "currency": "RUB",
            },
            "capture": true,
            "confirmation": {
                "type": "redirect",
                "return_url": self.config.return_url,
            },
            "description": description,
            "metadata": metadata,
        });

        debug!(
            "Creating gateway intent: amount={:.2}, student={}",
            amount, metadata.student_id
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .header("Idempotence-Key", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Gateway {
                message: format!("create payment request failed: {e}"),
            })?;

        let body = Self::read_success_body(response).await?;
        let parsed: CreatePaymentResponse =
            serde_json::from_str(&body).map_err(|e| Error::Gateway {
                message: format!("malformed create payment response: {e}"),
            })?;

        Ok(CreatedIntent {
            id: parsed.id,
            status: GatewayStatus::from_raw(&parsed.status),
            confirmation_url: parsed.confirmation.and_then(|c| c.confirmation_url),
        })
    }

    async fn get_intent(&self, gateway_id: &str) -> Result<IntentState> {
        let url = format!("{}/payments/{gateway_id}", self.config.api_url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .send()
            .await
            .map_err(|e| Error::Gateway {
                message: format!("get payment request failed: {e}"),
            })?;

        let body = Self::read_success_body(response).await?;
        let parsed: PaymentInfoResponse =
            serde_json::from_str(&body).map_err(|e| Error::Gateway {
                message: format!("malformed payment info response: {e}"),
            })?;

        Ok(IntentState {
            status: GatewayStatus::from_raw(&parsed.status),
            payment_method: parsed.payment_method,
        })
    }
}
