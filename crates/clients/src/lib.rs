use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use types::{
    errors::PayError,
    payment::{Payment, PaymentIntentRequest, PaymentMetadata},
    request_metrics,
};

pub const DEFAULT_API_BASE: &str = "https://pay.daimo.com/api";

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const API_KEY_HEADER: &str = "Api-Key";

/// Creates payments on the hosted checkout API.
///
/// Every call is single-shot: no retry and no backoff. A non-2xx answer is
/// returned to the caller as [`PayError::RequestFailed`].
#[derive(Debug, Clone)]
pub struct PaymentIntentClient {
    client: Client,
    api_base: String,
    metadata: PaymentMetadata,
}

impl PaymentIntentClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(api_base: impl Into<String>, timeout: Option<Duration>) -> Result<Self, PayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PayError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            metadata: PaymentMetadata::default(),
        })
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: PaymentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn generate_url(&self) -> String {
        format!("{}/generate", self.api_base.trim_end_matches('/'))
    }

    pub async fn create_payment(&self, request: &PaymentIntentRequest) -> Result<Payment, PayError> {
        request_metrics!("generate", self.send_generate(request))
    }

    async fn send_generate(&self, request: &PaymentIntentRequest) -> Result<Payment, PayError> {
        if request.api_key.is_empty() {
            return Err(PayError::MissingInput("api key"));
        }

        info!(
            "Creating payment: {} to {}",
            request.amount, request.destination
        );

        let response = self
            .client
            .post(self.generate_url())
            .header(IDEMPOTENCY_KEY_HEADER, request.idempotency_key.as_str())
            .header(API_KEY_HEADER, &request.api_key)
            .json(&request.body(&self.metadata))
            .send()
            .await
            .map_err(|e| PayError::Transport(format!("Failed to send payment request: {e}")))?;

        let status = response.status();
        info!("Response status {}", status.as_u16());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Payment creation failed: {}", text);
            return Err(PayError::RequestFailed {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PayError::Transport(format!("Failed to read payment response: {e}")))?;
        let payment: Payment = serde_json::from_str(&body)?;

        debug!("Response {:?}", payment);
        Ok(payment)
    }
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}
