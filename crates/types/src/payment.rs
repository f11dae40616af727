use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{address::Address, amount::TokenAmount, token::DestinationToken};

/// A payment created by the checkout API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    pub image: String,
}

/// Descriptive fields shown to the payer on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub intent: String,
    pub items: Vec<LineItem>,
}

impl Default for PaymentMetadata {
    fn default() -> Self {
        Self {
            intent: "Test".to_string(),
            items: vec![LineItem {
                name: "Foo".to_string(),
                description: "Bar".to_string(),
                image: "https://picsum.photos/200".to_string(),
            }],
        }
    }
}

/// Client-supplied token that lets the server deduplicate a creation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// A fresh random decimal string. A new key is drawn for every attempt.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<u64>().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdempotencyKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed for one payment creation attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub api_key: String,
    pub destination: Address,
    pub chain_id: u64,
    pub token_address: Address,
    pub amount: TokenAmount,
    pub idempotency_key: IdempotencyKey,
}

impl PaymentIntentRequest {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        destination: Address,
        token: &DestinationToken,
        amount: TokenAmount,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            destination,
            chain_id: token.chain_id,
            token_address: token.token_address,
            amount,
            idempotency_key: IdempotencyKey::random(),
        }
    }

    #[must_use]
    pub fn body<'a>(&'a self, metadata: &'a PaymentMetadata) -> GeneratePaymentBody<'a> {
        GeneratePaymentBody {
            intent: &metadata.intent,
            items: &metadata.items,
            recipient: Recipient {
                address: self.destination,
                amount: self.amount,
                token: self.token_address,
                chain: self.chain_id,
            },
        }
    }
}

// The API key stays out of logs.
impl fmt::Debug for PaymentIntentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentIntentRequest")
            .field("api_key", &"<redacted>")
            .field("destination", &self.destination)
            .field("chain_id", &self.chain_id)
            .field("token_address", &self.token_address)
            .field("amount", &self.amount)
            .field("idempotency_key", &self.idempotency_key)
            .finish()
    }
}

/// JSON body of `POST /generate`.
#[derive(Debug, Serialize)]
pub struct GeneratePaymentBody<'a> {
    pub intent: &'a str,
    pub items: &'a [LineItem],
    pub recipient: Recipient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: Address,
    pub amount: TokenAmount,
    pub token: Address,
    pub chain: u64,
}

/// Status reported by the embedded checkout widget for one payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Unpaid,
    Started,
    Completed,
    Bounced,
    Other(String),
}

impl PaymentStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "payment_unpaid" => Self::Unpaid,
            "payment_started" => Self::Started,
            "payment_completed" => Self::Completed,
            "payment_bounced" => Self::Bounced,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Bounced)
    }
}
