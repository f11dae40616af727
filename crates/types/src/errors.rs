use std::error::Error;

use derive_more::Display;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum PayError {
    /// Destination or amount text that cannot be used as-is.
    #[display("Validation error: {}", _0)]
    Validation(String),

    /// The payment API answered with a non-2xx status.
    #[display("Request failed ({status}): {status_text}")]
    RequestFailed { status: u16, status_text: String },

    /// A submission was attempted without a required field.
    #[display("Missing {}", _0)]
    MissingInput(&'static str),

    #[display("Transport error: {}", _0)]
    Transport(String),

    #[display("Failed to decode response: {}", _0)]
    Decode(String),

    #[display("Name resolution failed: {}", _0)]
    Resolution(String),

    #[display("Config error: {}", _0)]
    Config(String),
}

impl Error for PayError {}

impl From<serde_json::Error> for PayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
