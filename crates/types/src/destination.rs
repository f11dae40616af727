use serde::{Deserialize, Serialize};

use crate::address::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    #[default]
    Pending,
    Valid,
    Error,
}

/// Outcome of one resolution attempt for the destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResolvedDestination {
    pub address: Option<Address>,
    pub state: ValidationState,
}

impl ResolvedDestination {
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            address: None,
            state: ValidationState::Pending,
        }
    }

    #[must_use]
    pub const fn valid(address: Address) -> Self {
        Self {
            address: Some(address),
            state: ValidationState::Valid,
        }
    }

    #[must_use]
    pub const fn error() -> Self {
        Self {
            address: None,
            state: ValidationState::Error,
        }
    }

    /// The address, only when the state is `Valid`.
    #[must_use]
    pub const fn valid_address(&self) -> Option<Address> {
        match self.state {
            ValidationState::Valid => self.address,
            _ => None,
        }
    }
}
