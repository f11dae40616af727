use serde::{Deserialize, Serialize};

use crate::{address::Address, errors::PayError};

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// A token a payment can settle in, on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationToken {
    /// Short lookup key, e.g. `usdc-sepolia`.
    pub symbol: String,
    pub display_name: String,
    pub chain_id: u64,
    pub token_address: Address,
    pub decimal_places: u8,
}

// (symbol, display name, chain id, token address, decimals)
const CATALOG: &[(&str, &str, u64, &str, u8)] = &[
    (
        "usdc-sepolia",
        "USDC on Sepolia",
        SEPOLIA_CHAIN_ID,
        "0x1c7d4b196cb0c7b01d743fbc6116a902379c7238",
        6,
    ),
    (
        "usdc-base-sepolia",
        "USDC on Base Sepolia",
        84_532,
        "0x036cbd53842c5426634e7929541ec2318f3dcf7e",
        6,
    ),
    (
        "usdc-ethereum",
        "USDC on Ethereum",
        1,
        "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
        6,
    ),
    (
        "usdc-base",
        "USDC on Base",
        8_453,
        "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
        6,
    ),
    (
        "usdc-optimism",
        "USDC on Optimism",
        10,
        "0x0b2c639c533813f4aa9d7837caf62653d097ff85",
        6,
    ),
    (
        "usdc-arbitrum",
        "USDC on Arbitrum",
        42_161,
        "0xaf88d065e77c8cc2239327c5edb3a432268e5831",
        6,
    ),
    (
        "usdc-polygon",
        "USDC on Polygon",
        137,
        "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359",
        6,
    ),
];

pub const DEFAULT_TOKEN_SYMBOL: &str = "usdc-sepolia";

/// Every token the checkout can settle in.
pub fn catalog() -> Result<Vec<DestinationToken>, PayError> {
    CATALOG
        .iter()
        .map(|(symbol, display_name, chain_id, token_address, decimal_places)| {
            Ok(DestinationToken {
                symbol: (*symbol).to_string(),
                display_name: (*display_name).to_string(),
                chain_id: *chain_id,
                token_address: token_address.parse()?,
                decimal_places: *decimal_places,
            })
        })
        .collect()
}

/// Looks a token up by its symbol, case-insensitively.
pub fn find_token(symbol: &str) -> Result<DestinationToken, PayError> {
    catalog()?
        .into_iter()
        .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
        .ok_or_else(|| PayError::Validation(format!("Unknown token: {symbol}")))
}

/// The hardcoded test-network token used when nothing else is chosen.
pub fn default_token() -> Result<DestinationToken, PayError> {
    find_token(DEFAULT_TOKEN_SYMBOL)
}
