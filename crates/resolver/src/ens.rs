use crate::resolver::NameResolver;
use ethers_core::abi::{ParamType, Token, decode, encode};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use sha3::{Digest, Keccak256};
use std::time::Duration;
use tracing::debug;
use types::{address::Address, errors::PayError};

/// ENS registry, deployed at the same address on mainnet and Sepolia.
pub const ENS_REGISTRY: &str = "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e";

/// ENS Universal Resolver on mainnet.
pub const ENS_UNIVERSAL_RESOLVER: &str = "0xce01f8eee7e479c928f8919abd53e553a36cef67";

pub const DEFAULT_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";

/// EIP-3668 revert raised by contracts that answer from an offchain gateway.
pub const OFFCHAIN_LOOKUP: &str = "OffchainLookup(address,string[],bytes,bytes4,bytes)";

/// Gateway round trips allowed for a single name.
pub const MAX_OFFCHAIN_LOOKUPS: usize = 4;

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct GatewayResponse {
    data: String,
}

/// How an ENS name is turned into an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnsLookup {
    /// One `resolve(bytes,bytes)` call on a Universal Resolver. Supports
    /// wildcard resolvers and offchain (CCIP-read) resolvers.
    Universal(Address),
    /// Registry `resolver(node)`, then `addr(node)` on the returned
    /// resolver. Only finds names with an onchain resolver of their own.
    Registry(Address),
}

#[derive(Debug, PartialEq, Eq)]
enum CallOutcome {
    Success(Vec<u8>),
    Revert(Vec<u8>),
}

/// A decoded `OffchainLookup` revert.
#[derive(Debug)]
pub(crate) struct OffchainLookup {
    pub(crate) sender: Address,
    pub(crate) urls: Vec<String>,
    pub(crate) call_data: Vec<u8>,
    pub(crate) callback: [u8; 4],
    pub(crate) extra_data: Vec<u8>,
}

impl OffchainLookup {
    pub(crate) fn decode(revert: &[u8]) -> Result<Self, PayError> {
        let malformed = || PayError::Resolution("Malformed offchain lookup".to_string());
        let body = revert
            .strip_prefix(selector(OFFCHAIN_LOOKUP).as_slice())
            .ok_or_else(malformed)?;

        let tokens = decode(
            &[
                ParamType::Address,
                ParamType::Array(Box::new(ParamType::String)),
                ParamType::Bytes,
                ParamType::FixedBytes(4),
                ParamType::Bytes,
            ],
            body,
        )
        .map_err(|_| malformed())?;

        let [
            Token::Address(sender),
            Token::Array(urls),
            Token::Bytes(call_data),
            Token::FixedBytes(callback),
            Token::Bytes(extra_data),
        ] = tokens.as_slice()
        else {
            return Err(malformed());
        };

        let urls = urls
            .iter()
            .map(|url| match url {
                Token::String(url) => Ok(url.clone()),
                _ => Err(malformed()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sender: Address::from_bytes(sender.0),
            urls,
            call_data: call_data.clone(),
            callback: callback.as_slice().try_into().map_err(|_| malformed())?,
            extra_data: extra_data.clone(),
        })
    }

    /// Calldata for the callback: `callback(response, extraData)`.
    pub(crate) fn callback_data(&self, response: Vec<u8>) -> Vec<u8> {
        let mut data = self.callback.to_vec();
        data.extend(encode(&[
            Token::Bytes(response),
            Token::Bytes(self.extra_data.clone()),
        ]));
        data
    }
}

/// Resolves ENS names over Ethereum JSON-RPC `eth_call`.
#[derive(Clone)]
pub struct EnsResolver {
    pub client: Client,
    pub rpc_url: String,
    pub lookup: EnsLookup,
}

impl EnsResolver {
    pub fn new(rpc_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, PayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PayError::Config(format!("Failed to build RPC client: {e}")))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            lookup: EnsLookup::Universal(ENS_UNIVERSAL_RESOLVER.parse()?),
        })
    }

    #[must_use]
    pub const fn with_universal_resolver(mut self, universal_resolver: Address) -> Self {
        self.lookup = EnsLookup::Universal(universal_resolver);
        self
    }

    /// Switches to direct registry lookups, for chains without a Universal
    /// Resolver.
    #[must_use]
    pub const fn with_registry(mut self, registry: Address) -> Self {
        self.lookup = EnsLookup::Registry(registry);
        self
    }

    async fn eth_call(&self, to: Address, data: &[u8]) -> Result<CallOutcome, PayError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": to.to_string(), "data": format!("0x{}", hex::encode(data)) },
                "latest"
            ],
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PayError::Resolution(format!("Failed to reach RPC endpoint: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PayError::Resolution(format!(
                "RPC endpoint returned {status}"
            )));
        }

        let reply: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| PayError::Resolution(format!("Malformed RPC response: {e}")))?;

        if let Some(error) = reply.error {
            if let Some(revert) = revert_data(&error) {
                return Ok(CallOutcome::Revert(revert));
            }
            return Err(PayError::Resolution(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        let result = reply
            .result
            .ok_or_else(|| PayError::Resolution("RPC response has no result".to_string()))?;

        decode_hex(&result).map(CallOutcome::Success)
    }

    /// `eth_call` that follows EIP-3668 offchain lookups: the gateway's
    /// answer is passed back to the contract's callback until the contract
    /// returns or reverts with something else.
    async fn call_with_offchain_lookups(
        &self,
        to: Address,
        mut data: Vec<u8>,
    ) -> Result<CallOutcome, PayError> {
        let lookup_selector = selector(OFFCHAIN_LOOKUP);

        for _ in 0..=MAX_OFFCHAIN_LOOKUPS {
            let revert = match self.eth_call(to, &data).await? {
                CallOutcome::Revert(revert) if revert.starts_with(&lookup_selector) => revert,
                outcome => return Ok(outcome),
            };

            let lookup = OffchainLookup::decode(&revert)?;
            if lookup.sender != to {
                return Err(PayError::Resolution(format!(
                    "Offchain lookup sender {} does not match {}",
                    lookup.sender, to
                )));
            }

            let response = self.query_gateways(&lookup).await?;
            data = lookup.callback_data(response);
        }

        Err(PayError::Resolution(format!(
            "Gave up after {MAX_OFFCHAIN_LOOKUPS} offchain lookups"
        )))
    }

    /// Tries each gateway URL in order. Templates with `{data}` are fetched
    /// with GET, the rest get a JSON POST of `{data, sender}`.
    async fn query_gateways(&self, lookup: &OffchainLookup) -> Result<Vec<u8>, PayError> {
        let sender = format!("0x{}", hex::encode(lookup.sender.as_bytes()));
        let data = format!("0x{}", hex::encode(&lookup.call_data));
        let mut last_error = PayError::Resolution("Offchain lookup has no gateways".to_string());

        for template in &lookup.urls {
            let url = template.replace("{sender}", &sender).replace("{data}", &data);
            let request = if template.contains("{data}") {
                self.client.get(&url)
            } else {
                self.client
                    .post(&url)
                    .json(&json!({ "data": data, "sender": sender }))
            };

            debug!("Querying ENS gateway {}", url);
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    let body: GatewayResponse = response.json().await.map_err(|e| {
                        PayError::Resolution(format!("Malformed gateway response: {e}"))
                    })?;
                    return decode_hex(&body.data);
                }
                Ok(response) => {
                    last_error = PayError::Resolution(format!(
                        "Gateway {} returned {}",
                        url,
                        response.status()
                    ));
                }
                Err(e) => {
                    last_error = PayError::Resolution(format!("Failed to reach gateway: {e}"));
                }
            }
        }

        Err(last_error)
    }

    async fn resolve_universal(
        &self,
        universal_resolver: Address,
        name: &str,
    ) -> Result<Option<Address>, PayError> {
        let mut addr_call = selector("addr(bytes32)").to_vec();
        addr_call.extend_from_slice(&namehash(name));

        let mut data = selector("resolve(bytes,bytes)").to_vec();
        data.extend(encode(&[
            Token::Bytes(dns_encode(name)),
            Token::Bytes(addr_call),
        ]));

        let output = match self
            .call_with_offchain_lookups(universal_resolver, data)
            .await?
        {
            CallOutcome::Success(output) => output,
            CallOutcome::Revert(revert) => {
                // ResolverNotFound and friends: the name does not resolve.
                debug!(
                    "Universal resolver reverted for {} (0x{})",
                    name,
                    hex::encode(revert.get(..4).unwrap_or_default())
                );
                return Ok(None);
            }
        };

        let tokens = decode(&[ParamType::Bytes, ParamType::Address], &output).map_err(|e| {
            PayError::Resolution(format!("Malformed universal resolver output: {e}"))
        })?;
        let [Token::Bytes(result), Token::Address(resolver)] = tokens.as_slice() else {
            return Err(PayError::Resolution(
                "Malformed universal resolver output".to_string(),
            ));
        };

        let address = first_word(result).map_or(Address::ZERO, |word| Address::from_word(&word));
        if address.is_zero() {
            debug!(
                "Resolver {} has no address for {}",
                Address::from_bytes(resolver.0),
                name
            );
            return Ok(None);
        }

        debug!("Resolved {} to {}", name, address);
        Ok(Some(address))
    }

    async fn resolve_registry(
        &self,
        registry: Address,
        name: &str,
    ) -> Result<Option<Address>, PayError> {
        let node = namehash(name);

        let resolver = self
            .call_address_getter(registry, "resolver(bytes32)", &node)
            .await?;
        if resolver.is_zero() {
            debug!("No resolver set for {}", name);
            return Ok(None);
        }

        let address = self
            .call_address_getter(resolver, "addr(bytes32)", &node)
            .await?;
        if address.is_zero() {
            debug!("Resolver {} has no address for {}", resolver, name);
            return Ok(None);
        }

        debug!("Resolved {} to {}", name, address);
        Ok(Some(address))
    }

    /// Calls a `fn(bytes32) returns (address)` getter. Empty return data
    /// (no contract at `to`) reads as the zero address.
    async fn call_address_getter(
        &self,
        to: Address,
        signature: &str,
        node: &[u8; 32],
    ) -> Result<Address, PayError> {
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(&selector(signature));
        data.extend_from_slice(node);

        match self.eth_call(to, &data).await? {
            CallOutcome::Success(output) => {
                Ok(first_word(&output).map_or(Address::ZERO, |word| Address::from_word(&word)))
            }
            CallOutcome::Revert(_) => Err(PayError::Resolution(format!(
                "{signature} reverted on {to}"
            ))),
        }
    }
}

#[async_trait::async_trait]
impl NameResolver for EnsResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, PayError> {
        let Some(name) = normalize(name) else {
            return Ok(None);
        };

        match self.lookup {
            EnsLookup::Universal(universal_resolver) => {
                self.resolve_universal(universal_resolver, &name).await
            }
            EnsLookup::Registry(registry) => self.resolve_registry(registry, &name).await,
        }
    }
}

/// Execution reverts carry their return data in `error.data` (geth uses
/// code 3). A revert without data reads as empty.
fn revert_data(error: &JsonRpcError) -> Option<Vec<u8>> {
    let reverted = error.code == 3 || error.message.contains("revert");
    if !reverted {
        return None;
    }
    let data = error.data.as_ref().and_then(Value::as_str).unwrap_or("0x");
    decode_hex(data).ok()
}

fn decode_hex(data: &str) -> Result<Vec<u8>, PayError> {
    hex::decode(data.trim_start_matches("0x"))
        .map_err(|e| PayError::Resolution(format!("Invalid hex in RPC result: {e}")))
}

/// Lowercases and trims the name. Returns `None` for names with empty
/// labels, which cannot be registered.
#[must_use]
pub fn normalize(name: &str) -> Option<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() || name.split('.').any(str::is_empty) {
        return None;
    }
    Some(name)
}

/// EIP-137 namehash.
#[must_use]
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }

    for label in name.rsplit('.') {
        let label_hash = Keccak256::digest(label.as_bytes());
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_hash);
        node = hasher.finalize().into();
    }
    node
}

/// DNS wire format used by `resolve(bytes,bytes)`: each label prefixed by
/// its length, then a zero byte. Labels longer than 255 bytes are replaced
/// by their bracketed labelhash.
#[must_use]
pub fn dns_encode(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|label| !label.is_empty()) {
        let hashed;
        let label = if label.len() > 255 {
            hashed = format!("[{}]", hex::encode(Keccak256::digest(label.as_bytes())));
            hashed.as_str()
        } else {
            label
        };
        // Both branches are at most 255 bytes.
        out.push(u8::try_from(label.len()).unwrap_or(u8::MAX));
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

/// First four bytes of the keccak hash of a function signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn first_word(output: &[u8]) -> Option<[u8; 32]> {
    output.get(..32).and_then(|word| word.try_into().ok())
}
