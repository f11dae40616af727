use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use actix_web::{App, HttpResponse, HttpServer, dev::ServerHandle, web};
use ethers_core::abi::{ParamType, Token, decode, encode};
use resolver::ens::{ENS_REGISTRY, ENS_UNIVERSAL_RESOLVER, OFFCHAIN_LOOKUP, namehash, selector};
use serde_json::{Value, json};
use types::address::Address;

/// Resolver reported by the Universal Resolver for names answered offchain.
const OFFCHAIN_RESOLVER: &str = "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41";

const RESOLVE_CALLBACK: &str = "resolveCallback(bytes,bytes)";

/// ENS state served by [`MockRpcNode`].
#[derive(Clone, Default)]
pub struct EnsFixtures {
    // namehash -> resolver contract
    resolvers: HashMap<[u8; 32], Address>,
    // namehash -> address set on the resolver
    addresses: HashMap<[u8; 32], Address>,
    // parent namehash -> (wildcard resolver, address for every subname)
    wildcards: HashMap<[u8; 32], (Address, Address)>,
    // namehash -> address served by the gateway
    offchain: HashMap<[u8; 32], Address>,
    gateway_down: bool,
    error: Option<String>,
}

enum Reply {
    Output(Vec<u8>),
    Revert(Vec<u8>),
}

impl EnsFixtures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str, resolver: Address, address: Address) -> Self {
        let node = namehash(name);
        self.resolvers.insert(node, resolver);
        self.addresses.insert(node, address);
        self
    }

    /// A name with a resolver contract but no address record.
    pub fn with_resolver_only(mut self, name: &str, resolver: Address) -> Self {
        self.resolvers.insert(namehash(name), resolver);
        self
    }

    /// An ENSIP-10 wildcard resolver on `parent`: every subname resolves to
    /// `address` without a registry entry of its own.
    pub fn with_wildcard(mut self, parent: &str, resolver: Address, address: Address) -> Self {
        self.wildcards.insert(namehash(parent), (resolver, address));
        self
    }

    /// A name answered through an EIP-3668 offchain lookup.
    pub fn with_offchain_name(mut self, name: &str, address: Address) -> Self {
        self.offchain.insert(namehash(name), address);
        self
    }

    /// The offchain gateway answers every request with 502.
    pub fn gateway_down(mut self) -> Self {
        self.gateway_down = true;
        self
    }

    /// Every call answers with a JSON-RPC error.
    pub fn failing(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    fn answer(&self, to: Address, data: &[u8], base_url: &str) -> Reply {
        let Some(sel) = data.get(..4) else {
            return Reply::Output(Vec::new());
        };
        let args = &data[4..];

        let universal: Address = ENS_UNIVERSAL_RESOLVER.parse().unwrap();
        if to == universal && sel == selector("resolve(bytes,bytes)") {
            return self.resolve_universal(to, args, base_url);
        }
        if to == universal && sel == selector(RESOLVE_CALLBACK) {
            return resolve_callback(args);
        }

        let Some(node) = args.get(..32).and_then(|n| <[u8; 32]>::try_from(n).ok()) else {
            return Reply::Output(Vec::new());
        };

        let registry: Address = ENS_REGISTRY.parse().unwrap();
        if to == registry && sel == selector("resolver(bytes32)") {
            let resolver = self.resolvers.get(&node).copied().unwrap_or(Address::ZERO);
            return Reply::Output(resolver.to_word().to_vec());
        }

        let is_resolver = self.resolvers.values().any(|resolver| *resolver == to);
        if is_resolver && sel == selector("addr(bytes32)") {
            let address = self.addresses.get(&node).copied().unwrap_or(Address::ZERO);
            return Reply::Output(address.to_word().to_vec());
        }

        // No contract code at `to`.
        Reply::Output(Vec::new())
    }

    fn resolve_universal(&self, to: Address, args: &[u8], base_url: &str) -> Reply {
        let tokens = decode(&[ParamType::Bytes, ParamType::Bytes], args).unwrap_or_default();
        let [Token::Bytes(dns_name), Token::Bytes(call)] = tokens.as_slice() else {
            return Reply::Revert(Vec::new());
        };
        let Some(name) = dns_decode(dns_name) else {
            return Reply::Revert(Vec::new());
        };
        let node = namehash(&name);
        if call.get(..4) != Some(selector("addr(bytes32)").as_slice()) {
            return Reply::Revert(Vec::new());
        }

        if self.offchain.contains_key(&node) {
            let mut revert = selector(OFFCHAIN_LOOKUP).to_vec();
            revert.extend(encode(&[
                Token::Address(to.as_bytes().into()),
                Token::Array(vec![Token::String(format!(
                    "{base_url}gateway/{{sender}}/{{data}}"
                ))]),
                Token::Bytes(call.clone()),
                Token::FixedBytes(selector(RESOLVE_CALLBACK).to_vec()),
                Token::Bytes(node.to_vec()),
            ]));
            return Reply::Revert(revert);
        }

        let found = match self.resolvers.get(&node) {
            Some(resolver) => Some((
                *resolver,
                self.addresses.get(&node).copied().unwrap_or(Address::ZERO),
            )),
            None => self.wildcard_for(&name),
        };
        let Some((resolver, address)) = found else {
            let mut revert = selector("ResolverNotFound(bytes)").to_vec();
            revert.extend(encode(&[Token::Bytes(dns_name.clone())]));
            return Reply::Revert(revert);
        };

        Reply::Output(encode(&[
            Token::Bytes(address.to_word().to_vec()),
            Token::Address(resolver.as_bytes().into()),
        ]))
    }

    fn wildcard_for(&self, name: &str) -> Option<(Address, Address)> {
        let mut rest = name;
        while let Some((_, parent)) = rest.split_once('.') {
            if let Some(wildcard) = self.wildcards.get(&namehash(parent)) {
                return Some(*wildcard);
            }
            rest = parent;
        }
        None
    }

    fn gateway_answer(&self, data: &str) -> Option<Vec<u8>> {
        let data = hex::decode(data.trim_start_matches("0x")).ok()?;
        let node = <[u8; 32]>::try_from(data.get(4..36)?).ok()?;
        self.offchain.get(&node).map(|address| address.to_word().to_vec())
    }
}

fn resolve_callback(args: &[u8]) -> Reply {
    let tokens = decode(&[ParamType::Bytes, ParamType::Bytes], args).unwrap_or_default();
    let [Token::Bytes(response), Token::Bytes(_)] = tokens.as_slice() else {
        return Reply::Revert(Vec::new());
    };
    let resolver: Address = OFFCHAIN_RESOLVER.parse().unwrap();
    Reply::Output(encode(&[
        Token::Bytes(response.clone()),
        Token::Address(resolver.as_bytes().into()),
    ]))
}

fn dns_decode(mut encoded: &[u8]) -> Option<String> {
    let mut labels = Vec::new();
    loop {
        let (&len, rest) = encoded.split_first()?;
        if len == 0 {
            return Some(labels.join("."));
        }
        let label = rest.get(..usize::from(len))?;
        labels.push(String::from_utf8(label.to_vec()).ok()?);
        encoded = &rest[usize::from(len)..];
    }
}

#[derive(Clone)]
struct NodeState {
    fixtures: EnsFixtures,
    base_url: Arc<OnceLock<String>>,
    calls: Arc<Mutex<Vec<Value>>>,
    gateway_requests: Arc<Mutex<Vec<String>>>,
}

/// Minimal Ethereum JSON-RPC node that only understands `eth_call` against
/// the ENS registry, the Universal Resolver and the resolvers it was given.
/// Also serves the offchain gateway for names added with
/// [`EnsFixtures::with_offchain_name`].
pub struct MockRpcNode {
    pub url: String,
    calls: Arc<Mutex<Vec<Value>>>,
    gateway_requests: Arc<Mutex<Vec<String>>>,
    handle: ServerHandle,
}

impl MockRpcNode {
    pub fn start(fixtures: EnsFixtures) -> std::io::Result<Self> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let gateway_requests = Arc::new(Mutex::new(Vec::new()));
        let base_url = Arc::new(OnceLock::new());
        let state = NodeState {
            fixtures,
            base_url: base_url.clone(),
            calls: calls.clone(),
            gateway_requests: gateway_requests.clone(),
        };

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/", web::post().to(rpc))
                .route("/gateway/{sender}/{data}", web::get().to(gateway))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))?;

        let addr = server.addrs()[0];
        let url = format!("http://{addr}/");
        base_url.set(url.clone()).unwrap();

        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);

        Ok(Self {
            url,
            calls,
            gateway_requests,
            handle,
        })
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }

    pub fn gateway_requests(&self) -> Vec<String> {
        self.gateway_requests.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn rpc(body: web::Json<Value>, state: web::Data<NodeState>) -> HttpResponse {
    let request = body.into_inner();
    state.calls.lock().unwrap().push(request.clone());
    let id = request["id"].clone();

    if let Some(message) = &state.fixtures.error {
        return HttpResponse::Ok().json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message },
        }));
    }

    if request["method"] != "eth_call" {
        return HttpResponse::Ok().json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": "method not found" },
        }));
    }

    let call = &request["params"][0];
    let to = call["to"]
        .as_str()
        .and_then(|to| to.to_lowercase().parse::<Address>().ok())
        .unwrap_or(Address::ZERO);
    let data = call["data"]
        .as_str()
        .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok())
        .unwrap_or_default();

    let base_url = state.base_url.get().cloned().unwrap_or_default();
    match state.fixtures.answer(to, &data, &base_url) {
        Reply::Output(output) => HttpResponse::Ok().json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": format!("0x{}", hex::encode(output)),
        })),
        Reply::Revert(revert) => HttpResponse::Ok().json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": 3,
                "message": "execution reverted",
                "data": format!("0x{}", hex::encode(revert)),
            },
        })),
    }
}

async fn gateway(path: web::Path<(String, String)>, state: web::Data<NodeState>) -> HttpResponse {
    let (sender, data) = path.into_inner();
    state
        .gateway_requests
        .lock()
        .unwrap()
        .push(format!("{sender}/{data}"));

    if state.fixtures.gateway_down {
        return HttpResponse::BadGateway().finish();
    }

    match state.fixtures.gateway_answer(&data) {
        Some(answer) => HttpResponse::Ok().json(json!({
            "data": format!("0x{}", hex::encode(answer)),
        })),
        None => HttpResponse::NotFound().finish(),
    }
}
