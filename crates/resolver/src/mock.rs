use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use crate::resolver::NameResolver;
use tracing::info;
use types::{address::Address, errors::PayError};

#[derive(Clone, Default)]
pub struct MockNameResolver {
    // Map of lowercased name -> address
    pub names: HashMap<String, Address>,
    pub delays: HashMap<String, Duration>,
    pub failing: HashSet<String>,
}

impl MockNameResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_name(&mut self, name: &str, address: Address) {
        self.names.insert(name.to_lowercase(), address);
    }

    /// Delays every lookup of `name` by `delay` before answering.
    pub fn add_delay(&mut self, name: &str, delay: Duration) {
        self.delays.insert(name.to_lowercase(), delay);
    }

    /// Makes lookups of `name` fail as if the RPC endpoint were down.
    pub fn add_failure(&mut self, name: &str) {
        self.failing.insert(name.to_lowercase());
    }
}

#[async_trait::async_trait]
impl NameResolver for MockNameResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, PayError> {
        let key = name.to_lowercase();
        info!("Mock lookup for {}", key);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&key) {
            return Err(PayError::Resolution(format!("Lookup failed for {key}")));
        }

        Ok(self.names.get(&key).copied())
    }
}
