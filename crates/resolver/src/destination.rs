use crate::resolver::NameResolver;
use tracing::warn;
use types::{
    address::Address,
    destination::ResolvedDestination,
    resolution_metrics,
};

/// Turns destination field input into a [`ResolvedDestination`].
///
/// Holds no per-field state. Whoever owns the field decides whether a
/// result is still current when it arrives.
#[derive(Clone)]
pub struct DestinationResolver {
    names: Box<dyn NameResolver>,
}

impl DestinationResolver {
    #[must_use]
    pub fn new(names: Box<dyn NameResolver>) -> Self {
        Self { names }
    }

    /// Resolves committed input.
    pub async fn resolve(&self, input: &str) -> ResolvedDestination {
        let looked_up = self.lookup(input).await;
        classify(input, looked_up)
    }

    async fn lookup(&self, input: &str) -> Option<Address> {
        if !input.contains('.') {
            return None;
        }

        match self.names.resolve_name(input).await {
            Ok(Some(address)) => {
                resolution_metrics!("hit");
                Some(address)
            }
            Ok(None) => {
                resolution_metrics!("miss");
                None
            }
            Err(e) => {
                resolution_metrics!("error");
                warn!("Name lookup for {} failed: {}", input, e);
                None
            }
        }
    }
}

/// Decides the field state from the raw input and the name lookup result.
/// A lookup hit wins over literal parsing.
#[must_use]
pub fn classify(input: &str, looked_up: Option<Address>) -> ResolvedDestination {
    if let Some(address) = looked_up {
        return ResolvedDestination::valid(address);
    }
    if let Ok(address) = input.parse::<Address>() {
        return ResolvedDestination::valid(address);
    }
    if input.is_empty() {
        return ResolvedDestination::pending();
    }
    ResolvedDestination::error()
}
