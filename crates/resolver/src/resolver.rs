use dyn_clone::DynClone;
use types::{address::Address, errors::PayError};

/// Looks up a human-readable dotted name (e.g. `vitalik.eth`).
///
/// `Ok(None)` means the name has no address; `Err` means the lookup itself
/// could not be completed.
#[async_trait::async_trait]
pub trait NameResolver: Send + DynClone + Sync {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, PayError>;
}

dyn_clone::clone_trait_object!(NameResolver);
