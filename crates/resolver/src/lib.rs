pub mod destination;
pub mod ens;
pub mod mock;
pub mod resolver;

pub use destination::{DestinationResolver, classify};
pub use ens::{EnsLookup, EnsResolver};
pub use mock::MockNameResolver;
pub use resolver::NameResolver;
