pub mod address;
pub mod amount;
pub mod destination;
pub mod errors;
pub mod payment;
pub mod token;

#[macro_use]
pub mod macros;
