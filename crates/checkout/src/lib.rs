pub mod checkout;
pub mod config;
pub mod form;
pub mod logging;
pub mod status;

pub use checkout::Checkout;
pub use config::{CheckoutConfig, CheckoutConfigBuilder};
pub use form::CheckoutForm;
pub use status::{DisplayState, PayButton, PaymentDisplay, StatusFeed};
