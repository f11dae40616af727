use crate::{
    config::CheckoutConfig,
    form::CheckoutForm,
    status::StatusFeed,
};
use clients::PaymentIntentClient;
use resolver::{DestinationResolver, EnsResolver, NameResolver};
use tracing::{debug, info};
use types::{destination::ResolvedDestination, errors::PayError, payment::Payment};

/// Everything a checkout session needs, built once from a config and passed
/// to whoever drives the form.
#[derive(Clone)]
pub struct Checkout {
    config: CheckoutConfig,
    destinations: DestinationResolver,
    payments: PaymentIntentClient,
    status_feed: StatusFeed,
}

impl Checkout {
    pub fn new(config: CheckoutConfig, names: Box<dyn NameResolver>) -> Result<Self, PayError> {
        let payments = PaymentIntentClient::new(config.api_base.clone(), config.request_timeout())?
            .with_metadata(config.metadata.clone());

        Ok(Self {
            destinations: DestinationResolver::new(names),
            payments,
            status_feed: StatusFeed::default(),
            config,
        })
    }

    /// Uses ENS over the configured JSON-RPC endpoint for name lookups.
    pub fn from_config(config: CheckoutConfig) -> Result<Self, PayError> {
        let ens = ens_resolver(&config)?;
        Self::new(config, Box::new(ens))
    }

    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    #[must_use]
    pub const fn status_feed(&self) -> &StatusFeed {
        &self.status_feed
    }

    /// A blank form settling in the configured default token.
    pub fn new_form(&self) -> Result<CheckoutForm, PayError> {
        Ok(CheckoutForm::new(self.config.token()?))
    }

    /// Resolves destination input without touching any form. Callers that
    /// share a form across tasks pair this with
    /// [`CheckoutForm::set_destination_input`] and
    /// [`CheckoutForm::apply_resolution`].
    pub async fn resolve_destination(&self, input: &str) -> ResolvedDestination {
        let resolved = self.destinations.resolve(input).await;
        debug!("Destination {:?} resolved to {:?}", input, resolved);
        resolved
    }

    /// Commits destination input (the field lost focus) and resolves it.
    /// Returns `None` when the form's input was edited again before the
    /// lookup finished.
    pub async fn commit_destination(
        &self,
        form: &mut CheckoutForm,
        input: &str,
    ) -> Result<Option<ResolvedDestination>, PayError> {
        let seq = form.set_destination_input(input)?;
        let resolved = self.resolve_destination(input).await;

        if form.apply_resolution(seq, resolved)? {
            Ok(Some(resolved))
        } else {
            Ok(None)
        }
    }

    /// Creates the payment for a filled-in form and locks the form.
    pub async fn submit(&self, form: &mut CheckoutForm) -> Result<Payment, PayError> {
        let request = form.build_request()?;
        let payment = self.payments.create_payment(&request).await?;

        info!("Payment {} created: {}", payment.id, payment.url);
        form.record_payment(payment.clone())?;
        Ok(payment)
    }
}

/// A configured registry takes precedence over the Universal Resolver.
pub fn ens_resolver(config: &CheckoutConfig) -> Result<EnsResolver, PayError> {
    let mut ens = EnsResolver::new(config.rpc_url.clone(), config.request_timeout())?;
    if let Some(universal_resolver) = config.ens_universal_resolver {
        ens = ens.with_universal_resolver(universal_resolver);
    }
    if let Some(registry) = config.ens_registry {
        debug!("Resolving ENS names through registry {}", registry);
        ens = ens.with_registry(registry);
    }
    Ok(ens)
}
