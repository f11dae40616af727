use types::{
    amount::TokenAmount,
    destination::ResolvedDestination,
    errors::PayError,
    payment::{Payment, PaymentIntentRequest},
    token::DestinationToken,
};

/// Per-session state of the checkout steps: API key, destination, amount,
/// and the payment once it exists. Creating a payment locks the form.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    api_key: String,
    destination_input: String,
    destination: ResolvedDestination,
    quantity: String,
    token: DestinationToken,
    payment: Option<Payment>,
    // Bumped on every destination edit; a resolution only applies to the
    // edit that started it.
    resolution_seq: u64,
}

impl CheckoutForm {
    #[must_use]
    pub fn new(token: DestinationToken) -> Self {
        Self {
            api_key: String::new(),
            destination_input: String::new(),
            destination: ResolvedDestination::pending(),
            quantity: String::new(),
            token,
            payment: None,
            resolution_seq: 0,
        }
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.payment.is_some()
    }

    fn ensure_unlocked(&self) -> Result<(), PayError> {
        if self.is_locked() {
            return Err(PayError::Validation(
                "A payment was already created for this checkout".to_string(),
            ));
        }
        Ok(())
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<(), PayError> {
        self.ensure_unlocked()?;
        self.api_key = api_key.into();
        Ok(())
    }

    /// Records raw input and returns the sequence number its resolution must
    /// be applied with. The destination drops back to pending until then.
    pub fn set_destination_input(&mut self, input: impl Into<String>) -> Result<u64, PayError> {
        self.ensure_unlocked()?;
        self.destination_input = input.into();
        self.destination = ResolvedDestination::pending();
        self.resolution_seq += 1;
        Ok(self.resolution_seq)
    }

    /// Applies the resolution started by edit `seq`. Returns `false` and
    /// leaves the form as it is when the input was edited again since.
    pub fn apply_resolution(
        &mut self,
        seq: u64,
        resolved: ResolvedDestination,
    ) -> Result<bool, PayError> {
        self.ensure_unlocked()?;
        if seq != self.resolution_seq {
            return Ok(false);
        }
        self.destination = resolved;
        Ok(true)
    }

    pub fn set_quantity(&mut self, quantity: impl Into<String>) -> Result<(), PayError> {
        self.ensure_unlocked()?;
        self.quantity = quantity.into();
        Ok(())
    }

    pub fn set_token(&mut self, token: DestinationToken) -> Result<(), PayError> {
        self.ensure_unlocked()?;
        self.token = token;
        Ok(())
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn destination_input(&self) -> &str {
        &self.destination_input
    }

    #[must_use]
    pub const fn destination(&self) -> ResolvedDestination {
        self.destination
    }

    #[must_use]
    pub const fn token(&self) -> &DestinationToken {
        &self.token
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    /// The quantity in the token's smallest unit, if it parses.
    #[must_use]
    pub fn amount(&self) -> Option<TokenAmount> {
        TokenAmount::from_quantity(&self.quantity, self.token.decimal_places).ok()
    }

    /// Whether the create button is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_locked()
            && !self.api_key.is_empty()
            && self.destination.valid_address().is_some()
            && self.amount().is_some_and(|amount| !amount.is_zero())
    }

    /// Builds a fresh request, with a new idempotency key, from the current
    /// state. Fails on exactly the conditions that disable submission.
    pub fn build_request(&self) -> Result<PaymentIntentRequest, PayError> {
        self.ensure_unlocked()?;

        if self.api_key.is_empty() {
            return Err(PayError::MissingInput("api key"));
        }
        let destination = self
            .destination
            .valid_address()
            .ok_or(PayError::MissingInput("destination"))?;

        if self.quantity.trim().is_empty() {
            return Err(PayError::MissingInput("amount"));
        }
        let amount = TokenAmount::from_quantity(&self.quantity, self.token.decimal_places)?;
        if amount.is_zero() {
            return Err(PayError::Validation(
                "Amount must be greater than zero".to_string(),
            ));
        }

        Ok(PaymentIntentRequest::new(
            self.api_key.clone(),
            destination,
            &self.token,
            amount,
        ))
    }

    pub fn record_payment(&mut self, payment: Payment) -> Result<(), PayError> {
        self.ensure_unlocked()?;
        self.payment = Some(payment);
        Ok(())
    }
}
