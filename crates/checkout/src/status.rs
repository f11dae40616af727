use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, warn};
use types::payment::{Payment, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub payment_id: String,
    pub status: PaymentStatus,
}

/// Fan-out of payment status reports from the embedded checkout widget.
///
/// Whatever observes the widget calls [`StatusFeed::publish`]; everything
/// else subscribes per payment with [`StatusFeed::on_status_change`].
#[derive(Clone)]
pub struct StatusFeed {
    tx: broadcast::Sender<StatusEvent>,
}

impl Default for StatusFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

impl StatusFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes a raw widget status string for `payment_id`.
    pub fn publish(&self, payment_id: &str, raw_status: &str) -> PaymentStatus {
        let status = PaymentStatus::parse(raw_status);
        let event = StatusEvent {
            payment_id: payment_id.to_string(),
            status: status.clone(),
        };
        if self.tx.send(event).is_err() {
            debug!("No subscribers for payment {}", payment_id);
        }
        status
    }

    /// Calls `callback` for every status reported for `payment_id`.
    ///
    /// The subscription is registered before this returns, so nothing
    /// published afterwards is missed. The task ends after a terminal status
    /// has been delivered or once every feed handle is dropped.
    pub fn on_status_change<F>(&self, payment_id: &str, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(PaymentStatus) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let payment_id = payment_id.to_string();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.payment_id == payment_id => {
                        let terminal = event.status.is_terminal();
                        callback(event.status);
                        if terminal {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Status subscriber for {} lagged, skipped {} events",
                            payment_id, skipped
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    NoPayment,
    PaymentCreated,
    PaymentCompleted,
    PaymentBounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayButton {
    pub label: &'static str,
    pub disabled: bool,
}

#[must_use]
pub const fn button_for(status: &PaymentStatus) -> PayButton {
    match status {
        PaymentStatus::Completed => PayButton {
            label: "PAID",
            disabled: true,
        },
        PaymentStatus::Bounced => PayButton {
            label: "BOUNCED",
            disabled: true,
        },
        _ => PayButton {
            label: "PAY",
            disabled: false,
        },
    }
}

/// What the payment step shows: the external link plus the widget button.
/// The widget owns the real state machine; this only mirrors what it
/// reports.
#[derive(Debug, Clone, Default)]
pub struct PaymentDisplay {
    payment: Option<Payment>,
    status: Option<PaymentStatus>,
}

impl PaymentDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_payment(payment: Payment) -> Self {
        let mut display = Self::new();
        display.payment_created(payment);
        display
    }

    pub fn payment_created(&mut self, payment: Payment) {
        self.payment = Some(payment);
        self.status = Some(PaymentStatus::Unpaid);
    }

    /// Records a reported status. Ignored until a payment exists.
    pub fn apply_status(&mut self, status: PaymentStatus) {
        if self.payment.is_some() {
            self.status = Some(status);
        }
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    #[must_use]
    pub const fn state(&self) -> DisplayState {
        match &self.status {
            None => DisplayState::NoPayment,
            Some(PaymentStatus::Completed) => DisplayState::PaymentCompleted,
            Some(PaymentStatus::Bounced) => DisplayState::PaymentBounced,
            Some(_) => DisplayState::PaymentCreated,
        }
    }

    /// `None` while there is no payment to pay.
    #[must_use]
    pub const fn button(&self) -> Option<PayButton> {
        match &self.status {
            Some(status) => Some(button_for(status)),
            None => None,
        }
    }
}
