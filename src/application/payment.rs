use crate::domain::money::Amount;
use crate::domain::order::{Order, OrderStatus, PaymentStatus};
use crate::domain::ports::{
    OrderStoreRef, PaymentProviderRef, ProviderCharge, ProviderIntent, ProviderOutcome,
    UserStoreRef,
};
use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// References issued by the local simulated gateway carry this prefix.
/// Reconciliation uses it to decide whether a client-claimed outcome is
/// authoritative (local) or must be re-verified with the provider (remote).
pub const LOCAL_REFERENCE_PREFIX: &str = "local_";

pub fn is_local_reference(reference: &str) -> bool {
    reference.starts_with(LOCAL_REFERENCE_PREFIX)
}

/// What `initiate` hands back to the caller: everything the client needs to
/// complete the payment out-of-band and poll for its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub reference: String,
    pub authorization_url: String,
    pub amount: Amount,
}

/// Result of reconciling one correlation reference.
#[derive(Debug, Clone)]
pub enum Reconciliation {
    /// First successful settlement of this order.
    Confirmed(Order),
    /// The order was already paid; duplicate delivery, no effect.
    AlreadyPaid(Order),
    /// Verified failure; the order stays placed and retryable.
    Failed(Order),
    /// The provider has not settled the attempt yet.
    Outstanding(Order),
}

impl Reconciliation {
    pub fn order(&self) -> &Order {
        match self {
            Self::Confirmed(o) | Self::AlreadyPaid(o) | Self::Failed(o) | Self::Outstanding(o) => o,
        }
    }
}

/// Coordinates external payment attempts and reconciles their outcomes back
/// onto exactly one order.
///
/// A primary (authoritative) provider is optional. When it is absent or its
/// `initialize` call fails, the service falls back to the local simulated
/// gateway so a cart is never left unpayable because the provider is
/// unreachable.
pub struct PaymentService {
    orders: OrderStoreRef,
    users: UserStoreRef,
    primary: Option<PaymentProviderRef>,
    fallback: PaymentProviderRef,
    callback_base: String,
}

impl PaymentService {
    pub fn new(
        orders: OrderStoreRef,
        users: UserStoreRef,
        primary: Option<PaymentProviderRef>,
        fallback: PaymentProviderRef,
        callback_base: &str,
    ) -> Self {
        Self {
            orders,
            users,
            primary,
            fallback,
            callback_base: callback_base.trim_end_matches('/').to_string(),
        }
    }

    fn callback_url(&self) -> String {
        format!("{}/payment/verify", self.callback_base)
    }

    /// Turns the session's payable cart into an external payment attempt.
    ///
    /// The chosen correlation reference is persisted onto the order (and the
    /// order placed) before the intent is returned, so a crash after the
    /// provider call cannot leave an un-reconcilable payment in flight.
    pub async fn initiate(&self, session_id: &str) -> Result<PaymentIntent> {
        let user = self.users.get_or_create(session_id).await?;
        let order = match user.current_order {
            Some(id) => self.orders.get(id).await?,
            None => None,
        };
        let order = order
            .filter(|o| {
                matches!(o.status, OrderStatus::Pending | OrderStatus::Placed) && !o.is_empty()
            })
            .ok_or_else(|| {
                ChatError::InvalidTransition("no order with items to pay for".to_string())
            })?;

        let (reference, intent) = match &self.primary {
            Some(provider) => {
                let reference = self.fresh_reference(&order, false).await?;
                let charge = ProviderCharge {
                    reference: reference.clone(),
                    amount: order.total,
                    callback_url: self.callback_url(),
                };
                match provider.initialize(charge).await {
                    Ok(intent) => (reference, intent),
                    Err(err) => {
                        tracing::warn!(
                            provider = provider.name(),
                            error = %err,
                            "payment provider unavailable, falling back to simulated gateway"
                        );
                        self.simulated_intent(&order).await?
                    }
                }
            }
            None => self.simulated_intent(&order).await?,
        };

        let persisted_reference = reference.clone();
        let updated = self
            .orders
            .update(
                order.id,
                Box::new(move |o| {
                    o.payment_reference = Some(persisted_reference);
                    o.payment_status = PaymentStatus::Pending;
                    o.place()
                }),
            )
            .await?;

        let order_id = updated.id;
        self.users
            .update(
                session_id,
                Box::new(move |u| {
                    u.remember_order(order_id);
                    u.touch();
                    Ok(())
                }),
            )
            .await?;

        tracing::info!(reference = %reference, amount = %updated.total, "payment initiated");
        Ok(PaymentIntent {
            reference,
            authorization_url: intent.authorization_url,
            amount: updated.total,
        })
    }

    async fn simulated_intent(&self, order: &Order) -> Result<(String, ProviderIntent)> {
        let reference = self.fresh_reference(order, true).await?;
        let charge = ProviderCharge {
            reference: reference.clone(),
            amount: order.total,
            callback_url: self.callback_url(),
        };
        let intent = self.fallback.initialize(charge).await?;
        Ok((reference, intent))
    }

    /// Generates a correlation reference not yet present on any order. The
    /// random suffix keeps references unguessable from visible order data.
    async fn fresh_reference(&self, order: &Order, local: bool) -> Result<String> {
        loop {
            let salt = Uuid::new_v4().simple();
            let prefix = if local { LOCAL_REFERENCE_PREFIX } else { "" };
            let candidate = format!("{prefix}order_{}_{salt}", order.id.simple());
            if self.orders.find_by_reference(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
    }

    /// Applies a payment outcome onto the unique order carrying `reference`.
    ///
    /// Safe under at-least-once delivery: only the first verified success has
    /// an effect, later deliveries report `AlreadyPaid`. For remote
    /// references the outcome is re-verified with the provider; the caller's
    /// claim is only trusted for local simulated references.
    pub async fn reconcile(
        &self,
        reference: &str,
        claimed: ProviderOutcome,
        expected_session: Option<&str>,
    ) -> Result<Reconciliation> {
        let order = self
            .orders
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| ChatError::NotFound("order for payment reference".to_string()))?;
        if let Some(session) = expected_session
            && order.user_session != session
        {
            return Err(ChatError::NotFound(
                "order for payment reference".to_string(),
            ));
        }
        if order.status == OrderStatus::Paid {
            return Ok(Reconciliation::AlreadyPaid(order));
        }

        let outcome = if is_local_reference(reference) {
            claimed
        } else {
            match &self.primary {
                Some(provider) => provider.verify(reference).await?,
                None => {
                    return Err(ChatError::Provider(
                        "no provider configured to verify this reference".to_string(),
                    ));
                }
            }
        };

        match outcome {
            ProviderOutcome::Success => {
                let updated = self
                    .orders
                    .update(order.id, Box::new(|o| o.mark_paid()))
                    .await?;
                self.detach_current_order(&updated).await?;
                tracing::info!(reference, order = %updated.id, "payment confirmed");
                Ok(Reconciliation::Confirmed(updated))
            }
            ProviderOutcome::Failed => {
                let updated = self
                    .orders
                    .update(
                        order.id,
                        Box::new(|o| {
                            o.mark_payment_failed();
                            Ok(())
                        }),
                    )
                    .await?;
                tracing::info!(reference, order = %updated.id, "payment failed, order retryable");
                Ok(Reconciliation::Failed(updated))
            }
            ProviderOutcome::Pending => Ok(Reconciliation::Outstanding(order)),
        }
    }

    /// Clears the user's `current_order` once it is paid, moving it into
    /// history-only territory. Runs through `UserStore::update` so a chat
    /// handler racing with reconciliation cannot re-attach the paid order
    /// from a stale snapshot.
    async fn detach_current_order(&self, order: &Order) -> Result<()> {
        let order_id = order.id;
        self.users
            .update(
                &order.user_session,
                Box::new(move |u| {
                    if u.current_order == Some(order_id) {
                        u.current_order = None;
                    }
                    u.remember_order(order_id);
                    u.touch();
                    Ok(())
                }),
            )
            .await?;
        Ok(())
    }

    /// Re-queries the order behind a reference without any side effects.
    pub async fn status(&self, reference: &str) -> Result<(OrderStatus, PaymentStatus)> {
        let order = self
            .orders
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| ChatError::NotFound("order for payment reference".to_string()))?;
        Ok((order.status, order.payment_status))
    }

    /// Client-driven bounded poll. Returns the last observed payment status
    /// when `ceiling` elapses; a timeout neither cancels the payment nor
    /// marks it failed, since the provider-side transaction may settle later
    /// and stays reconcilable.
    pub async fn await_settlement(
        &self,
        reference: &str,
        every: Duration,
        ceiling: Duration,
    ) -> Result<PaymentStatus> {
        let deadline = tokio::time::Instant::now() + ceiling;
        loop {
            let (_, payment_status) = self.status(reference).await?;
            if payment_status != PaymentStatus::Pending
                || tokio::time::Instant::now() >= deadline
            {
                return Ok(payment_status);
            }
            tokio::time::sleep(every).await;
        }
    }
}
