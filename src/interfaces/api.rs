use crate::application::dialogue::{ChatReply, DialogueEngine, OrderSnapshot};
use crate::application::payment::{PaymentService, Reconciliation};
use crate::domain::money::Amount;
use crate::domain::order::{self, OrderStatus};
use crate::domain::ports::{OrderStoreRef, ProviderOutcome, UserStoreRef};
use crate::error::ChatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// `POST /message` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub message: String,
}

/// `POST /payment/initialize` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitData {
    pub authorization_url: String,
    pub reference: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitResponse {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<PaymentInitData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

/// `POST /payment/verify` body. `outcome` is the client's claim, only
/// trusted for locally simulated references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub reference: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outcome: Option<ProviderOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyData {
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    pub amount: Amount,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<VerifyData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

/// One entry of `GET /orders/history/:userId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: OrderSnapshot,
}

/// The endpoint-shaped surface of the assistant.
///
/// Every method returns a well-formed body even on failure; the transport
/// wrapping this (HTTP server, REPL) never has to render an error page.
pub struct ChatApi {
    engine: DialogueEngine,
    payments: Arc<PaymentService>,
    users: UserStoreRef,
    orders: OrderStoreRef,
}

impl ChatApi {
    pub fn new(
        engine: DialogueEngine,
        payments: Arc<PaymentService>,
        users: UserStoreRef,
        orders: OrderStoreRef,
    ) -> Self {
        Self {
            engine,
            payments,
            users,
            orders,
        }
    }

    /// `POST /message`.
    pub async fn post_message(&self, request: MessageRequest) -> ChatReply {
        self.engine.handle(&request.user_id, &request.message).await
    }

    /// `POST /payment/initialize`.
    pub async fn initialize_payment(&self, request: PaymentInitRequest) -> PaymentInitResponse {
        match self.payments.initiate(&request.user_id).await {
            Ok(intent) => PaymentInitResponse {
                status: true,
                data: Some(PaymentInitData {
                    authorization_url: intent.authorization_url,
                    reference: intent.reference,
                    amount: intent.amount,
                }),
                message: None,
            },
            Err(ChatError::InvalidTransition(_)) => PaymentInitResponse {
                status: false,
                data: None,
                message: Some("No order to pay for. Please place an order first.".to_string()),
            },
            Err(err) => {
                tracing::error!(error = %err, "payment initialization failed");
                PaymentInitResponse {
                    status: false,
                    data: None,
                    message: Some("Payment initialization failed. Please try again.".to_string()),
                }
            }
        }
    }

    /// `POST /payment/verify`. Also serves as the provider callback target.
    pub async fn verify_payment(&self, request: VerifyRequest) -> VerifyResponse {
        let claimed = request.outcome.unwrap_or(ProviderOutcome::Success);
        match self
            .payments
            .reconcile(&request.reference, claimed, Some(&request.user_id))
            .await
        {
            Ok(Reconciliation::Confirmed(order)) | Ok(Reconciliation::AlreadyPaid(order)) => {
                VerifyResponse {
                    status: true,
                    data: Some(VerifyData {
                        order_id: order.id,
                        amount: order.total,
                        status: "success".to_string(),
                    }),
                    message: Some("Payment verified successfully".to_string()),
                }
            }
            Ok(Reconciliation::Failed(order)) => VerifyResponse {
                status: false,
                data: Some(VerifyData {
                    order_id: order.id,
                    amount: order.total,
                    status: "failed".to_string(),
                }),
                message: Some("Payment verification failed".to_string()),
            },
            Ok(Reconciliation::Outstanding(order)) => VerifyResponse {
                status: false,
                data: Some(VerifyData {
                    order_id: order.id,
                    amount: order.total,
                    status: "pending".to_string(),
                }),
                message: Some("Payment not settled yet".to_string()),
            },
            Err(ChatError::NotFound(_)) => VerifyResponse {
                status: false,
                data: None,
                message: Some("Order not found".to_string()),
            },
            Err(err) => {
                tracing::error!(error = %err, "payment verification failed");
                VerifyResponse {
                    status: false,
                    data: None,
                    message: Some("Payment verification failed".to_string()),
                }
            }
        }
    }

    /// `GET /orders/current/:userId`. Empty snapshot when there is no
    /// pending cart.
    pub async fn current_order(&self, user_id: &str) -> OrderSnapshot {
        let order = async {
            let user = self.users.get(user_id).await?;
            match user.and_then(|u| u.current_order) {
                Some(id) => self.orders.get(id).await,
                None => Ok(None),
            }
        }
        .await;

        match order {
            Ok(Some(order)) if order.is_open_cart() => OrderSnapshot::from(&order),
            Ok(_) => OrderSnapshot::default(),
            Err(err) => {
                tracing::error!(error = %err, "current order lookup failed");
                OrderSnapshot::default()
            }
        }
    }

    /// `GET /orders/history/:userId`. Placed/paid orders, newest first.
    pub async fn order_history(&self, user_id: &str) -> Vec<HistoryEntry> {
        match self.orders.history_for(user_id).await {
            Ok(mut orders) => {
                order::sort_newest_first(&mut orders);
                orders
                    .iter()
                    .map(|o| HistoryEntry {
                        order_id: o.id,
                        status: o.status,
                        date: o.history_timestamp(),
                        snapshot: OrderSnapshot::from(o),
                    })
                    .collect()
            }
            Err(err) => {
                tracing::error!(error = %err, "order history lookup failed");
                Vec::new()
            }
        }
    }
}
