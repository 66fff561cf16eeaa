use super::payment::PaymentService;
use crate::domain::money::Amount;
use crate::domain::order::{self, Order, OrderStatus};
use crate::domain::ports::{MenuStoreRef, OrderStoreRef, UserStoreRef};
use crate::domain::user::User;
use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use uuid::Uuid;

/// One selectable option offered back to the client. `value` is echoed
/// verbatim as the next message; `action` tells the client to call the
/// payment-initialize endpoint instead of resubmitting the token as chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatOption {
    pub value: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub action: Option<String>,
}

impl ChatOption {
    pub fn new(value: &str, text: &str) -> Self {
        Self {
            value: value.to_string(),
            text: text.to_string(),
            action: None,
        }
    }

    fn pay(value: &str, text: &str) -> Self {
        Self {
            value: value.to_string(),
            text: text.to_string(),
            action: Some("initiate_payment".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineSnapshot {
    pub name: String,
    pub price: Amount,
    pub quantity: u32,
}

/// The order view attached to chat replies and the order-query endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderSnapshot {
    pub items: Vec<LineSnapshot>,
    pub total: Amount,
}

impl From<&Order> for OrderSnapshot {
    fn from(order: &Order) -> Self {
        Self {
            items: order
                .items
                .iter()
                .map(|line| LineSnapshot {
                    name: line.name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                })
                .collect(),
            total: order.total,
        }
    }
}

/// Every handler returns this complete triple; a reply without options is a
/// contract violation, the chat surface has no other way to continue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub options: Vec<ChatOption>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub order: Option<OrderSnapshot>,
}

impl ChatReply {
    fn new(message: impl Into<String>, options: Vec<ChatOption>) -> Self {
        Self {
            message: message.into(),
            options,
            order: None,
        }
    }

    fn with_order(mut self, order: &Order) -> Self {
        self.order = Some(OrderSnapshot::from(order));
        self
    }
}

/// The option tokens the engine dispatches on. Clients echo these back
/// verbatim from previously offered options.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionToken {
    PlaceOrder,
    Category(String),
    Add(u32),
    Checkout,
    InitiatePayment,
    PaymentStatus,
    CurrentOrder,
    OrderHistory,
    CancelOrder,
    MainMenu,
    Unknown(String),
}

impl OptionToken {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "place-order" => Self::PlaceOrder,
            "checkout" => Self::Checkout,
            "initiate-payment" => Self::InitiatePayment,
            "payment-status" => Self::PaymentStatus,
            "current-order" => Self::CurrentOrder,
            "order-history" => Self::OrderHistory,
            "cancel-order" => Self::CancelOrder,
            "main-menu" => Self::MainMenu,
            _ => {
                if let Some(category) = raw.strip_prefix("category:") {
                    Self::Category(category.to_string())
                } else if let Some(id) = raw.strip_prefix("add:") {
                    match id.parse() {
                        Ok(id) => Self::Add(id),
                        Err(_) => Self::Unknown(raw.to_string()),
                    }
                } else {
                    Self::Unknown(raw.to_string())
                }
            }
        }
    }
}

fn main_options() -> Vec<ChatOption> {
    vec![
        ChatOption::new("place-order", "🛍️ Place an order"),
        ChatOption::new("checkout", "💰 Checkout order"),
        ChatOption::new("order-history", "📊 Order history"),
        ChatOption::new("current-order", "📋 Current order"),
        ChatOption::new("cancel-order", "❌ Cancel order"),
    ]
}

fn back_to_main() -> ChatOption {
    ChatOption::new("main-menu", "← Main Menu")
}

/// The dialogue engine: a stateless dispatcher from (session, option token)
/// to a complete chat reply, with all durable state behind the store ports.
pub struct DialogueEngine {
    menu: MenuStoreRef,
    users: UserStoreRef,
    orders: OrderStoreRef,
    payments: Arc<PaymentService>,
}

impl DialogueEngine {
    pub fn new(
        menu: MenuStoreRef,
        users: UserStoreRef,
        orders: OrderStoreRef,
        payments: Arc<PaymentService>,
    ) -> Self {
        Self {
            menu,
            users,
            orders,
            payments,
        }
    }

    /// Handles one incoming message. Never fails: storage and provider
    /// errors degrade into a conversational reply with a safe option set.
    pub async fn handle(&self, session_id: &str, raw: &str) -> ChatReply {
        match self.dispatch(session_id, raw).await {
            Ok(reply) => reply,
            Err(err) => degraded_reply(err),
        }
    }

    async fn dispatch(&self, session_id: &str, raw: &str) -> Result<ChatReply> {
        let user = self.users.get_or_create(session_id).await?;
        match OptionToken::parse(raw) {
            OptionToken::PlaceOrder => self.handle_place_order().await,
            OptionToken::Category(category) => self.handle_category(&category).await,
            OptionToken::Add(item_id) => self.handle_add(user, item_id).await,
            OptionToken::Checkout => self.handle_checkout(&user).await,
            OptionToken::InitiatePayment => self.handle_initiate_payment(&user).await,
            OptionToken::PaymentStatus => self.handle_payment_status(&user).await,
            OptionToken::CurrentOrder => self.handle_current_order(&user).await,
            OptionToken::OrderHistory => self.handle_order_history(&user).await,
            OptionToken::CancelOrder => self.handle_cancel(user).await,
            OptionToken::MainMenu => Ok(Self::handle_main_menu()),
            OptionToken::Unknown(_) => Ok(ChatReply::new(
                "Invalid option. Please select from the menu.",
                main_options(),
            )),
        }
    }

    fn handle_main_menu() -> ChatReply {
        ChatReply::new(
            "🏠 **Main Menu**\nWelcome! How can I help you today?",
            main_options(),
        )
    }

    async fn handle_place_order(&self) -> Result<ChatReply> {
        let categories = self.menu.categories().await?;
        let mut options: Vec<ChatOption> = categories
            .iter()
            .map(|c| ChatOption::new(&format!("category:{c}"), &format!("Browse {c}")))
            .collect();
        options.push(back_to_main());
        Ok(ChatReply::new(
            "Please select a category to browse menu items:",
            options,
        ))
    }

    async fn handle_category(&self, category: &str) -> Result<ChatReply> {
        let items = self.menu.items_in(category).await?;
        if items.is_empty() {
            return Ok(ChatReply::new(
                format!("Sorry, we have nothing under **{category}** right now."),
                vec![
                    ChatOption::new("place-order", "← Back to Categories"),
                    back_to_main(),
                ],
            ));
        }
        let mut options: Vec<ChatOption> = items
            .iter()
            .map(|item| {
                ChatOption::new(
                    &format!("add:{}", item.id),
                    &format!("{} - {}", item.name, item.price),
                )
            })
            .collect();
        options.push(ChatOption::new("place-order", "← Back to Categories"));
        options.push(back_to_main());
        Ok(ChatReply::new(
            format!("**{category} Menu:**\nPlease select items to add to your order:"),
            options,
        ))
    }

    async fn handle_add(&self, user: User, item_id: u32) -> Result<ChatReply> {
        let item = match self.menu.get(item_id).await? {
            Some(item) if item.available => item,
            _ => {
                return Ok(ChatReply::new("Item not found.", main_options()));
            }
        };

        let order_id = self.open_cart(user).await?;
        let name = item.name.clone();
        let updated = self
            .orders
            .update(order_id, Box::new(move |o| o.add_item(&item)))
            .await?;

        Ok(ChatReply::new(
            format!("✅ Added **{name}** to your order!"),
            vec![
                ChatOption::new("place-order", "➕ Add More Items"),
                ChatOption::new("current-order", "📋 View Current Order"),
                ChatOption::new("checkout", "💰 Checkout"),
                back_to_main(),
            ],
        )
        .with_order(&updated))
    }

    /// Returns the id of the user's usable pending cart, creating a fresh one
    /// when the current order is missing or no longer pending (a placed or
    /// cancelled cart is never mutated).
    ///
    /// Attachment re-checks the observed `current_order` inside
    /// `UserStore::update`, so two concurrent first adds converge on one cart
    /// instead of each attaching their own; the losing cart is retired.
    async fn open_cart(&self, user: User) -> Result<Uuid> {
        if let Some(id) = user.current_order
            && let Some(existing) = self.orders.get(id).await?
            && existing.is_open_cart()
        {
            return Ok(id);
        }

        let order = Order::new(&user.session_id);
        let candidate = order.id;
        self.orders.store(order).await?;

        let observed = user.current_order;
        let updated = self
            .users
            .update(
                &user.session_id,
                Box::new(move |u| {
                    if u.current_order == observed || u.current_order.is_none() {
                        u.current_order = Some(candidate);
                    }
                    u.touch();
                    Ok(())
                }),
            )
            .await?;

        match updated.current_order {
            Some(winner) if winner != candidate => {
                self.orders
                    .update(candidate, Box::new(|o| o.cancel()))
                    .await?;
                Ok(winner)
            }
            _ => Ok(candidate),
        }
    }

    async fn current_pending(&self, user: &User) -> Result<Option<Order>> {
        let Some(id) = user.current_order else {
            return Ok(None);
        };
        Ok(self.orders.get(id).await?.filter(|o| o.is_open_cart()))
    }

    async fn handle_checkout(&self, user: &User) -> Result<ChatReply> {
        let Some(order) = self.current_pending(user).await?.filter(|o| !o.is_empty()) else {
            return Ok(ChatReply::new(
                "❌ No order to place. Please add items first.",
                vec![
                    ChatOption::new("place-order", "🛍️ Start Ordering"),
                    back_to_main(),
                ],
            ));
        };

        let mut message = String::from("📋 **Order Summary:**\n");
        for line in &order.items {
            let _ = writeln!(
                message,
                "• {}x {} - {}",
                line.quantity,
                line.name,
                line.line_total()
            );
        }
        let _ = write!(
            message,
            "\n💰 **Total: {}**\n\nWould you like to proceed to payment?",
            order.total
        );

        Ok(ChatReply::new(
            message,
            vec![
                ChatOption::pay("initiate-payment", "💳 Proceed to Payment"),
                ChatOption::new("place-order", "🛍️ Add More Items"),
                ChatOption::new("cancel-order", "❌ Cancel Order"),
                back_to_main(),
            ],
        )
        .with_order(&order))
    }

    async fn handle_initiate_payment(&self, user: &User) -> Result<ChatReply> {
        match self.payments.initiate(&user.session_id).await {
            Ok(intent) => Ok(ChatReply::new(
                format!(
                    "💳 **Payment Processing**\n\nOrder Total: {}\n\nComplete your payment here:\n{}\n\nReference: {}",
                    intent.amount, intent.authorization_url, intent.reference
                ),
                vec![
                    ChatOption::new("payment-status", "📡 Check Payment Status"),
                    ChatOption::new("current-order", "📋 View Order"),
                    back_to_main(),
                ],
            )),
            Err(ChatError::InvalidTransition(_)) => Ok(ChatReply::new(
                "No order to pay for. Please place an order first.",
                main_options(),
            )),
            Err(err) => Err(err),
        }
    }

    async fn handle_payment_status(&self, user: &User) -> Result<ChatReply> {
        let Some(order) = self.latest_payment_attempt(user).await? else {
            return Ok(ChatReply::new(
                "No payment in progress. Checkout first to start one.",
                main_options(),
            ));
        };
        let message = match order.status {
            OrderStatus::Paid => "✅ Payment confirmed. Thank you for your order!".to_string(),
            _ => format!(
                "Payment is **{:?}** and your order is **{:?}**. You can retry from checkout if it failed.",
                order.payment_status, order.status
            ),
        };
        Ok(ChatReply::new(
            message,
            vec![
                ChatOption::new("payment-status", "📡 Check Again"),
                ChatOption::new("order-history", "📊 Order history"),
                back_to_main(),
            ],
        )
        .with_order(&order))
    }

    /// The order behind the session's most recent payment attempt: the
    /// current order when it carries a reference, otherwise the newest
    /// history order that does (a confirmed payment detaches the order from
    /// the session, after which only history still knows about it).
    async fn latest_payment_attempt(&self, user: &User) -> Result<Option<Order>> {
        if let Some(id) = user.current_order
            && let Some(order) = self.orders.get(id).await?
            && order.payment_reference.is_some()
        {
            return Ok(Some(order));
        }
        let mut orders = self.orders.history_for(&user.session_id).await?;
        order::sort_newest_first(&mut orders);
        Ok(orders.into_iter().find(|o| o.payment_reference.is_some()))
    }

    async fn handle_current_order(&self, user: &User) -> Result<ChatReply> {
        let Some(order) = self.current_pending(user).await?.filter(|o| !o.is_empty()) else {
            return Ok(ChatReply::new(
                "📋 No current order. Please place an order first.",
                vec![
                    ChatOption::new("place-order", "🛍️ Start Ordering"),
                    back_to_main(),
                ],
            ));
        };

        let mut message = String::from("📋 **Current Order:**\n");
        for line in &order.items {
            let _ = writeln!(
                message,
                "• {}x {} - {}",
                line.quantity,
                line.name,
                line.line_total()
            );
        }
        let _ = write!(message, "\n💰 **Total: {}**", order.total);

        Ok(ChatReply::new(
            message,
            vec![
                ChatOption::new("place-order", "➕ Add More Items"),
                ChatOption::new("checkout", "💰 Checkout"),
                ChatOption::new("cancel-order", "❌ Cancel Order"),
                back_to_main(),
            ],
        )
        .with_order(&order))
    }

    async fn handle_order_history(&self, user: &User) -> Result<ChatReply> {
        let mut orders = self.orders.history_for(&user.session_id).await?;
        order::sort_newest_first(&mut orders);

        if orders.is_empty() {
            return Ok(ChatReply::new(
                "📊 No order history found.",
                vec![
                    ChatOption::new("place-order", "🛍️ Place New Order"),
                    back_to_main(),
                ],
            ));
        }

        let mut message = String::from("📊 **Your Order History:**\n\n");
        for (index, order) in orders.iter().enumerate() {
            let _ = writeln!(
                message,
                "**Order {}:**\n• {} items\n• Total: {}\n• Status: {:?}\n• Date: {}\n",
                index + 1,
                order.items.len(),
                order.total,
                order.status,
                order.history_timestamp().format("%Y-%m-%d")
            );
        }

        Ok(ChatReply::new(
            message,
            vec![
                ChatOption::new("place-order", "🛍️ Place New Order"),
                back_to_main(),
            ],
        ))
    }

    async fn handle_cancel(&self, user: User) -> Result<ChatReply> {
        let Some(order) = self.current_pending(&user).await? else {
            return Ok(ChatReply::new("❌ No order to cancel.", main_options()));
        };

        self.orders
            .update(order.id, Box::new(|o| o.cancel()))
            .await?;
        let order_id = order.id;
        self.users
            .update(
                &user.session_id,
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

        Ok(ChatReply::new(
            "❌ Order cancelled successfully.",
            vec![
                ChatOption::new("place-order", "🛍️ Start New Order"),
                back_to_main(),
            ],
        ))
    }
}

/// The degraded reply for handler-level failures: a generic try-again
/// message with the safe option set, never a raw error.
fn degraded_reply(err: ChatError) -> ChatReply {
    tracing::warn!(error = %err, "chat handler failed, degrading to fallback reply");
    let message = match err {
        ChatError::NotFound(what) => format!("Sorry, {what}. Please pick from the menu."),
        ChatError::InvalidTransition(why) => format!("That is not possible right now: {why}."),
        _ => "Something went wrong on our side. Please try again.".to_string(),
    };
    ChatReply::new(message, main_options())
}
