use super::menu::MenuItem;
use super::money::Amount;
use crate::error::{ChatError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Placed,
    Paid,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// A line on an order. `name` and `price` are snapshotted from the catalog at
/// add time so the line stays renderable and priced even if the menu item is
/// later retired or repriced.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    pub menu_item: u32,
    pub name: String,
    pub price: Amount,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Amount {
        self.price * self.quantity
    }
}

/// The cart/order aggregate.
///
/// `total` is derived from the line items and recomputed on every mutation;
/// it is never an independently trusted field. Status moves along
/// `pending -> {placed, cancelled}` and `placed -> paid` only; `paid` and
/// `cancelled` are terminal.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_session: String,
    pub items: Vec<OrderItem>,
    pub total: Amount,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub placed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(user_session: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_session: user_session.to_string(),
            items: Vec::new(),
            total: Amount::ZERO,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            created_at: Utc::now(),
            placed_at: None,
            paid_at: None,
        }
    }

    pub fn is_open_cart(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one unit of a catalog item, snapshotting its current name and
    /// price. Adding the same item again increments the existing line.
    pub fn add_item(&mut self, item: &MenuItem) -> Result<()> {
        if !self.is_open_cart() {
            return Err(ChatError::InvalidTransition(
                "cannot add items to an order that is no longer pending".to_string(),
            ));
        }
        match self.items.iter_mut().find(|line| line.menu_item == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.items.push(OrderItem {
                menu_item: item.id,
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
            }),
        }
        self.recompute_total();
        Ok(())
    }

    fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .fold(Amount::ZERO, |sum, line| sum + line.line_total());
    }

    /// `pending -> placed`. Re-placing an already placed order is a no-op so
    /// that payment retries do not trip over the transition guard.
    pub fn place(&mut self) -> Result<()> {
        match self.status {
            OrderStatus::Pending => {
                self.status = OrderStatus::Placed;
                self.placed_at = Some(Utc::now());
                Ok(())
            }
            OrderStatus::Placed => Ok(()),
            other => Err(ChatError::InvalidTransition(format!(
                "cannot place an order in status {other:?}"
            ))),
        }
    }

    /// `pending -> cancelled`.
    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            OrderStatus::Pending => {
                self.status = OrderStatus::Cancelled;
                Ok(())
            }
            other => Err(ChatError::InvalidTransition(format!(
                "cannot cancel an order in status {other:?}"
            ))),
        }
    }

    /// `placed -> paid`. Marking an already paid order again is a no-op so
    /// reconciliation stays idempotent under duplicate delivery.
    pub fn mark_paid(&mut self) -> Result<()> {
        match self.status {
            OrderStatus::Paid => Ok(()),
            OrderStatus::Placed => {
                self.status = OrderStatus::Paid;
                self.payment_status = PaymentStatus::Success;
                self.paid_at = Some(Utc::now());
                Ok(())
            }
            other => Err(ChatError::InvalidTransition(format!(
                "cannot pay an order in status {other:?}"
            ))),
        }
    }

    pub fn mark_payment_failed(&mut self) {
        self.payment_status = PaymentStatus::Failed;
    }

    /// Sort key for history listings: newest first by `placed_at`, falling
    /// back to `created_at` when the order was never placed.
    pub fn history_timestamp(&self) -> DateTime<Utc> {
        self.placed_at.unwrap_or(self.created_at)
    }
}

/// Orders newest-first for history listings.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.history_timestamp().cmp(&a.history_timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::menu::sample_menu;

    fn jollof() -> MenuItem {
        sample_menu().into_iter().find(|i| i.id == 1).unwrap()
    }

    #[test]
    fn test_add_same_item_accumulates_quantity() {
        let mut order = Order::new("session-1");
        let item = jollof();
        order.add_item(&item).unwrap();
        order.add_item(&item).unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.total, Amount::naira(5000));
    }

    #[test]
    fn test_total_tracks_line_items() {
        let mut order = Order::new("session-1");
        let menu = sample_menu();
        order.add_item(&menu[0]).unwrap(); // 2500
        order.add_item(&menu[4]).unwrap(); // 800
        order.add_item(&menu[4]).unwrap(); // 800

        let expected = order
            .items
            .iter()
            .fold(Amount::ZERO, |sum, line| sum + line.line_total());
        assert_eq!(order.total, expected);
        assert_eq!(order.total, Amount::naira(4100));
    }

    #[test]
    fn test_quantity_increment_saturates() {
        let mut order = Order::new("session-1");
        order.add_item(&jollof()).unwrap();
        order.items[0].quantity = u32::MAX;

        order.add_item(&jollof()).unwrap();
        assert_eq!(order.items[0].quantity, u32::MAX);
    }

    #[test]
    fn test_line_snapshots_survive_catalog_changes() {
        let mut order = Order::new("session-1");
        let mut item = jollof();
        order.add_item(&item).unwrap();

        item.name = "Renamed".to_string();
        item.price = Amount::naira(9999);

        assert_eq!(order.items[0].name, "Jollof Rice with Chicken");
        assert_eq!(order.items[0].price, Amount::naira(2500));
    }

    #[test]
    fn test_add_rejected_once_placed() {
        let mut order = Order::new("session-1");
        order.add_item(&jollof()).unwrap();
        order.place().unwrap();

        assert!(matches!(
            order.add_item(&jollof()),
            Err(ChatError::InvalidTransition(_))
        ));
        assert_eq!(order.items[0].quantity, 1);
    }

    #[test]
    fn test_status_is_monotone() {
        let mut order = Order::new("session-1");
        order.add_item(&jollof()).unwrap();
        order.place().unwrap();
        order.mark_paid().unwrap();

        assert!(order.cancel().is_err());
        assert_eq!(order.status, OrderStatus::Paid);

        // Paying again is a tolerated no-op, not a regression.
        let paid_at = order.paid_at;
        order.mark_paid().unwrap();
        assert_eq!(order.paid_at, paid_at);
    }

    #[test]
    fn test_cancel_only_from_pending() {
        let mut order = Order::new("session-1");
        order.cancel().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.place().is_err());
        assert!(order.mark_paid().is_err());
    }

    #[test]
    fn test_payment_failure_keeps_order_retryable() {
        let mut order = Order::new("session-1");
        order.add_item(&jollof()).unwrap();
        order.place().unwrap();
        order.mark_payment_failed();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert!(order.mark_paid().is_ok());
    }

    #[test]
    fn test_history_sort_falls_back_to_created_at() {
        let mut a = Order::new("s");
        let mut b = Order::new("s");
        b.created_at = a.created_at + chrono::Duration::seconds(10);
        a.placed_at = Some(a.created_at + chrono::Duration::seconds(60));

        let mut orders = vec![b.clone(), a.clone()];
        sort_newest_first(&mut orders);
        // a was placed after b was created, so a sorts first.
        assert_eq!(orders[0].id, a.id);
        assert_eq!(orders[1].id, b.id);
    }
}
