use crate::domain::menu::MenuItem;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{MenuStore, OrderMutation, OrderStore, UserMutation, UserStore};
use crate::domain::user::User;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory menu catalog.
///
/// A `BTreeMap` keyed by item id keeps listings in stable catalog order.
/// Seed-once, then read-only in the hot path.
#[derive(Default, Clone)]
pub struct InMemoryMenuStore {
    items: Arc<RwLock<BTreeMap<u32, MenuItem>>>,
}

impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MenuStore for InMemoryMenuStore {
    async fn seed(&self, items: Vec<MenuItem>) -> Result<()> {
        let mut catalog = self.items.write().await;
        if !catalog.is_empty() {
            tracing::debug!("menu already seeded, skipping");
            return Ok(());
        }
        for item in items {
            catalog.insert(item.id, item);
        }
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let catalog = self.items.read().await;
        let mut categories = Vec::new();
        for item in catalog.values() {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        Ok(categories)
    }

    async fn items_in(&self, category: &str) -> Result<Vec<MenuItem>> {
        let catalog = self.items.read().await;
        Ok(catalog
            .values()
            .filter(|item| item.available && item.category == category)
            .cloned()
            .collect())
    }

    async fn get(&self, id: u32) -> Result<Option<MenuItem>> {
        let catalog = self.items.read().await;
        Ok(catalog.get(&id).cloned())
    }
}

/// In-memory session store.
///
/// `get_or_create` runs under the write lock, so two simultaneous first
/// contacts for one session id resolve to a single record.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_or_create(&self, session_id: &str) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .entry(session_id.to_string())
            .or_insert_with(|| User::new(session_id));
        Ok(user.clone())
    }

    async fn get(&self, session_id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(session_id).cloned())
    }

    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.session_id.clone(), user);
        Ok(())
    }

    async fn update(&self, session_id: &str, mutation: UserMutation) -> Result<User> {
        let mut users = self.users.write().await;
        let current = users
            .get(session_id)
            .ok_or_else(|| ChatError::NotFound("user".to_string()))?;
        let mut candidate = current.clone();
        mutation(&mut candidate)?;
        users.insert(session_id.to_string(), candidate.clone());
        Ok(candidate)
    }
}

/// In-memory order store.
///
/// `update` applies the mutation while holding the write lock, which
/// serializes concurrent read-modify-write calls against the same order.
/// The mutation runs on a copy and commits only on success, so a failed
/// transition leaves the stored order untouched.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn store(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, mutation: OrderMutation) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&id)
            .ok_or_else(|| ChatError::NotFound("order".to_string()))?;
        let mut candidate = current.clone();
        mutation(&mut candidate)?;
        orders.insert(id, candidate.clone());
        Ok(candidate)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn history_for(&self, session_id: &str) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| {
                o.user_session == session_id
                    && matches!(o.status, OrderStatus::Placed | OrderStatus::Paid)
            })
            .cloned()
            .collect())
    }
}
