use super::menu::MenuItem;
use super::money::Amount;
use super::order::Order;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handles to the storage backends. The backend (in-memory or
/// persistent) is selected once at startup; handlers only ever see these
/// ports.
pub type MenuStoreRef = Arc<dyn MenuStore>;
pub type UserStoreRef = Arc<dyn UserStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type PaymentProviderRef = Arc<dyn PaymentProvider>;

/// A single serialized mutation of one order. Implementations apply it under
/// a per-store write discipline so concurrent read-modify-write calls against
/// the same order cannot lose updates.
pub type OrderMutation = Box<dyn FnOnce(&mut Order) -> Result<()> + Send>;

/// Same discipline for session records. Cart attachment and detachment go
/// through this, so a handler holding a stale user snapshot cannot overwrite
/// a concurrent attach or detach.
pub type UserMutation = Box<dyn FnOnce(&mut User) -> Result<()> + Send>;

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Idempotent: if any items already exist, the seed is skipped.
    async fn seed(&self, items: Vec<MenuItem>) -> Result<()>;
    async fn categories(&self) -> Result<Vec<String>>;
    /// Available items in a category, in catalog order.
    async fn items_in(&self, category: &str) -> Result<Vec<MenuItem>>;
    async fn get(&self, id: u32) -> Result<Option<MenuItem>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Safe under concurrent first-contact requests for the same session id:
    /// exactly one record is created, racers fetch the existing one.
    async fn get_or_create(&self, session_id: &str) -> Result<User>;
    async fn get(&self, session_id: &str) -> Result<Option<User>>;
    async fn store(&self, user: User) -> Result<()>;
    /// Applies `mutation` atomically and returns the updated user.
    /// If the mutation fails, the stored record is left unchanged.
    async fn update(&self, session_id: &str, mutation: UserMutation) -> Result<User>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>>;
    /// Applies `mutation` atomically and returns the updated order.
    /// If the mutation fails, the stored order is left unchanged.
    async fn update(&self, id: Uuid, mutation: OrderMutation) -> Result<Order>;
    /// The unique order carrying this payment reference, if any.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>>;
    /// The session's placed and paid orders, unsorted.
    async fn history_for(&self, session_id: &str) -> Result<Vec<Order>>;
}

/// What the coordinator asks an external gateway to charge.
#[derive(Debug, Clone)]
pub struct ProviderCharge {
    pub reference: String,
    pub amount: Amount,
    pub callback_url: String,
}

/// The gateway's handle for an initiated payment: where to send the user,
/// under which correlation reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIntent {
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderOutcome {
    Success,
    Failed,
    Pending,
}

/// An external payment gateway.
///
/// `verify` is the authoritative outcome check for references issued by this
/// provider; the coordinator never trusts a client-supplied claim for an
/// authoritative provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn initialize(&self, charge: ProviderCharge) -> Result<ProviderIntent>;
    async fn verify(&self, reference: &str) -> Result<ProviderOutcome>;
}
