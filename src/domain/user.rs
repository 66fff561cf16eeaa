use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat session's durable record.
///
/// `session_id` is an opaque client-generated token, not a credential. The
/// record is created lazily on first contact and never deleted.
/// `current_order` points at the one pending cart (if any); it is cleared on
/// cancel and on successful payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub session_id: String,
    pub current_order: Option<Uuid>,
    pub order_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl User {
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            current_order: None,
            order_history: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn remember_order(&mut self, order_id: Uuid) {
        if !self.order_history.contains(&order_id) {
            self.order_history.push(order_id);
        }
    }
}
