use crate::domain::menu::MenuItem;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{MenuStore, OrderMutation, OrderStore, UserMutation, UserStore};
use crate::domain::user::User;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for the menu catalog.
pub const CF_MENU: &str = "menu";
/// Column Family for session records.
pub const CF_USERS: &str = "users";
/// Column Family for orders.
pub const CF_ORDERS: &str = "orders";

/// A persistent store implementation using RocksDB.
///
/// One database, one Column Family per entity, values encoded as JSON.
/// `Clone` shares the underlying `Arc<DB>`. Read-modify-write operations
/// (`update`, `get_or_create`) are serialized through `write_guard`; RocksDB
/// point writes alone would not make those atomic.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring the
    /// required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_MENU, Options::default()),
            ColumnFamilyDescriptor::new(CF_USERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ORDERS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ChatError::persistence(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }

    fn put_json<T: serde::Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        self.db.put_cf(&cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_cf(&cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_orders(&self) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            orders.push(serde_json::from_slice(&value)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl MenuStore for RocksDbStore {
    async fn seed(&self, items: Vec<MenuItem>) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let cf = self.cf(CF_MENU)?;
        let already_seeded = self
            .db
            .iterator_cf(&cf, rocksdb::IteratorMode::Start)
            .next()
            .is_some();
        if already_seeded {
            tracing::debug!("menu already seeded, skipping");
            return Ok(());
        }
        for item in items {
            self.put_json(CF_MENU, &item.id.to_be_bytes(), &item)?;
        }
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let cf = self.cf(CF_MENU)?;
        let mut categories = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let item: MenuItem = serde_json::from_slice(&value)?;
            if !categories.contains(&item.category) {
                categories.push(item.category);
            }
        }
        Ok(categories)
    }

    async fn items_in(&self, category: &str) -> Result<Vec<MenuItem>> {
        let cf = self.cf(CF_MENU)?;
        let mut items = Vec::new();
        for entry in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = entry?;
            let item: MenuItem = serde_json::from_slice(&value)?;
            if item.available && item.category == category {
                items.push(item);
            }
        }
        Ok(items)
    }

    async fn get(&self, id: u32) -> Result<Option<MenuItem>> {
        self.get_json(CF_MENU, &id.to_be_bytes())
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn get_or_create(&self, session_id: &str) -> Result<User> {
        let _guard = self.write_guard.lock().await;
        if let Some(user) = self.get_json::<User>(CF_USERS, session_id.as_bytes())? {
            return Ok(user);
        }
        let user = User::new(session_id);
        self.put_json(CF_USERS, session_id.as_bytes(), &user)?;
        Ok(user)
    }

    async fn get(&self, session_id: &str) -> Result<Option<User>> {
        self.get_json(CF_USERS, session_id.as_bytes())
    }

    async fn store(&self, user: User) -> Result<()> {
        self.put_json(CF_USERS, user.session_id.as_bytes(), &user)
    }

    async fn update(&self, session_id: &str, mutation: UserMutation) -> Result<User> {
        let _guard = self.write_guard.lock().await;
        let mut user: User = self
            .get_json(CF_USERS, session_id.as_bytes())?
            .ok_or_else(|| ChatError::NotFound("user".to_string()))?;
        mutation(&mut user)?;
        self.put_json(CF_USERS, session_id.as_bytes(), &user)?;
        Ok(user)
    }
}

#[async_trait]
impl OrderStore for RocksDbStore {
    async fn store(&self, order: Order) -> Result<()> {
        self.put_json(CF_ORDERS, order.id.as_bytes(), &order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, id.as_bytes())
    }

    async fn update(&self, id: Uuid, mutation: OrderMutation) -> Result<Order> {
        let _guard = self.write_guard.lock().await;
        let mut order: Order = self
            .get_json(CF_ORDERS, id.as_bytes())?
            .ok_or_else(|| ChatError::NotFound("order".to_string()))?;
        mutation(&mut order)?;
        self.put_json(CF_ORDERS, id.as_bytes(), &order)?;
        Ok(order)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        Ok(self
            .scan_orders()?
            .into_iter()
            .find(|o| o.payment_reference.as_deref() == Some(reference)))
    }

    async fn history_for(&self, session_id: &str) -> Result<Vec<Order>> {
        Ok(self
            .scan_orders()?
            .into_iter()
            .filter(|o| {
                o.user_session == session_id
                    && matches!(o.status, OrderStatus::Placed | OrderStatus::Paid)
            })
            .collect())
    }
}
