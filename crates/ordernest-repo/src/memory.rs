use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ordernest_types::domain::order::{Order, OrderListFilter, OrderReceipt};
use ordernest_types::domain::pagination::Pagination;
use ordernest_types::domain::user::{NewUser, User};
use ordernest_types::ports::order_repository::{OrderRepository, RepoError};
use ordernest_types::ports::user_repository::UserRepository;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub orders: Arc<DashMap<String, Order>>,
    pub users: Arc<DashMap<String, User>>,
    next_order_id: Arc<AtomicU64>,
    next_user_id: Arc<AtomicU64>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
            next_order_id: Arc::new(AtomicU64::new(1)),
            next_user_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, mut order: Order) -> Result<OrderReceipt, RepoError> {
        match self.orders.entry(order.consignment_id.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "consignment {} already exists",
                order.consignment_id
            ))),
            Entry::Vacant(slot) => {
                order.id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
                let receipt = order.receipt();
                slot.insert(order);
                Ok(receipt)
            }
        }
    }

    async fn get(&self, consignment_id: &str) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(consignment_id).map(|r| r.clone()))
    }

    async fn cancel(&self, consignment_id: &str, user_id: u64) -> Result<(), RepoError> {
        match self.orders.get_mut(consignment_id) {
            Some(mut order) => {
                order.cancel(user_id);
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn list(
        &self,
        filter: &OrderListFilter,
        page: &Pagination,
    ) -> Result<(Vec<Order>, u64), RepoError> {
        let mut matching: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| filter.matches(kv.value()))
            .map(|kv| kv.value().clone())
            .collect();
        matching.sort_by_key(|o| o.id);

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .collect();
        Ok((data, total))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "username {} already exists",
                user.username
            ))),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let created = User {
                    id: self.next_user_id.fetch_add(1, Ordering::Relaxed),
                    username: user.username,
                    password_hash: user.password_hash,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<User, RepoError> {
        self.users
            .get(username)
            .map(|r| r.clone())
            .ok_or(RepoError::NotFound)
    }

    async fn get_by_id(&self, id: u64) -> Result<User, RepoError> {
        self.users
            .iter()
            .find(|kv| kv.value().id == id)
            .map(|kv| kv.value().clone())
            .ok_or(RepoError::NotFound)
    }
}
