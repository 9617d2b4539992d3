use async_trait::async_trait;

use crate::domain::order::{Order, OrderListFilter, OrderReceipt};
use crate::domain::pagination::Pagination;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists a new order atomically; the consignment id is already set.
    async fn create(&self, order: Order) -> Result<OrderReceipt, RepoError>;
    async fn get(&self, consignment_id: &str) -> Result<Option<Order>, RepoError>;
    /// Marks the order canceled. `RepoError::NotFound` when no order has
    /// this consignment id.
    async fn cancel(&self, consignment_id: &str, user_id: u64) -> Result<(), RepoError>;
    /// Returns one page of matching orders plus the total match count.
    async fn list(
        &self,
        filter: &OrderListFilter,
        page: &Pagination,
    ) -> Result<(Vec<Order>, u64), RepoError>;
}
