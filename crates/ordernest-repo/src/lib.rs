#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use ordernest_types::domain::order::{Order, OrderListFilter, OrderReceipt};
use ordernest_types::domain::pagination::Pagination;
use ordernest_types::domain::user::{NewUser, User};
use ordernest_types::ports::order_repository::{OrderRepository, RepoError};
use ordernest_types::ports::user_repository::UserRepository;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub const DEFAULT_SQLITE_URL: &str = "sqlite://ordernest.db";

/// The adapter selected at startup. Orders and users always live in the
/// same backend.
#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        tracing::info!(backend = "memory", "repository ready");
        Ok(Repo::Memory(crate::memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_SQLITE_URL);
        let sqlite = sqlite::SqliteRepo::new(url).await?;
        tracing::info!(backend = "sqlite", "repository ready");
        Ok(Repo::Sqlite(sqlite))
    }

    // With both adapters compiled in, an explicit URL selects SQLite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => {
                let sqlite = sqlite::SqliteRepo::new(url).await?;
                tracing::info!(backend = "sqlite", "repository ready");
                Ok(Repo::Sqlite(sqlite))
            }
            None => {
                tracing::info!(backend = "memory", "repository ready");
                Ok(Repo::Memory(crate::memory::InMemoryRepo::new()))
            }
        }
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<OrderReceipt, RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.create(order).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.create(order).await,
        }
    }

    async fn get(&self, consignment_id: &str) -> Result<Option<Order>, RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.get(consignment_id).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.get(consignment_id).await,
        }
    }

    async fn cancel(&self, consignment_id: &str, user_id: u64) -> Result<(), RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.cancel(consignment_id, user_id).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.cancel(consignment_id, user_id).await,
        }
    }

    async fn list(
        &self,
        filter: &OrderListFilter,
        page: &Pagination,
    ) -> Result<(Vec<Order>, u64), RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.list(filter, page).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.list(filter, page).await,
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for Repo {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.create_user(user).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.create_user(user).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<User, RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.get_by_username(username).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.get_by_username(username).await,
        }
    }

    async fn get_by_id(&self, id: u64) -> Result<User, RepoError> {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r.get_by_id(id).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(r) => r.get_by_id(id).await,
        }
    }
}
