use async_trait::async_trait;

use crate::domain::user::{NewUser, User};
use crate::ports::order_repository::RepoError;

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Fails with `RepoError::Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;
    async fn get_by_username(&self, username: &str) -> Result<User, RepoError>;
    async fn get_by_id(&self, id: u64) -> Result<User, RepoError>;
}
