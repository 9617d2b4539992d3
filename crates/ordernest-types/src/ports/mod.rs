pub mod order_repository;
pub mod user_repository;

pub use order_repository::{OrderRepository, RepoError};
pub use user_repository::UserRepository;
