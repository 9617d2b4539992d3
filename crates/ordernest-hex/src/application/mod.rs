pub mod auth_service;
pub mod credentials;
pub mod order_service;
pub mod token_service;
