pub mod order;
pub mod pagination;
pub mod pricing;
pub mod user;
pub mod validation;
