mod auth;
mod handlers;
mod server;

pub use auth::AuthUser;
pub use server::{AppState, HttpServer, HttpServerConfig};
