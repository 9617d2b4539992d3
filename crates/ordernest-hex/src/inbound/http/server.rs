use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::{serve, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers;
use crate::application::auth_service::AuthService;
use crate::application::credentials::CredentialVerifier;
use crate::application::order_service::OrderService;
use crate::application::token_service::TokenService;
use crate::config::AuthConfig;
use ordernest_types::ports::order_repository::OrderRepository;
use ordernest_types::ports::user_repository::UserRepository;

#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub request_timeout: Duration,
}

/// Services shared by every handler. Both services run on the same
/// repository handle.
pub struct AppState<R>
where
    R: OrderRepository + UserRepository,
{
    pub orders: Arc<OrderService<R>>,
    pub auth: Arc<AuthService<R>>,
    pub tokens: Arc<TokenService>,
}

impl<R> Clone for AppState<R>
where
    R: OrderRepository + UserRepository,
{
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            auth: Arc::clone(&self.auth),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<R> AppState<R>
where
    R: OrderRepository + UserRepository + Clone,
{
    pub fn from_config(repo: R, auth: &AuthConfig) -> Self {
        let tokens = Arc::new(TokenService::new(auth));
        let credentials = CredentialVerifier::new(auth.bcrypt_cost);
        Self {
            orders: Arc::new(OrderService::new(repo.clone())),
            auth: Arc::new(AuthService::new(repo, credentials, Arc::clone(&tokens))),
            tokens,
        }
    }
}

impl<R> FromRef<AppState<R>> for Arc<TokenService>
where
    R: OrderRepository + UserRepository,
{
    fn from_ref(state: &AppState<R>) -> Self {
        Arc::clone(&state.tokens)
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    /// Builds the router and binds the listener. Port `0` picks a free port;
    /// see [`HttpServer::local_addr`].
    pub async fn new<R>(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self>
    where
        R: OrderRepository + UserRepository,
    {
        let router = router(state, config.request_timeout);
        let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("starting server on {}", self.listener.local_addr()?);
        serve(self.listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

fn router<R>(state: AppState<R>, request_timeout: Duration) -> Router
where
    R: OrderRepository + UserRepository,
{
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            let request_id = Uuid::new_v4();
            tracing::info_span!(
                "http_request",
                %request_id,
                method = %request.method(),
                uri
            )
        })
        .on_request(|request: &axum::extract::Request<_>, span: &tracing::Span| {
            tracing::info!(
                parent: span,
                method = %request.method(),
                uri = %request.uri(),
                "request"
            );
        })
        .on_response(
            |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                tracing::info!(
                    parent: span,
                    status = %response.status(),
                    latency_ms = %latency.as_millis(),
                    "response"
                );
            },
        );

    let api = Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/logout", get(handlers::logout))
        .route("/orders", post(handlers::create_order::<R>))
        .route("/orders/all", get(handlers::list_orders::<R>))
        .route("/orders/{consignment_id}", get(handlers::get_order::<R>))
        .route(
            "/orders/{consignment_id}/cancel",
            put(handlers::cancel_order::<R>),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .with_state(state)
}
