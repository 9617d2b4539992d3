use ordernest_hex::config::Config;
use ordernest_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use ordernest_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for JWT_SECRET_KEY / DATABASE_URL / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(auth = ?config.auth, port = %config.server_port, "configuration loaded");

    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    let state = AppState::from_config(repo, &config.auth);

    if let Some(seed) = &config.seed_user {
        state.auth.ensure_user(&seed.username, &seed.password).await?;
        tracing::info!(username = %seed.username, "seed user ready");
    }

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        request_timeout: config.request_timeout,
    };

    let http = HttpServer::new(state, server_cfg).await?;
    http.run_with_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
