use std::{net::Ipv4Addr, process::ExitCode, sync::Arc};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use taskbees::{config::ServerConfig, create_app, db, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskbees=info,tower_http=info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let db = match db::init_db(&config.database) {
        Ok(db) => db,
        Err(err) => {
            error!(path = %config.database.display(), "initializing database: {err}");
            return ExitCode::FAILURE;
        }
    };
    match db::cleanup_expired_sessions(&db) {
        Ok(removed) => info!(removed, "Removed expired sessions"),
        Err(err) => error!(?err, "Failed to clean up sessions"),
    }

    let state = AppState {
        db,
        base_path: Arc::new(config.base_path),
    };
    let app = create_app(state);
    let addr = (Ipv4Addr::UNSPECIFIED, config.port);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(port = config.port, "failed to bind: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("running on {addr:?}");

    if let Err(err) = axum::serve(listener, app).await {
        error!("failed serving: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
