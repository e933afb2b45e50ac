//! Potluck server entry point.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use potluck_api::{AppState, router as api_router};
use potluck_common::Config;
use potluck_db::repositories::{GroupPostRepository, GroupRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "potluck=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting potluck server...");

    // Load configuration
    let config = Config::load().context("loading configuration")?;
    potluck_common::error::set_expose_errors(config.server.expose_errors);

    // Connect to database
    let db = Arc::new(
        potluck_db::init(&config)
            .await
            .context("connecting to database")?,
    );
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    potluck_db::migrate(&db).await.context("running migrations")?;
    info!("Migrations completed");

    // Initialize repositories
    let group_repo = Arc::new(GroupRepository::new(Arc::clone(&db)));
    let group_post_repo = Arc::new(GroupPostRepository::new(Arc::clone(&db)));
    let user_repo = Arc::new(UserRepository::new(Arc::clone(&db)));

    let state = AppState::new(group_repo, group_post_repo, user_repo);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let host: IpAddr = config.server.host.parse().unwrap_or_else(|_| {
        warn!(host = %config.server.host, "Invalid bind host, falling back to 0.0.0.0");
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    });
    let addr = SocketAddr::new(host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
