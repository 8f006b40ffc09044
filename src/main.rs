//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Initializes the database
//! - Starts the HTTP server with graceful shutdown support

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use urlvault::config::Settings;
use urlvault::database::{init_db, AppState};
use urlvault::route::create_app;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    let settings = Settings::from_env().expect("Invalid configuration");

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let db = init_db(&settings.database_path).expect("Failed to initialize database");

    let addr = format!("0.0.0.0:{}", settings.port);
    tracing::info!(
        database = %settings.database_path,
        prefix = %settings.short_url_prefix,
        auth_secret = settings.api_secret.is_some(),
        "starting server on {addr}"
    );

    let app = create_app(AppState::new(db, settings)).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind address");

    // Serve until SIGTERM or SIGINT, letting in-flight requests finish
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, stopping server");
}
