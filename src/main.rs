//! # Storefront Server
//!
//! Server-rendered storefront: product catalog by category, a session cart,
//! user accounts and a small admin area.
//!
//! ## Key Concepts
//! - **Pipeline**: every request passes an ordered list of stages (see `pipeline`)
//! - **Sessions**: stored in SQLite, signed cookie, fixed three-hour lifetime
//! - **View context**: login state, user, cart and categories handed to every page

// Module declarations - organize code into logical components
mod auth; // Signed-in user handle and password hashing
mod breadcrumbs; // Navigation trail built from the request path
mod cart; // Shopping cart kept in the session
mod config; // Configuration management (environment variables, settings)
mod db; // Database operations (categories, products, users)
mod error; // Error handling and custom error types
mod extract; // Form and path extractors with AppError rejections
mod handlers; // HTTP request handlers (routes)
mod logging; // Tracing subscriber setup
mod middleware; // Pipeline stages (auth, context, breadcrumbs, error boundary)
mod pipeline; // Stage order and application assembly
mod routes; // Route groups and their mount prefixes
mod session; // Session store and absolute expiry
mod state; // Shared application state
mod views; // Template rendering

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::state::AppState;

/// Main application entry point
///
/// This function:
/// 1. Loads configuration from environment variables
/// 2. Sets up logging
/// 3. Connects to the database and loads templates
/// 4. Creates the session store and its cleanup task
/// 5. Assembles the request pipeline
/// 6. Serves until SIGINT/SIGTERM, then drains in-flight requests
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_format);
    tracing::info!("Configuration loaded: {:?}", config);

    let bind_addr = config.bind_address();

    // Creates the connection pool, runs migrations and loads templates
    let app_state = AppState::new(config).await?;
    tracing::info!("Application state initialized");

    let session_store = session::store(&app_state.db).await?;
    let cleanup = session::spawn_cleanup(session_store.clone());

    let app = pipeline::assemble(app_state, session_store, routes::mount_table())?;

    tracing::info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}
