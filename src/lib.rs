pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod credentials;
pub mod db;
pub mod jwt;

use api::create_api_router;
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing session tokens
    pub jwt_secret: Vec<u8>,
    /// Whether logged-out tokens are rejected until they expire
    pub revocation: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));
    create_api_router(config.db.clone(), jwt, config.revocation)
}

/// Run cleanup tasks and spawn background scheduler.
/// Does nothing unless revocation is enabled.
pub async fn init_cleanup(config: &ServerConfig) {
    if !config.revocation {
        return;
    }
    cleanup::run_cleanup(&config.db).await;
    cleanup::spawn_cleanup_scheduler(config.db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    init_cleanup(&config).await;

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    Ok((handle, local_addr))
}
