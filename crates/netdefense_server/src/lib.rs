//! # NetDefense Server
//!
//! Thin HTTP layer over the game core.
//!
//! Each request identifies its player, loads that player's document,
//! runs one engine operation, and writes the document back with
//! compare-and-set. Players never share state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
pub mod store;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError};
pub use service::GameService;
pub use store::{MemoryStore, PlayerStore};

/// Load game data, bind, and serve until the process exits.
///
/// # Errors
///
/// Returns [`ServerError`] if game data fails to load or the socket fails.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let engine = config.load_engine()?;
    let service = GameService::new(engine, MemoryStore::new(), config.seed);
    let app = api::build_router(service);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
