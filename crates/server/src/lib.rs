//! HTTP REST API for the creator matching engine.
//!
//! - **Matching**: `POST /matches` — rank creators against a content brief
//! - **Health**: `GET /health` — live dependency rollup from the resilience
//!   layer's circuit breakers
//! - **Middleware**: request ID tracking, structured logging, compression,
//!   CORS, optional API-key authentication
//! - **Configuration**: environment-variable driven, see [`config::EngineConfig`]
//! - **Graceful shutdown**: SIGTERM / Ctrl+C
//!
//! ```rust,no_run
//! use server::EngineConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::load()?;
//!     // A real deployment supplies a document-store-backed CatalogSource
//!     // and a PersistencePort; this snippet elides their construction.
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::EngineConfig;
pub use error::{ServerError, ServerResult};
pub use server::start_server;
pub use state::ServerState;
