//! Orchestrates a single match call across the vector index, embedding,
//! completion, persistence, and catalog collaborators, with the resilience
//! fabric wrapped around every outbound call (§4.7).

pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod persistence;

pub use config::{Deadlines, OrchestratorConfig};
pub use engine::MatchOrchestrator;
pub use error::MatchEngineError;
pub use health::{DependencyHealth, HealthAggregator, HealthReport, OverallStatus};
pub use persistence::{HttpPersistence, HttpPersistenceConfig, NoopPersistence, PersistencePort};
