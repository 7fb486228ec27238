//! Composition root: loads configuration, wires the document-store-backed
//! catalog source and persistence port, and starts the HTTP server.

use std::sync::Arc;

use catalog::http::HttpCatalogSource;
use orchestrator::HttpPersistence;
use server::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::load()?;

    let catalog_source = Arc::new(HttpCatalogSource::new(config.catalog_source_config()));
    let persistence = Arc::new(HttpPersistence::new(config.persistence_config()));

    server::start_server(config, catalog_source, persistence).await
}
