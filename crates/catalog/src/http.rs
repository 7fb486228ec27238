//! HTTP-backed catalog source: lists the full creator catalog from a
//! document store (§4, fourth external collaborator), mirroring the
//! pooled-client pattern used by the vector-index and provider adapters.

use once_cell::sync::Lazy;
use scoring::Creator;

use crate::{CatalogError, CatalogSource};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build shared reqwest client")
});

#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

pub struct HttpCatalogSource {
    config: HttpCatalogConfig,
}

impl HttpCatalogSource {
    pub fn new(config: HttpCatalogConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn list_all(&self) -> Result<Vec<Creator>, CatalogError> {
        let url = format!("{}/creators", self.config.base_url.trim_end_matches('/'));
        let mut builder = HTTP_CLIENT.get(&url);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| CatalogError::SourceUnavailable(err.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|err| CatalogError::SourceUnavailable(err.to_string()))?;
        response
            .json::<Vec<Creator>>()
            .await
            .map_err(|err| CatalogError::SourceUnavailable(format!("malformed catalog response: {err}")))
    }
}
