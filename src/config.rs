use crate::domain::errors::{StorageError, StorageResult};

/// Static configuration for the storage backend, read once at startup.
///
/// Every reconnect reuses the same configuration; nothing here changes at
/// runtime.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Host and port of the S3-compatible endpoint, e.g. `localhost:9000`
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Optional prefix prepended to every logical bucket name, namespacing
    /// deployments that share one storage backend
    pub bucket_prefix: Option<String>,
    /// Well-known bucket the liveness probe writes into
    pub health_bucket: String,
    /// The original deployment talks plain HTTP to the endpoint
    pub use_ssl: bool,
}

impl StorageConfig {
    /// Read configuration from the environment (`.env` files supported).
    ///
    /// Required: `STORAGE_ENDPOINT`, `STORAGE_ACCESS_KEY`, `STORAGE_SECRET_KEY`.
    /// Optional: `STORAGE_REGION` (default `us-east-1`), `STORAGE_BUCKET_PREFIX`,
    /// `STORAGE_HEALTH_BUCKET` (default `storage-health`), `STORAGE_USE_SSL`
    /// (default `false`).
    pub fn from_env() -> StorageResult<Self> {
        dotenvy::dotenv().ok();

        let endpoint = require_var("STORAGE_ENDPOINT")?;
        let access_key = require_var("STORAGE_ACCESS_KEY")?;
        let secret_key = require_var("STORAGE_SECRET_KEY")?;

        let region =
            std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let bucket_prefix = std::env::var("STORAGE_BUCKET_PREFIX")
            .ok()
            .filter(|p| !p.is_empty());

        let health_bucket = std::env::var("STORAGE_HEALTH_BUCKET")
            .unwrap_or_else(|_| "storage-health".to_string());

        let use_ssl = std::env::var("STORAGE_USE_SSL")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            region,
            bucket_prefix,
            health_bucket,
            use_ssl,
        })
    }

    /// Base URL of the endpoint, scheme chosen by `use_ssl`
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

fn require_var(name: &str) -> StorageResult<String> {
    std::env::var(name).map_err(|_| StorageError::Configuration {
        message: format!("{} environment variable required", name),
    })
}
