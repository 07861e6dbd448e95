// Storage backend implementations
pub mod memory;
pub mod minio;

// Re-export key types
pub use memory::{InMemoryConnector, InMemoryStore};
pub use minio::{MinioConnector, MinioStore};
