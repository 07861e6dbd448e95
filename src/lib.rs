//! Tenant-aware facade over an S3-compatible blob store.
//!
//! [`StorageClient`] exposes bucket-prefixed CRUD operations (put, get,
//! delete, existence checks, presigned URLs, copy, move, bucket teardown)
//! with bounded retry and reconnect-on-failure. The client is an explicit,
//! injectable value; substitute the backend through the [`Connector`] port
//! for testing.

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;

// Re-export key types for convenience

pub use client::StorageClient;
pub use config::StorageConfig;

// Domain types - value objects and errors
pub use domain::{BucketName, ObjectKey, StorageError, StorageResult, ValidationError};

// Port types - interfaces for storage backends
pub use ports::{BlobStore, Connector, ObjectEntry, PutReceipt};

// Adapter types - backend implementations
pub use adapters::{InMemoryConnector, InMemoryStore, MinioConnector, MinioStore};
