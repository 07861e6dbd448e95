use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::{
    errors::StorageResult,
    value_objects::{BucketName, ObjectKey},
};

/// Port for bucket-aware blob storage operations.
/// This abstracts the actual backend (MinIO, S3, in-memory fakes).
///
/// All bucket names arriving here are already fully resolved; prefix
/// translation is the facade's job and happens exactly once per call.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool>;

    /// Create a bucket; creating an existing bucket is not an error
    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &BucketName) -> StorageResult<()>;

    /// Store object data
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
    ) -> StorageResult<PutReceipt>;

    /// Retrieve full object data
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes>;

    /// Delete an object
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()>;

    /// Probe object metadata without retrieving data
    async fn head_object(&self, bucket: &BucketName, key: &ObjectKey)
        -> StorageResult<ObjectEntry>;

    /// List up to `limit` objects in a bucket.
    ///
    /// Callers drain a bucket by alternating list and delete until a page
    /// comes back empty, so no continuation token is needed.
    async fn list_page(&self, bucket: &BucketName, limit: usize) -> StorageResult<Vec<ObjectEntry>>;

    /// Server-side copy between (possibly different) buckets
    async fn copy_object(
        &self,
        src_bucket: &BucketName,
        src_key: &ObjectKey,
        dest_bucket: &BucketName,
        dest_key: &ObjectKey,
    ) -> StorageResult<()>;

    /// Generate a time-limited direct-access URL for a GET of the object
    async fn presigned_get_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String>;
}

/// Port for opening connections to a storage backend.
///
/// The facade calls this once at startup and again on every reconnect;
/// implementations build a fresh handle from static configuration each time.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> StorageResult<Arc<dyn BlobStore>>;
}

/// Information about an object in storage
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub key: ObjectKey,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
}

/// Descriptor returned by a successful upload
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PutReceipt {
    pub size: u64,
    pub etag: Option<String>,
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_receipt_serializes_for_callers() {
        // Document services persist the receipt alongside their metadata
        let receipt = PutReceipt {
            size: 11,
            etag: Some("5eb63bbbe01eeed093cb22bb8f5acdc3".to_string()),
            version: None,
        };

        let json = serde_json::to_string(&receipt).unwrap();
        assert!(json.contains("\"size\":11"));

        let back: PutReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.size, receipt.size);
        assert_eq!(back.etag, receipt.etag);
    }
}
