use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::{
    adapters::minio::MinioConnector,
    config::StorageConfig,
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{BlobStore, Connector, PutReceipt},
};

/// Upload retry ceiling
const PUT_ATTEMPTS: u32 = 3;
/// Retrieval gets a single attempt; failure still reconnects before giving up
const GET_ATTEMPTS: u32 = 1;
/// Presigned URL generation retry ceiling
const PRESIGN_ATTEMPTS: u32 = 10;
/// Fixed pause between attempts; no backoff
const RETRY_PAUSE: Duration = Duration::from_secs(1);
/// Page size for draining a bucket before deleting it
const REMOVE_PAGE_SIZE: usize = 1000;

/// Fingerprint object written by the liveness probe
const HEALTH_KEY: &str = "txtxtxtxt1";
const HEALTH_PAYLOAD: &[u8] = b"_t@@@1";

/// Tenant-aware facade over an S3-compatible blob store.
///
/// Owned by the composing application and shared by `Arc`; there is no
/// global instance. Every operation resolves the configured bucket prefix
/// exactly once, then runs against the current connection under the
/// operation's retry ceiling. A failed attempt logs, swaps in a freshly
/// opened connection, pauses a fixed second, and tries again until the
/// budget is spent.
///
/// The connection handle is an immutable `Arc` swapped under a lock, so an
/// in-flight operation either keeps the handle it already cloned or sees
/// the replacement; it never observes a half-closed connection.
///
/// `tenant_id` parameters are recorded in logs for traceability but do not
/// route or namespace calls at this layer.
pub struct StorageClient {
    connector: Arc<dyn Connector>,
    connection: RwLock<Option<Arc<dyn BlobStore>>>,
    bucket_prefix: Option<String>,
    health_bucket: String,
}

impl StorageClient {
    /// Build a client over any connector.
    ///
    /// The initial connection attempt happens here; failure is logged and
    /// the client starts disconnected, retrying the open on first use.
    pub async fn new(
        connector: Arc<dyn Connector>,
        bucket_prefix: Option<String>,
        health_bucket: impl Into<String>,
    ) -> Self {
        let client = Self {
            connector,
            connection: RwLock::new(None),
            bucket_prefix,
            health_bucket: health_bucket.into(),
        };

        if let Err(e) = client.reconnect().await {
            error!(error = %e, "Failed to open storage connection; will retry on first use");
        }

        client
    }

    /// Build a client against an S3-compatible endpoint
    pub async fn connect(config: StorageConfig) -> Self {
        let bucket_prefix = config.bucket_prefix.clone();
        let health_bucket = config.health_bucket.clone();
        Self::new(
            Arc::new(MinioConnector::new(config)),
            bucket_prefix,
            health_bucket,
        )
        .await
    }

    /// Build a client from `STORAGE_*` environment variables
    pub async fn from_env() -> StorageResult<Self> {
        Ok(Self::connect(StorageConfig::from_env()?).await)
    }

    /// Apply the deployment prefix to a logical bucket name
    fn resolve(&self, logical: &str) -> StorageResult<BucketName> {
        Ok(BucketName::resolve(self.bucket_prefix.as_deref(), logical)?)
    }

    /// Current connection, opening one if the client is disconnected
    async fn connection(&self) -> StorageResult<Arc<dyn BlobStore>> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }
        self.reconnect().await
    }

    /// Discard the current handle and open a fresh one from the same
    /// configuration. The swap happens under the write lock; readers that
    /// already cloned the old `Arc` finish their call on it undisturbed.
    async fn reconnect(&self) -> StorageResult<Arc<dyn BlobStore>> {
        let mut guard = self.connection.write().await;
        match self.connector.connect().await {
            Ok(fresh) => {
                *guard = Some(fresh.clone());
                Ok(fresh)
            }
            Err(e) => {
                *guard = None;
                Err(e)
            }
        }
    }

    /// Run `call` up to `attempts` times. Not-found and validation errors
    /// return immediately; anything else logs, reconnects, pauses, and
    /// retries until the budget is exhausted.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        attempts: u32,
        mut call: F,
    ) -> StorageResult<T>
    where
        F: FnMut(Arc<dyn BlobStore>) -> Fut,
        Fut: std::future::Future<Output = StorageResult<T>>,
    {
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            // A failed connection open already counts as this attempt's
            // reconnect; don't open twice.
            let (outcome, reconnect_pending) = match self.connection().await {
                Ok(conn) => (call(conn).await, true),
                Err(e) => (Err(e), false),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_not_found() || e.is_permanent() => return Err(e),
                Err(e) => {
                    warn!(
                        operation,
                        attempt,
                        error = %e,
                        "Storage operation failed; reconnecting"
                    );
                    last_error = e.to_string();

                    if reconnect_pending {
                        if let Err(reconnect_err) = self.reconnect().await {
                            warn!(operation, error = %reconnect_err, "Reconnect failed");
                        }
                    }

                    sleep(RETRY_PAUSE).await;
                }
            }
        }

        error!(
            operation,
            attempts,
            last_error = %last_error,
            "Storage operation exhausted its retry budget"
        );
        Err(StorageError::Unavailable {
            attempts,
            message: last_error,
        })
    }

    /// Liveness probe: write a small fixed fingerprint object into the
    /// well-known health bucket, creating the bucket if absent. No retry.
    pub async fn health(&self) -> StorageResult<PutReceipt> {
        let bucket = self.resolve(&self.health_bucket)?;
        let key = ObjectKey::new(HEALTH_KEY.to_string())?;

        let conn = self.connection().await?;
        if !conn.bucket_exists(&bucket).await? {
            conn.create_bucket(&bucket).await?;
        }
        conn.put_object(&bucket, &key, Bytes::from_static(HEALTH_PAYLOAD))
            .await
    }

    /// Upload bytes under `bucket`/`key`, creating the bucket if absent.
    /// Retries up to 3 attempts total.
    pub async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        tenant_id: Option<&str>,
    ) -> StorageResult<PutReceipt> {
        let bucket = self.resolve(bucket)?;
        let key = ObjectKey::new(key.to_string())?;
        debug!(bucket = %bucket, key = %key, tenant = tenant_id, size = data.len(), "put object");

        self.with_retry("put", PUT_ATTEMPTS, |conn| {
            let bucket = bucket.clone();
            let key = key.clone();
            let data = data.clone();
            async move {
                if !conn.bucket_exists(&bucket).await? {
                    conn.create_bucket(&bucket).await?;
                }
                conn.put_object(&bucket, &key, data).await
            }
        })
        .await
    }

    /// Delete an object; best effort, single attempt. Deleting an object
    /// that is already gone succeeds.
    pub async fn rm(&self, bucket: &str, key: &str, tenant_id: Option<&str>) -> StorageResult<()> {
        let bucket = self.resolve(bucket)?;
        let key = ObjectKey::new(key.to_string())?;
        debug!(bucket = %bucket, key = %key, tenant = tenant_id, "remove object");

        let conn = self.connection().await?;
        match conn.delete_object(&bucket, &key).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                warn!(bucket = %bucket, key = %key, error = %e, "Failed to remove object");
                Err(e)
            }
        }
    }

    /// Retrieve full object content. Single attempt; a transient failure
    /// still triggers a reconnect before the error surfaces, so the next
    /// call starts on a fresh connection.
    pub async fn get(
        &self,
        bucket: &str,
        key: &str,
        tenant_id: Option<&str>,
    ) -> StorageResult<Bytes> {
        let bucket = self.resolve(bucket)?;
        let key = ObjectKey::new(key.to_string())?;
        debug!(bucket = %bucket, key = %key, tenant = tenant_id, "get object");

        self.with_retry("get", GET_ATTEMPTS, |conn| {
            let bucket = bucket.clone();
            let key = key.clone();
            async move { conn.get_object(&bucket, &key).await }
        })
        .await
    }

    /// Whether the object exists. Absent bucket or key is a clean `false`.
    pub async fn obj_exist(
        &self,
        bucket: &str,
        key: &str,
        tenant_id: Option<&str>,
    ) -> StorageResult<bool> {
        let bucket = self.resolve(bucket)?;
        let key = ObjectKey::new(key.to_string())?;
        debug!(bucket = %bucket, key = %key, tenant = tenant_id, "probe object");

        let conn = self.connection().await?;
        if !conn.bucket_exists(&bucket).await? {
            return Ok(false);
        }

        match conn.head_object(&bucket, &key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => {
                warn!(bucket = %bucket, key = %key, error = %e, "Existence probe failed");
                Err(e)
            }
        }
    }

    /// Whether the bucket exists
    pub async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let bucket = self.resolve(bucket)?;

        let conn = self.connection().await?;
        match conn.bucket_exists(&bucket).await {
            Ok(exists) => Ok(exists),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => {
                warn!(bucket = %bucket, error = %e, "Bucket probe failed");
                Err(e)
            }
        }
    }

    /// Generate a time-limited direct-access GET URL for an object.
    /// Retries up to 10 attempts total.
    pub async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        tenant_id: Option<&str>,
    ) -> StorageResult<String> {
        let bucket = self.resolve(bucket)?;
        let key = ObjectKey::new(key.to_string())?;
        debug!(bucket = %bucket, key = %key, tenant = tenant_id, "presign object url");

        self.with_retry("get_presigned_url", PRESIGN_ATTEMPTS, |conn| {
            let bucket = bucket.clone();
            let key = key.clone();
            async move { conn.presigned_get_url(&bucket, &key, expires_in).await }
        })
        .await
    }

    /// Delete a bucket and everything in it. The listing is drained in
    /// fixed-size pages rather than one unbounded enumeration. Removing an
    /// absent bucket is a no-op.
    pub async fn remove_bucket(&self, bucket: &str) -> StorageResult<()> {
        let bucket = self.resolve(bucket)?;
        debug!(bucket = %bucket, "remove bucket");

        let conn = self.connection().await?;
        if !conn.bucket_exists(&bucket).await? {
            return Ok(());
        }

        loop {
            let page = conn.list_page(&bucket, REMOVE_PAGE_SIZE).await?;
            if page.is_empty() {
                break;
            }
            for entry in &page {
                conn.delete_object(&bucket, &entry.key).await?;
            }
            if page.len() < REMOVE_PAGE_SIZE {
                break;
            }
        }

        conn.delete_bucket(&bucket).await
    }

    /// Server-side copy. Ensures the destination bucket exists and verifies
    /// the source object before issuing the copy; an absent source is an
    /// `ObjectNotFound` error, not a retryable failure.
    pub async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> StorageResult<()> {
        let src_bucket = self.resolve(src_bucket)?;
        let src_key = ObjectKey::new(src_key.to_string())?;
        let dest_bucket = self.resolve(dest_bucket)?;
        let dest_key = ObjectKey::new(dest_key.to_string())?;

        self.copy_resolved(&src_bucket, &src_key, &dest_bucket, &dest_key)
            .await
    }

    /// Copy, then delete the source — but only if the copy succeeded.
    /// (`move` is a keyword, hence `mv`.)
    pub async fn mv(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> StorageResult<()> {
        // Resolve once here; the inner copy works on resolved names
        let src_bucket = self.resolve(src_bucket)?;
        let src_key = ObjectKey::new(src_key.to_string())?;
        let dest_bucket = self.resolve(dest_bucket)?;
        let dest_key = ObjectKey::new(dest_key.to_string())?;

        self.copy_resolved(&src_bucket, &src_key, &dest_bucket, &dest_key)
            .await?;

        let conn = self.connection().await?;
        match conn.delete_object(&src_bucket, &src_key).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                warn!(
                    bucket = %src_bucket,
                    key = %src_key,
                    error = %e,
                    "Copied but failed to remove source object"
                );
                Err(e)
            }
        }
    }

    async fn copy_resolved(
        &self,
        src_bucket: &BucketName,
        src_key: &ObjectKey,
        dest_bucket: &BucketName,
        dest_key: &ObjectKey,
    ) -> StorageResult<()> {
        debug!(
            src_bucket = %src_bucket,
            src_key = %src_key,
            dest_bucket = %dest_bucket,
            dest_key = %dest_key,
            "copy object"
        );

        let conn = self.connection().await?;
        if !conn.bucket_exists(dest_bucket).await? {
            conn.create_bucket(dest_bucket).await?;
        }

        if let Err(e) = conn.head_object(src_bucket, src_key).await {
            warn!(bucket = %src_bucket, key = %src_key, error = %e, "Copy source not available");
            return Err(e);
        }

        conn.copy_object(src_bucket, src_key, dest_bucket, dest_key)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryConnector;

    #[tokio::test]
    async fn test_resolve_applies_prefix_once() {
        let client = StorageClient::new(
            Arc::new(InMemoryConnector::new()),
            Some("dev".to_string()),
            "storage-health",
        )
        .await;

        let resolved = client.resolve("documents").unwrap();
        assert_eq!(resolved.as_str(), "dev-documents");
    }

    #[tokio::test]
    async fn test_resolve_without_prefix_is_identity() {
        let client = StorageClient::new(
            Arc::new(InMemoryConnector::new()),
            None,
            "storage-health",
        )
        .await;

        let resolved = client.resolve("documents").unwrap();
        assert_eq!(resolved.as_str(), "documents");
    }

    #[tokio::test]
    async fn test_health_fingerprint_constants() {
        // The probe payload is a fixed fingerprint; downstream monitors
        // match on it, so it must not drift.
        assert_eq!(HEALTH_KEY, "txtxtxtxt1");
        assert_eq!(HEALTH_PAYLOAD, b"_t@@@1");
    }
}
