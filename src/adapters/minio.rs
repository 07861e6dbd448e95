use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use bytes::Bytes;
use futures::StreamExt;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    path::Path as ObjectPath,
    signer::Signer,
    ObjectStore, PutPayload,
};
use tokio::sync::RwLock;

use crate::{
    config::StorageConfig,
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{BlobStore, Connector, ObjectEntry, PutReceipt},
};

/// Error codes the backend reports for absent buckets/keys; these map to a
/// clean not-found result rather than a failure. `NotFound` is what the SDK
/// synthesizes for bodyless HEAD responses.
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NoSuchBucket", "ResourceNotFound", "NotFound"];

fn is_not_found_code(code: &str) -> bool {
    NOT_FOUND_CODES.contains(&code)
}

/// Connector for an S3-compatible endpoint (MinIO in production).
///
/// Each `connect` builds a fresh [`MinioStore`] from the same static
/// configuration, which is what makes reconnect-on-failure possible.
pub struct MinioConnector {
    config: StorageConfig,
}

impl MinioConnector {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for MinioConnector {
    async fn connect(&self) -> StorageResult<Arc<dyn BlobStore>> {
        let store = MinioStore::open(self.config.clone())?;
        Ok(Arc::new(store))
    }
}

/// BlobStore backed by an S3-compatible service.
///
/// Object operations go through per-bucket `object_store` handles, built
/// lazily and cached for the lifetime of this connection. Bucket-level
/// administration and server-side copy are not covered by `object_store`,
/// so those go through an `aws-sdk-s3` client built from the same
/// credentials; both paths sign requests with SigV4.
pub struct MinioStore {
    config: StorageConfig,
    admin: aws_sdk_s3::Client,
    stores: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl MinioStore {
    /// Open a connection handle against the configured endpoint
    pub fn open(config: StorageConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.base_url())
            .credentials_provider(credentials)
            // MinIO serves buckets path-style, not as virtual hosts
            .force_path_style(true)
            .build();

        let admin = aws_sdk_s3::Client::from_conf(sdk_config);

        Ok(Self {
            config,
            admin,
            stores: RwLock::new(HashMap::new()),
        })
    }

    /// Get or build the `object_store` handle for a bucket
    async fn store_for(&self, bucket: &BucketName) -> StorageResult<Arc<AmazonS3>> {
        if let Some(store) = self.stores.read().await.get(bucket.as_str()) {
            return Ok(store.clone());
        }

        let built = AmazonS3Builder::new()
            .with_endpoint(self.config.base_url())
            .with_bucket_name(bucket.as_str())
            .with_access_key_id(&self.config.access_key)
            .with_secret_access_key(&self.config.secret_key)
            .with_region(&self.config.region)
            .with_allow_http(!self.config.use_ssl)
            .with_virtual_hosted_style_request(false)
            .build()
            .map_err(|e| StorageError::Backend {
                message: format!("Failed to build store for bucket {}: {}", bucket, e),
            })?;

        let store = Arc::new(built);
        self.stores
            .write()
            .await
            .insert(bucket.as_str().to_string(), store.clone());
        Ok(store)
    }

    fn object_error(
        bucket: &BucketName,
        key: &ObjectKey,
        err: object_store::Error,
    ) -> StorageError {
        match err {
            object_store::Error::NotFound { .. } => StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => StorageError::Backend {
                message: other.to_string(),
            },
        }
    }

    /// Service error code of an SDK failure, if the response carried one
    fn sdk_code<E, R>(err: &SdkError<E, R>) -> Option<&str>
    where
        E: ProvideErrorMetadata,
    {
        err.as_service_error().and_then(|service| service.code())
    }
}

#[async_trait]
impl BlobStore for MinioStore {
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        match self
            .admin
            .head_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    return Ok(false);
                }
                if Self::sdk_code(&err).is_some_and(is_not_found_code) {
                    return Ok(false);
                }
                Err(StorageError::Backend {
                    message: format!(
                        "Failed to probe bucket {}: {}",
                        bucket,
                        DisplayErrorContext(&err)
                    ),
                })
            }
        }
    }

    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        match self
            .admin
            .create_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                // Racing a concurrent creator is fine
                let already_there = err.as_service_error().is_some_and(|e| {
                    e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists()
                });
                if already_there {
                    return Ok(());
                }
                Err(StorageError::Backend {
                    message: format!(
                        "Failed to create bucket {}: {}",
                        bucket,
                        DisplayErrorContext(&err)
                    ),
                })
            }
        }
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        match self
            .admin
            .delete_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
        {
            Ok(_) => {
                // Dropped handles for a deleted bucket would otherwise go stale
                self.stores.write().await.remove(bucket.as_str());
                Ok(())
            }
            Err(err) => {
                if Self::sdk_code(&err).is_some_and(is_not_found_code) {
                    return Err(StorageError::BucketNotFound {
                        bucket: bucket.to_string(),
                    });
                }
                Err(StorageError::Backend {
                    message: format!(
                        "Failed to delete bucket {}: {}",
                        bucket,
                        DisplayErrorContext(&err)
                    ),
                })
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
    ) -> StorageResult<PutReceipt> {
        let store = self.store_for(bucket).await?;
        let path = ObjectPath::from(key.as_str());
        let size = data.len() as u64;
        let payload = PutPayload::from(data);

        let result = store
            .put(&path, payload)
            .await
            .map_err(|e| Self::object_error(bucket, key, e))?;

        Ok(PutReceipt {
            size,
            etag: result.e_tag,
            version: result.version,
        })
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes> {
        let store = self.store_for(bucket).await?;
        let path = ObjectPath::from(key.as_str());

        let result = store
            .get(&path)
            .await
            .map_err(|e| Self::object_error(bucket, key, e))?;

        result.bytes().await.map_err(|e| StorageError::Backend {
            message: format!("Failed to read object bytes: {}", e),
        })
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        let store = self.store_for(bucket).await?;
        let path = ObjectPath::from(key.as_str());

        store
            .delete(&path)
            .await
            .map_err(|e| Self::object_error(bucket, key, e))
    }

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<ObjectEntry> {
        let store = self.store_for(bucket).await?;
        let path = ObjectPath::from(key.as_str());

        let meta = store
            .head(&path)
            .await
            .map_err(|e| Self::object_error(bucket, key, e))?;

        Ok(ObjectEntry {
            key: key.clone(),
            size: meta.size,
            last_modified: meta.last_modified,
            etag: meta.e_tag,
        })
    }

    async fn list_page(
        &self,
        bucket: &BucketName,
        limit: usize,
    ) -> StorageResult<Vec<ObjectEntry>> {
        let store = self.store_for(bucket).await?;
        let mut stream = store.list(None);
        let mut entries = Vec::new();

        while let Some(item) = stream.next().await {
            let meta = item.map_err(|e| match e {
                object_store::Error::NotFound { .. } => StorageError::BucketNotFound {
                    bucket: bucket.to_string(),
                },
                other => StorageError::Backend {
                    message: format!("Failed to list bucket {}: {}", bucket, other),
                },
            })?;

            let key = ObjectKey::new(meta.location.to_string())?;
            entries.push(ObjectEntry {
                key,
                size: meta.size,
                last_modified: meta.last_modified,
                etag: meta.e_tag,
            });

            if entries.len() >= limit {
                break;
            }
        }

        Ok(entries)
    }

    async fn copy_object(
        &self,
        src_bucket: &BucketName,
        src_key: &ObjectKey,
        dest_bucket: &BucketName,
        dest_key: &ObjectKey,
    ) -> StorageResult<()> {
        match self
            .admin
            .copy_object()
            .copy_source(format!("{}/{}", src_bucket, src_key))
            .bucket(dest_bucket.as_str())
            .key(dest_key.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                if Self::sdk_code(&err).is_some_and(is_not_found_code) {
                    return Err(StorageError::ObjectNotFound {
                        bucket: src_bucket.to_string(),
                        key: src_key.to_string(),
                    });
                }
                Err(StorageError::Backend {
                    message: format!(
                        "Failed to copy {}/{} -> {}/{}: {}",
                        src_bucket,
                        src_key,
                        dest_bucket,
                        dest_key,
                        DisplayErrorContext(&err)
                    ),
                })
            }
        }
    }

    async fn presigned_get_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self.store_for(bucket).await?;
        let path = ObjectPath::from(key.as_str());

        let url = store
            .signed_url(http::Method::GET, &path, expires_in)
            .await
            .map_err(|e| Self::object_error(bucket, key, e))?;

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig {
            endpoint: "localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            bucket_prefix: None,
            health_bucket: "storage-health".to_string(),
            use_ssl: false,
        }
    }

    #[test]
    fn test_open_builds_signing_clients() {
        // Both request paths carry the configured credentials; nothing
        // here performs network I/O.
        let store = MinioStore::open(config()).unwrap();
        assert!(store
            .admin
            .config()
            .endpoint_url()
            .is_some_and(|url| url == "http://localhost:9000"));
    }

    #[test]
    fn test_not_found_codes_cover_backend_set() {
        for code in ["NoSuchKey", "NoSuchBucket", "ResourceNotFound", "NotFound"] {
            assert!(is_not_found_code(code));
        }
        assert!(!is_not_found_code("AccessDenied"));
        assert!(!is_not_found_code("BucketNotEmpty"));
    }
}
