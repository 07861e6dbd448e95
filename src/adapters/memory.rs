use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{BlobStore, Connector, ObjectEntry, PutReceipt},
};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
    etag: String,
}

/// In-memory BlobStore for tests and local development.
///
/// Buckets are nested maps behind a single `RwLock`; etags are md5 of the
/// content, matching what S3-compatible backends report for simple puts.
#[derive(Default)]
pub struct InMemoryStore {
    buckets: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_missing(bucket: &BucketName) -> StorageError {
        StorageError::BucketNotFound {
            bucket: bucket.to_string(),
        }
    }

    fn object_missing(bucket: &BucketName, key: &ObjectKey) -> StorageError {
        StorageError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryStore {
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket.as_str()))
    }

    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.as_str().to_string())
            .or_default();
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        match self.buckets.write().await.remove(bucket.as_str()) {
            Some(_) => Ok(()),
            None => Err(Self::bucket_missing(bucket)),
        }
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
    ) -> StorageResult<PutReceipt> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(bucket))?;

        let etag = format!("{:x}", md5::compute(&data));
        let size = data.len() as u64;

        objects.insert(
            key.as_str().to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
                etag: etag.clone(),
            },
        );

        Ok(PutReceipt {
            size,
            etag: Some(etag),
            version: None,
        })
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(bucket))?;

        objects
            .get(key.as_str())
            .map(|obj| obj.data.clone())
            .ok_or_else(|| Self::object_missing(bucket, key))
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(bucket))?;

        match objects.remove(key.as_str()) {
            Some(_) => Ok(()),
            None => Err(Self::object_missing(bucket, key)),
        }
    }

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<ObjectEntry> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(bucket))?;

        let stored = objects
            .get(key.as_str())
            .ok_or_else(|| Self::object_missing(bucket, key))?;

        Ok(ObjectEntry {
            key: key.clone(),
            size: stored.data.len() as u64,
            last_modified: stored.last_modified,
            etag: Some(stored.etag.clone()),
        })
    }

    async fn list_page(
        &self,
        bucket: &BucketName,
        limit: usize,
    ) -> StorageResult<Vec<ObjectEntry>> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(bucket))?;

        // Stable order keeps drain loops deterministic
        let mut keys: Vec<&String> = objects.keys().collect();
        keys.sort();

        keys.into_iter()
            .take(limit)
            .map(|k| {
                let stored = &objects[k];
                Ok(ObjectEntry {
                    key: ObjectKey::new(k.clone())?,
                    size: stored.data.len() as u64,
                    last_modified: stored.last_modified,
                    etag: Some(stored.etag.clone()),
                })
            })
            .collect()
    }

    async fn copy_object(
        &self,
        src_bucket: &BucketName,
        src_key: &ObjectKey,
        dest_bucket: &BucketName,
        dest_key: &ObjectKey,
    ) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;

        let stored = buckets
            .get(src_bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(src_bucket))?
            .get(src_key.as_str())
            .ok_or_else(|| Self::object_missing(src_bucket, src_key))?
            .clone();

        let dest = buckets
            .get_mut(dest_bucket.as_str())
            .ok_or_else(|| Self::bucket_missing(dest_bucket))?;

        dest.insert(dest_key.as_str().to_string(), stored);
        Ok(())
    }

    async fn presigned_get_url(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String> {
        // Probe first so absent objects behave like the real backend
        self.head_object(bucket, key).await?;

        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }
}

/// Connector yielding the same shared in-memory store on every connect, so
/// data survives a reconnect the way it does against a real backend.
#[derive(Clone)]
pub struct InMemoryConnector {
    store: Arc<InMemoryStore>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
        }
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<InMemoryStore> {
        self.store.clone()
    }
}

impl Default for InMemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self) -> StorageResult<Arc<dyn BlobStore>> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name.to_string()).unwrap()
    }

    fn key(name: &str) -> ObjectKey {
        ObjectKey::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_basic_object_operations() {
        let store = InMemoryStore::new();
        let b = bucket("test-bucket");
        let k = key("test/key");
        let data = Bytes::from_static(b"test data");

        store.create_bucket(&b).await.unwrap();

        let receipt = store.put_object(&b, &k, data.clone()).await.unwrap();
        assert_eq!(receipt.size, data.len() as u64);
        assert!(receipt.etag.is_some());

        let retrieved = store.get_object(&b, &k).await.unwrap();
        assert_eq!(retrieved, data);

        let meta = store.head_object(&b, &k).await.unwrap();
        assert_eq!(meta.size, data.len() as u64);

        store.delete_object(&b, &k).await.unwrap();
        assert!(store.get_object(&b, &k).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_bucket_is_not_found() {
        let store = InMemoryStore::new();
        let b = bucket("nope");
        let k = key("some.txt");

        let err = store.get_object(&b, &k).await.unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .put_object(&b, &k, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_page_respects_limit() {
        let store = InMemoryStore::new();
        let b = bucket("listing");
        store.create_bucket(&b).await.unwrap();

        for i in 0..10 {
            let k = key(&format!("obj-{:02}", i));
            store
                .put_object(&b, &k, Bytes::from(format!("data {}", i)))
                .await
                .unwrap();
        }

        let page = store.list_page(&b, 4).await.unwrap();
        assert_eq!(page.len(), 4);
        assert_eq!(page[0].key.as_str(), "obj-00");
    }

    #[tokio::test]
    async fn test_copy_across_buckets() {
        let store = InMemoryStore::new();
        let src = bucket("src-bucket");
        let dst = bucket("dst-bucket");
        store.create_bucket(&src).await.unwrap();
        store.create_bucket(&dst).await.unwrap();

        let k = key("doc.pdf");
        let data = Bytes::from_static(b"pdf bytes");
        store.put_object(&src, &k, data.clone()).await.unwrap();

        store.copy_object(&src, &k, &dst, &k).await.unwrap();
        assert_eq!(store.get_object(&dst, &k).await.unwrap(), data);
        // Source untouched
        assert_eq!(store.get_object(&src, &k).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_presigned_url_requires_object() {
        let store = InMemoryStore::new();
        let b = bucket("signed");
        store.create_bucket(&b).await.unwrap();

        let k = key("file.txt");
        let err = store
            .presigned_get_url(&b, &k, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store
            .put_object(&b, &k, Bytes::from_static(b"x"))
            .await
            .unwrap();
        let url = store
            .presigned_get_url(&b, &k, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("memory://signed/file.txt"));
    }
}
