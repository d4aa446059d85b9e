use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::key::StorageKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Durable byte storage addressed by opaque keys.
///
/// Every write lands under a freshly generated key; the store never
/// inspects or deduplicates content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a fresh key. Returns the key and the byte count
    /// actually written.
    async fn put(&self, data: &[u8]) -> Result<(StorageKey, u64), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader).await
    }

    /// Store data from an async reader under a fresh key. Returns the key
    /// and the byte count actually written.
    async fn put_stream(&self, reader: BoxReader) -> Result<(StorageKey, u64), StorageError>;

    /// Open a blob as a streaming async reader.
    async fn open_read(&self, key: &StorageKey) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError>;
}
