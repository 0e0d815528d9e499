//! Attachment blob storage behind an opendal operator.
//!
//! Storage keys are opaque to the rest of the system: produced here at
//! upload time, persisted on the attachment row, and meaningless outside
//! this module.

use gridbase_core::{Error, Result};
use opendal::Operator;
use opendal::services::Fs;
use uuid::Uuid;

/// Tracing target for object storage operations.
const TRACING_TARGET: &str = "gridbase_server::service::storage";

/// Object storage for attachment payloads.
#[derive(Clone)]
pub struct ObjectStore {
    operator: Operator,
}

impl ObjectStore {
    /// Creates a filesystem-backed store rooted at the given path.
    pub fn filesystem(root: &str) -> Result<Self> {
        let builder = Fs::default().root(root);
        let operator = Operator::new(builder)
            .map_err(|e| Error::storage(format!("failed to open storage root: {e}")))?
            .finish();

        tracing::info!(
            target: TRACING_TARGET,
            root = %root,
            "object store initialized"
        );

        Ok(Self { operator })
    }

    /// Creates a store around an existing operator (tests, other backends).
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Produces a fresh opaque storage key.
    pub fn new_key(record_id: Uuid) -> String {
        format!("attachments/{}/{}", record_id, Uuid::now_v7())
    }

    /// Writes a blob under the given key.
    pub async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.operator
            .write(key, bytes)
            .await
            .map_err(|e| Error::storage(format!("failed to write blob: {e}")))?;
        Ok(())
    }

    /// Reads a blob back.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(|e| Error::storage(format!("failed to read blob: {e}")))?;
        Ok(buffer.to_vec())
    }

    /// Deletes a blob; missing blobs are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| Error::storage(format!("failed to delete blob: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::filesystem(dir.path().to_str().unwrap()).unwrap();

        let key = ObjectStore::new_key(Uuid::new_v4());
        store.put(&key, b"payload".to_vec()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), b"payload");

        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.is_err());
    }

    #[test]
    fn keys_are_unique_per_upload() {
        let record_id = Uuid::new_v4();
        assert_ne!(ObjectStore::new_key(record_id), ObjectStore::new_key(record_id));
    }
}
