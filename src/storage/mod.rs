use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where normalized photos live. The contract is fixed (bytes in, public
/// URL out); swapping the local directory for an object store is a matter
/// of another implementation behind this trait.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;
}

/// Filesystem-backed storage, served back by the HTTP layer under
/// `public_base`.
pub struct LocalPhotoStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalPhotoStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String, StorageError> {
        // Keys are generated internally, but keep traversal out anyway.
        if !Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        Ok(format!("{}/{key}", self.public_base))
    }
}

/// Content-addressed key for a loja's photo: same bytes, same key, so
/// re-uploads of the same photo overwrite instead of piling up.
pub fn photo_key(loja_id: Uuid, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = format!("{:x}", hasher.finalize());
    format!("{loja_id}/{}.jpg", &hash[..24])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_key_is_deterministic_and_scoped() {
        let loja = Uuid::new_v4();
        let a = photo_key(loja, b"mesmos bytes");
        let b = photo_key(loja, b"mesmos bytes");
        let c = photo_key(loja, b"outros bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with(&loja.to_string()));
        assert!(a.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn local_storage_writes_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("vitrine-test-{}", Uuid::new_v4()));
        let storage = LocalPhotoStorage::new(&dir, "/uploads/");

        let url = storage.put("loja/foto.jpg", b"jpeg", "image/jpeg").await.unwrap();
        assert_eq!(url, "/uploads/loja/foto.jpg");
        let written = tokio::fs::read(dir.join("loja/foto.jpg")).await.unwrap();
        assert_eq!(written, b"jpeg");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn local_storage_rejects_traversal_keys() {
        let storage = LocalPhotoStorage::new("/tmp/nunca-usado", "/uploads");
        let err = storage.put("../fora.jpg", b"x", "image/jpeg").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
