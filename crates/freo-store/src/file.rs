//! Single-file JSON store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use freo_protocol::{Codec, JsonCodec};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{SessionStore, StoreError};

type Document = BTreeMap<String, Value>;

/// A [`SessionStore`] that keeps every key in one JSON object on disk.
///
/// Writes go to a sibling `*.tmp` file which is then renamed over the
/// original, so a reader sees either the old document or the new one.
/// A missing file reads as an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Document::new()),
            Ok(bytes) => JsonCodec.decode(&bytes).map_err(StoreError::Corrupt),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let bytes = JsonCodec.encode(doc).map_err(StoreError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), keys = doc.len(), "store flushed");
        Ok(())
    }
}

impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut doc = self.load().await?;
        Ok(doc.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        doc.insert(key.to_owned(), value);
        self.save(&doc).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        if doc.remove(key).is_some() {
            self.save(&doc).await?;
        }
        Ok(())
    }
}
