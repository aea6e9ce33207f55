//! Filesystem-backed session storage.

use crate::backend::{component_count, SessionBackend, SessionInfo};
use crate::SessionError;
use async_trait::async_trait;
use axon_core::SessionId;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::sync::Mutex;

/// One aggregated document per session, stored at
/// `<root>/<session_id>.json`.
///
/// Writes go to a sibling temp file first and are moved into place with a
/// rename, so readers never observe a partial document. Concurrent writes
/// for any session on the same store are serialized by an internal mutex;
/// the last write wins.
pub struct FsSessionBackend {
    root: PathBuf,
    write_gate: Mutex<()>,
}

impl FsSessionBackend {
    /// A store rooted at the given directory. The directory is created
    /// lazily on first write.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            write_gate: Mutex::new(()),
        }
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SessionBackend for FsSessionBackend {
    async fn put(
        &self,
        id: &SessionId,
        document: serde_json::Value,
    ) -> Result<(), SessionError> {
        let _gate = self.write_gate.lock().await;
        tokio::fs::create_dir_all(&self.root).await?;
        let contents = serde_json::to_string_pretty(&document)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        let target = self.path_for(id);
        let temp = self.root.join(format!("{id}.json.tmp"));
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<serde_json::Value>, SessionError> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(contents) => {
                let document = serde_json::from_str(&contents)
                    .map_err(|e| SessionError::Corrupt(e.to_string()))?;
                Ok(Some(document))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<SessionId>, SessionError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(id) = name.strip_suffix(".json") {
                    ids.push(SessionId::new(id));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn info(&self, id: &SessionId) -> Result<Option<SessionInfo>, SessionError> {
        let path = self.path_for(id);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let last_modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let document = self
            .get(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        Ok(Some(SessionInfo {
            size_bytes: metadata.len(),
            components: component_count(&document),
            last_modified_ms,
        }))
    }
}
