//! Durable token storage
//!
//! The durable copy of a session is a single key-value entry holding the
//! token string; absence of the entry means logged out.

use async_trait::async_trait;
use portal_core::{storage_error, PortalResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Fixed key the token is stored under
pub const TOKEN_KEY: &str = "token";

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> PortalResult<Option<String>>;

    async fn save(&self, token: &str) -> PortalResult<()>;

    /// Remove the entry; removing an absent entry is not an error
    async fn remove(&self) -> PortalResult<()>;
}

/// On-disk layout: `{ "token": "..." }`
#[derive(Debug, Serialize, Deserialize)]
struct TokenEntry {
    #[serde(rename = "token")]
    value: String,
}

/// JSON file backed store, the desktop analog of browser local storage.
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written entry.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| TOKEN_KEY.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> PortalResult<Option<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error!("Failed to read token file", "token_store", e)),
        };

        let entry: TokenEntry = serde_json::from_str(&content)
            .map_err(|e| storage_error!("Token file is corrupted", "token_store", e))?;

        debug!("Loaded durable token from {}", self.path.display());
        Ok(Some(entry.value).filter(|token| !token.is_empty()))
    }

    async fn save(&self, token: &str) -> PortalResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error!("Failed to create token directory", "token_store", e))?;
        }

        let json = serde_json::to_string(&TokenEntry {
            value: token.to_string(),
        })?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| storage_error!("Failed to write token file", "token_store", e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| storage_error!("Failed to replace token file", "token_store", e))?;

        info!("Saved durable token to {}", self.path.display());
        Ok(())
    }

    async fn remove(&self) -> PortalResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Removed durable token at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error!("Failed to remove token file", "token_store", e)),
        }
    }
}

/// Process-local store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> PortalResult<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &str) -> PortalResult<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn remove(&self) -> PortalResult<()> {
        *self.token.write().await = None;
        Ok(())
    }
}
