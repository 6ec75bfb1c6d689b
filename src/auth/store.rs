//! Credential storage
//!
//! Tokens live in a key-value store shared by every client in the process.
//! The store is borrowed, never owned: `CredentialStore` wraps whichever
//! `StorageAdapter` the application hands it.

use crate::error::{Error, Result};
use crate::types::{JsonValue, TokenPair};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the cached user profile
pub const USER_INFO_KEY: &str = "userInfo";

/// Persistent string key-value storage
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// File storage
// ============================================================================

/// JSON-file backed storage with atomic writes
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: RwLock<Option<HashMap<String, String>>>,
}

impl FileStorage {
    /// Create storage backed by the given file. The file is read on first use.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            values: RwLock::new(None),
        }
    }

    /// Default location under the user's config directory
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::storage("could not determine config directory"))?;
        Ok(dir.join(crate::config::APP_NAME).join("credentials.json"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(format!(
                "failed to read credentials file '{}': {e}",
                self.path.display()
            ))),
        }
    }

    fn parse(&self, contents: &str) -> Result<HashMap<String, String>> {
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(contents).map_err(|e| {
            Error::storage(format!(
                "failed to parse credentials file '{}': {e}",
                self.path.display()
            ))
        })
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        match self.read_file().await? {
            Some(contents) => self.parse(&contents),
            None => Ok(HashMap::new()),
        }
    }

    /// Load for a write. An unparseable file is discarded so it can be
    /// overwritten; the flag reports that the file must be rewritten.
    async fn load_for_write(&self) -> Result<(HashMap<String, String>, bool)> {
        let Some(contents) = self.read_file().await? else {
            return Ok((HashMap::new(), false));
        };
        match self.parse(&contents) {
            Ok(values) => Ok((values, false)),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable credentials file");
                Ok((HashMap::new(), true))
            }
        }
    }

    async fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(values)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents).await.map_err(|e| {
            Error::storage(format!("failed to write credentials file: {e}"))
        })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::storage(format!("failed to rename credentials file: {e}")))?;

        debug!(path = %self.path.display(), "Credentials persisted");
        Ok(())
    }

    /// Run `f` against a copy of the map; the cache is replaced only once the
    /// change is on disk
    async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool + Send,
    {
        let mut guard = self.values.write().await;
        let (mut next, reset) = match guard.as_ref() {
            Some(values) => (values.clone(), false),
            None => self.load_for_write().await?,
        };
        if f(&mut next) || reset {
            self.persist(&next).await?;
        }
        *guard = Some(next);
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let guard = self.values.read().await;
            if let Some(values) = guard.as_ref() {
                return Ok(values.get(key).cloned());
            }
        }

        let mut guard = self.values.write().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(guard.as_ref().and_then(|values| values.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.update(move |values| values.insert(key, value.clone()).as_ref() != Some(&value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| values.remove(key).is_some()).await
    }
}

// ============================================================================
// Credential store
// ============================================================================

/// Typed access to the stored tokens and cached user profile
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn StorageAdapter>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.storage.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.storage.get(REFRESH_TOKEN_KEY).await
    }

    /// Store both tokens of a freshly issued pair
    pub async fn store_tokens(&self, tokens: &TokenPair) -> Result<()> {
        self.storage.set(ACCESS_TOKEN_KEY, &tokens.access).await?;
        self.storage.set(REFRESH_TOKEN_KEY, &tokens.refresh).await
    }

    pub async fn set_access_token(&self, token: &str) -> Result<()> {
        self.storage.set(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.storage.set(REFRESH_TOKEN_KEY, token).await
    }

    /// Cached user profile, if present and parseable
    pub async fn user_info(&self) -> Result<Option<JsonValue>> {
        match self.storage.get(USER_INFO_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw).ok()),
            None => Ok(None),
        }
    }

    pub async fn set_user_info(&self, user: &JsonValue) -> Result<()> {
        self.storage
            .set(USER_INFO_KEY, &serde_json::to_string(user)?)
            .await
    }

    /// True when both tokens are stored
    pub async fn has_tokens(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some() && self.refresh_token().await?.is_some())
    }

    /// Remove both tokens and the cached profile.
    ///
    /// Every key is attempted even if an earlier removal fails; the first
    /// failure is returned.
    pub async fn clear(&self) -> Result<()> {
        let mut first_error = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_INFO_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
