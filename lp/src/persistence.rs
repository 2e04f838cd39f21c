//! State persistence
//!
//! `JsonFileRepository` keeps the whole `DomainState` in one JSON file.
//! `PersistenceAuthority` adapts it to the reconciliation `Authority` seam: a
//! change is confirmed once the state holding it is on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{DomainState, EntityValue};
use crate::reconcile::{AppliedChange, Authority, AuthorityError};
use crate::store::DomainStore;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PersistenceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where the authoritative copy of the state lives
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Load the saved state, or an empty one if there is nothing usable
    async fn load(&self) -> Result<DomainState, PersistenceError>;

    async fn save(&self, state: &DomainState) -> Result<(), PersistenceError>;
}

/// Whole-state JSON file
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(?path, "JsonFileRepository::new: called");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateRepository for JsonFileRepository {
    async fn load(&self) -> Result<DomainState, PersistenceError> {
        debug!(path = ?self.path, "JsonFileRepository::load: called");
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file yet, starting empty");
                return Ok(DomainState::default());
            }
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };

        match serde_json::from_str::<DomainState>(&content) {
            Ok(state) => {
                debug!(
                    projects = state.projects.len(),
                    tasks = state.tasks.len(),
                    habits = state.habits.len(),
                    "JsonFileRepository::load: loaded"
                );
                Ok(state)
            }
            Err(e) => {
                // Keep the unreadable file around; the next save would overwrite it
                let backup = self.sibling(".corrupt");
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "State file is corrupt, starting empty"
                );
                if let Err(copy_err) = fs::copy(&self.path, &backup).await {
                    warn!(error = %copy_err, "Could not back up corrupt state file");
                }
                Ok(DomainState::default())
            }
        }
    }

    async fn save(&self, state: &DomainState) -> Result<(), PersistenceError> {
        debug!(path = ?self.path, "JsonFileRepository::save: called");
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(|e| PersistenceError::io(dir, e))?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.sibling(&format!(".{}.tmp", uuid::Uuid::now_v7().simple()));

        fs::write(&tmp, json).await.map_err(|e| PersistenceError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(PersistenceError::io(&self.path, e));
        }

        debug!("JsonFileRepository::save: written");
        Ok(())
    }
}

/// Confirms changes by saving the store to a repository
///
/// Saves are serialized and always write the store's latest state, so a
/// slow save can never overwrite a newer one.
pub struct PersistenceAuthority {
    repository: Arc<dyn StateRepository>,
    store: DomainStore,
    timeout: Duration,
    save_lock: Mutex<()>,
}

impl PersistenceAuthority {
    pub fn new(repository: Arc<dyn StateRepository>, store: DomainStore, timeout: Duration) -> Self {
        debug!(?timeout, "PersistenceAuthority::new: called");
        Self {
            repository,
            store,
            timeout,
            save_lock: Mutex::new(()),
        }
    }

    async fn save_latest(&self) -> Result<(), PersistenceError> {
        let _guard = self.save_lock.lock().await;
        let state = self.store.get();
        self.repository.save(&state).await
    }
}

#[async_trait]
impl Authority for PersistenceAuthority {
    async fn confirm(&self, change: &AppliedChange) -> Result<Option<EntityValue>, AuthorityError> {
        debug!(attempt = change.attempt, key = %change.key, "PersistenceAuthority::confirm: called");
        match tokio::time::timeout(self.timeout, self.save_latest()).await {
            Ok(Ok(())) => Ok(None),
            Ok(Err(e)) => Err(AuthorityError::Persistence(e.to_string())),
            Err(_) => Err(AuthorityError::Timeout(self.timeout)),
        }
    }
}
