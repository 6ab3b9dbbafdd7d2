// Persisted session state, one file per role
//
// Files hold Playwright storage state JSON (cookies + per-origin local
// storage). The latest successful authentication always wins: `save`
// overwrites without merging.

use std::path::{Path, PathBuf};

use playwright_rs::protocol::{BrowserContext, StorageState};

use crate::credentials::Role;
use crate::error::{Error, Result};

/// File name of the reusable project identifier
pub const PROJECT_ID_FILE: &str = "project-id.txt";

/// Directory of persisted session files.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the session file for `role`, e.g. `playwright/.auth/owner.json`.
    pub fn path_for(&self, role: Role) -> PathBuf {
        self.dir.join(format!("{}.json", role.label()))
    }

    pub fn exists(&self, role: Role) -> bool {
        self.path_for(role).is_file()
    }

    /// Writes `state` for `role`, replacing any previous file.
    ///
    /// The file is written next to its destination and renamed into place so
    /// readers never observe a partial snapshot.
    pub async fn save(&self, role: Role, state: &StorageState) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(role);
        let tmp = self.dir.join(format!(".{}.json.tmp", role.label()));
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::info!(
            %role,
            path = %path.display(),
            cookies = state.cookies.len(),
            origins = state.origins.len(),
            "persisted session state"
        );
        Ok(path)
    }

    /// Serializes the live storage state of `context` for `role`.
    pub async fn capture(&self, context: &BrowserContext, role: Role) -> Result<PathBuf> {
        let state = context.storage_state().await?;
        self.save(role, &state).await
    }

    /// Loads the session for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSession`] when the setup phase has not produced
    /// a file for this role; never falls back to an unauthenticated state.
    pub async fn load(&self, role: Role) -> Result<StorageState> {
        let path = self.path_for(role);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingSession { role, path });
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "session file {} is not valid storage state ({}); re-run setup",
                path.display(),
                e
            ))
        })
    }

    /// Deletes the session for `role`. Deleting an absent file is not an error.
    pub async fn remove(&self, role: Role) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(role)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_project_id(&self, project_id: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(PROJECT_ID_FILE);
        tokio::fs::write(&path, project_id.trim()).await?;
        Ok(path)
    }

    /// Reads the seeded project identifier shared by suites that need one.
    pub async fn project_id(&self) -> Result<String> {
        let path = self.dir.join(PROJECT_ID_FILE);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::Config(format!(
                "cannot read project id from {}: {}",
                path.display(),
                e
            ))
        })?;
        let id = content.trim();
        if id.is_empty() {
            return Err(Error::Config(format!("{} is empty", path.display())));
        }
        Ok(id.to_string())
    }
}
