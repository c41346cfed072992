//! AsyncDirStorage-based SessionRepository implementation
//!
//! Persists one TOML document per session under a `sessions/` directory,
//! with schema migrations handled by the registered migrator. The
//! optimistic version check runs under a write gate so the read-compare-
//! write sequence is atomic within this process.

use crate::dto::create_session_migrator;
use async_trait::async_trait;
use deckrank_core::error::{DeckrankError, Result};
use deckrank_core::session::{Session, SessionRepository};
use std::path::Path;
use tokio::fs;
use tokio::sync::Mutex;
use version_migrate::{
    AppPaths, AsyncDirStorage, DirStorageStrategy, FilenameEncoding, FormatStrategy, PathStrategy,
};

const ENTITY: &str = "session";

/// AsyncDirStorage-based session repository.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── sessions/
///     ├── session-id-1.toml
///     └── session-id-2.toml
/// ```
pub struct AsyncDirSessionRepository {
    storage: AsyncDirStorage,
    // Serializes save_expecting_version so the compare and the write
    // cannot interleave with another writer in this process.
    write_gate: Mutex<()>,
}

impl AsyncDirSessionRepository {
    /// Creates a repository at the default location (~/.config/deckrank).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be determined
    /// or if the directory structure cannot be created.
    pub async fn default_location() -> Result<Self> {
        use crate::paths::DeckrankPaths;
        let base_dir = DeckrankPaths::config_dir()
            .map_err(|e| DeckrankError::io(format!("failed to get config directory: {e}")))?;
        Self::new(base_dir).await
    }

    /// Creates a new AsyncDirSessionRepository under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or AsyncDirStorage
    /// initialization fails.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir).await?;

        let paths =
            AppPaths::new("deckrank").data_strategy(PathStrategy::CustomBase(base_dir.clone()));

        let migrator = create_session_migrator();

        let strategy = DirStorageStrategy::default()
            .with_format(FormatStrategy::Toml)
            .with_filename_encoding(FilenameEncoding::Direct);

        let storage = AsyncDirStorage::new(paths, "sessions", migrator, strategy)
            .await
            .map_err(|e| DeckrankError::data_access(format!("failed to create storage: {e}")))?;

        Ok(Self {
            storage,
            write_gate: Mutex::new(()),
        })
    }

    /// Returns the actual sessions directory path.
    pub fn sessions_dir(&self) -> &Path {
        self.storage.base_path()
    }

    async fn load_session(&self, session_id: &str) -> Result<Option<Session>> {
        // FilenameEncoding::Direct pins the document path, so a missing
        // session is detected by existence rather than by matching the
        // storage error's message text.
        let path = self.storage.base_path().join(format!("{session_id}.toml"));
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        self.storage
            .load::<Session>(ENTITY, session_id)
            .await
            .map(Some)
            .map_err(|e| DeckrankError::data_access(format!("failed to load session: {e}")))
    }

    async fn write_session(&self, session: &Session) -> Result<()> {
        self.storage
            .save(ENTITY, &session.id, session)
            .await
            .map_err(|e| DeckrankError::data_access(format!("failed to save session: {e}")))?;
        tracing::debug!(
            session_id = %session.id,
            version = session.version,
            "session document written"
        );
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for AsyncDirSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.load_session(session_id).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        self.write_session(session).await
    }

    async fn save_expecting_version(&self, session: &Session, expected_version: u64) -> Result<()> {
        let _gate = self.write_gate.lock().await;

        match self.load_session(&session.id).await? {
            Some(stored) => {
                if stored.version != expected_version {
                    tracing::warn!(
                        session_id = %session.id,
                        expected_version,
                        stored_version = stored.version,
                        "optimistic version check failed"
                    );
                    return Err(DeckrankError::concurrent_modification(
                        &session.id,
                        expected_version,
                    ));
                }
            }
            None => {
                if expected_version != 0 {
                    return Err(DeckrankError::not_found("session", session.id.clone()));
                }
            }
        }

        self.write_session(session).await
    }
}
