//! Durable backup snapshots for session documents.
//!
//! Each snapshot is one TOML file named `<session-id>.backup.toml`,
//! written via tmp file + fsync + atomic rename so a crash mid-write
//! never corrupts the previous snapshot. The recovery layer restores
//! from these when the primary document fails validation.

use async_trait::async_trait;
use deckrank_core::error::{DeckrankError, Result};
use deckrank_core::session::{Session, SessionBackupStore};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use version_migrate::{FromDomain, IntoDomain};

use crate::dto::SessionV1_0_0;

/// Backup store writing one snapshot file per session.
pub struct TomlBackupStore {
    dir: PathBuf,
}

impl TomlBackupStore {
    /// Creates a backup store rooted at `dir`. The directory is created
    /// lazily on first snapshot.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn backup_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.backup.toml"))
    }

    fn temp_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!(".{session_id}.backup.toml.tmp"))
    }
}

#[async_trait]
impl SessionBackupStore for TomlBackupStore {
    async fn snapshot(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let dto = SessionV1_0_0::from_domain(session.clone());
        let toml_string = toml::to_string_pretty(&dto)?;

        // tmp file + fsync + rename, so the previous snapshot survives
        // a crash mid-write
        let tmp_path = self.temp_path(&session.id);
        let mut tmp_file = File::create(&tmp_path).await?;
        tmp_file.write_all(toml_string.as_bytes()).await?;
        tmp_file.sync_all().await?;
        drop(tmp_file);

        fs::rename(&tmp_path, self.backup_path(&session.id)).await?;
        tracing::debug!(
            session_id = %session.id,
            version = session.version,
            "backup snapshot written"
        );
        Ok(())
    }

    async fn restore(&self, session_id: &str) -> Result<Option<Session>> {
        let path = self.backup_path(session_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DeckrankError::from(e)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let dto: SessionV1_0_0 = toml::from_str(&content)?;
        tracing::info!(session_id, "backup snapshot loaded");
        Ok(Some(dto.into_domain()))
    }
}
