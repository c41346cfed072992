//! Recovery and validation wrapper around session persistence.
//!
//! Every read and write of a session document passes through
//! `RecoveryService`: documents are validated on the way in and out, and a
//! failed validation triggers reconstruction — first a refetch, then the
//! most recent backup snapshot. Only when both fail is the session declared
//! unrecoverable.

use deckrank_core::error::{DeckrankError, Result};
use deckrank_core::session::{Session, SessionBackupStore, SessionRepository};
use deckrank_core::validate::validate_integrity;
use std::sync::Arc;

/// Validating gateway to the session repository.
pub struct RecoveryService {
    sessions: Arc<dyn SessionRepository>,
    backups: Arc<dyn SessionBackupStore>,
}

impl RecoveryService {
    pub fn new(sessions: Arc<dyn SessionRepository>, backups: Arc<dyn SessionBackupStore>) -> Self {
        Self { sessions, backups }
    }

    /// Persists a freshly created session and writes its first snapshot.
    pub async fn create(&self, session: &Session) -> Result<()> {
        let report = validate_integrity(session);
        if !report.is_ok() {
            return Err(DeckrankError::integrity(report.violations));
        }
        self.sessions.save(session).await?;
        self.snapshot(session).await;
        Ok(())
    }

    /// Loads a session, validating it and attempting recovery when the
    /// stored document is corrupt.
    pub async fn load(&self, session_id: &str) -> Result<Session> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| DeckrankError::not_found("session", session_id))?;

        let report = validate_integrity(&session);
        if report.is_ok() {
            return Ok(session);
        }

        tracing::warn!(
            session_id,
            violations = ?report.violations,
            "session failed integrity check, attempting recovery"
        );
        self.recover(session_id).await
    }

    /// Persists a mutated session under the optimistic version check and
    /// refreshes its backup snapshot.
    ///
    /// `expected_version` is the version read at the start of the
    /// operation; the stored document must still carry it.
    pub async fn store(&self, session: &mut Session, expected_version: u64) -> Result<()> {
        session.version = expected_version + 1;

        let report = validate_integrity(session);
        if !report.is_ok() {
            return Err(DeckrankError::integrity(report.violations));
        }

        self.sessions
            .save_expecting_version(session, expected_version)
            .await?;
        self.snapshot(session).await;
        Ok(())
    }

    /// Attempts reconstruction of a corrupt or conflicted session:
    /// (a) refetch and revalidate, (b) restore the latest backup snapshot.
    ///
    /// A restored snapshot is written back as the current document so
    /// subsequent reads see it.
    pub async fn recover(&self, session_id: &str) -> Result<Session> {
        if let Some(session) = self.sessions.find_by_id(session_id).await? {
            if validate_integrity(&session).is_ok() {
                tracing::info!(session_id, "session recovered by refetch");
                return Ok(session);
            }
        }

        if let Some(backup) = self.backups.restore(session_id).await? {
            if validate_integrity(&backup).is_ok() {
                self.sessions.save(&backup).await?;
                tracing::info!(session_id, "session restored from backup snapshot");
                return Ok(backup);
            }
            tracing::warn!(session_id, "backup snapshot also failed validation");
        }

        Err(DeckrankError::unrecoverable(session_id))
    }

    /// Snapshot failures never fail the operation that triggered them.
    async fn snapshot(&self, session: &Session) {
        if let Err(e) = self.backups.snapshot(session).await {
            tracing::warn!(
                session_id = %session.id,
                error = %e,
                "failed to write backup snapshot"
            );
        }
    }
}
