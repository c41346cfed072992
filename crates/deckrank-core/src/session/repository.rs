//! Session repository traits.
//!
//! Defines the interface for session persistence operations. The engine
//! specifies the document's logical shape, never the storage mechanism.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// This trait defines the contract for persisting and retrieving sessions,
/// decoupling the engine from the specific storage mechanism (TOML files,
/// database, remote API).
///
/// # Implementation Notes
///
/// `save_expecting_version` is the optimistic-concurrency seam: the check
/// against the stored version and the write must be atomic with respect to
/// other callers of the same repository instance.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Saves a session unconditionally.
    ///
    /// Used for initial creation and for restoring a recovered document;
    /// state-changing operations go through `save_expecting_version`.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Saves a session only if the stored version still equals
    /// `expected_version`.
    ///
    /// The caller must have already set `session.version` to
    /// `expected_version + 1`. A session that does not exist yet is treated
    /// as version-compatible when `expected_version` is 0.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` when the stored version differs from
    /// `expected_version`.
    async fn save_expecting_version(&self, session: &Session, expected_version: u64)
    -> Result<()>;
}

/// Store for per-session backup snapshots used by the recovery layer.
///
/// A snapshot is the most recent known-good copy of a session document;
/// the recovery layer restores from it when the primary copy fails
/// validation.
#[async_trait]
pub trait SessionBackupStore: Send + Sync {
    /// Writes (or overwrites) the backup snapshot for a session.
    async fn snapshot(&self, session: &Session) -> Result<()>;

    /// Reads the most recent backup snapshot for a session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: A snapshot exists
    /// - `Ok(None)`: No snapshot has been written
    /// - `Err(_)`: Error occurred during retrieval
    async fn restore(&self, session_id: &str) -> Result<Option<Session>>;
}
