//! Error types for the Deckrank engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Deckrank engine.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum DeckrankError {
    /// Deck has too few eligible cards to start a ranking session.
    /// Fatal for this deck; there is nothing to retry.
    #[error("Deck '{deck_tag}' has too few eligible cards ({count})")]
    EmptyDeck { deck_tag: String, count: usize },

    /// Swipe arrived out of order or for an already-consumed candidate.
    #[error("Invalid swipe for card '{card_id}': {reason}")]
    InvalidSwipeSequence { card_id: String, reason: String },

    /// Vote does not match the pending comparison pair.
    #[error("Stale vote ({card_a} vs {card_b}): {reason}")]
    StaleVote {
        card_a: String,
        card_b: String,
        reason: String,
    },

    /// Optimistic concurrency check failed: the session was modified
    /// since it was read.
    #[error("Concurrent modification of session '{session_id}' (expected version {expected})")]
    ConcurrentModification { session_id: String, expected: u64 },

    /// Session document failed structural/logical validation.
    #[error("Session integrity violated: {}", .violations.join("; "))]
    IntegrityViolation { violations: Vec<String> },

    /// Recovery exhausted; only a fresh session remains.
    #[error("Session '{session_id}' is unrecoverable")]
    Unrecoverable { session_id: String },

    /// Candidate handed to the insertion engine is already ranked.
    #[error("Candidate '{card_id}' is already present in the ranking")]
    DuplicateCandidate { card_id: String },

    /// Judged winner is neither of the two compared cards.
    #[error("Winner '{card_id}' is not one of the compared cards")]
    InvalidWinner { card_id: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckrankError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an EmptyDeck error
    pub fn empty_deck(deck_tag: impl Into<String>, count: usize) -> Self {
        Self::EmptyDeck {
            deck_tag: deck_tag.into(),
            count,
        }
    }

    /// Creates an InvalidSwipeSequence error
    pub fn invalid_swipe(card_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSwipeSequence {
            card_id: card_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a StaleVote error
    pub fn stale_vote(
        card_a: impl Into<String>,
        card_b: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StaleVote {
            card_a: card_a.into(),
            card_b: card_b.into(),
            reason: reason.into(),
        }
    }

    /// Creates a ConcurrentModification error
    pub fn concurrent_modification(session_id: impl Into<String>, expected: u64) -> Self {
        Self::ConcurrentModification {
            session_id: session_id.into(),
            expected,
        }
    }

    /// Creates an IntegrityViolation error
    pub fn integrity(violations: Vec<String>) -> Self {
        Self::IntegrityViolation { violations }
    }

    /// Creates an Unrecoverable error
    pub fn unrecoverable(session_id: impl Into<String>) -> Self {
        Self::Unrecoverable {
            session_id: session_id.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a ConcurrentModification error
    pub fn is_concurrent_modification(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    /// Check if this is an IntegrityViolation error
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation { .. })
    }

    /// Check if this is an Unrecoverable error
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable { .. })
    }

    /// Check if this error means the client is out of sync with the session
    /// (resurfaced to the caller, never retried automatically).
    pub fn is_client_out_of_sync(&self) -> bool {
        matches!(
            self,
            Self::InvalidSwipeSequence { .. } | Self::StaleVote { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for DeckrankError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for DeckrankError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DeckrankError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DeckrankError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (adapter boundaries only)
impl From<anyhow::Error> for DeckrankError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, DeckrankError>`.
pub type Result<T> = std::result::Result<T, DeckrankError>;
