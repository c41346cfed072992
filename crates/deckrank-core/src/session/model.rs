//! Session domain model.
//!
//! A `Session` is one ranking attempt over one deck: the shuffled candidate
//! order, the chronological swipe and vote logs, and the in-progress
//! personal ranking. Hierarchical sessions additionally carry an expansion
//! phase marker and back-references to their child sessions.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a ranking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Presenting candidates for accept/reject decisions.
    Swiping,
    /// Suspended on a pairwise comparison; exactly one vote is pending.
    Voting,
    /// Top-level ranking finished; child families still being ranked.
    WaitingForChildren,
    /// Final ranking available in `personal_ranking`.
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swiping => "swiping",
            Self::Voting => "voting",
            Self::WaitingForChildren => "waiting_for_children",
            Self::Completed => "completed",
        }
    }
}

/// Direction of a swipe decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// Reject: the candidate is discarded.
    Left,
    /// Accept: the candidate enters the ranking.
    Right,
}

/// A single recorded swipe decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeEvent {
    pub card_id: String,
    pub direction: SwipeDirection,
    /// Timestamp of the swipe (ISO 8601 format)
    pub timestamp: String,
}

/// A single pairwise comparison result. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteEvent {
    pub card_a: String,
    pub card_b: String,
    pub winner: String,
    /// Timestamp of the vote (ISO 8601 format)
    pub timestamp: String,
}

/// The comparison the insertion engine is suspended on.
///
/// Persisted so an interrupted session resumes at the exact same question
/// and stale votes can be rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingComparison {
    /// The newly accepted candidate awaiting placement.
    pub candidate: String,
    /// The randomly selected existing member it is compared against.
    pub comparator: String,
}

/// Progress marker for hierarchical sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchicalPhase {
    /// Child families are being ranked, strictly in parent-rank order.
    Expanding,
    /// The flattened ranking has been applied.
    Expanded,
}

/// Back-reference to a child session ranking one parent's family.
///
/// The child session is an independent document; this entry is a lookup
/// reference, not a containment link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSessionRef {
    pub parent_card_id: String,
    pub parent_name: String,
    pub session_id: String,
    pub status: SessionStatus,
}

/// One ranking attempt over one deck.
///
/// Invariants (enforced by `validate::validate_integrity`):
/// - `personal_ranking` is a duplicate-free subset of `candidate_ids`
///   (plus descendant ids once hierarchically expanded)
/// - every card id in `swipes` and `votes` appears in `candidate_ids`
/// - `Voting` status implies a recorded `pending_vote`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Owning organization identifier
    pub organization_id: String,
    /// Deck tag this session ranks (parent card id for child sessions)
    pub deck_tag: String,
    /// Candidate card ids in shuffled presentation order
    pub candidate_ids: Vec<String>,
    /// Chronological swipe log
    #[serde(default)]
    pub swipes: Vec<SwipeEvent>,
    /// Chronological vote log (append-only)
    #[serde(default)]
    pub votes: Vec<VoteEvent>,
    /// The in-progress or final personal ranking (best first)
    #[serde(default)]
    pub personal_ranking: Vec<String>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// The comparison currently awaiting a vote, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_vote: Option<PendingComparison>,
    /// Expansion progress marker (hierarchical sessions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchical_phase: Option<HierarchicalPhase>,
    /// Back-references to child sessions, one per started family
    #[serde(default)]
    pub child_sessions: Vec<ChildSessionRef>,
    /// Whether `personal_ranking` already holds the flattened order
    #[serde(default)]
    pub is_hierarchically_expanded: bool,
    /// Optimistic-concurrency version counter
    #[serde(default)]
    pub version: u64,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session completed (ISO 8601 format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Session {
    /// Returns the next unconsumed candidate, or `None` when every
    /// candidate has been swiped.
    pub fn next_candidate(&self) -> Option<&str> {
        self.candidate_ids
            .iter()
            .find(|id| !self.has_swiped(id))
            .map(String::as_str)
    }

    /// Whether a swipe has been recorded for the given card.
    pub fn has_swiped(&self, card_id: &str) -> bool {
        self.swipes.iter().any(|s| s.card_id == card_id)
    }

    /// Looks up the child-session reference for a parent card, if one
    /// has been started.
    pub fn child_ref(&self, parent_card_id: &str) -> Option<&ChildSessionRef> {
        self.child_sessions
            .iter()
            .find(|c| c.parent_card_id == parent_card_id)
    }
}
