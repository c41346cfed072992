//! Session DTOs and migrations

use serde::{Deserialize, Serialize};
use version_migrate::{IntoDomain, Versioned};

use deckrank_core::session::{
    ChildSessionRef, HierarchicalPhase, PendingComparison, Session, SessionStatus, SwipeDirection,
    SwipeEvent, VoteEvent,
};

/// Session status DTO matching the domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatusDTO {
    Swiping,
    Voting,
    WaitingForChildren,
    Completed,
}

impl From<SessionStatusDTO> for SessionStatus {
    fn from(dto: SessionStatusDTO) -> Self {
        match dto {
            SessionStatusDTO::Swiping => SessionStatus::Swiping,
            SessionStatusDTO::Voting => SessionStatus::Voting,
            SessionStatusDTO::WaitingForChildren => SessionStatus::WaitingForChildren,
            SessionStatusDTO::Completed => SessionStatus::Completed,
        }
    }
}

impl From<SessionStatus> for SessionStatusDTO {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Swiping => SessionStatusDTO::Swiping,
            SessionStatus::Voting => SessionStatusDTO::Voting,
            SessionStatus::WaitingForChildren => SessionStatusDTO::WaitingForChildren,
            SessionStatus::Completed => SessionStatusDTO::Completed,
        }
    }
}

/// Swipe direction DTO matching the domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirectionDTO {
    Left,
    Right,
}

impl From<SwipeDirectionDTO> for SwipeDirection {
    fn from(dto: SwipeDirectionDTO) -> Self {
        match dto {
            SwipeDirectionDTO::Left => SwipeDirection::Left,
            SwipeDirectionDTO::Right => SwipeDirection::Right,
        }
    }
}

impl From<SwipeDirection> for SwipeDirectionDTO {
    fn from(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Left => SwipeDirectionDTO::Left,
            SwipeDirection::Right => SwipeDirectionDTO::Right,
        }
    }
}

/// Hierarchical phase DTO matching the domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchicalPhaseDTO {
    Expanding,
    Expanded,
}

impl From<HierarchicalPhaseDTO> for HierarchicalPhase {
    fn from(dto: HierarchicalPhaseDTO) -> Self {
        match dto {
            HierarchicalPhaseDTO::Expanding => HierarchicalPhase::Expanding,
            HierarchicalPhaseDTO::Expanded => HierarchicalPhase::Expanded,
        }
    }
}

impl From<HierarchicalPhase> for HierarchicalPhaseDTO {
    fn from(phase: HierarchicalPhase) -> Self {
        match phase {
            HierarchicalPhase::Expanding => HierarchicalPhaseDTO::Expanding,
            HierarchicalPhase::Expanded => HierarchicalPhaseDTO::Expanded,
        }
    }
}

/// Swipe event DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeEventDTO {
    pub card_id: String,
    pub direction: SwipeDirectionDTO,
    pub timestamp: String,
}

impl From<SwipeEventDTO> for SwipeEvent {
    fn from(dto: SwipeEventDTO) -> Self {
        SwipeEvent {
            card_id: dto.card_id,
            direction: dto.direction.into(),
            timestamp: dto.timestamp,
        }
    }
}

impl From<SwipeEvent> for SwipeEventDTO {
    fn from(event: SwipeEvent) -> Self {
        SwipeEventDTO {
            card_id: event.card_id,
            direction: event.direction.into(),
            timestamp: event.timestamp,
        }
    }
}

/// Vote event DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteEventDTO {
    pub card_a: String,
    pub card_b: String,
    pub winner: String,
    pub timestamp: String,
}

impl From<VoteEventDTO> for VoteEvent {
    fn from(dto: VoteEventDTO) -> Self {
        VoteEvent {
            card_a: dto.card_a,
            card_b: dto.card_b,
            winner: dto.winner,
            timestamp: dto.timestamp,
        }
    }
}

impl From<VoteEvent> for VoteEventDTO {
    fn from(event: VoteEvent) -> Self {
        VoteEventDTO {
            card_a: event.card_a,
            card_b: event.card_b,
            winner: event.winner,
            timestamp: event.timestamp,
        }
    }
}

/// Pending comparison DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingComparisonDTO {
    pub candidate: String,
    pub comparator: String,
}

impl From<PendingComparisonDTO> for PendingComparison {
    fn from(dto: PendingComparisonDTO) -> Self {
        PendingComparison {
            candidate: dto.candidate,
            comparator: dto.comparator,
        }
    }
}

impl From<PendingComparison> for PendingComparisonDTO {
    fn from(pending: PendingComparison) -> Self {
        PendingComparisonDTO {
            candidate: pending.candidate,
            comparator: pending.comparator,
        }
    }
}

/// Child session reference DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSessionRefDTO {
    pub parent_card_id: String,
    pub parent_name: String,
    pub session_id: String,
    pub status: SessionStatusDTO,
}

impl From<ChildSessionRefDTO> for ChildSessionRef {
    fn from(dto: ChildSessionRefDTO) -> Self {
        ChildSessionRef {
            parent_card_id: dto.parent_card_id,
            parent_name: dto.parent_name,
            session_id: dto.session_id,
            status: dto.status.into(),
        }
    }
}

impl From<ChildSessionRef> for ChildSessionRefDTO {
    fn from(child_ref: ChildSessionRef) -> Self {
        ChildSessionRefDTO {
            parent_card_id: child_ref.parent_card_id,
            parent_name: child_ref.parent_name,
            session_id: child_ref.session_id,
            status: child_ref.status.into(),
        }
    }
}

/// V1.0.0: Initial session schema.
///
/// The optimistic-concurrency counter is persisted as `revision`: the
/// `version` key is the schema-version envelope owned by the migrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct SessionV1_0_0 {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Owning organization identifier.
    pub organization_id: String,
    /// Deck tag this session ranks.
    pub deck_tag: String,
    /// Candidate card ids in shuffled presentation order.
    pub candidate_ids: Vec<String>,
    /// Chronological swipe log.
    #[serde(default)]
    pub swipes: Vec<SwipeEventDTO>,
    /// Chronological vote log.
    #[serde(default)]
    pub votes: Vec<VoteEventDTO>,
    /// The in-progress or final personal ranking.
    #[serde(default)]
    pub personal_ranking: Vec<String>,
    /// Lifecycle status.
    pub status: SessionStatusDTO,
    /// The comparison currently awaiting a vote, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_vote: Option<PendingComparisonDTO>,
    /// Expansion progress marker (hierarchical sessions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchical_phase: Option<HierarchicalPhaseDTO>,
    /// Back-references to child sessions.
    #[serde(default)]
    pub child_sessions: Vec<ChildSessionRefDTO>,
    /// Whether the ranking already holds the flattened order.
    #[serde(default)]
    pub is_hierarchically_expanded: bool,
    /// Optimistic-concurrency counter (domain `version`).
    #[serde(default)]
    pub revision: u64,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the session completed (ISO 8601 format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert SessionV1_0_0 DTO to domain model.
impl IntoDomain<Session> for SessionV1_0_0 {
    fn into_domain(self) -> Session {
        Session {
            id: self.id,
            organization_id: self.organization_id,
            deck_tag: self.deck_tag,
            candidate_ids: self.candidate_ids,
            swipes: self.swipes.into_iter().map(Into::into).collect(),
            votes: self.votes.into_iter().map(Into::into).collect(),
            personal_ranking: self.personal_ranking,
            status: self.status.into(),
            pending_vote: self.pending_vote.map(Into::into),
            hierarchical_phase: self.hierarchical_phase.map(Into::into),
            child_sessions: self.child_sessions.into_iter().map(Into::into).collect(),
            is_hierarchically_expanded: self.is_hierarchically_expanded,
            version: self.revision,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Convert domain model to SessionV1_0_0 DTO for persistence.
impl version_migrate::FromDomain<Session> for SessionV1_0_0 {
    fn from_domain(session: Session) -> Self {
        SessionV1_0_0 {
            id: session.id,
            organization_id: session.organization_id,
            deck_tag: session.deck_tag,
            candidate_ids: session.candidate_ids,
            swipes: session.swipes.into_iter().map(Into::into).collect(),
            votes: session.votes.into_iter().map(Into::into).collect(),
            personal_ranking: session.personal_ranking,
            status: session.status.into(),
            pending_vote: session.pending_vote.map(Into::into),
            hierarchical_phase: session.hierarchical_phase.map(Into::into),
            child_sessions: session.child_sessions.into_iter().map(Into::into).collect(),
            is_hierarchically_expanded: session.is_hierarchically_expanded,
            revision: session.version,
            created_at: session.created_at,
            completed_at: session.completed_at,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for Session entities.
///
/// # Migration Path
///
/// - V1.0.0 → Session: Converts DTO to domain model
pub fn create_session_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0.0 -> Session
    let session_path = version_migrate::Migrator::define("session")
        .from::<SessionV1_0_0>()
        .into_with_save::<Session>();

    migrator
        .register(session_path)
        .expect("Failed to register session migration path");

    migrator
}
