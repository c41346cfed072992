//! Session integrity validation.
//!
//! One exhaustive check at the persistence boundary instead of ad hoc field
//! checks scattered across callers. `validate_integrity` never mutates; it
//! reports every violated invariant so the recovery layer can log and act.

use crate::session::{Session, SessionStatus};
use std::collections::HashSet;

/// Outcome of an integrity check: empty means the document is sound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntegrityReport {
    pub violations: Vec<String>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

fn is_rfc3339(value: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(value).is_ok()
}

/// Validates a session document's structural and logical integrity.
///
/// Checks required fields, duplicate/foreign identifiers in the ranking,
/// event references, timestamp formats, and state-specific invariants
/// (a `Voting` session must carry its pending comparison, a `Completed`
/// one must not). The `version` counter is a `u64` and therefore
/// non-negative by construction.
pub fn validate_integrity(session: &Session) -> IntegrityReport {
    let mut violations = Vec::new();

    if session.id.is_empty() {
        violations.push("session id is empty".to_string());
    }
    if session.organization_id.is_empty() {
        violations.push("organization id is empty".to_string());
    }
    if session.deck_tag.is_empty() {
        violations.push("deck tag is empty".to_string());
    }

    let candidates: HashSet<&str> = session.candidate_ids.iter().map(String::as_str).collect();
    if candidates.len() != session.candidate_ids.len() {
        violations.push("candidate list contains duplicates".to_string());
    }

    let mut seen = HashSet::new();
    for card_id in &session.personal_ranking {
        if !seen.insert(card_id.as_str()) {
            violations.push(format!("ranking contains duplicate card '{card_id}'"));
        }
        // Once expanded the ranking legitimately holds descendant ids the
        // candidate list never knew about, so membership is only checked
        // against the original candidates before expansion.
        if !session.is_hierarchically_expanded && !candidates.contains(card_id.as_str()) {
            violations.push(format!("ranking contains foreign card '{card_id}'"));
        }
    }

    for swipe in &session.swipes {
        if !candidates.contains(swipe.card_id.as_str()) {
            violations.push(format!(
                "swipe references card '{}' outside the candidate list",
                swipe.card_id
            ));
        }
        if !is_rfc3339(&swipe.timestamp) {
            violations.push(format!(
                "swipe on '{}' has a malformed timestamp",
                swipe.card_id
            ));
        }
    }

    for vote in &session.votes {
        for card_id in [&vote.card_a, &vote.card_b] {
            if !candidates.contains(card_id.as_str()) {
                violations.push(format!(
                    "vote references card '{card_id}' outside the candidate list"
                ));
            }
        }
        if vote.winner != vote.card_a && vote.winner != vote.card_b {
            violations.push(format!(
                "vote winner '{}' is neither of the compared cards",
                vote.winner
            ));
        }
        if !is_rfc3339(&vote.timestamp) {
            violations.push("vote has a malformed timestamp".to_string());
        }
    }

    match session.status {
        SessionStatus::Voting => match &session.pending_vote {
            Some(pending) => {
                if !candidates.contains(pending.candidate.as_str()) {
                    violations.push(format!(
                        "pending comparison candidate '{}' is not a session candidate",
                        pending.candidate
                    ));
                }
                if !session
                    .personal_ranking
                    .iter()
                    .any(|id| id == &pending.comparator)
                {
                    violations.push(format!(
                        "pending comparison comparator '{}' is not in the ranking",
                        pending.comparator
                    ));
                }
            }
            None => {
                violations.push("voting session has no pending comparison".to_string());
            }
        },
        _ => {
            if session.pending_vote.is_some() {
                violations.push(format!(
                    "session in status '{}' carries a pending comparison",
                    session.status.as_str()
                ));
            }
        }
    }

    if session.status == SessionStatus::WaitingForChildren && session.hierarchical_phase.is_none()
    {
        violations.push("waiting_for_children session has no hierarchical phase".to_string());
    }

    let mut parents = HashSet::new();
    for child_ref in &session.child_sessions {
        if !parents.insert(child_ref.parent_card_id.as_str()) {
            violations.push(format!(
                "duplicate child session for parent '{}'",
                child_ref.parent_card_id
            ));
        }
        if child_ref.session_id.is_empty() {
            violations.push(format!(
                "child session reference for parent '{}' has no session id",
                child_ref.parent_card_id
            ));
        }
    }

    if !is_rfc3339(&session.created_at) {
        violations.push("created_at is malformed".to_string());
    }
    if let Some(completed_at) = &session.completed_at {
        if !is_rfc3339(completed_at) {
            violations.push("completed_at is malformed".to_string());
        }
    }

    IntegrityReport { violations }
}
