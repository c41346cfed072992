//! Session state machine.
//!
//! Stateless operations over an explicit `&mut Session`: no shared engine
//! object, no interior state. The caller owns loading the document, running
//! one operation, and persisting the result under the optimistic version
//! check.

use super::model::{
    PendingComparison, Session, SessionStatus, SwipeDirection, SwipeEvent, VoteEvent,
};
use crate::card::Card;
use crate::error::{DeckrankError, Result};
use crate::ranking::{self, InsertOutcome};
use rand::Rng;
use rand::seq::SliceRandom;

/// What the caller should do next after a swipe or vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Present the next candidate for swiping.
    NextCard(String),
    /// Obtain a judged winner between the two cards, then vote.
    VoteRequired { card_a: String, card_b: String },
    /// Every candidate has been swiped; the ranking is final for this
    /// session (hierarchical promotion is the caller's concern).
    Completed,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Creates a fresh session over the given cards with a uniformly shuffled
/// candidate order.
///
/// Candidate-count policy belongs to the caller: top-level decks require at
/// least two cards, child sessions may run with one.
pub fn new_session(
    organization_id: &str,
    deck_tag: &str,
    cards: &[Card],
    rng: &mut impl Rng,
) -> Session {
    let mut candidate_ids: Vec<String> = cards.iter().map(|c| c.id.clone()).collect();
    candidate_ids.shuffle(rng);

    Session {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        deck_tag: deck_tag.to_string(),
        candidate_ids,
        swipes: Vec::new(),
        votes: Vec::new(),
        personal_ranking: Vec::new(),
        status: SessionStatus::Swiping,
        pending_vote: None,
        hierarchical_phase: None,
        child_sessions: Vec::new(),
        is_hierarchically_expanded: false,
        version: 0,
        created_at: now(),
        completed_at: None,
    }
}

/// Records one swipe decision.
///
/// Requires `Swiping` status and `card_id` to be the next unconsumed
/// candidate; out-of-order and duplicate swipes fail with
/// `InvalidSwipeSequence` and leave the session untouched. A right swipe
/// either appends directly (empty ranking) or suspends the session on a
/// pairwise comparison.
pub fn process_swipe(
    session: &mut Session,
    card_id: &str,
    direction: SwipeDirection,
    rng: &mut impl Rng,
) -> Result<TurnOutcome> {
    if session.status != SessionStatus::Swiping {
        return Err(DeckrankError::invalid_swipe(
            card_id,
            format!("session status is '{}'", session.status.as_str()),
        ));
    }

    match session.next_candidate() {
        Some(next) if next == card_id => {}
        Some(next) => {
            let reason = if session.has_swiped(card_id) {
                format!("card already swiped; expected '{next}' next")
            } else {
                format!("expected '{next}' next")
            };
            return Err(DeckrankError::invalid_swipe(card_id, reason));
        }
        None => {
            return Err(DeckrankError::invalid_swipe(
                card_id,
                "no candidates remain",
            ));
        }
    }

    session.swipes.push(SwipeEvent {
        card_id: card_id.to_string(),
        direction,
        timestamp: now(),
    });

    match direction {
        SwipeDirection::Left => advance(session),
        SwipeDirection::Right => {
            match ranking::begin_insert(card_id, &mut session.personal_ranking, rng)? {
                InsertOutcome::Appended => advance(session),
                InsertOutcome::VoteRequired {
                    candidate,
                    comparator,
                } => {
                    session.status = SessionStatus::Voting;
                    session.pending_vote = Some(PendingComparison {
                        candidate: candidate.clone(),
                        comparator: comparator.clone(),
                    });
                    Ok(TurnOutcome::VoteRequired {
                        card_a: candidate,
                        card_b: comparator,
                    })
                }
            }
        }
    }
}

/// Applies one judged comparison.
///
/// Requires `Voting` status and the pair to match the pending comparison
/// exactly, ignoring order; anything else fails with `StaleVote`. The
/// winner must be one of the two compared cards. On success the vote is
/// appended to the log, the candidate is placed, and swiping resumes.
pub fn process_vote(
    session: &mut Session,
    card_a: &str,
    card_b: &str,
    winner: &str,
) -> Result<TurnOutcome> {
    if session.status != SessionStatus::Voting {
        return Err(DeckrankError::stale_vote(
            card_a,
            card_b,
            "session is not awaiting a vote",
        ));
    }

    let pending = session.pending_vote.clone().ok_or_else(|| {
        DeckrankError::integrity(vec![
            "voting session has no pending comparison recorded".to_string(),
        ])
    })?;

    let pair_matches = (card_a == pending.candidate && card_b == pending.comparator)
        || (card_a == pending.comparator && card_b == pending.candidate);
    if !pair_matches {
        return Err(DeckrankError::stale_vote(
            card_a,
            card_b,
            format!(
                "pending comparison is '{}' vs '{}'",
                pending.candidate, pending.comparator
            ),
        ));
    }

    if winner != pending.candidate && winner != pending.comparator {
        return Err(DeckrankError::InvalidWinner {
            card_id: winner.to_string(),
        });
    }

    ranking::apply_judgement(
        &pending.candidate,
        &pending.comparator,
        winner,
        &mut session.personal_ranking,
    )?;

    session.votes.push(VoteEvent {
        card_a: card_a.to_string(),
        card_b: card_b.to_string(),
        winner: winner.to_string(),
        timestamp: now(),
    });
    session.pending_vote = None;
    session.status = SessionStatus::Swiping;

    advance(session)
}

/// Moves to the next candidate, or completes the session when none remain.
fn advance(session: &mut Session) -> Result<TurnOutcome> {
    match session.next_candidate() {
        Some(next) => Ok(TurnOutcome::NextCard(next.to_string())),
        None => {
            session.status = SessionStatus::Completed;
            session.completed_at = Some(now());
            Ok(TurnOutcome::Completed)
        }
    }
}
