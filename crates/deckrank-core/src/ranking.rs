//! Ranking insertion engine.
//!
//! Places a newly accepted candidate into a partially built ranking with at
//! most one pairwise comparison per accepted card. An empty ranking accepts
//! the candidate immediately; otherwise one existing member is drawn
//! uniformly at random as the comparator and the engine suspends until the
//! caller supplies the judged winner. This is deliberately a single
//! comparison, not a binary search: each right-swipe costs the user at most
//! one vote.

use crate::error::{DeckrankError, Result};
use rand::Rng;

/// Outcome of starting an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Ranking was empty; the candidate was appended without a vote.
    Appended,
    /// The engine is suspended: the caller must obtain a judged winner
    /// between `candidate` and `comparator`, then call `apply_judgement`.
    VoteRequired {
        candidate: String,
        comparator: String,
    },
}

/// Begins inserting `candidate` into `ranking`.
///
/// Appends directly when the ranking is empty. Otherwise selects a
/// comparator uniformly at random and returns the comparison the caller
/// must judge; the ranking is not modified in that case.
///
/// # Errors
///
/// `DuplicateCandidate` if the candidate is already ranked.
pub fn begin_insert(
    candidate: &str,
    ranking: &mut Vec<String>,
    rng: &mut impl Rng,
) -> Result<InsertOutcome> {
    if ranking.iter().any(|id| id == candidate) {
        return Err(DeckrankError::DuplicateCandidate {
            card_id: candidate.to_string(),
        });
    }

    if ranking.is_empty() {
        ranking.push(candidate.to_string());
        return Ok(InsertOutcome::Appended);
    }

    let comparator = ranking[rng.gen_range(0..ranking.len())].clone();
    Ok(InsertOutcome::VoteRequired {
        candidate: candidate.to_string(),
        comparator,
    })
}

/// Applies a judged comparison: the candidate is inserted immediately
/// before the comparator when it won, immediately after when it lost.
///
/// Returns the position the candidate was inserted at. The resulting
/// ranking is exactly one element longer and the relative order of all
/// other elements is preserved.
///
/// # Errors
///
/// - `DuplicateCandidate` if the candidate is already ranked
/// - `InvalidWinner` if `winner` is neither of the two compared cards
/// - `Internal` if the comparator is no longer present in the ranking
pub fn apply_judgement(
    candidate: &str,
    comparator: &str,
    winner: &str,
    ranking: &mut Vec<String>,
) -> Result<usize> {
    if ranking.iter().any(|id| id == candidate) {
        return Err(DeckrankError::DuplicateCandidate {
            card_id: candidate.to_string(),
        });
    }

    let comparator_pos = ranking
        .iter()
        .position(|id| id == comparator)
        .ok_or_else(|| {
            DeckrankError::internal(format!(
                "comparator '{comparator}' is not present in the ranking"
            ))
        })?;

    let position = if winner == candidate {
        comparator_pos
    } else if winner == comparator {
        comparator_pos + 1
    } else {
        return Err(DeckrankError::InvalidWinner {
            card_id: winner.to_string(),
        });
    };

    ranking.insert(position, candidate.to_string());
    Ok(position)
}
