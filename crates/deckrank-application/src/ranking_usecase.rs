//! Ranking use case.
//!
//! Orchestrates the session state machine, the hierarchical expansion
//! engine, and the recovery layer behind the transport-agnostic operations
//! the presentation layer calls: start, swipe, vote, hierarchical status,
//! and session snapshot.

use crate::recovery::RecoveryService;
use crate::retry::RetryPolicy;
use deckrank_core::card::{Card, CardDirectory};
use deckrank_core::error::{DeckrankError, Result};
use deckrank_core::expansion::{ExpansionEngine, ExpansionStep};
use deckrank_core::session::{
    HierarchicalPhase, Session, SessionBackupStore, SessionRepository, SessionStatus,
    SwipeDirection, TurnOutcome, machine,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;

/// Result of starting a ranking session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStart {
    pub session_id: String,
    pub next_card: Card,
}

/// Continuation returned by both `swipe` and `vote`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnResponse {
    /// Present this candidate for the next swipe.
    NextCard { card: Card },
    /// Ask the user which of the two cards they prefer, then vote.
    VoteRequired { card_a: Card, card_b: Card },
    /// Session finished; when `awaiting_children` is set the caller should
    /// poll `hierarchical_status` to drive family rankings.
    Completed { awaiting_children: bool },
}

/// Snapshot of hierarchical progress for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchicalStatus {
    pub is_hierarchical: bool,
    pub action: HierarchicalAction,
}

/// What the presentation layer should do about child families.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HierarchicalAction {
    /// Nothing to do (plain session, or still swiping/voting).
    None,
    /// Run the given child session next.
    StartChildSession {
        child_session_id: String,
        parent_name: String,
        cards: Vec<Card>,
    },
    /// The flattened ranking has been applied; the session is final.
    Completed,
}

/// Use case exposing the engine's operations to the presentation layer.
///
/// Stateless between calls: every operation loads the session document
/// through the recovery layer, applies one state transition, and persists
/// it under the optimistic version check.
pub struct RankingUseCase {
    directory: Arc<dyn CardDirectory>,
    recovery: Arc<RecoveryService>,
    expansion: Arc<ExpansionEngine>,
    retry: RetryPolicy,
}

impl RankingUseCase {
    pub fn new(
        directory: Arc<dyn CardDirectory>,
        sessions: Arc<dyn SessionRepository>,
        backups: Arc<dyn SessionBackupStore>,
    ) -> Self {
        Self {
            recovery: Arc::new(RecoveryService::new(sessions.clone(), backups)),
            expansion: Arc::new(ExpansionEngine::new(directory.clone(), sessions)),
            directory,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Starts a ranking session over a deck.
    ///
    /// # Errors
    ///
    /// `EmptyDeck` when fewer than two eligible cards exist.
    pub async fn start_session(
        &self,
        organization_id: &str,
        deck_tag: &str,
    ) -> Result<SessionStart> {
        let cards: Vec<Card> = self
            .directory
            .deck_cards(organization_id, deck_tag)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();

        if cards.len() < 2 {
            return Err(DeckrankError::empty_deck(deck_tag, cards.len()));
        }

        let mut rng = StdRng::from_entropy();
        let session = machine::new_session(organization_id, deck_tag, &cards, &mut rng);
        self.recovery.create(&session).await?;

        let next_id = session
            .next_candidate()
            .ok_or_else(|| DeckrankError::internal("fresh session has no candidates"))?;
        let next_card = self.card(next_id).await?;

        tracing::info!(
            session_id = %session.id,
            deck_tag,
            candidates = session.candidate_ids.len(),
            "ranking session started"
        );
        Ok(SessionStart {
            session_id: session.id.clone(),
            next_card,
        })
    }

    /// Records one swipe decision.
    pub async fn swipe(
        &self,
        session_id: &str,
        card_id: &str,
        direction: SwipeDirection,
    ) -> Result<TurnResponse> {
        self.with_retries(|| self.try_swipe(session_id, card_id, direction))
            .await
    }

    /// Applies one judged comparison.
    pub async fn vote(
        &self,
        session_id: &str,
        card_a: &str,
        card_b: &str,
        winner: &str,
    ) -> Result<TurnResponse> {
        self.with_retries(|| self.try_vote(session_id, card_a, card_b, winner))
            .await
    }

    /// Reports hierarchical progress, creating or resuming the next child
    /// family when the top-level ranking is waiting on one, and applying
    /// the flattened ranking once every family has completed.
    ///
    /// Runs under the retry policy like `swipe` and `vote`: a lost version
    /// race replays against the fresh document, where the child-reference
    /// check collapses onto the family the winning writer started.
    pub async fn hierarchical_status(&self, session_id: &str) -> Result<HierarchicalStatus> {
        self.with_retries(|| self.try_hierarchical_status(session_id))
            .await
    }

    async fn try_hierarchical_status(&self, session_id: &str) -> Result<HierarchicalStatus> {
        let mut session = self.recovery.load(session_id).await?;
        let is_hierarchical =
            session.hierarchical_phase.is_some() || session.is_hierarchically_expanded;

        if session.status != SessionStatus::WaitingForChildren {
            let action = if session.status == SessionStatus::Completed && is_hierarchical {
                HierarchicalAction::Completed
            } else {
                HierarchicalAction::None
            };
            return Ok(HierarchicalStatus {
                is_hierarchical,
                action,
            });
        }

        let expected = session.version;
        let before = session.clone();
        let mut rng = StdRng::from_entropy();

        let action = match self.expansion.next_step(&mut session, &mut rng).await? {
            ExpansionStep::StartChildSession {
                child_session_id,
                parent_name,
                cards,
                ..
            } => HierarchicalAction::StartChildSession {
                child_session_id,
                parent_name,
                cards,
            },
            ExpansionStep::AllFamiliesComplete => {
                let result = self.expansion.expand(&session).await?;
                ExpansionEngine::apply_expansion(&mut session, &result);
                tracing::info!(
                    session_id = %session.id,
                    expanded_len = result.expanded.len(),
                    families = result.actions.len(),
                    "hierarchical expansion applied"
                );
                HierarchicalAction::Completed
            }
        };

        // Resuming an existing family leaves the document untouched;
        // only persist when the walk actually changed it.
        if session != before {
            self.recovery.store(&mut session, expected).await?;
        }

        Ok(HierarchicalStatus {
            is_hierarchical: true,
            action,
        })
    }

    /// Returns the full session document for resume. Never mutates.
    pub async fn session_snapshot(&self, session_id: &str) -> Result<Session> {
        self.recovery.load(session_id).await
    }

    async fn try_swipe(
        &self,
        session_id: &str,
        card_id: &str,
        direction: SwipeDirection,
    ) -> Result<TurnResponse> {
        let mut session = self.recovery.load(session_id).await?;
        let expected = session.version;

        let mut rng = StdRng::from_entropy();
        let outcome = machine::process_swipe(&mut session, card_id, direction, &mut rng)?;
        let response = self.finish_turn(&mut session, outcome).await?;

        self.recovery.store(&mut session, expected).await?;
        Ok(response)
    }

    async fn try_vote(
        &self,
        session_id: &str,
        card_a: &str,
        card_b: &str,
        winner: &str,
    ) -> Result<TurnResponse> {
        let mut session = self.recovery.load(session_id).await?;
        let expected = session.version;

        let outcome = machine::process_vote(&mut session, card_a, card_b, winner)?;
        let response = self.finish_turn(&mut session, outcome).await?;

        self.recovery.store(&mut session, expected).await?;
        Ok(response)
    }

    /// Maps a state-machine outcome to a presentation response, promoting
    /// a freshly completed session to `WaitingForChildren` when its ranking
    /// contains parent cards.
    async fn finish_turn(
        &self,
        session: &mut Session,
        outcome: TurnOutcome,
    ) -> Result<TurnResponse> {
        match outcome {
            TurnOutcome::NextCard(card_id) => Ok(TurnResponse::NextCard {
                card: self.card(&card_id).await?,
            }),
            TurnOutcome::VoteRequired { card_a, card_b } => Ok(TurnResponse::VoteRequired {
                card_a: self.card(&card_a).await?,
                card_b: self.card(&card_b).await?,
            }),
            TurnOutcome::Completed => {
                let awaiting_children = self.expansion.needs_expansion(session).await?;
                if awaiting_children {
                    session.status = SessionStatus::WaitingForChildren;
                    session.hierarchical_phase = Some(HierarchicalPhase::Expanding);
                    tracing::info!(
                        session_id = %session.id,
                        "ranking contains parent cards, awaiting child families"
                    );
                }
                Ok(TurnResponse::Completed { awaiting_children })
            }
        }
    }

    /// Runs an operation under the retry policy. Each attempt refetches
    /// current state, so a `ConcurrentModification` replay sees the
    /// competing write.
    async fn with_retries<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut remaining = self.retry.max_attempts();
        loop {
            match operation().await {
                Err(e) if remaining > 1 && self.retry.should_retry(&e) => {
                    remaining -= 1;
                    tracing::warn!(error = %e, remaining, "retrying session operation");
                }
                other => return other,
            }
        }
    }

    async fn card(&self, card_id: &str) -> Result<Card> {
        self.directory
            .get(card_id)
            .await?
            .ok_or_else(|| DeckrankError::not_found("card", card_id))
    }
}
