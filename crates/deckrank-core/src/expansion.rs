//! Hierarchical expansion engine.
//!
//! Post-processes a completed top-level ranking: each ranked parent card is
//! replaced in place by `[parent, child₁, child₂, …]` in the order produced
//! by a nested ranking session over that parent's children. Families are
//! expanded strictly in parent-rank order — family *i+1* never starts
//! before family *i* completes, so an interrupted run resumes exactly where
//! it left off.

use crate::card::{Card, CardDirectory};
use crate::error::{DeckrankError, Result};
use crate::session::{
    ChildSessionRef, HierarchicalPhase, Session, SessionStatus, machine,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::session::SessionRepository;

/// What the expansion driver should do next for a parent session.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionStep {
    /// Present the given child session to the user (newly created or
    /// resumed); its candidate cards are included for rendering.
    StartChildSession {
        child_session_id: String,
        parent_card_id: String,
        parent_name: String,
        cards: Vec<Card>,
    },
    /// Every family has a completed child session; the flattened ranking
    /// can be built and applied.
    AllFamiliesComplete,
}

/// Per-parent record of what expansion did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ExpansionAction {
    /// Parent replaced by itself plus `child_count` ranked children.
    Expanded {
        parent_card_id: String,
        child_count: usize,
    },
    /// Parent kept its single slot: no active children, or its child
    /// session ranked none of them.
    Skipped { parent_card_id: String },
}

/// Transient result of expanding a completed ranking. Never persisted as
/// its own entity; `apply_expansion` folds it back into the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionResult {
    /// The parent-level ranking as it was before expansion.
    pub original: Vec<String>,
    /// The fully flattened ranking.
    pub expanded: Vec<String>,
    /// Per-parent action log, in parent-rank order.
    pub actions: Vec<ExpansionAction>,
}

/// Drives nested ranking sessions and stitches their results into one
/// flattened ranking.
pub struct ExpansionEngine {
    directory: Arc<dyn CardDirectory>,
    sessions: Arc<dyn SessionRepository>,
}

impl ExpansionEngine {
    pub fn new(directory: Arc<dyn CardDirectory>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            directory,
            sessions,
        }
    }

    /// Whether any ranked entry is a parent card needing sub-ranking.
    pub async fn needs_expansion(&self, session: &Session) -> Result<bool> {
        for card_id in &session.personal_ranking {
            if let Some(card) = self.directory.get(card_id).await? {
                if card.is_parent {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Advances the family walk by one step.
    ///
    /// Syncs `child_sessions` statuses from the repository, then returns
    /// the first incomplete family in parent-rank order — creating its
    /// child session only when no entry for that parent exists yet, so
    /// concurrent attempts to start the same family collapse to one
    /// session. Parents with no active children are passed over here and
    /// logged as skipped by `expand`.
    ///
    /// The caller must persist the session afterwards if it was mutated.
    pub async fn next_step(
        &self,
        session: &mut Session,
        rng: &mut (impl Rng + Send),
    ) -> Result<ExpansionStep> {
        if session.is_hierarchically_expanded {
            return Ok(ExpansionStep::AllFamiliesComplete);
        }

        self.sync_child_statuses(session).await?;

        let ranked = session.personal_ranking.clone();
        for parent_id in &ranked {
            let Some(card) = self.directory.get(parent_id).await? else {
                continue;
            };
            if !card.is_parent {
                continue;
            }

            let children = self
                .directory
                .children_of(&session.organization_id, parent_id)
                .await?;
            if children.is_empty() {
                continue;
            }

            if let Some(child_ref) = session.child_ref(parent_id) {
                if child_ref.status == SessionStatus::Completed {
                    continue;
                }
                tracing::debug!(
                    session_id = %session.id,
                    parent_card_id = %parent_id,
                    child_session_id = %child_ref.session_id,
                    "resuming incomplete child family"
                );
                return Ok(ExpansionStep::StartChildSession {
                    child_session_id: child_ref.session_id.clone(),
                    parent_card_id: parent_id.clone(),
                    parent_name: child_ref.parent_name.clone(),
                    cards: children,
                });
            }

            let child = machine::new_session(&session.organization_id, parent_id, &children, rng);
            self.sessions.save(&child).await?;
            session.child_sessions.push(ChildSessionRef {
                parent_card_id: parent_id.clone(),
                parent_name: card.title.clone(),
                session_id: child.id.clone(),
                status: child.status,
            });
            tracing::info!(
                session_id = %session.id,
                parent_card_id = %parent_id,
                child_session_id = %child.id,
                child_count = children.len(),
                "child family session started"
            );
            return Ok(ExpansionStep::StartChildSession {
                child_session_id: child.id,
                parent_card_id: parent_id.clone(),
                parent_name: card.title.clone(),
                cards: children,
            });
        }

        Ok(ExpansionStep::AllFamiliesComplete)
    }

    /// Builds the flattened ranking from the completed child sessions.
    ///
    /// Requires every started family to be `Completed`. Idempotent: an
    /// already-expanded session returns its current ranking unchanged with
    /// an empty action log.
    pub async fn expand(&self, session: &Session) -> Result<ExpansionResult> {
        if session.is_hierarchically_expanded {
            return Ok(ExpansionResult {
                original: session.personal_ranking.clone(),
                expanded: session.personal_ranking.clone(),
                actions: Vec::new(),
            });
        }

        let mut expanded = Vec::new();
        let mut actions = Vec::new();

        for card_id in &session.personal_ranking {
            let is_parent = match self.directory.get(card_id).await? {
                Some(card) => card.is_parent,
                None => false,
            };
            if !is_parent {
                expanded.push(card_id.clone());
                continue;
            }

            let child_ranking = match session.child_ref(card_id) {
                Some(child_ref) => {
                    let child = self
                        .sessions
                        .find_by_id(&child_ref.session_id)
                        .await?
                        .ok_or_else(|| {
                            DeckrankError::not_found("session", child_ref.session_id.clone())
                        })?;
                    if child.status != SessionStatus::Completed {
                        return Err(DeckrankError::internal(format!(
                            "family '{card_id}' has not completed its ranking"
                        )));
                    }
                    child.personal_ranking
                }
                // no children, or the family never needed a session
                None => Vec::new(),
            };

            expanded.push(card_id.clone());
            if child_ranking.is_empty() {
                actions.push(ExpansionAction::Skipped {
                    parent_card_id: card_id.clone(),
                });
            } else {
                let child_count = child_ranking.len();
                expanded.extend(child_ranking);
                actions.push(ExpansionAction::Expanded {
                    parent_card_id: card_id.clone(),
                    child_count,
                });
            }
        }

        Ok(ExpansionResult {
            original: session.personal_ranking.clone(),
            expanded,
            actions,
        })
    }

    /// Overwrites the session's ranking with the flattened order and marks
    /// it completed. The caller persists the session in a single versioned
    /// write, so readers never observe a partial expansion.
    pub fn apply_expansion(session: &mut Session, result: &ExpansionResult) {
        session.personal_ranking = result.expanded.clone();
        session.is_hierarchically_expanded = true;
        session.hierarchical_phase = Some(HierarchicalPhase::Expanded);
        session.status = SessionStatus::Completed;
        if session.completed_at.is_none() {
            session.completed_at = Some(chrono::Utc::now().to_rfc3339());
        }
    }

    /// Refreshes each child reference's status from its own document.
    async fn sync_child_statuses(&self, session: &mut Session) -> Result<()> {
        for child_ref in &mut session.child_sessions {
            if child_ref.status == SessionStatus::Completed {
                continue;
            }
            if let Some(child) = self.sessions.find_by_id(&child_ref.session_id).await? {
                child_ref.status = child.status;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SwipeDirection;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct StubDirectory {
        cards: Vec<Card>,
    }

    #[async_trait::async_trait]
    impl CardDirectory for StubDirectory {
        async fn deck_cards(&self, organization_id: &str, deck_tag: &str) -> Result<Vec<Card>> {
            Ok(self
                .cards
                .iter()
                .filter(|c| {
                    c.is_active && c.organization_id == organization_id && c.parent_tag == deck_tag
                })
                .cloned()
                .collect())
        }

        async fn children_of(
            &self,
            organization_id: &str,
            parent_card_id: &str,
        ) -> Result<Vec<Card>> {
            self.deck_cards(organization_id, parent_card_id).await
        }

        async fn get(&self, card_id: &str) -> Result<Option<Card>> {
            Ok(self.cards.iter().find(|c| c.id == card_id).cloned())
        }
    }

    struct StubSessionRepository {
        sessions: Mutex<HashMap<String, Session>>,
    }

    impl StubSessionRepository {
        fn new() -> Self {
            Self {
                sessions: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl SessionRepository for StubSessionRepository {
        async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
            Ok(self.sessions.lock().await.get(session_id).cloned())
        }

        async fn save(&self, session: &Session) -> Result<()> {
            self.sessions
                .lock()
                .await
                .insert(session.id.clone(), session.clone());
            Ok(())
        }

        async fn save_expecting_version(
            &self,
            session: &Session,
            expected_version: u64,
        ) -> Result<()> {
            let mut sessions = self.sessions.lock().await;
            if let Some(stored) = sessions.get(&session.id) {
                if stored.version != expected_version {
                    return Err(DeckrankError::concurrent_modification(
                        &session.id,
                        expected_version,
                    ));
                }
            }
            sessions.insert(session.id.clone(), session.clone());
            Ok(())
        }
    }

    fn family_deck() -> Vec<Card> {
        vec![
            Card::new("p1", "Parent One", "org-1", "top").as_parent(),
            Card::new("p2", "Parent Two", "org-1", "top").as_parent(),
            Card::new("c1", "Child One", "org-1", "p1"),
            Card::new("c2", "Child Two", "org-1", "p1"),
        ]
    }

    fn completed_parent_session(ranking: &[&str]) -> Session {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = machine::new_session("org-1", "top", &[], &mut rng);
        session.candidate_ids = ranking.iter().map(|s| s.to_string()).collect();
        session.personal_ranking = ranking.iter().map(|s| s.to_string()).collect();
        session.status = SessionStatus::WaitingForChildren;
        session.hierarchical_phase = Some(HierarchicalPhase::Expanding);
        session
    }

    fn engine(cards: Vec<Card>) -> (ExpansionEngine, Arc<StubSessionRepository>) {
        let repo = Arc::new(StubSessionRepository::new());
        let engine = ExpansionEngine::new(Arc::new(StubDirectory { cards }), repo.clone());
        (engine, repo)
    }

    /// Completes a child session by swiping every candidate right and
    /// answering every vote in favor of the new candidate.
    async fn finish_child(repo: &StubSessionRepository, session_id: &str) {
        let mut child = repo.find_by_id(session_id).await.unwrap().unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        loop {
            let Some(next) = child.next_candidate().map(str::to_owned) else {
                break;
            };
            match machine::process_swipe(&mut child, &next, SwipeDirection::Right, &mut rng)
                .unwrap()
            {
                machine::TurnOutcome::VoteRequired { card_a, card_b } => {
                    machine::process_vote(&mut child, &card_a, &card_b, &card_a).unwrap();
                }
                _ => {}
            }
        }
        repo.save(&child).await.unwrap();
    }

    #[tokio::test]
    async fn test_needs_expansion_detects_ranked_parents() {
        let (engine, _repo) = engine(family_deck());

        let hierarchical = completed_parent_session(&["p1", "p2"]);
        assert!(engine.needs_expansion(&hierarchical).await.unwrap());

        let flat = completed_parent_session(&["c1", "c2"]);
        assert!(!engine.needs_expansion(&flat).await.unwrap());
    }

    #[tokio::test]
    async fn test_expand_substitutes_children_and_skips_childless_parent() {
        let (engine, repo) = engine(family_deck());
        let mut parent = completed_parent_session(&["p1", "p2"]);
        let mut rng = StdRng::seed_from_u64(2);

        // p1 has children: first step starts its family
        let step = engine.next_step(&mut parent, &mut rng).await.unwrap();
        let child_id = match step {
            ExpansionStep::StartChildSession {
                child_session_id,
                parent_card_id,
                ..
            } => {
                assert_eq!(parent_card_id, "p1");
                child_session_id
            }
            other => panic!("expected StartChildSession, got {:?}", other),
        };
        finish_child(&repo, &child_id).await;

        // p2 has no children: walk is done
        assert_eq!(
            engine.next_step(&mut parent, &mut rng).await.unwrap(),
            ExpansionStep::AllFamiliesComplete
        );

        let result = engine.expand(&parent).await.unwrap();
        assert_eq!(result.expanded.len(), 4);
        assert_eq!(result.expanded[0], "p1");
        assert_eq!(result.expanded[3], "p2");
        assert!(result.expanded.contains(&"c1".to_string()));
        assert!(result.expanded.contains(&"c2".to_string()));
        assert_eq!(result.actions.len(), 2);
        assert!(matches!(
            result.actions[0],
            ExpansionAction::Expanded { child_count: 2, .. }
        ));
        assert!(matches!(result.actions[1], ExpansionAction::Skipped { .. }));

        ExpansionEngine::apply_expansion(&mut parent, &result);
        assert_eq!(parent.status, SessionStatus::Completed);
        assert!(parent.is_hierarchically_expanded);
        assert_eq!(parent.hierarchical_phase, Some(HierarchicalPhase::Expanded));
    }

    #[tokio::test]
    async fn test_expand_is_idempotent() {
        let (engine, repo) = engine(family_deck());
        let mut parent = completed_parent_session(&["p1", "p2"]);
        let mut rng = StdRng::seed_from_u64(2);

        let step = engine.next_step(&mut parent, &mut rng).await.unwrap();
        if let ExpansionStep::StartChildSession {
            child_session_id, ..
        } = step
        {
            finish_child(&repo, &child_session_id).await;
        }

        let first = engine.expand(&parent).await.unwrap();
        ExpansionEngine::apply_expansion(&mut parent, &first);

        let second = engine.expand(&parent).await.unwrap();
        assert_eq!(second.expanded, first.expanded);
        assert!(second.actions.is_empty());
    }

    #[tokio::test]
    async fn test_second_family_waits_for_first() {
        let mut cards = family_deck();
        cards.push(Card::new("c3", "Child Three", "org-1", "p2"));
        let (engine, repo) = engine(cards);
        let mut parent = completed_parent_session(&["p1", "p2"]);
        let mut rng = StdRng::seed_from_u64(2);

        let first = engine.next_step(&mut parent, &mut rng).await.unwrap();
        let first_child = match &first {
            ExpansionStep::StartChildSession {
                parent_card_id,
                child_session_id,
                ..
            } => {
                assert_eq!(parent_card_id, "p1");
                child_session_id.clone()
            }
            other => panic!("expected StartChildSession, got {:?}", other),
        };

        // p1 incomplete: polling again resumes the same family, never p2
        let resumed = engine.next_step(&mut parent, &mut rng).await.unwrap();
        match resumed {
            ExpansionStep::StartChildSession {
                child_session_id,
                parent_card_id,
                ..
            } => {
                assert_eq!(child_session_id, first_child);
                assert_eq!(parent_card_id, "p1");
            }
            other => panic!("expected resumed family, got {:?}", other),
        }
        assert_eq!(parent.child_sessions.len(), 1);

        finish_child(&repo, &first_child).await;

        let second = engine.next_step(&mut parent, &mut rng).await.unwrap();
        match second {
            ExpansionStep::StartChildSession { parent_card_id, .. } => {
                assert_eq!(parent_card_id, "p2");
            }
            other => panic!("expected p2 family, got {:?}", other),
        }
    }
}
