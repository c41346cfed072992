//! End-to-end flows through the ranking use case, wired to the in-memory
//! adapters.

use async_trait::async_trait;
use deckrank_application::{HierarchicalAction, RankingUseCase, RetryPolicy, TurnResponse};
use deckrank_core::card::Card;
use deckrank_core::error::{DeckrankError, Result};
use deckrank_core::session::Session;
use deckrank_core::session::{
    SessionBackupStore, SessionRepository, SessionStatus, SwipeDirection,
};
use deckrank_infrastructure::{
    InMemoryBackupStore, InMemoryCardDirectory, InMemorySessionRepository,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Repository that fails the next versioned save with a version conflict,
/// as if a competing writer had committed in between.
struct ConflictOnceRepository {
    inner: InMemorySessionRepository,
    armed: AtomicBool,
}

impl ConflictOnceRepository {
    fn new() -> Self {
        Self {
            inner: InMemorySessionRepository::new(),
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionRepository for ConflictOnceRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.inner.find_by_id(session_id).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.inner.save(session).await
    }

    async fn save_expecting_version(&self, session: &Session, expected_version: u64) -> Result<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            return Err(DeckrankError::concurrent_modification(
                &session.id,
                expected_version,
            ));
        }
        self.inner.save_expecting_version(session, expected_version).await
    }
}

fn build_usecase(
    cards: Vec<Card>,
) -> (
    RankingUseCase,
    Arc<InMemorySessionRepository>,
    Arc<InMemoryBackupStore>,
) {
    let directory = Arc::new(InMemoryCardDirectory::new(cards));
    let sessions = Arc::new(InMemorySessionRepository::new());
    let backups = Arc::new(InMemoryBackupStore::new());
    let usecase = RankingUseCase::new(directory, sessions.clone(), backups.clone());
    (usecase, sessions, backups)
}

/// Drives a session to completion: swipes right on every candidate and
/// resolves votes in favor of the lexicographically smaller card id.
async fn drive_to_completion(usecase: &RankingUseCase, session_id: &str) -> TurnResponse {
    loop {
        let snapshot = usecase.session_snapshot(session_id).await.unwrap();
        let response = match snapshot.status {
            SessionStatus::Swiping => {
                let card_id = snapshot.next_candidate().unwrap().to_string();
                usecase
                    .swipe(session_id, &card_id, SwipeDirection::Right)
                    .await
                    .unwrap()
            }
            SessionStatus::Voting => {
                let pending = snapshot.pending_vote.clone().unwrap();
                let winner = if pending.candidate < pending.comparator {
                    pending.candidate.clone()
                } else {
                    pending.comparator.clone()
                };
                usecase
                    .vote(session_id, &pending.candidate, &pending.comparator, &winner)
                    .await
                    .unwrap()
            }
            other => panic!("session should still be in progress, got {other:?}"),
        };
        if let TurnResponse::Completed { .. } = response {
            return response;
        }
    }
}

fn flat_deck(ids: &[&str]) -> Vec<Card> {
    ids.iter()
        .map(|id| Card::new(*id, format!("Card {id}"), "org-1", "deck"))
        .collect()
}

#[tokio::test]
async fn test_full_session_right_swipe_flow() {
    let (usecase, _, _) = build_usecase(flat_deck(&["a", "b", "c", "d"]));

    let start = usecase.start_session("org-1", "deck").await.unwrap();
    let response = drive_to_completion(&usecase, &start.session_id).await;
    assert_eq!(
        response,
        TurnResponse::Completed {
            awaiting_children: false
        }
    );

    let session = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.completed_at.is_some());

    // every candidate was swiped right, so all four are ranked
    let mut ranked = session.personal_ranking.clone();
    ranked.sort();
    assert_eq!(ranked, vec!["a", "b", "c", "d"]);

    // each recorded vote's winner precedes its loser in the final order
    for vote in &session.votes {
        let loser = if vote.winner == vote.card_a {
            &vote.card_b
        } else {
            &vote.card_a
        };
        let winner_pos = session
            .personal_ranking
            .iter()
            .position(|id| id == &vote.winner)
            .unwrap();
        let loser_pos = session
            .personal_ranking
            .iter()
            .position(|id| id == loser)
            .unwrap();
        assert!(winner_pos < loser_pos);
    }

    // one version bump per swipe and per vote
    assert_eq!(
        session.version,
        (session.swipes.len() + session.votes.len()) as u64
    );
}

#[tokio::test]
async fn test_left_swiped_card_excluded_from_ranking() {
    let (usecase, _, _) = build_usecase(flat_deck(&["a", "b", "c"]));

    let start = usecase.start_session("org-1", "deck").await.unwrap();
    let rejected = start.next_card.id.clone();
    usecase
        .swipe(&start.session_id, &rejected, SwipeDirection::Left)
        .await
        .unwrap();

    drive_to_completion(&usecase, &start.session_id).await;

    let session = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(session.personal_ranking.len(), 2);
    assert!(!session.personal_ranking.contains(&rejected));
}

#[tokio::test]
async fn test_start_session_rejects_thin_deck() {
    let mut cards = flat_deck(&["only"]);
    let mut inactive = Card::new("hidden", "Hidden", "org-1", "deck");
    inactive.is_active = false;
    cards.push(inactive);
    let (usecase, _, _) = build_usecase(cards);

    let err = usecase.start_session("org-1", "deck").await.unwrap_err();
    assert!(matches!(err, DeckrankError::EmptyDeck { count: 1, .. }));
}

#[tokio::test]
async fn test_duplicate_swipe_reports_client_out_of_sync() {
    let (usecase, _, _) = build_usecase(flat_deck(&["a", "b", "c"]));

    let start = usecase.start_session("org-1", "deck").await.unwrap();
    let first = start.next_card.id.clone();
    usecase
        .swipe(&start.session_id, &first, SwipeDirection::Right)
        .await
        .unwrap();

    // replaying the same swipe must not advance the session
    let before = usecase.session_snapshot(&start.session_id).await.unwrap();
    let err = usecase
        .swipe(&start.session_id, &first, SwipeDirection::Right)
        .await
        .unwrap_err();
    assert!(err.is_client_out_of_sync());

    let after = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_hierarchical_deck_expands_into_flat_ranking() {
    let cards = vec![
        Card::new("p1", "Parent One", "org-1", "top").as_parent(),
        Card::new("p2", "Plain Two", "org-1", "top"),
        Card::new("c1", "Child One", "org-1", "p1"),
        Card::new("c2", "Child Two", "org-1", "p1"),
    ];
    let (usecase, _, _) = build_usecase(cards);

    let start = usecase.start_session("org-1", "top").await.unwrap();
    let response = drive_to_completion(&usecase, &start.session_id).await;
    assert_eq!(
        response,
        TurnResponse::Completed {
            awaiting_children: true
        }
    );

    let top = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(top.status, SessionStatus::WaitingForChildren);

    // first poll hands out the child family for p1
    let status = usecase.hierarchical_status(&start.session_id).await.unwrap();
    assert!(status.is_hierarchical);
    let child_session_id = match status.action {
        HierarchicalAction::StartChildSession {
            child_session_id,
            parent_name,
            cards,
        } => {
            assert_eq!(parent_name, "Parent One");
            assert_eq!(cards.len(), 2);
            child_session_id
        }
        other => panic!("expected child session, got {other:?}"),
    };

    // polling again before the child finishes resumes the same family
    let status = usecase.hierarchical_status(&start.session_id).await.unwrap();
    match status.action {
        HierarchicalAction::StartChildSession {
            child_session_id: resumed,
            ..
        } => assert_eq!(resumed, child_session_id),
        other => panic!("expected resumed child session, got {other:?}"),
    }

    let response = drive_to_completion(&usecase, &child_session_id).await;
    assert_eq!(
        response,
        TurnResponse::Completed {
            awaiting_children: false
        }
    );

    // all families done: the flattened ranking is applied
    let status = usecase.hierarchical_status(&start.session_id).await.unwrap();
    assert_eq!(status.action, HierarchicalAction::Completed);

    let expanded = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(expanded.status, SessionStatus::Completed);
    assert!(expanded.is_hierarchically_expanded);
    assert_eq!(expanded.personal_ranking.len(), 4);

    let pos = |id: &str| {
        expanded
            .personal_ranking
            .iter()
            .position(|c| c == id)
            .unwrap()
    };
    assert!(pos("p1") < pos("c1"));
    assert!(pos("p1") < pos("c2"));

    let child_ref = expanded.child_ref("p1").unwrap();
    assert_eq!(child_ref.session_id, child_session_id);
    assert_eq!(child_ref.status, SessionStatus::Completed);

    // a completed hierarchical session keeps answering Completed
    let status = usecase.hierarchical_status(&start.session_id).await.unwrap();
    assert_eq!(status.action, HierarchicalAction::Completed);
}

#[tokio::test]
async fn test_hierarchical_status_replays_after_version_conflict() {
    let cards = vec![
        Card::new("p1", "Parent One", "org-1", "top").as_parent(),
        Card::new("p2", "Plain Two", "org-1", "top"),
        Card::new("c1", "Child One", "org-1", "p1"),
        Card::new("c2", "Child Two", "org-1", "p1"),
    ];
    let directory = Arc::new(InMemoryCardDirectory::new(cards));
    let sessions = Arc::new(ConflictOnceRepository::new());
    let backups = Arc::new(InMemoryBackupStore::new());
    let usecase = RankingUseCase::new(directory, sessions.clone(), backups);

    let start = usecase.start_session("org-1", "top").await.unwrap();
    drive_to_completion(&usecase, &start.session_id).await;

    // the versioned save of the child-session start loses a version race
    sessions.arm();
    let status = usecase.hierarchical_status(&start.session_id).await.unwrap();
    let child_session_id = match status.action {
        HierarchicalAction::StartChildSession {
            child_session_id, ..
        } => child_session_id,
        other => panic!("expected child session after replay, got {other:?}"),
    };

    // exactly one family reference was committed and it matches the handout
    let top = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(top.child_sessions.len(), 1);
    assert_eq!(top.child_sessions[0].session_id, child_session_id);
}

#[tokio::test]
async fn test_zero_attempt_policy_still_runs_once() {
    let (usecase, _, _) = build_usecase(flat_deck(&["a", "b", "c"]));
    let usecase = usecase.with_retry_policy(RetryPolicy::new(0));

    let start = usecase.start_session("org-1", "deck").await.unwrap();
    let response = usecase
        .swipe(&start.session_id, &start.next_card.id, SwipeDirection::Right)
        .await
        .unwrap();
    assert!(matches!(response, TurnResponse::NextCard { .. }));
}

#[tokio::test]
async fn test_corrupt_session_restored_from_backup() {
    let (usecase, sessions, _) = build_usecase(flat_deck(&["a", "b", "c"]));

    let start = usecase.start_session("org-1", "deck").await.unwrap();
    let good = usecase.session_snapshot(&start.session_id).await.unwrap();

    // corrupt the stored document behind the recovery layer's back
    let mut corrupt = good.clone();
    corrupt.candidate_ids.push(corrupt.candidate_ids[0].clone());
    sessions.save(&corrupt).await.unwrap();

    let recovered = usecase.session_snapshot(&start.session_id).await.unwrap();
    assert_eq!(recovered, good);

    // the restored document was written back as current
    let stored = sessions.find_by_id(&start.session_id).await.unwrap().unwrap();
    assert_eq!(stored, good);
}

#[tokio::test]
async fn test_corrupt_session_and_backup_is_unrecoverable() {
    let (usecase, sessions, backups) = build_usecase(flat_deck(&["a", "b", "c"]));

    let start = usecase.start_session("org-1", "deck").await.unwrap();
    let good = usecase.session_snapshot(&start.session_id).await.unwrap();

    let mut corrupt = good.clone();
    corrupt.candidate_ids.push(corrupt.candidate_ids[0].clone());
    sessions.save(&corrupt).await.unwrap();
    backups.snapshot(&corrupt).await.unwrap();

    let err = usecase
        .session_snapshot(&start.session_id)
        .await
        .unwrap_err();
    assert!(err.is_unrecoverable());
}
