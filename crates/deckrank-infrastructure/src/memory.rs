//! In-memory adapters.
//!
//! Backing stores for tests and for embedders that bring their own
//! durability. The session repository implements the same optimistic
//! version check as the durable one, under a single lock so the
//! compare-and-swap is atomic.

use async_trait::async_trait;
use deckrank_core::card::{Card, CardDirectory};
use deckrank_core::error::{DeckrankError, Result};
use deckrank_core::session::{Session, SessionBackupStore, SessionRepository};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Card directory over a fixed, in-memory card list.
pub struct InMemoryCardDirectory {
    cards: Vec<Card>,
}

impl InMemoryCardDirectory {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

#[async_trait]
impl CardDirectory for InMemoryCardDirectory {
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

/// Session repository over a mutex-guarded map.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
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
        } else if expected_version != 0 {
            return Err(DeckrankError::not_found("session", session.id.clone()));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }
}

/// Backup store over a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryBackupStore {
    snapshots: Mutex<HashMap<String, Session>>,
}

impl InMemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackupStore for InMemoryBackupStore {
    async fn snapshot(&self, session: &Session) -> Result<()> {
        self.snapshots
            .lock()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn restore(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.snapshots.lock().await.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckrank_core::session::machine;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_session() -> Session {
        let mut rng = StdRng::seed_from_u64(1);
        let cards = vec![
            Card::new("a", "A", "org-1", "deck"),
            Card::new("b", "B", "org-1", "deck"),
        ];
        machine::new_session("org-1", "deck", &cards, &mut rng)
    }

    #[tokio::test]
    async fn test_save_and_find_round_trip() {
        let repo = InMemorySessionRepository::new();
        let session = sample_session();

        repo.save(&session).await.unwrap();
        let loaded = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);

        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writers_exactly_one_wins() {
        let repo = InMemorySessionRepository::new();
        let session = sample_session();
        repo.save(&session).await.unwrap();

        // both writers read version 0 before either committed
        let mut first = session.clone();
        first.version = 1;
        let mut second = session.clone();
        second.version = 1;

        let r1 = repo.save_expecting_version(&first, 0).await;
        let r2 = repo.save_expecting_version(&second, 0).await;

        assert!(r1.is_ok());
        let err = r2.unwrap_err();
        assert!(err.is_concurrent_modification());

        let stored = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_backup_snapshot_round_trip() {
        let backups = InMemoryBackupStore::new();
        let session = sample_session();

        assert!(backups.restore(&session.id).await.unwrap().is_none());
        backups.snapshot(&session).await.unwrap();
        let restored = backups.restore(&session.id).await.unwrap().unwrap();
        assert_eq!(restored, session);
    }
}
