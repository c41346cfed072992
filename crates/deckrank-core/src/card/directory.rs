//! Card directory trait.
//!
//! Defines the read-only interface to the external card catalog.

use super::model::Card;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract, read-only view of the card catalog.
///
/// The directory is owned by an external collaborator (the catalog CRUD
/// layer); the engine never writes through it. Implementations must only
/// return active cards.
#[async_trait]
pub trait CardDirectory: Send + Sync {
    /// Returns the active cards of a deck, i.e. cards whose `parent_tag`
    /// equals `deck_tag` within the given organization.
    async fn deck_cards(&self, organization_id: &str, deck_tag: &str) -> Result<Vec<Card>>;

    /// Returns the active children of a parent card, i.e. cards whose
    /// `parent_tag` equals the parent card's id.
    async fn children_of(&self, organization_id: &str, parent_card_id: &str)
    -> Result<Vec<Card>>;

    /// Looks up a single card by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Card))`: Card found
    /// - `Ok(None)`: No such card
    /// - `Err(_)`: Error occurred during retrieval
    async fn get(&self, card_id: &str) -> Result<Option<Card>>;
}
