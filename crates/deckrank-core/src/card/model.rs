//! Card domain model.
//!
//! Cards are owned and edited by the external catalog; the engine only
//! reads active cards matching an organization and deck tag. The ELO
//! aggregates summarize swipe and vote outcomes across all users, separate
//! from any single session's personal ranking.

use serde::{Deserialize, Serialize};

/// An orderable item in a deck.
///
/// A card belongs to a deck via `parent_tag`. A card with `is_parent = true`
/// heads its own sub-deck: its children are the active cards whose
/// `parent_tag` equals this card's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique card identifier (UUID format)
    pub id: String,
    /// Title or main text of the card
    pub title: String,
    /// Owning organization identifier
    pub organization_id: String,
    /// Deck-membership tag (deck tag for top-level cards, parent card id
    /// for children)
    pub parent_tag: String,
    /// Whether this card heads a ranked sub-deck
    #[serde(default)]
    pub is_parent: bool,
    /// Whether any child cards currently exist for this card
    #[serde(default)]
    pub has_children: bool,
    /// Inactive cards are invisible to ranking sessions
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Number of right swipes (likes) received
    #[serde(default)]
    pub likes_count: u64,
    /// Number of left swipes (dislikes) received
    #[serde(default)]
    pub dislikes_count: u64,
    /// Total number of swipe interactions
    #[serde(default)]
    pub total_interactions: u64,
    /// Timestamp of the most recent swipe interaction (ISO 8601 format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_interaction_at: Option<String>,
    /// Current ELO rating of the card
    #[serde(default = "default_elo_rating")]
    pub elo_rating: f64,
    /// K-factor for ELO updates, determines rating volatility
    #[serde(default = "default_elo_k_factor")]
    pub elo_k_factor: f64,
    /// Confidence in the current ELO rating, grows with interactions
    #[serde(default)]
    pub confidence_score: f64,
    /// Timestamp when the card was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the card was last updated (ISO 8601 format)
    pub updated_at: String,
}

fn default_active() -> bool {
    true
}

fn default_elo_rating() -> f64 {
    1500.0
}

fn default_elo_k_factor() -> f64 {
    32.0
}

impl Card {
    /// Creates an active, non-parent card with fresh timestamps and the
    /// standard initial ELO rating.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        organization_id: impl Into<String>,
        parent_tag: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            title: title.into(),
            organization_id: organization_id.into(),
            parent_tag: parent_tag.into(),
            is_parent: false,
            has_children: false,
            is_active: true,
            likes_count: 0,
            dislikes_count: 0,
            total_interactions: 0,
            last_interaction_at: None,
            elo_rating: default_elo_rating(),
            elo_k_factor: default_elo_k_factor(),
            confidence_score: 0.0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Marks the card as the head of a sub-deck.
    pub fn as_parent(mut self) -> Self {
        self.is_parent = true;
        self.has_children = true;
        self
    }

    /// Records one swipe against the interaction counters.
    ///
    /// `liked` is true for a right swipe, false for a left swipe.
    pub fn record_interaction(&mut self, liked: bool) {
        if liked {
            self.likes_count += 1;
        } else {
            self.dislikes_count += 1;
        }
        self.total_interactions += 1;

        let now = chrono::Utc::now().to_rfc3339();
        self.last_interaction_at = Some(now.clone());
        self.updated_at = now;
    }

    /// Expected probability (0..1) of this card being preferred over an
    /// opponent with the given ELO rating.
    pub fn win_probability(&self, opponent_rating: f64) -> f64 {
        1.0 / (1.0 + 10.0_f64.powf((opponent_rating - self.elo_rating) / 400.0))
    }

    /// Updates the ELO rating after a judged comparison against an opponent
    /// with the given rating. Confidence saturates at 1.0 after 100
    /// interactions.
    pub fn update_elo_rating(&mut self, opponent_rating: f64, won: bool) {
        let expected = self.win_probability(opponent_rating);
        let actual = if won { 1.0 } else { 0.0 };

        self.elo_rating += self.elo_k_factor * (actual - expected);
        self.confidence_score = (self.total_interactions as f64 / 100.0).min(1.0);
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Composite display score: the ELO rating weighted by confidence, so
    /// barely-seen cards do not outrank well-established ones.
    pub fn ranking_score(&self) -> f64 {
        self.elo_rating * self.confidence_score
    }
}
