//! Deckrank core: the ranking/decision-tree engine.
//!
//! Turns a user's swipe and vote decisions into a personal total ranking of
//! a deck of cards, and recursively expands ranked parent cards into their
//! own ranked children. External collaborators (card catalog, persistence,
//! presentation) plug in behind the traits in `card` and `session`.

pub mod card;
pub mod error;
pub mod expansion;
pub mod ranking;
pub mod session;
pub mod validate;

// Re-export common error type
pub use error::{DeckrankError, Result};
