//! Deckrank application layer.
//!
//! Use cases composing the core engines with the recovery layer and the
//! retry policy. The presentation layer talks to `RankingUseCase`; nothing
//! here knows about transports or storage engines.

pub mod ranking_usecase;
pub mod recovery;
pub mod retry;

pub use ranking_usecase::{
    HierarchicalAction, HierarchicalStatus, RankingUseCase, SessionStart, TurnResponse,
};
pub use recovery::RecoveryService;
pub use retry::RetryPolicy;
