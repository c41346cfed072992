//! Session domain module.
//!
//! - `model`: the session document and its event types
//! - `machine`: stateless state-machine operations over a session
//! - `repository`: persistence traits (`SessionRepository`, `SessionBackupStore`)

pub mod machine;
mod model;
mod repository;

pub use machine::TurnOutcome;
pub use model::{
    ChildSessionRef, HierarchicalPhase, PendingComparison, Session, SessionStatus, SwipeDirection,
    SwipeEvent, VoteEvent,
};
pub use repository::{SessionBackupStore, SessionRepository};
