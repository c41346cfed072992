//! Data Transfer Objects for persistence
//!
//! DTOs are versioned snapshots of domain models at specific schema versions.
//! They enable safe schema evolution through explicit migration paths.

pub mod session;

pub use session::{SessionV1_0_0, create_session_migrator};
