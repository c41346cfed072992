pub mod async_dir_session_repository;
pub mod dto;
pub mod memory;
pub mod paths;
pub mod storage;

pub use crate::async_dir_session_repository::AsyncDirSessionRepository;
pub use crate::memory::{InMemoryBackupStore, InMemoryCardDirectory, InMemorySessionRepository};
pub use crate::storage::TomlBackupStore;
