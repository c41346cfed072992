//! Storage primitives shared by the durable adapters.

pub mod backup;

pub use backup::TomlBackupStore;
