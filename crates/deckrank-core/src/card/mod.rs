//! Card domain module.

mod directory;
mod model;

pub use directory::CardDirectory;
pub use model::Card;
