//! Card and deck loaders
//!
//! JSON card catalogues, plain-text deck lists, and game setup from both

pub mod card;
pub mod database;
pub mod deck;
pub mod game_init;

pub use card::{pattern_of, CardCatalog, ParseDiagnostics};
pub use database::CardDatabase;
pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::GameInitializer;
