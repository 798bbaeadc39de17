//! Lore Engine - ability resolution engine for an ink-and-lore card game
//!
//! Card rules text is compiled into a closed effect AST by [`parser`], then
//! interpreted against a single mutable [`game::GameState`] by the executor.
//! Player decisions suspend resolution until a response arrives; triggered
//! abilities queue in the bag and resolve active player first.

pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod parser;
pub mod zones;

pub use error::{LoreError, Result};
