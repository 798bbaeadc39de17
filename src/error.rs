//! Error types for the lore engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoreError {
    #[error("Invalid card format: {0}")]
    InvalidCardFormat(String),

    #[error("Invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    /// A player action violated turn, phase or resource rules.
    /// Always raised before any state is touched.
    #[error("Illegal action: {0}")]
    IllegalAction(String),

    /// A choice response selected something outside the eligible set
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    #[error("No choice is pending")]
    NoPendingChoice,

    /// An effect tag the executor does not know about
    #[error("Unknown effect tag: {0}")]
    UnknownEffectTag(String),

    #[error("Runaway trigger chain exceeded depth {depth}")]
    RunawayTriggers { depth: u32 },

    /// A resumed ability replayed a step that does not match its journal
    #[error("Resolution journal out of step: {0}")]
    JournalMismatch(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoreError>;
