//! Game state, turn structure and ability resolution

pub mod bag;
pub mod choice;
pub mod config;
pub mod continuous;
pub mod decision;
pub mod events;
pub mod executor;
pub mod logger;
pub mod phase;
pub mod snapshot;
pub mod state;
pub mod targeting;
pub mod turn_manager;

pub use bag::{Bag, BagEntry, PendingStep};
pub use choice::{ChoiceKind, ChoiceOption, ChoiceRequest, ChoiceResponse, ChoiceValue, ResolutionFrame, StepRecord};
pub use config::GameConfig;
pub use continuous::{ActiveEffect, Expiry};
pub use decision::{
    ChoicePoll, DecisionHub, DecisionProvider, GameStateView, PendingProvider, ScriptedAnswer, ScriptedProvider,
    UnattendedPolicy,
};
pub use events::{EventBus, EventObserver, GameEvent};
pub use executor::{execute, resolve_ability, ExecResult, GameContext, Interrupt};
pub use logger::{GameLogger, LogEntry, LogLevel, OutputFormat, OutputMode, VerbosityLevel};
pub use phase::{Phase, TurnStructure};
pub use snapshot::{GameHistory, GameSnapshot};
pub use state::GameState;
pub use targeting::{Candidate, Participant};
pub use turn_manager::{ActionOutcome, TurnManager};
