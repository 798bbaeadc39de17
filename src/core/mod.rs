//! Core game types and entities

pub mod card;
pub mod effects;
pub mod entity;
pub mod filter;
pub mod player;
pub mod types;

pub use card::{Card, CardInstance, CardType, DamageShield, InkColor, InstanceMeta, RawAbility};
pub use effects::{
    AbilityDefinition, AbilityKind, ActivationCost, Affected, Amount, Comparison, Condition,
    ContinuousKind, CountExpr, Duration, EffectAst, EventKind, ForcedAction, Keyword, LookPick,
    Owner, PickDestination, Restriction, RestPlacement, Side, Stat, TargetAst, TriggerSpec,
    TriggerSubject,
};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use filter::{has_printed_keyword, CardFilter, StatBound, StatLens};
pub use player::{CostReduction, Player};
pub use types::{fold_text, CardName, PlayerName, Subtype};

/// Card instance id
pub type CardId = EntityId<CardInstance>;

/// Player id
pub type PlayerId = EntityId<Player>;
