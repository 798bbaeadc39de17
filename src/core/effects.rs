//! Effect AST and ability definitions
//!
//! The parser compiles rules text into these trees; the executor interprets
//! them. Every enum here is closed: adding a variant is a compile error at
//! every `match` that consumes it. Serialized tags are snake_case and an
//! unknown tag fails deserialization instead of being skipped.

use crate::core::{CardFilter, CardId, CardType};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};

/// A printed stat or a per-instance counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Strength,
    Willpower,
    Lore,
    Cost,
    Damage,
}

impl Stat {
    pub fn label(&self) -> &'static str {
        match self {
            Stat::Strength => "strength",
            Stat::Willpower => "willpower",
            Stat::Lore => "lore",
            Stat::Cost => "cost",
            Stat::Damage => "damage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    AtMost,
    Exactly,
}

impl Comparison {
    pub fn holds(&self, lhs: i32, rhs: i32) -> bool {
        match self {
            Comparison::AtLeast => lhs >= rhs,
            Comparison::AtMost => lhs <= rhs,
            Comparison::Exactly => lhs == rhs,
        }
    }
}

/// Keyword abilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    Bodyguard,
    Evasive,
    Reckless,
    Rush,
    Support,
    Ward,
    Vanish,
    /// Damage dealt to this character is reduced by N
    Resist(i32),
    /// +N strength while challenging
    Challenger(i32),
    /// Counts as cost N for singing songs
    Singer(i32),
    /// Catch-all for keywords the engine has no rules for
    Other(String),
}

impl Keyword {
    /// Same keyword ignoring its numeric parameter
    pub fn same_kind(&self, other: &Keyword) -> bool {
        match (self, other) {
            (Keyword::Other(a), Keyword::Other(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    /// Numeric parameter (0 for keywords without one)
    pub fn value(&self) -> i32 {
        match self {
            Keyword::Resist(n) | Keyword::Challenger(n) | Keyword::Singer(n) => *n,
            _ => 0,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Keyword::Bodyguard => "Bodyguard".to_string(),
            Keyword::Evasive => "Evasive".to_string(),
            Keyword::Reckless => "Reckless".to_string(),
            Keyword::Rush => "Rush".to_string(),
            Keyword::Support => "Support".to_string(),
            Keyword::Ward => "Ward".to_string(),
            Keyword::Vanish => "Vanish".to_string(),
            Keyword::Resist(n) => format!("Resist +{n}"),
            Keyword::Challenger(n) => format!("Challenger +{n}"),
            Keyword::Singer(n) => format!("Singer {n}"),
            Keyword::Other(s) => s.clone(),
        }
    }
}

/// How long a timed modifier lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    ThisTurn,
    UntilStartOfYourNextTurn,
    /// As long as the source stays in play
    WhileInPlay,
}

/// Whose cards a count or target looks at, relative to the acting player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    You,
    Opponents,
    Any,
}

/// "for each X" / "the number of X" expression, evaluated at resolution time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountExpr {
    pub source: Zone,
    pub owner: Owner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<CardFilter>,
    /// Multiplier ("gain 2 lore for each ...")
    #[serde(default = "default_per")]
    pub per: i32,
}

fn default_per() -> i32 {
    1
}

impl CountExpr {
    pub fn new(source: Zone, owner: Owner, filter: Option<CardFilter>) -> Self {
        CountExpr {
            source,
            owner,
            filter,
            per: 1,
        }
    }

    pub fn times(mut self, per: i32) -> Self {
        self.per = per;
        self
    }
}

/// Numeric amount of an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Amount {
    Fixed { value: i32 },
    Count(CountExpr),
    /// "equal to this character's strength"
    SourceStat { stat: Stat },
}

impl Amount {
    pub fn fixed(value: i32) -> Self {
        Amount::Fixed { value }
    }

    pub fn zero() -> Self {
        Amount::Fixed { value: 0 }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Amount::Fixed { value: 0 })
    }
}

/// Which side of the table a target may come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Any,
    Yours,
    Opposing,
}

/// How participants of an effect are picked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetAst {
    /// The source card ("this character")
    ThisCard,
    /// The acting player
    You,
    EachOpponent,
    ChosenOpponent,
    EachPlayer,
    /// Player-picked card(s) in play
    Chosen {
        filter: CardFilter,
        side: Side,
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default)]
        up_to: bool,
    },
    /// Every matching card in play
    Each { filter: CardFilter, side: Side },
    /// "the challenging character"
    Challenger,
    /// The other card carried by the triggering event
    EventCard,
}

fn default_count() -> u32 {
    1
}

impl TargetAst {
    pub fn chosen_character() -> Self {
        TargetAst::Chosen {
            filter: CardFilter::of_type(CardType::Character),
            side: Side::Any,
            count: 1,
            up_to: false,
        }
    }

    pub fn chosen_opposing_character() -> Self {
        TargetAst::Chosen {
            filter: CardFilter::of_type(CardType::Character),
            side: Side::Opposing,
            count: 1,
            up_to: false,
        }
    }

    /// Does this target pick players rather than cards?
    pub fn is_player_target(&self) -> bool {
        matches!(
            self,
            TargetAst::You | TargetAst::EachOpponent | TargetAst::ChosenOpponent | TargetAst::EachPlayer
        )
    }
}

/// A game-state predicate evaluated at execution time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Count {
        count: CountExpr,
        cmp: Comparison,
        value: i32,
    },
    /// Ready (unexerted) cards in the acting player's inkwell
    InkAvailable { cmp: Comparison, value: i32 },
    SourceInZone { zone: Zone },
    SourceStat {
        stat: Stat,
        cmp: Comparison,
        value: i32,
    },
    SourceExerted { exerted: bool },
    SourceAtLocation,
    /// A card was put under the source this turn
    PutCardUnderThisTurn,
    OpponentHasMoreLore,
    YourTurn,
    Not { condition: Box<Condition> },
}

/// Something a character is prevented from doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    CantQuest,
    CantChallenge,
    CantBeChallenged,
    CantReady,
}

/// The modifier carried by a continuous effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContinuousKind {
    StatBuff {
        #[serde(default)]
        strength: i32,
        #[serde(default)]
        willpower: i32,
        #[serde(default)]
        lore: i32,
    },
    /// +N strength for each damage on the affected character
    StatPerDamage { strength: i32 },
    GrantKeyword { keyword: Keyword },
    /// Counts as having +N cost to sing songs
    SingBuff { amount: i32 },
    /// Pay N less for matching cards
    CostReduction { amount: i32, filter: CardFilter },
    Restrict { restriction: Restriction },
}

/// Who a static ability applies to before it is resolved against the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Affected {
    SelfCard,
    YourCards { filter: CardFilter },
    OpposingCards { filter: CardFilter },
    /// The controlling player (cost reductions)
    You,
    /// Concrete cards picked when a triggered effect resolved
    Cards { ids: Vec<CardId> },
}

/// Where a card picked from a look/search goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickDestination {
    Hand,
    TopOfDeck,
    Inkwell,
}

/// Where the cards not picked go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestPlacement {
    Bottom,
    /// Each card separately on top or bottom
    TopOrBottom,
    Top,
    Discard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookPick {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<CardFilter>,
    pub max: u32,
    pub destination: PickDestination,
    #[serde(default)]
    pub reveal: bool,
}

/// What an opponent is forced to do to one of their own cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedAction {
    Banish,
    ReturnToHand,
    Exert,
}

/// A single effect node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectAst {
    // Damage / combat family
    DealDamage {
        target: TargetAst,
        amount: Amount,
    },
    /// N damage split among chosen characters, one point per pick
    DistributeDamage {
        amount: i32,
        target: TargetAst,
    },
    MoveDamage {
        amount: Amount,
        from: TargetAst,
        to: TargetAst,
        #[serde(default)]
        up_to: bool,
    },
    /// `amount: None` removes all damage
    RemoveDamage {
        target: TargetAst,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<Amount>,
        #[serde(default)]
        up_to: bool,
    },
    PreventDamage {
        target: TargetAst,
        amount: i32,
        duration: Duration,
    },
    Banish {
        target: TargetAst,
    },

    // Resources
    Draw {
        player: TargetAst,
        amount: Amount,
    },
    GainLore {
        amount: Amount,
    },

    // Deck / zone manipulation family
    ReturnToHand {
        target: TargetAst,
    },
    ReturnFromDiscard {
        filter: CardFilter,
        count: u32,
    },
    ShuffleIntoDeck {
        target: TargetAst,
    },
    PutIntoInkwell {
        target: TargetAst,
        exerted: bool,
    },
    InkFromHand {
        exerted: bool,
    },
    InkTopOfDeck {
        exerted: bool,
    },
    Mill {
        player: TargetAst,
        amount: Amount,
    },
    SearchDeck {
        filter: CardFilter,
        destination: PickDestination,
        reveal: bool,
        shuffle: bool,
    },
    LookAtTop {
        count: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pick: Option<LookPick>,
        rest: RestPlacement,
    },
    RevealTop {
        filter: CardFilter,
        on_match: PickDestination,
        otherwise: RestPlacement,
    },
    PutCardUnder {
        target: TargetAst,
    },
    Exert {
        target: TargetAst,
    },
    Ready {
        target: TargetAst,
    },

    // Static / continuous family
    ModifyStats {
        target: TargetAst,
        #[serde(default = "Amount::zero")]
        strength: Amount,
        #[serde(default = "Amount::zero")]
        willpower: Amount,
        #[serde(default = "Amount::zero")]
        lore: Amount,
        duration: Duration,
    },
    GrantKeyword {
        target: TargetAst,
        keyword: Keyword,
        duration: Duration,
    },
    Restrict {
        target: TargetAst,
        restriction: Restriction,
        duration: Duration,
    },
    Continuous {
        modifier: ContinuousKind,
        affected: Affected,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Condition>,
    },
    /// "the next character you play this turn costs N less"
    CostReduction {
        amount: i32,
        filter: CardFilter,
        uses: u32,
    },
    /// Keyword shorthand on the card itself
    Keyword {
        keyword: Keyword,
    },

    // Choice family
    ChooseAndDiscard {
        player: TargetAst,
        amount: Amount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<CardFilter>,
    },
    PlayForFree {
        filter: CardFilter,
        from: Zone,
    },

    // Opponent-interaction family
    LoseLore {
        player: TargetAst,
        amount: Amount,
    },
    OpponentChooses {
        player: TargetAst,
        action: ForcedAction,
        filter: CardFilter,
    },
    RevealHand {
        player: TargetAst,
    },

    // Location family
    MoveToLocation {
        target: TargetAst,
        location: TargetAst,
        free: bool,
    },

    // Structure
    Conditional {
        condition: Condition,
        then: Box<EffectAst>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<EffectAst>>,
    },
    /// "you may ..."
    Optional {
        effect: Box<EffectAst>,
    },
    Sequence {
        effects: Vec<EffectAst>,
    },
    ForEach {
        count: CountExpr,
        effect: Box<EffectAst>,
    },
    ChooseOne {
        options: Vec<EffectAst>,
    },
}

impl EffectAst {
    /// Snake-case tag, as serialized
    pub fn tag(&self) -> &'static str {
        match self {
            EffectAst::DealDamage { .. } => "deal_damage",
            EffectAst::DistributeDamage { .. } => "distribute_damage",
            EffectAst::MoveDamage { .. } => "move_damage",
            EffectAst::RemoveDamage { .. } => "remove_damage",
            EffectAst::PreventDamage { .. } => "prevent_damage",
            EffectAst::Banish { .. } => "banish",
            EffectAst::Draw { .. } => "draw",
            EffectAst::GainLore { .. } => "gain_lore",
            EffectAst::ReturnToHand { .. } => "return_to_hand",
            EffectAst::ReturnFromDiscard { .. } => "return_from_discard",
            EffectAst::ShuffleIntoDeck { .. } => "shuffle_into_deck",
            EffectAst::PutIntoInkwell { .. } => "put_into_inkwell",
            EffectAst::InkFromHand { .. } => "ink_from_hand",
            EffectAst::InkTopOfDeck { .. } => "ink_top_of_deck",
            EffectAst::Mill { .. } => "mill",
            EffectAst::SearchDeck { .. } => "search_deck",
            EffectAst::LookAtTop { .. } => "look_at_top",
            EffectAst::RevealTop { .. } => "reveal_top",
            EffectAst::PutCardUnder { .. } => "put_card_under",
            EffectAst::Exert { .. } => "exert",
            EffectAst::Ready { .. } => "ready",
            EffectAst::ModifyStats { .. } => "modify_stats",
            EffectAst::GrantKeyword { .. } => "grant_keyword",
            EffectAst::Restrict { .. } => "restrict",
            EffectAst::Continuous { .. } => "continuous",
            EffectAst::CostReduction { .. } => "cost_reduction",
            EffectAst::Keyword { .. } => "keyword",
            EffectAst::ChooseAndDiscard { .. } => "choose_and_discard",
            EffectAst::PlayForFree { .. } => "play_for_free",
            EffectAst::LoseLore { .. } => "lose_lore",
            EffectAst::OpponentChooses { .. } => "opponent_chooses",
            EffectAst::RevealHand { .. } => "reveal_hand",
            EffectAst::MoveToLocation { .. } => "move_to_location",
            EffectAst::Conditional { .. } => "conditional",
            EffectAst::Optional { .. } => "optional",
            EffectAst::Sequence { .. } => "sequence",
            EffectAst::ForEach { .. } => "for_each",
            EffectAst::ChooseOne { .. } => "choose_one",
        }
    }

    /// Decode an effect from JSON, reporting unknown tags as such
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            if e.to_string().contains("unknown variant") {
                crate::LoreError::UnknownEffectTag(e.to_string())
            } else {
                crate::LoreError::Json(e)
            }
        })
    }
}

/// Domain event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    CardPlayed,
    CardQuested,
    CardChallenges,
    CardChallenged,
    CardDamaged,
    CardBanished,
    CardDiscarded,
    CardInked,
    CardMoved,
    CardDrawn,
    AbilityActivated,
    StartOfTurn,
    EndOfTurn,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CardPlayed => "CARD_PLAYED",
            EventKind::CardQuested => "CARD_QUESTED",
            EventKind::CardChallenges => "CARD_CHALLENGES",
            EventKind::CardChallenged => "CARD_CHALLENGED",
            EventKind::CardDamaged => "CARD_DAMAGED",
            EventKind::CardBanished => "CARD_BANISHED",
            EventKind::CardDiscarded => "CARD_DISCARDED",
            EventKind::CardInked => "CARD_INKED",
            EventKind::CardMoved => "CARD_MOVED",
            EventKind::CardDrawn => "CARD_DRAWN",
            EventKind::AbilityActivated => "ABILITY_ACTIVATED",
            EventKind::StartOfTurn => "START_OF_TURN",
            EventKind::EndOfTurn => "END_OF_TURN",
        }
    }
}

/// Whose cards a trigger listens to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSubject {
    ThisCard,
    YourCards { filter: CardFilter },
    OpponentCards { filter: CardFilter },
    AnyCards { filter: CardFilter },
    /// The source is the event's counterpart ("banishes another character")
    Counterpart,
    /// Player-level events of the controller (turn boundaries, inking)
    You,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub event: EventKind,
    pub subject: TriggerSubject,
    #[serde(default)]
    pub your_turn_only: bool,
    /// Only banishments that happened during a challenge
    #[serde(default)]
    pub in_challenge: bool,
}

impl TriggerSpec {
    pub fn this_card(event: EventKind) -> Self {
        TriggerSpec {
            event,
            subject: TriggerSubject::ThisCard,
            your_turn_only: false,
            in_challenge: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    Triggered,
    Static,
    Activated,
}

/// Cost of an activated ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationCost {
    #[serde(default)]
    pub exert: bool,
    #[serde(default)]
    pub ink: u32,
    #[serde(default)]
    pub banish_self: bool,
}

/// One compiled ability of a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub kind: AbilityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerSpec>,
    /// Intervening "if" clause, checked when the ability resolves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<ActivationCost>,
    pub effects: Vec<EffectAst>,
    pub text: String,
}

impl AbilityDefinition {
    pub fn triggered(trigger: TriggerSpec, effects: Vec<EffectAst>, text: impl Into<String>) -> Self {
        AbilityDefinition {
            kind: AbilityKind::Triggered,
            name: None,
            trigger: Some(trigger),
            condition: None,
            cost: None,
            effects,
            text: text.into(),
        }
    }

    pub fn static_ability(effects: Vec<EffectAst>, text: impl Into<String>) -> Self {
        AbilityDefinition {
            kind: AbilityKind::Static,
            name: None,
            trigger: None,
            condition: None,
            cost: None,
            effects,
            text: text.into(),
        }
    }

    pub fn activated(cost: ActivationCost, effects: Vec<EffectAst>, text: impl Into<String>) -> Self {
        AbilityDefinition {
            kind: AbilityKind::Activated,
            name: None,
            trigger: None,
            condition: None,
            cost: Some(cost),
            effects,
            text: text.into(),
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_tags_match_serde() {
        let effect = EffectAst::DealDamage {
            target: TargetAst::chosen_opposing_character(),
            amount: Amount::fixed(2),
        };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], effect.tag());
        assert_eq!(json["amount"]["type"], "fixed");
    }

    #[test]
    fn test_unknown_effect_tag_is_loud() {
        let err = EffectAst::from_json(r#"{"type":"teleport","target":{"type":"this_card"}}"#)
            .unwrap_err();
        assert!(matches!(err, crate::LoreError::UnknownEffectTag(_)));
    }

    #[test]
    fn test_count_amount_shape() {
        let amount = Amount::Count(CountExpr::new(Zone::Play, Owner::You, None));
        let json = serde_json::to_value(&amount).unwrap();
        assert_eq!(json["type"], "count");
        assert_eq!(json["source"], "play");
        assert_eq!(json["owner"], "you");
        let back: Amount = serde_json::from_value(json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn test_keyword_kinds() {
        assert!(Keyword::Resist(1).same_kind(&Keyword::Resist(3)));
        assert!(!Keyword::Resist(1).same_kind(&Keyword::Challenger(1)));
        assert_eq!(Keyword::Singer(5).value(), 5);
        assert_eq!(Keyword::Ward.value(), 0);
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::AtLeast.holds(2, 2));
        assert!(!Comparison::AtLeast.holds(1, 2));
        assert!(Comparison::AtMost.holds(2, 3));
        assert!(Comparison::Exactly.holds(4, 4));
    }
}
