//! Card predicates shared by targeting, counting and continuous effects

use crate::core::{CardId, CardInstance, CardType, Comparison, EffectAst, Keyword, Subtype};
use crate::game::GameState;
use serde::{Deserialize, Serialize};

/// Which stat values a filter observes
///
/// Conditions of continuous effects read `Base` so that evaluating a buff
/// never has to evaluate the buff itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatLens {
    Derived,
    Base,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBound {
    pub cmp: Comparison,
    pub value: i32,
}

impl StatBound {
    pub fn at_most(value: i32) -> Self {
        StatBound {
            cmp: Comparison::AtMost,
            value,
        }
    }

    pub fn at_least(value: i32) -> Self {
        StatBound {
            cmp: Comparison::AtLeast,
            value,
        }
    }

    pub fn admits(&self, v: i32) -> bool {
        self.cmp.holds(v, self.value)
    }
}

/// A conjunction of card properties; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_types: Vec<CardType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Subtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Printed cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<StatBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<StatBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub willpower: Option<StatBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exerted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damaged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<Keyword>,
    /// "other": the source card itself never matches
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude_self: bool,
}

impl CardFilter {
    pub fn of_type(card_type: CardType) -> Self {
        CardFilter {
            card_types: vec![card_type],
            ..Default::default()
        }
    }

    pub fn characters() -> Self {
        Self::of_type(CardType::Character)
    }

    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn other(mut self) -> Self {
        self.exclude_self = true;
        self
    }

    pub fn with_cost(mut self, bound: StatBound) -> Self {
        self.cost = Some(bound);
        self
    }

    /// True when no field constrains anything
    pub fn is_any(&self) -> bool {
        *self == CardFilter::default()
    }

    /// Does `card` satisfy every set field?
    pub fn matches(
        &self,
        game: &GameState,
        card: &CardInstance,
        source: Option<CardId>,
        lens: StatLens,
    ) -> bool {
        if self.exclude_self && Some(card.id) == source {
            return false;
        }
        if !self.card_types.is_empty() && !self.card_types.iter().any(|t| card.is_type(*t)) {
            return false;
        }
        if let Some(subtype) = &self.subtype {
            if !card.card.has_subtype(subtype.as_str()) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !card.name().matches(name) {
                return false;
            }
        }
        if let Some(bound) = &self.cost {
            if !bound.admits(card.card.cost) {
                return false;
            }
        }
        if let Some(bound) = &self.strength {
            let strength = match lens {
                StatLens::Derived => game.strength(card.id),
                StatLens::Base => card.base_strength(),
            };
            if !bound.admits(strength) {
                return false;
            }
        }
        if let Some(bound) = &self.willpower {
            let willpower = match lens {
                StatLens::Derived => game.willpower(card.id),
                StatLens::Base => card.base_willpower(),
            };
            if !bound.admits(willpower) {
                return false;
            }
        }
        if let Some(exerted) = self.exerted {
            if card.exerted != exerted {
                return false;
            }
        }
        if let Some(damaged) = self.damaged {
            if (card.damage > 0) != damaged {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            let has = match lens {
                StatLens::Derived => game.has_keyword(card.id, keyword),
                StatLens::Base => has_printed_keyword(card, keyword),
            };
            if !has {
                return false;
            }
        }
        true
    }

    /// Short description for prompts and logs
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.exclude_self {
            parts.push("other".to_string());
        }
        if let Some(exerted) = self.exerted {
            parts.push(if exerted { "exerted" } else { "ready" }.to_string());
        }
        if self.damaged == Some(true) {
            parts.push("damaged".to_string());
        }
        if let Some(subtype) = &self.subtype {
            parts.push(subtype.to_string());
        }
        if self.card_types.is_empty() {
            parts.push("card".to_string());
        } else {
            let types: Vec<_> = self.card_types.iter().map(|t| t.label()).collect();
            parts.push(types.join(" or "));
        }
        if let Some(name) = &self.name {
            parts.push(format!("named {name}"));
        }
        if let Some(bound) = &self.cost {
            parts.push(format!("with cost {:?} {}", bound.cmp, bound.value));
        }
        parts.join(" ")
    }
}

/// Keyword printed on the card (ignores granted keywords)
pub fn has_printed_keyword(card: &CardInstance, keyword: &Keyword) -> bool {
    card.abilities().iter().any(|ability| {
        ability.effects.iter().any(|effect| match effect {
            EffectAst::Keyword { keyword: printed } => printed.same_kind(keyword),
            _ => false,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Card;
    use crate::game::GameState;
    use std::sync::Arc;

    fn setup() -> (GameState, CardId, CardId) {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let alice = game.players[0].id;
        let pirate = Arc::new(
            Card::new("T-1", "Captain Hook", CardType::Character, 4)
                .with_stats(3, 4, 1)
                .with_subtype("Pirate")
                .with_keyword("Evasive"),
        );
        let item = Arc::new(Card::new("T-2", "Dinglehopper", CardType::Item, 1));
        let hook = game.create_card(pirate, alice);
        let fork = game.create_card(item, alice);
        game.move_card(hook, crate::zones::Zone::Play).unwrap();
        game.move_card(fork, crate::zones::Zone::Play).unwrap();
        (game, hook, fork)
    }

    #[test]
    fn test_type_and_subtype() {
        let (game, hook, fork) = setup();
        let filter = CardFilter::characters().with_subtype("pirate");
        assert!(filter.matches(&game, game.card(hook).unwrap(), None, StatLens::Derived));
        assert!(!filter.matches(&game, game.card(fork).unwrap(), None, StatLens::Derived));
    }

    #[test]
    fn test_exclude_self() {
        let (game, hook, _) = setup();
        let filter = CardFilter::characters().other();
        let card = game.card(hook).unwrap();
        assert!(!filter.matches(&game, card, Some(hook), StatLens::Derived));
        assert!(filter.matches(&game, card, None, StatLens::Derived));
    }

    #[test]
    fn test_cost_bound() {
        let (game, hook, _) = setup();
        let card = game.card(hook).unwrap();
        let cheap = CardFilter::characters().with_cost(StatBound::at_most(3));
        let pricey = CardFilter::characters().with_cost(StatBound::at_least(4));
        assert!(!cheap.matches(&game, card, None, StatLens::Derived));
        assert!(pricey.matches(&game, card, None, StatLens::Derived));
    }

    #[test]
    fn test_printed_keyword() {
        let (game, hook, _) = setup();
        let filter = CardFilter {
            keyword: Some(Keyword::Evasive),
            ..Default::default()
        };
        let card = game.card(hook).unwrap();
        assert!(filter.matches(&game, card, None, StatLens::Base));
        assert!(filter.matches(&game, card, None, StatLens::Derived));
    }

    #[test]
    fn test_describe() {
        let filter = CardFilter::characters().other().with_subtype("Pirate");
        assert_eq!(filter.describe(), "other Pirate character");
    }
}
