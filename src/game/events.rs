//! Domain events and the observer bus
//!
//! Handlers push events onto `GameState::pending_events` right after the
//! mutation they describe. The turn manager drains them, publishes each to
//! the bus and matches it against triggered abilities.

use crate::core::{CardId, EventKind, PlayerId};
use serde::{Deserialize, Serialize};

/// Something that happened, with a structured payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,
    /// The player the event belongs to (card owner or acting player)
    pub player: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardId>,
    /// Counterpart card (challenge opponent, destination location)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<CardId>,
    #[serde(default)]
    pub amount: i32,
    #[serde(default)]
    pub in_challenge: bool,
    pub turn: u32,
}

impl GameEvent {
    pub fn new(kind: EventKind, player: PlayerId, turn: u32) -> Self {
        GameEvent {
            kind,
            player,
            card: None,
            other: None,
            amount: 0,
            in_challenge: false,
            turn,
        }
    }

    pub fn with_card(mut self, card: CardId) -> Self {
        self.card = Some(card);
        self
    }

    pub fn with_other(mut self, other: CardId) -> Self {
        self.other = Some(other);
        self
    }

    pub fn with_amount(mut self, amount: i32) -> Self {
        self.amount = amount;
        self
    }

    pub fn during_challenge(mut self) -> Self {
        self.in_challenge = true;
        self
    }

    /// The card on the other side of the event from `perspective`
    pub fn counterpart(&self, perspective: CardId) -> Option<CardId> {
        if self.card == Some(perspective) {
            self.other
        } else {
            self.card
        }
    }
}

/// Read-only subscriber
pub trait EventObserver {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventObserver for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Publish/subscribe surface for domain events
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn EventObserver>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn EventObserver>) {
        self.observers.push(observer);
    }

    pub fn publish(&mut self, event: &GameEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_bus_publishes_to_all() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let a = Rc::clone(&seen);
        bus.subscribe(Box::new(move |e: &GameEvent| a.borrow_mut().push(e.kind)));
        let b = Rc::clone(&seen);
        bus.subscribe(Box::new(move |e: &GameEvent| b.borrow_mut().push(e.kind)));

        bus.publish(&GameEvent::new(EventKind::CardQuested, PlayerId::new(0), 1));
        assert_eq!(*seen.borrow(), vec![EventKind::CardQuested, EventKind::CardQuested]);
    }

    #[test]
    fn test_counterpart() {
        let event = GameEvent::new(EventKind::CardChallenged, PlayerId::new(0), 3)
            .with_card(CardId::new(5))
            .with_other(CardId::new(9));
        assert_eq!(event.counterpart(CardId::new(5)), Some(CardId::new(9)));
        assert_eq!(event.counterpart(CardId::new(7)), Some(CardId::new(5)));
    }

    #[test]
    fn test_event_kind_serializes_screaming() {
        let event = GameEvent::new(EventKind::CardDiscarded, PlayerId::new(1), 2);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "CARD_DISCARDED");
    }
}
