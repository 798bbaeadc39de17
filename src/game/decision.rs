//! Decision providers and the unattended policy
//!
//! The engine asks for a decision by handing a provider a read-only view of
//! the game and a `ChoiceRequest`. A provider either answers right away or
//! reports `Pending`, in which case the resolving ability suspends until a
//! response is submitted. Players without a provider are decided for by
//! `UnattendedPolicy`, a fixed heuristic that only ever picks valid options.

use crate::core::{CardId, PlayerId};
use crate::game::{ChoiceKind, ChoiceRequest, ChoiceResponse, ChoiceValue, GameState};
use crate::zones::Zone;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Outcome of asking a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoicePoll {
    Ready(ChoiceResponse),
    /// No answer yet; resolution suspends
    Pending,
}

/// Read-only view of game state for decision providers
///
/// This provides access to game information without allowing mutation.
pub struct GameStateView<'a> {
    game: &'a GameState,
    player_id: PlayerId,
}

impl<'a> GameStateView<'a> {
    /// Create a new view of the game state from a player's perspective
    pub fn new(game: &'a GameState, player_id: PlayerId) -> Self {
        GameStateView { game, player_id }
    }

    /// Get the player ID this view is for
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Full state, for providers that need more than the accessors
    pub fn game(&self) -> &'a GameState {
        self.game
    }

    /// Get cards in this player's hand
    pub fn hand(&self) -> Vec<CardId> {
        self.game.cards_in(self.player_id, Zone::Hand)
    }

    /// Every card in play
    pub fn in_play(&self) -> Vec<CardId> {
        self.game.in_play()
    }

    /// Get a card's name
    pub fn card_name(&self, card_id: CardId) -> Option<String> {
        self.game.card(card_id).ok().map(|c| c.name().to_string())
    }

    pub fn owner(&self, card_id: CardId) -> Option<PlayerId> {
        self.game.card(card_id).ok().map(|c| c.owner)
    }

    pub fn is_mine(&self, card_id: CardId) -> bool {
        self.owner(card_id) == Some(self.player_id)
    }

    pub fn cost(&self, card_id: CardId) -> i32 {
        self.game.card(card_id).map(|c| c.card.cost).unwrap_or(0)
    }

    pub fn strength(&self, card_id: CardId) -> i32 {
        self.game.strength(card_id)
    }

    pub fn willpower(&self, card_id: CardId) -> i32 {
        self.game.willpower(card_id)
    }

    pub fn lore(&self, player: PlayerId) -> i32 {
        self.game.player(player).map(|p| p.lore).unwrap_or(0)
    }

    pub fn available_ink(&self) -> i32 {
        self.game.available_ink(self.player_id)
    }
}

/// Something that can answer choice requests for one player
pub trait DecisionProvider {
    fn request_choice(&mut self, view: &GameStateView<'_>, request: &ChoiceRequest) -> ChoicePoll;
}

/// One queued answer of a scripted provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedAnswer {
    /// Option ids as listed in the request
    Select(Vec<String>),
    Values(Vec<ChoiceValue>),
    Decline,
    /// Report pending once (simulates a player who has not answered yet)
    Pending,
}

/// Answers requests from a queue, in order
///
/// An exhausted queue reports `Pending`.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    answers: VecDeque<ScriptedAnswer>,
    /// Requests seen, for assertions in tests
    pub seen: Vec<ChoiceRequest>,
}

impl ScriptedProvider {
    pub fn new(answers: Vec<ScriptedAnswer>) -> Self {
        ScriptedProvider {
            answers: answers.into(),
            seen: Vec::new(),
        }
    }

    pub fn push(&mut self, answer: ScriptedAnswer) {
        self.answers.push_back(answer);
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl DecisionProvider for ScriptedProvider {
    fn request_choice(&mut self, _view: &GameStateView<'_>, request: &ChoiceRequest) -> ChoicePoll {
        self.seen.push(request.clone());
        match self.answers.pop_front() {
            Some(ScriptedAnswer::Select(ids)) => {
                ChoicePoll::Ready(ChoiceResponse::select(request.id.clone(), ids))
            }
            Some(ScriptedAnswer::Values(values)) => {
                ChoicePoll::Ready(ChoiceResponse::of_values(request.id.clone(), &values))
            }
            Some(ScriptedAnswer::Decline) => ChoicePoll::Ready(ChoiceResponse::decline(request.id.clone())),
            Some(ScriptedAnswer::Pending) | None => ChoicePoll::Pending,
        }
    }
}

/// Always pending: every decision waits for `TurnManager::submit_choice`
#[derive(Debug, Default)]
pub struct PendingProvider;

impl DecisionProvider for PendingProvider {
    fn request_choice(&mut self, _view: &GameStateView<'_>, _request: &ChoiceRequest) -> ChoicePoll {
        ChoicePoll::Pending
    }
}

/// Deterministic stand-in for a missing provider
///
/// - harmful target: opposing cards before your own, lowest willpower first
/// - beneficial target: your own cards first, highest strength first
/// - discard: highest cost first
/// - losing one of your own cards: lowest willpower, then lowest cost
/// - free play and picks from a deck: highest cost first
/// - "may": accept
/// - "choose one": first valid mode
/// - damage split: all of it on the lowest-willpower target
/// - cards to the bottom: as few as allowed, lowest cost first
///
/// Ties break on option order. Only valid options are ever selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnattendedPolicy;

impl UnattendedPolicy {
    pub fn decide(&self, view: &GameStateView<'_>, request: &ChoiceRequest) -> ChoiceResponse {
        let valid: Vec<ChoiceValue> = request.valid_options().map(|o| o.value).collect();
        if valid.is_empty() {
            return if request.optional {
                ChoiceResponse::decline(request.id.clone())
            } else {
                ChoiceResponse::select(request.id.clone(), Vec::new())
            };
        }

        let picks: Vec<ChoiceValue> = match request.kind {
            ChoiceKind::Confirm => vec![ChoiceValue::Accept],
            ChoiceKind::Mode => vec![valid[0]],
            ChoiceKind::Distribute => {
                let target = Self::ranked(view, &valid, |v| (view.willpower(v), 0));
                vec![target[0]; request.max]
            }
            ChoiceKind::Target { harmful: true } => {
                let ranked = Self::ranked(view, &valid, |v| (view.is_mine(v) as i32, view.willpower(v)));
                Self::take(ranked, request.max)
            }
            ChoiceKind::Target { harmful: false } => {
                let ranked = Self::ranked(view, &valid, |v| (!view.is_mine(v) as i32, -view.strength(v)));
                Self::take(ranked, request.max)
            }
            ChoiceKind::Discard => {
                let ranked = Self::ranked(view, &valid, |v| (-view.cost(v), 0));
                Self::take(ranked, request.min.max(1).min(request.max))
            }
            ChoiceKind::Sacrifice => {
                let ranked = Self::ranked(view, &valid, |v| (view.willpower(v), view.cost(v)));
                Self::take(ranked, request.min.max(1).min(request.max))
            }
            ChoiceKind::FreePlay => {
                let ranked = Self::ranked(view, &valid, |v| (-view.cost(v), 0));
                Self::take(ranked, 1.min(request.max))
            }
            ChoiceKind::Pick => {
                let ranked = Self::ranked(view, &valid, |v| (-view.cost(v), 0));
                Self::take(ranked, request.max)
            }
            ChoiceKind::Bottom => {
                let ranked = Self::ranked(view, &valid, |v| (view.cost(v), 0));
                Self::take(ranked, request.min)
            }
        };
        ChoiceResponse::of_values(request.id.clone(), &picks)
    }

    /// Stable sort of valid values by a key over cards; players and modes keep
    /// their option order
    fn ranked(
        view: &GameStateView<'_>,
        valid: &[ChoiceValue],
        key: impl Fn(CardId) -> (i32, i32),
    ) -> Vec<ChoiceValue> {
        let mut ranked = valid.to_vec();
        ranked.sort_by_key(|value| match value {
            ChoiceValue::Card(id) => key(*id),
            ChoiceValue::Player(id) => (-view.lore(*id), 0),
            _ => (0, 0),
        });
        ranked
    }

    fn take(ranked: Vec<ChoiceValue>, n: usize) -> Vec<ChoiceValue> {
        ranked.into_iter().take(n).collect()
    }
}

/// Per-player providers plus the fallback policy
#[derive(Default)]
pub struct DecisionHub {
    providers: FxHashMap<PlayerId, Box<dyn DecisionProvider>>,
    policy: UnattendedPolicy,
}

impl DecisionHub {
    /// Every player is decided for by the policy
    pub fn unattended() -> Self {
        Self::default()
    }

    pub fn register(&mut self, player: PlayerId, provider: Box<dyn DecisionProvider>) {
        self.providers.insert(player, provider);
    }

    pub fn unregister(&mut self, player: PlayerId) -> Option<Box<dyn DecisionProvider>> {
        self.providers.remove(&player)
    }

    pub fn has_provider(&self, player: PlayerId) -> bool {
        self.providers.contains_key(&player)
    }

    /// Ask the deciding player's provider, or the policy when there is none
    pub fn poll(&mut self, game: &GameState, request: &ChoiceRequest) -> ChoicePoll {
        let view = GameStateView::new(game, request.player);
        match self.providers.get_mut(&request.player) {
            Some(provider) => provider.request_choice(&view, request),
            None => ChoicePoll::Ready(self.policy.decide(&view, request)),
        }
    }

    pub fn policy(&self) -> UnattendedPolicy {
        self.policy
    }
}

impl std::fmt::Debug for DecisionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut players: Vec<_> = self.providers.keys().copied().collect();
        players.sort();
        f.debug_struct("DecisionHub")
            .field("providers", &players)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType};
    use crate::game::ChoiceOption;
    use std::sync::Arc;

    fn board() -> (GameState, Vec<CardId>) {
        let mut game = GameState::new_two_player("Alice", "Bob");
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        let specs = [
            ("Mine", alice, 5, 4, 1),
            ("Tough", bob, 3, 5, 2),
            ("Frail", bob, 4, 1, 6),
        ];
        let mut ids = Vec::new();
        for (name, owner, strength, willpower, cost) in specs {
            let card = Card::new("T", name, CardType::Character, cost).with_stats(strength, willpower, 1);
            let id = game.create_card(Arc::new(card), owner);
            game.move_card(id, Zone::Play).unwrap();
            ids.push(id);
        }
        (game, ids)
    }

    fn request(kind: ChoiceKind, ids: &[CardId], min: usize, max: usize) -> ChoiceRequest {
        ChoiceRequest {
            id: "c1-0-0".to_string(),
            player: PlayerId::new(0),
            prompt: "test".to_string(),
            kind,
            options: ids
                .iter()
                .map(|id| ChoiceOption::new(ChoiceValue::Card(*id), id.to_string()))
                .collect(),
            min,
            max,
            optional: false,
        }
    }

    #[test]
    fn test_policy_harmful_prefers_weak_opponent() {
        let (game, ids) = board();
        let view = GameStateView::new(&game, PlayerId::new(0));
        let req = request(ChoiceKind::Target { harmful: true }, &ids, 1, 1);
        let resp = UnattendedPolicy.decide(&view, &req);
        assert_eq!(resp.selected, vec![format!("card:{}", ids[2])]);
        assert!(req.validate(&resp).is_ok());
    }

    #[test]
    fn test_policy_beneficial_prefers_own_strong() {
        let (game, ids) = board();
        let view = GameStateView::new(&game, PlayerId::new(0));
        let req = request(ChoiceKind::Target { harmful: false }, &ids, 1, 1);
        let resp = UnattendedPolicy.decide(&view, &req);
        assert_eq!(resp.selected, vec![format!("card:{}", ids[0])]);
    }

    #[test]
    fn test_policy_never_picks_invalid() {
        let (game, ids) = board();
        let view = GameStateView::new(&game, PlayerId::new(0));
        let mut req = request(ChoiceKind::Target { harmful: true }, &ids, 1, 1);
        req.options[2] = req.options[2].clone().invalid("ward");
        let resp = UnattendedPolicy.decide(&view, &req);
        assert_eq!(resp.selected, vec![format!("card:{}", ids[1])]);
        assert!(req.validate(&resp).is_ok());
    }

    #[test]
    fn test_policy_discard_highest_cost() {
        let (game, ids) = board();
        let view = GameStateView::new(&game, PlayerId::new(1));
        let req = request(ChoiceKind::Discard, &ids, 2, 2);
        let resp = UnattendedPolicy.decide(&view, &req);
        assert_eq!(
            resp.selected,
            vec![format!("card:{}", ids[2]), format!("card:{}", ids[1])]
        );
    }

    #[test]
    fn test_policy_distribution_repeats() {
        let (game, ids) = board();
        let view = GameStateView::new(&game, PlayerId::new(0));
        let req = request(ChoiceKind::Distribute, &ids, 3, 3);
        let resp = UnattendedPolicy.decide(&view, &req);
        assert_eq!(resp.selected.len(), 3);
        assert!(req.validate(&resp).is_ok());
    }

    #[test]
    fn test_scripted_provider_then_pending() {
        let (game, ids) = board();
        let mut provider = ScriptedProvider::new(vec![ScriptedAnswer::Values(vec![ChoiceValue::Card(ids[1])])]);
        let view = GameStateView::new(&game, PlayerId::new(0));
        let req = request(ChoiceKind::Target { harmful: true }, &ids, 1, 1);
        match provider.request_choice(&view, &req) {
            ChoicePoll::Ready(resp) => assert_eq!(resp.request_id, "c1-0-0"),
            ChoicePoll::Pending => panic!("expected an answer"),
        }
        assert_eq!(provider.request_choice(&view, &req), ChoicePoll::Pending);
        assert_eq!(provider.seen.len(), 2);
    }

    #[test]
    fn test_hub_falls_back_to_policy() {
        let (game, ids) = board();
        let mut hub = DecisionHub::unattended();
        let req = request(ChoiceKind::Target { harmful: true }, &ids, 1, 1);
        assert!(matches!(hub.poll(&game, &req), ChoicePoll::Ready(_)));

        hub.register(PlayerId::new(0), Box::new(PendingProvider));
        assert_eq!(hub.poll(&game, &req), ChoicePoll::Pending);
        assert!(hub.has_provider(PlayerId::new(0)));
    }
}
