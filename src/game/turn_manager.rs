//! Turn manager: player actions, the trigger bag and turn progression
//!
//! Every action is validated before anything changes. A legal action mutates
//! the state, emits its event and then runs the bag until it is empty, a
//! choice is pending, or the game is over.

use crate::core::{
    AbilityDefinition, AbilityKind, Amount, CardFilter, CardId, CardType, Duration, EffectAst, EventKind, Keyword,
    PlayerId, Restriction, Side, Stat, StatLens, TargetAst, TriggerSpec, TriggerSubject,
};
use crate::game::executor::{damage, deck, location, resolve_ability, GameContext, Interrupt};
use crate::game::targeting::Participant;
use crate::game::{
    BagEntry, ChoiceRequest, ChoiceResponse, DecisionHub, EventBus, EventObserver, GameEvent, GameState, PendingStep,
    Phase,
};
use crate::zones::Zone;
use crate::{LoreError, Result};

/// Where the game stands after an action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Everything resolved; the active player may act again
    Ready,
    /// Resolution stopped on this request; answer it with `submit_choice`
    AwaitingChoice(ChoiceRequest),
    GameOver(PlayerId),
}

impl ActionOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ActionOutcome::Ready)
    }

    pub fn request(&self) -> Option<&ChoiceRequest> {
        match self {
            ActionOutcome::AwaitingChoice(request) => Some(request),
            _ => None,
        }
    }
}

/// Drives one game: owns the state, the decision providers and the observers
pub struct TurnManager {
    pub game: GameState,
    pub decisions: DecisionHub,
    bus: EventBus,
    /// Targets picked up front for the next ability put in the bag for this card
    staged_payload: Option<(CardId, Vec<Participant>)>,
}

impl TurnManager {
    pub fn new(game: GameState) -> Self {
        TurnManager {
            game,
            decisions: DecisionHub::unattended(),
            bus: EventBus::new(),
            staged_payload: None,
        }
    }

    pub fn with_decisions(mut self, decisions: DecisionHub) -> Self {
        self.decisions = decisions;
        self
    }

    /// Register a read-only observer of every published event
    pub fn subscribe(&mut self, observer: Box<dyn EventObserver>) {
        self.bus.subscribe(observer);
    }

    /// The request the game is waiting on, if any
    pub fn pending_choice(&self) -> Option<&ChoiceRequest> {
        self.game.bag.pending_request()
    }

    /// Shuffle, deal opening hands and begin the first player's turn
    pub fn start_game(&mut self) -> Result<ActionOutcome> {
        let hand = self.game.config.starting_hand;
        let players: Vec<PlayerId> = self.game.players.iter().map(|p| p.id).collect();
        for player in players {
            self.game.shuffle_deck(player)?;
            for _ in 0..hand {
                if self.game.draw_card(player)?.is_none() {
                    break;
                }
            }
        }
        // opening hands are not draws for trigger purposes
        let dealt = self.game.take_events();
        self.game.event_log.extend(dealt);
        self.game.logger.info("Game started");
        self.begin_turn()?;
        self.run()
    }

    // ---- validation helpers ----

    fn card_name(&self, id: CardId) -> String {
        self.game
            .card(id)
            .map(|c| c.card.full_name())
            .unwrap_or_else(|_| format!("card {id}"))
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.game
            .player(id)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|_| format!("player {id}"))
    }

    fn ensure_can_act(&self, player: PlayerId) -> Result<()> {
        if self.game.is_game_over() {
            return Err(LoreError::IllegalAction("the game is over".to_string()));
        }
        if self.pending_choice().is_some() {
            return Err(LoreError::IllegalAction("a choice is pending".to_string()));
        }
        if !self.game.is_active(player) {
            return Err(LoreError::IllegalAction(format!(
                "it is not {}'s turn",
                self.player_name(player)
            )));
        }
        if !self.game.turn.is_main() {
            return Err(LoreError::IllegalAction(format!(
                "actions are only allowed in the main phase, not {:?}",
                self.game.turn.phase
            )));
        }
        Ok(())
    }

    fn ensure_owned_in(&self, player: PlayerId, id: CardId, zone: Zone) -> Result<()> {
        let card = self.game.card(id)?;
        if card.owner != player {
            return Err(LoreError::IllegalAction(format!(
                "{} does not belong to {}",
                card.card.full_name(),
                self.player_name(player)
            )));
        }
        if card.zone != zone {
            return Err(LoreError::IllegalAction(format!(
                "{} is in {}, not {}",
                card.card.full_name(),
                card.zone,
                zone
            )));
        }
        Ok(())
    }

    /// Played this turn ("drying")
    fn is_drying(&self, id: CardId) -> bool {
        self.game
            .card(id)
            .map(|c| c.turn_played == Some(self.game.turn.turn_number))
            .unwrap_or(false)
    }

    fn ensure_ready_character(&self, id: CardId, verb: &str) -> Result<()> {
        let card = self.game.card(id)?;
        if !card.is_character() {
            return Err(LoreError::IllegalAction(format!(
                "{} is not a character",
                card.card.full_name()
            )));
        }
        if card.exerted {
            return Err(LoreError::IllegalAction(format!(
                "{} is exerted and cannot {verb}",
                card.card.full_name()
            )));
        }
        Ok(())
    }

    // ---- player actions ----

    /// Pay a card's cost from the inkwell and play it
    pub fn play_card(&mut self, player: PlayerId, card: CardId) -> Result<ActionOutcome> {
        self.play_card_with_targets(player, card, None)
    }

    /// Play a card whose first targeted effect uses targets the host already picked
    pub fn play_card_with_targets(
        &mut self,
        player: PlayerId,
        card: CardId,
        targets: Option<Vec<Participant>>,
    ) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, card, Zone::Hand)?;
        let cost = self.game.effective_cost(card);
        self.game.pay_ink(player, cost)?;
        self.game.consume_cost_reductions(card)?;

        let (who, what) = (self.player_name(player), self.card_name(card));
        self.game.logger.action(&format!("{who} plays {what} for {cost} ink"));
        self.staged_payload = targets.map(|t| (card, t));
        self.game.complete_play(card)?;
        self.run()
    }

    /// Exert a character to play a song for free
    pub fn sing_song(&mut self, player: PlayerId, song: CardId, singer: CardId) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, song, Zone::Hand)?;
        self.ensure_owned_in(player, singer, Zone::Play)?;
        let song_cost = {
            let card = self.game.card(song)?;
            if card.card.card_type != CardType::Song {
                return Err(LoreError::IllegalAction(format!(
                    "{} is not a song",
                    card.card.full_name()
                )));
            }
            card.card.cost
        };
        self.ensure_ready_character(singer, "sing")?;
        if self.is_drying(singer) {
            return Err(LoreError::IllegalAction(format!(
                "{} was played this turn and cannot sing",
                self.card_name(singer)
            )));
        }
        let value = self.game.sing_value(singer);
        if value < song_cost {
            return Err(LoreError::IllegalAction(format!(
                "{} counts as cost {value} and cannot sing a cost {song_cost} song",
                self.card_name(singer)
            )));
        }

        self.game.card_mut(singer)?.exert();
        self.game.card_mut(song)?.meta.free_play = true;
        let (who, what) = (self.card_name(singer), self.card_name(song));
        self.game.logger.action(&format!("{who} sings {what}"));
        self.game.complete_play(song)?;
        self.run()
    }

    /// Put an inkable card from hand into the inkwell (once per turn)
    pub fn ink_card(&mut self, player: PlayerId, card: CardId) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, card, Zone::Hand)?;
        if !self.game.player(player)?.can_ink() {
            return Err(LoreError::IllegalAction(format!(
                "{} has already inked a card this turn",
                self.player_name(player)
            )));
        }
        if !self.game.card(card)?.card.inkable {
            return Err(LoreError::IllegalAction(format!(
                "{} is not inkable",
                self.card_name(card)
            )));
        }
        let (who, what) = (self.player_name(player), self.card_name(card));
        self.game.logger.action(&format!("{who} inks {what}"));
        deck::ink(&mut self.game, card, false)?;
        self.game.player_mut(player)?.inked_this_turn = true;
        self.run()
    }

    /// Exert a character to gain its lore
    pub fn quest(&mut self, player: PlayerId, character: CardId) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, character, Zone::Play)?;
        self.ensure_ready_character(character, "quest")?;
        if self.is_drying(character) {
            return Err(LoreError::IllegalAction(format!(
                "{} was played this turn and cannot quest",
                self.card_name(character)
            )));
        }
        if self.game.has_restriction(character, Restriction::CantQuest)
            || self.game.has_keyword(character, &Keyword::Reckless)
        {
            return Err(LoreError::IllegalAction(format!(
                "{} cannot quest",
                self.card_name(character)
            )));
        }

        self.game.card_mut(character)?.exert();
        let lore = self.game.lore(character);
        self.game.player_mut(player)?.gain_lore(lore);
        let name = self.card_name(character);
        self.game.logger.action(&format!("{name} quests for {lore} lore"));
        let event = self
            .game
            .event(EventKind::CardQuested, player)
            .with_card(character)
            .with_amount(lore);
        self.game.emit(event.clone());
        if self.game.has_keyword(character, &Keyword::Support) {
            self.queue_support(player, character, event)?;
        }
        self.run()
    }

    /// Support: "you may add this character's strength to another chosen
    /// character's strength this turn"
    fn queue_support(&mut self, player: PlayerId, character: CardId, event: GameEvent) -> Result<()> {
        let boost = EffectAst::Optional {
            effect: Box::new(EffectAst::ModifyStats {
                target: TargetAst::Chosen {
                    filter: CardFilter::characters().other(),
                    side: Side::Yours,
                    count: 1,
                    up_to: false,
                },
                strength: Amount::SourceStat { stat: Stat::Strength },
                willpower: Amount::zero(),
                lore: Amount::zero(),
                duration: Duration::ThisTurn,
            }),
        };
        let ability = AbilityDefinition::triggered(TriggerSpec::this_card(EventKind::CardQuested), vec![boost], "Support")
            .with_name(Some("Support".to_string()));
        let entry = BagEntry::new(ability, Some(character), player, Some(event), 1);
        self.push_entry(entry);
        Ok(())
    }

    /// Exert a character to challenge an exerted opposing character or a location
    ///
    /// Damage is dealt after the "whenever this character challenges" and
    /// "whenever this character is challenged" abilities resolve.
    pub fn challenge(&mut self, player: PlayerId, attacker: CardId, defender: CardId) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, attacker, Zone::Play)?;
        self.ensure_ready_character(attacker, "challenge")?;
        if self.is_drying(attacker) && !self.game.has_keyword(attacker, &Keyword::Rush) {
            return Err(LoreError::IllegalAction(format!(
                "{} was played this turn and cannot challenge",
                self.card_name(attacker)
            )));
        }
        if self.game.has_restriction(attacker, Restriction::CantChallenge) {
            return Err(LoreError::IllegalAction(format!(
                "{} cannot challenge",
                self.card_name(attacker)
            )));
        }
        self.check_defender(attacker, defender)?;
        let defender_owner = self.game.card(defender)?.owner;
        if !self.game.has_keyword(defender, &Keyword::Bodyguard) {
            let guard = self.game.cards_in(defender_owner, Zone::Play).into_iter().find(|id| {
                *id != defender
                    && self.game.has_keyword(*id, &Keyword::Bodyguard)
                    && self.check_defender(attacker, *id).is_ok()
            });
            if let Some(guard) = guard {
                return Err(LoreError::IllegalAction(format!(
                    "{} must be challenged first",
                    self.card_name(guard)
                )));
            }
        }

        self.game.card_mut(attacker)?.exert();
        let (who, whom) = (self.card_name(attacker), self.card_name(defender));
        self.game.logger.action(&format!("{who} challenges {whom}"));
        let challenges = self
            .game
            .event(EventKind::CardChallenges, player)
            .with_card(attacker)
            .with_other(defender)
            .during_challenge();
        let challenged = self
            .game
            .event(EventKind::CardChallenged, defender_owner)
            .with_card(defender)
            .with_other(attacker)
            .during_challenge();
        self.game.emit(challenges);
        self.game.emit(challenged);
        self.game.pending_step = Some(PendingStep::ChallengeDamage { attacker, defender });
        self.run()
    }

    fn check_defender(&self, attacker: CardId, defender: CardId) -> Result<()> {
        let attacking = self.game.card(attacker)?;
        let card = self.game.card(defender)?;
        let name = card.card.full_name();
        if card.zone != Zone::Play || card.owner == attacking.owner {
            return Err(LoreError::IllegalAction(format!("{name} is not an opposing card in play")));
        }
        if card.is_character() {
            if !card.exerted {
                return Err(LoreError::IllegalAction(format!("{name} is ready and cannot be challenged")));
            }
            if self.game.has_keyword(defender, &Keyword::Evasive)
                && !self.game.has_keyword(attacker, &Keyword::Evasive)
            {
                return Err(LoreError::IllegalAction(format!(
                    "{name} has Evasive and can only be challenged by Evasive characters"
                )));
            }
        } else if !card.is_location() {
            return Err(LoreError::IllegalAction(format!("{name} cannot be challenged")));
        }
        if self.game.has_restriction(defender, Restriction::CantBeChallenged) {
            return Err(LoreError::IllegalAction(format!("{name} cannot be challenged")));
        }
        Ok(())
    }

    /// Pay a location's move cost to move a character there
    pub fn move_to_location(&mut self, player: PlayerId, character: CardId, place: CardId) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, character, Zone::Play)?;
        location::move_character(&mut self.game, character, place, true)?;
        self.run()
    }

    /// Pay the cost of a card's `index`-th activated ability and resolve it
    pub fn activate_ability(&mut self, player: PlayerId, card: CardId, index: usize) -> Result<ActionOutcome> {
        self.activate_ability_with_targets(player, card, index, None)
    }

    pub fn activate_ability_with_targets(
        &mut self,
        player: PlayerId,
        card: CardId,
        index: usize,
        targets: Option<Vec<Participant>>,
    ) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        self.ensure_owned_in(player, card, Zone::Play)?;
        let ability = self
            .game
            .card(card)?
            .abilities()
            .iter()
            .filter(|a| a.kind == AbilityKind::Activated)
            .nth(index)
            .cloned()
            .ok_or_else(|| {
                LoreError::IllegalAction(format!("{} has no activated ability {index}", self.card_name(card)))
            })?;
        let cost = ability.cost.clone().unwrap_or_default();
        let ink = cost.ink as i32;

        if cost.exert {
            let instance = self.game.card(card)?;
            if instance.exerted {
                return Err(LoreError::IllegalAction(format!(
                    "{} is already exerted",
                    instance.card.full_name()
                )));
            }
            if instance.is_character() && self.is_drying(card) {
                return Err(LoreError::IllegalAction(format!(
                    "{} was played this turn and cannot exert",
                    instance.card.full_name()
                )));
            }
        }
        let available = self.game.available_ink(player);
        if available < ink {
            return Err(LoreError::IllegalAction(format!("needs {ink} ink, has {available}")));
        }

        if cost.exert {
            self.game.card_mut(card)?.exert();
        }
        self.game.pay_ink(player, ink)?;
        let name = self.card_name(card);
        self.game.logger.action(&format!("{name} activates {}", ability.text));
        if cost.banish_self {
            damage::banish(&mut self.game, card, None, false)?;
        }
        let event = self
            .game
            .event(EventKind::AbilityActivated, player)
            .with_card(card);
        let entry = BagEntry::new(ability, Some(card), player, Some(event.clone()), 1).with_payload(targets);
        self.push_entry(entry);
        self.game.emit(event);
        self.run()
    }

    /// End the turn: end-of-turn abilities resolve, then the next player begins
    pub fn pass_turn(&mut self, player: PlayerId) -> Result<ActionOutcome> {
        self.ensure_can_act(player)?;
        let name = self.player_name(player);
        self.game.logger.action(&format!("{name} passes the turn"));
        self.game.turn.phase = Phase::End;
        let event = self.game.event(EventKind::EndOfTurn, player);
        self.game.emit(event);
        self.game.pending_step = Some(PendingStep::EndTurn);
        self.run()
    }

    /// Answer the pending request and continue resolving
    ///
    /// A response for another request, or one selecting ineligible options,
    /// is rejected with a warning and nothing changes.
    pub fn submit_choice(&mut self, response: ChoiceResponse) -> Result<ActionOutcome> {
        let Some(request) = self.pending_choice().cloned() else {
            return Err(LoreError::NoPendingChoice);
        };
        if response.request_id != request.id {
            let message = format!(
                "response for {} does not answer pending request {}",
                response.request_id, request.id
            );
            self.game.logger.warn(&message);
            return Err(LoreError::InvalidChoice(message));
        }
        if let Err(err) = request.validate(&response) {
            self.game
                .logger
                .warn(&format!("rejected answer to {}: {err}", request.id));
            return Err(err);
        }
        if let Some(entry) = self.game.bag.suspended_mut() {
            entry.frame.answer(response);
            entry.pending = None;
        }
        self.run()
    }

    // ---- resolution loop ----

    fn push_entry(&mut self, entry: BagEntry) {
        let label = entry.label();
        let (depth, len) = (self.game.config.max_bag_depth, self.game.config.max_bag_len);
        if let Err(err) = self.game.bag.push(entry, depth, len) {
            self.game
                .logger
                .error(&format!("Runaway trigger chain: dropped {label} ({err})"));
        }
    }

    /// Resolve the bag and any deferred turn step until the game needs input
    fn run(&mut self) -> Result<ActionOutcome> {
        self.settle(0)?;
        loop {
            if let Some(winner) = self.game.winner {
                return Ok(ActionOutcome::GameOver(winner));
            }
            let order = self.game.turn_order_from(self.game.active_player());
            if let Some(index) = self.game.bag.next_index(&order) {
                let mut entry = self.game.bag.take(index);
                let depth = entry.depth;
                if let Some(request) = self.resolve_entry(&mut entry) {
                    entry.started = true;
                    entry.pending = Some(request.clone());
                    self.game.bag.restore(index, entry);
                    self.settle(depth)?;
                    if let Some(winner) = self.game.winner {
                        return Ok(ActionOutcome::GameOver(winner));
                    }
                    return Ok(ActionOutcome::AwaitingChoice(request));
                }
                self.settle(depth)?;
                continue;
            }

            match self.game.pending_step.take() {
                Some(PendingStep::ChallengeDamage { attacker, defender }) => {
                    damage::resolve_challenge_damage(&mut self.game, attacker, defender)?;
                    self.settle(0)?;
                }
                Some(PendingStep::EndTurn) => {
                    self.end_turn()?;
                    self.begin_turn()?;
                    self.settle(0)?;
                }
                Some(PendingStep::EnterMain) => {
                    self.game.turn.phase = Phase::Main;
                }
                None => return Ok(ActionOutcome::Ready),
            }
        }
    }

    /// Run one entry; returns the request it suspended on
    fn resolve_entry(&mut self, entry: &mut BagEntry) -> Option<ChoiceRequest> {
        entry.frame.rewind();
        entry.pending = None;
        let label = entry.label();
        if !entry.started {
            self.game.logger.debug(&format!("resolving {label}"));
        }
        let outcome = {
            let mut ctx = GameContext::new(
                &mut self.game,
                &mut self.decisions,
                &mut entry.frame,
                entry.controller,
                entry.source,
            );
            ctx.entry_id = entry.id;
            ctx.event = entry.event.clone();
            ctx.payload = entry.payload.clone();
            resolve_ability(&entry.ability, &mut ctx)
        };
        match outcome {
            Ok(()) => None,
            Err(Interrupt::Suspend(request)) => {
                self.game
                    .logger
                    .debug(&format!("{label} waits on {}", request.id));
                Some(request)
            }
            Err(Interrupt::Fatal(err)) => {
                self.game.logger.error(&format!("{label} failed: {err}"));
                None
            }
        }
    }

    /// Publish pending events, queue their triggers and apply state checks
    /// until nothing changes
    fn settle(&mut self, depth: u32) -> Result<()> {
        loop {
            self.dispatch_events(depth)?;
            if !self.state_checks()? {
                break;
            }
        }
        self.game.check_victory();
        Ok(())
    }

    fn dispatch_events(&mut self, depth: u32) -> Result<()> {
        for event in self.game.take_events() {
            self.bus.publish(&event);
            for (source, controller, ability) in self.matching_triggers(&event)? {
                let staged = event.kind == EventKind::CardPlayed
                    && matches!(&self.staged_payload, Some((card, _)) if *card == source);
                let payload = if staged {
                    self.staged_payload.take().map(|(_, targets)| targets)
                } else {
                    None
                };
                let entry =
                    BagEntry::new(ability, Some(source), controller, Some(event.clone()), depth + 1)
                        .with_payload(payload);
                self.push_entry(entry);
            }
            self.game.event_log.push(event);
        }
        self.staged_payload = None;
        Ok(())
    }

    /// Triggered abilities listening to `event`
    ///
    /// Cards in play listen to everything; a card outside play only hears
    /// events about itself (an action being played, a character being banished).
    fn matching_triggers(&self, event: &GameEvent) -> Result<Vec<(CardId, PlayerId, AbilityDefinition)>> {
        let mut listeners = self.game.in_play();
        if let Some(card) = event.card {
            if !listeners.contains(&card) {
                listeners.push(card);
            }
        }
        let subject_card = event.card.and_then(|id| self.game.card(id).ok());

        let mut found = Vec::new();
        for id in listeners {
            let card = self.game.card(id)?;
            let in_play = card.zone == Zone::Play;
            for ability in card.abilities() {
                let Some(trigger) = ability.trigger.as_ref() else {
                    continue;
                };
                if ability.kind != AbilityKind::Triggered || trigger.event != event.kind {
                    continue;
                }
                if !in_play && trigger.subject != TriggerSubject::ThisCard {
                    continue;
                }
                if trigger.your_turn_only && !self.game.is_active(card.owner) {
                    continue;
                }
                if trigger.in_challenge && !event.in_challenge {
                    continue;
                }
                let hears = match &trigger.subject {
                    TriggerSubject::ThisCard => event.card == Some(id),
                    TriggerSubject::Counterpart => event.other == Some(id),
                    TriggerSubject::You => event.player == card.owner,
                    TriggerSubject::YourCards { filter } => subject_card.is_some_and(|c| {
                        c.owner == card.owner && filter.matches(&self.game, c, Some(id), StatLens::Derived)
                    }),
                    TriggerSubject::OpponentCards { filter } => subject_card.is_some_and(|c| {
                        c.owner != card.owner && filter.matches(&self.game, c, Some(id), StatLens::Derived)
                    }),
                    TriggerSubject::AnyCards { filter } => subject_card
                        .is_some_and(|c| filter.matches(&self.game, c, Some(id), StatLens::Derived)),
                };
                if hears {
                    found.push((id, card.owner, ability.clone()));
                }
            }
        }
        Ok(found)
    }

    /// Banish every character and location with lethal damage
    fn state_checks(&mut self) -> Result<bool> {
        let doomed: Vec<CardId> = self
            .game
            .in_play()
            .into_iter()
            .filter(|id| {
                self.game
                    .card(*id)
                    .is_ok_and(|c| (c.is_character() || c.is_location()) && self.game.has_lethal_damage(*id))
            })
            .collect();
        for id in &doomed {
            damage::banish(&mut self.game, *id, None, false)?;
        }
        Ok(!doomed.is_empty())
    }

    // ---- turn progression ----

    fn end_turn(&mut self) -> Result<()> {
        self.game.expire_end_of_turn();
        for player in self.game.players.iter_mut() {
            player.end_turn();
        }
        let active = self.game.active_player();
        let order = self.game.turn_order_from(active);
        let next = order
            .into_iter()
            .skip(1)
            .find(|p| self.game.player(*p).is_ok_and(|p| !p.has_lost))
            .unwrap_or(active);
        let idx = self.game.player_idx(next).unwrap_or(0);
        if idx <= self.game.turn.active_player_idx {
            self.game.turn.first_round_done = true;
        }
        self.game.turn.next_turn(next, idx);
        Ok(())
    }

    /// Ready, set, draw; then start-of-turn abilities and the main phase
    fn begin_turn(&mut self) -> Result<()> {
        let player = self.game.active_player();
        let turn = self.game.turn.turn_number;
        self.game.turn.phase = Phase::Beginning;
        let name = self.player_name(player);
        self.game.logger.info(&format!("Turn {turn}: {name}"));

        self.game.expire_start_of_turn(player);
        self.game.player_mut(player)?.start_turn();

        let mut readied = self.game.cards_in(player, Zone::Play);
        readied.extend(self.game.cards_in(player, Zone::Inkwell));
        for id in readied {
            if self.game.has_restriction(id, Restriction::CantReady) {
                continue;
            }
            self.game.card_mut(id)?.ready();
        }

        for id in self.game.cards_in(player, Zone::Play) {
            if self.game.card(id)?.is_location() {
                let lore = self.game.lore(id);
                if lore > 0 {
                    self.game.player_mut(player)?.gain_lore(lore);
                    let place = self.card_name(id);
                    self.game.logger.effect(&format!("{name} gains {lore} lore from {place}"));
                }
            }
        }

        let skip_draw = turn == 1 && self.game.config.first_player_skips_draw;
        if !skip_draw && self.game.draw_card(player)?.is_none() {
            self.game.logger.info(&format!("{name} cannot draw and loses"));
            self.game.player_mut(player)?.has_lost = true;
            if self.game.check_victory().is_none() {
                self.game.pending_step = Some(PendingStep::EndTurn);
            }
            return Ok(());
        }

        let event = self.game.event(EventKind::StartOfTurn, player);
        self.game.emit(event);
        self.game.pending_step = Some(PendingStep::EnterMain);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Card;
    use crate::game::{ChoiceValue, GameConfig, GameLogger, LogLevel, PendingProvider};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn character(name: &str, cost: i32, stats: (i32, i32, i32)) -> Arc<Card> {
        Arc::new(Card::new("T-1", name, CardType::Character, cost).with_stats(stats.0, stats.1, stats.2))
    }

    /// Two players in Alice's main phase, each with ten filler cards in deck
    fn setup() -> (TurnManager, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("Alice", "Bob");
        game.logger = GameLogger::capturing();
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        for player in [alice, bob] {
            for i in 0..10 {
                game.create_card(character(&format!("Filler {i}"), 1, (1, 1, 1)), player);
            }
        }
        let mut manager = TurnManager::new(game);
        manager.game.turn.phase = Phase::Main;
        (manager, alice, bob)
    }

    fn in_zone(manager: &mut TurnManager, card: Arc<Card>, owner: PlayerId, zone: Zone) -> CardId {
        let id = manager.game.create_card(card, owner);
        manager.game.move_card(id, zone).unwrap();
        id
    }

    fn give_ink(manager: &mut TurnManager, owner: PlayerId, n: usize) {
        for _ in 0..n {
            in_zone(manager, character("Ink", 1, (0, 0, 0)), owner, Zone::Inkwell);
        }
    }

    /// Put a card in play as if it had been there since an earlier turn
    fn veteran(manager: &mut TurnManager, card: Arc<Card>, owner: PlayerId) -> CardId {
        let id = in_zone(manager, card, owner, Zone::Play);
        manager.game.card_mut(id).unwrap().turn_played = Some(0);
        id
    }

    #[test]
    fn test_start_game_deals_and_skips_first_draw() {
        let (mut manager, alice, bob) = setup();
        manager.game.turn.phase = Phase::Beginning;
        let outcome = manager.start_game().unwrap();
        assert_eq!(outcome, ActionOutcome::Ready);
        assert!(manager.game.turn.is_main());
        assert_eq!(manager.game.cards_in(alice, Zone::Hand).len(), 7);
        assert_eq!(manager.game.cards_in(bob, Zone::Hand).len(), 7);
    }

    #[test]
    fn test_play_card_pays_ink_and_fires_play_trigger() {
        let (mut manager, alice, _) = setup();
        give_ink(&mut manager, alice, 2);
        let card = Arc::new(
            Card::new("T-2", "Lefou", CardType::Character, 2)
                .with_stats(1, 2, 1)
                .with_text("When you play this character, gain 1 lore."),
        );
        let id = in_zone(&mut manager, card, alice, Zone::Hand);

        let outcome = manager.play_card(alice, id).unwrap();
        assert!(outcome.is_ready());
        assert_eq!(manager.game.card(id).unwrap().zone, Zone::Play);
        assert_eq!(manager.game.available_ink(alice), 0);
        assert_eq!(manager.game.player(alice).unwrap().lore, 1);
    }

    #[test]
    fn test_illegal_play_changes_nothing() {
        let (mut manager, alice, bob) = setup();
        give_ink(&mut manager, alice, 1);
        let id = in_zone(&mut manager, character("Maui", 5, (5, 5, 2)), alice, Zone::Hand);
        assert!(matches!(manager.play_card(alice, id), Err(LoreError::IllegalAction(_))));
        assert_eq!(manager.game.card(id).unwrap().zone, Zone::Hand);
        assert_eq!(manager.game.available_ink(alice), 1);

        // not Bob's turn
        let theirs = in_zone(&mut manager, character("Pua", 0, (1, 1, 1)), bob, Zone::Hand);
        assert!(matches!(manager.play_card(bob, theirs), Err(LoreError::IllegalAction(_))));
    }

    #[test]
    fn test_ink_once_per_turn() {
        let (mut manager, alice, _) = setup();
        let a = in_zone(&mut manager, character("A", 1, (1, 1, 1)), alice, Zone::Hand);
        let b = in_zone(&mut manager, character("B", 1, (1, 1, 1)), alice, Zone::Hand);
        manager.ink_card(alice, a).unwrap();
        assert_eq!(manager.game.card(a).unwrap().zone, Zone::Inkwell);
        assert!(manager.ink_card(alice, b).is_err());
        assert_eq!(manager.game.card(b).unwrap().zone, Zone::Hand);
    }

    #[test]
    fn test_quest_rules() {
        let (mut manager, alice, _) = setup();
        let fresh = in_zone(&mut manager, character("Fresh", 1, (1, 1, 2)), alice, Zone::Play);
        assert!(manager.quest(alice, fresh).is_err());

        let old = veteran(&mut manager, character("Old", 1, (1, 1, 2)), alice);
        manager.quest(alice, old).unwrap();
        assert_eq!(manager.game.player(alice).unwrap().lore, 2);
        assert!(manager.game.card(old).unwrap().exerted);
        // already exerted
        assert!(manager.quest(alice, old).is_err());
    }

    #[test]
    fn test_challenge_deals_damage_after_triggers() {
        let (mut manager, alice, bob) = setup();
        let attacker = veteran(&mut manager, character("Mulan", 3, (3, 3, 1)), alice);
        let defender = veteran(&mut manager, character("Hades", 3, (2, 3, 1)), bob);
        assert!(manager.challenge(alice, attacker, defender).is_err(), "ready defenders cannot be challenged");

        manager.game.card_mut(defender).unwrap().exert();
        manager.challenge(alice, attacker, defender).unwrap();
        assert_eq!(manager.game.card(defender).unwrap().zone, Zone::Discard);
        assert_eq!(manager.game.card(attacker).unwrap().damage, 2);
        assert!(manager
            .game
            .event_log
            .iter()
            .any(|e| e.kind == EventKind::CardBanished && e.in_challenge));
    }

    #[test]
    fn test_evasive_and_bodyguard() {
        let (mut manager, alice, bob) = setup();
        let attacker = veteran(&mut manager, character("Mulan", 3, (3, 3, 1)), alice);
        let flyer = veteran(
            &mut manager,
            Arc::new(
                Card::new("T-3", "Iago", CardType::Character, 2)
                    .with_stats(1, 2, 1)
                    .with_keyword("Evasive"),
            ),
            bob,
        );
        manager.game.card_mut(flyer).unwrap().exert();
        assert!(manager.challenge(alice, attacker, flyer).is_err());

        let guard = veteran(
            &mut manager,
            Arc::new(
                Card::new("T-4", "Baloo", CardType::Character, 3)
                    .with_stats(2, 5, 1)
                    .with_keyword("Bodyguard"),
            ),
            bob,
        );
        let other = veteran(&mut manager, character("Kaa", 2, (2, 2, 1)), bob);
        manager.game.card_mut(guard).unwrap().exert();
        manager.game.card_mut(other).unwrap().exert();
        assert!(manager.challenge(alice, attacker, other).is_err());
        assert!(manager.challenge(alice, attacker, guard).is_ok());
    }

    #[test]
    fn test_pass_turn_draws_and_readies() {
        let (mut manager, alice, bob) = setup();
        let old = veteran(&mut manager, character("Old", 1, (1, 1, 1)), bob);
        manager.game.card_mut(old).unwrap().exert();
        let hand_before = manager.game.cards_in(bob, Zone::Hand).len();

        let outcome = manager.pass_turn(alice).unwrap();
        assert!(outcome.is_ready());
        assert_eq!(manager.game.active_player(), bob);
        assert_eq!(manager.game.turn.turn_number, 2);
        assert!(manager.game.turn.is_main());
        assert!(!manager.game.card(old).unwrap().exerted);
        assert_eq!(manager.game.cards_in(bob, Zone::Hand).len(), hand_before + 1);
    }

    #[test]
    fn test_empty_deck_on_draw_loses() {
        let mut game = GameState::new_two_player("Alice", "Bob");
        game.logger = GameLogger::capturing();
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        game.create_card(character("Only", 1, (1, 1, 1)), alice);
        let mut manager = TurnManager::new(game);
        manager.game.turn.phase = Phase::Main;
        let outcome = manager.pass_turn(alice).unwrap();
        assert_eq!(outcome, ActionOutcome::GameOver(alice));
        assert!(manager.game.player(bob).unwrap().has_lost);
    }

    #[test]
    fn test_start_of_turn_trigger_and_location_lore() {
        let (mut manager, alice, bob) = setup();
        let watcher = Arc::new(
            Card::new("T-5", "Rafiki", CardType::Character, 3)
                .with_stats(1, 3, 1)
                .with_text("At the start of your turn, gain 1 lore."),
        );
        veteran(&mut manager, watcher, bob);
        veteran(
            &mut manager,
            Arc::new(Card::new("T-6", "Pride Rock", CardType::Location, 2).with_stats(0, 7, 2)),
            bob,
        );
        manager.pass_turn(alice).unwrap();
        assert_eq!(manager.game.player(bob).unwrap().lore, 3);
    }

    #[test]
    fn test_lore_goal_ends_game() {
        let (mut manager, alice, _) = setup();
        manager.game.player_mut(alice).unwrap().lore = 19;
        let old = veteran(&mut manager, character("Old", 1, (1, 1, 1)), alice);
        assert_eq!(manager.quest(alice, old).unwrap(), ActionOutcome::GameOver(alice));
        assert!(manager.pass_turn(alice).is_err());
    }

    #[test]
    fn test_suspend_and_submit_choice() {
        let (mut manager, alice, bob) = setup();
        manager.decisions.register(alice, Box::new(PendingProvider));
        give_ink(&mut manager, alice, 2);
        let a = veteran(&mut manager, character("Jafar", 4, (3, 5, 1)), bob);
        let b = veteran(&mut manager, character("Iago", 2, (1, 3, 1)), bob);
        let bolt = in_zone(
            &mut manager,
            Arc::new(Card::new("T-7", "Fire the Cannons", CardType::Action, 1).with_text("Deal 2 damage to chosen character.")),
            alice,
            Zone::Hand,
        );

        let outcome = manager.play_card(alice, bolt).unwrap();
        let request = outcome.request().cloned().expect("a target choice");
        assert!(manager.pass_turn(alice).is_err(), "no actions while a choice is pending");

        // an answer for another request is rejected without changes
        let wrong = ChoiceResponse::of_values("c99-0-0", &[ChoiceValue::Card(a)]);
        assert!(matches!(manager.submit_choice(wrong), Err(LoreError::InvalidChoice(_))));
        assert_eq!(manager.game.card(a).unwrap().damage, 0);

        let answer = ChoiceResponse::of_values(request.id.clone(), &[ChoiceValue::Card(a)]);
        assert!(manager.submit_choice(answer).unwrap().is_ready());
        assert_eq!(manager.game.card(a).unwrap().damage, 2);
        assert_eq!(manager.game.card(b).unwrap().damage, 0);
        assert!(matches!(
            manager.submit_choice(ChoiceResponse::decline("x")),
            Err(LoreError::NoPendingChoice)
        ));
    }

    #[test]
    fn test_pre_resolved_targets() {
        let (mut manager, alice, bob) = setup();
        give_ink(&mut manager, alice, 1);
        let tough = veteran(&mut manager, character("Chernabog", 9, (9, 9, 1)), bob);
        let weak = veteran(&mut manager, character("Flit", 1, (1, 1, 1)), bob);
        let bolt = in_zone(
            &mut manager,
            Arc::new(Card::new("T-7", "Fire the Cannons", CardType::Action, 1).with_text("Deal 2 damage to chosen character.")),
            alice,
            Zone::Hand,
        );
        manager
            .play_card_with_targets(alice, bolt, Some(vec![Participant::Card(tough)]))
            .unwrap();
        assert_eq!(manager.game.card(tough).unwrap().damage, 2);
        assert_eq!(manager.game.card(weak).unwrap().zone, Zone::Play);
    }

    #[test]
    fn test_runaway_chain_is_dropped_and_logged() {
        let (mut manager, alice, bob) = setup();
        manager.game.config = GameConfig::default().with_bag_limits(1, 256);
        give_ink(&mut manager, alice, 1);
        let mourner = Arc::new(
            Card::new("T-8", "Mufasa", CardType::Character, 6)
                .with_stats(4, 6, 2)
                .with_text("When this character is banished, gain 1 lore."),
        );
        let target = veteran(&mut manager, mourner, bob);
        let doom = in_zone(
            &mut manager,
            Arc::new(Card::new("T-9", "Stampede", CardType::Action, 1).with_text("Banish chosen character.")),
            alice,
            Zone::Hand,
        );
        assert!(manager.play_card(alice, doom).unwrap().is_ready());
        assert_eq!(manager.game.card(target).unwrap().zone, Zone::Discard);
        assert_eq!(manager.game.player(bob).unwrap().lore, 0);
        assert_eq!(manager.game.bag.dropped_chains, 1);
        assert_eq!(
            manager
                .game
                .logger
                .logs()
                .count_matching(LogLevel::Error, "Runaway trigger chain"),
            1
        );
    }

    #[test]
    fn test_observers_see_every_event() {
        let (mut manager, alice, _) = setup();
        let seen: Rc<RefCell<Vec<EventKind>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        manager.subscribe(Box::new(move |event: &GameEvent| sink.borrow_mut().push(event.kind)));
        let old = veteran(&mut manager, character("Old", 1, (1, 1, 1)), alice);
        manager.quest(alice, old).unwrap();
        assert_eq!(*seen.borrow(), vec![EventKind::CardQuested]);
    }
}
