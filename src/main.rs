//! Lore Engine - command line front end
//!
//! Compile rules text, audit a card catalogue, or run an unattended game

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lore_engine::{
    core::{CardId, CardType, PlayerId},
    game::{ActionOutcome, GameConfig, OutputFormat, TurnManager, VerbosityLevel},
    loader::{CardCatalog, CardDatabase, DeckLoader, GameInitializer},
    parser::parse_text,
    zones::Zone,
};
use std::path::PathBuf;

/// Verbosity level for game output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "lore")]
#[command(about = "Lore Engine - card ability compiler and resolution engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one piece of rules text and print the abilities as JSON
    Parse {
        /// Rules text, e.g. "When you play this character, gain 1 lore."
        #[arg(long)]
        text: String,

        /// Card name, substituted for the card's own name in the text
        #[arg(long, default_value = "Unnamed")]
        name: String,
    },

    /// Parse every card of a catalogue and report text the parser cannot match
    Check {
        /// Card catalogue (JSON)
        #[arg(value_name = "CARDS_JSON")]
        cards: PathBuf,

        /// How many unmatched patterns to list
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Play an unattended game between two decks
    Play {
        /// Card catalogue (JSON)
        #[arg(value_name = "CARDS_JSON")]
        cards: PathBuf,

        #[arg(value_name = "PLAYER1_DECK")]
        deck1: PathBuf,

        #[arg(value_name = "PLAYER2_DECK")]
        deck2: PathBuf,

        /// Set random seed for deterministic games
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Stop after this many turns if nobody has won
        #[arg(long, default_value_t = 60)]
        max_turns: u32,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Print log entries as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { text, name } => run_parse(&name, &text),
        Commands::Check { cards, top } => run_check(cards, top),
        Commands::Play {
            cards,
            deck1,
            deck2,
            seed,
            max_turns,
            verbosity,
            json,
        } => run_play(cards, deck1, deck2, seed, max_turns, verbosity.0, json),
    }
}

fn run_parse(name: &str, text: &str) -> anyhow::Result<()> {
    let Some(abilities) = parse_text(name, text) else {
        bail!("no template matches: {text}");
    };
    println!("{}", serde_json::to_string_pretty(&abilities)?);
    Ok(())
}

fn run_check(cards: PathBuf, top: usize) -> anyhow::Result<()> {
    let catalog = CardCatalog::load_from_file(&cards)
        .with_context(|| format!("loading {}", cards.display()))?;
    let report = catalog.diagnostics();

    println!("cards:               {}", report.cards);
    println!("fully parsed cards:  {}", report.fully_parsed_cards);
    println!("parsed sections:     {}", report.parsed_sections);
    println!("unparsed sections:   {}", report.unparsed_sections);
    if !report.unmatched.is_empty() {
        println!();
        println!("most common unmatched text:");
        for (pattern, count) in report.unmatched.iter().take(top) {
            println!("{count:>5}  {pattern}");
        }
    }
    Ok(())
}

fn run_play(
    cards: PathBuf,
    deck1: PathBuf,
    deck2: PathBuf,
    seed: u64,
    max_turns: u32,
    verbosity: VerbosityLevel,
    json: bool,
) -> anyhow::Result<()> {
    let db = CardDatabase::load_from_file(&cards)
        .with_context(|| format!("loading {}", cards.display()))?;
    let deck1_list = DeckLoader::load_from_file(&deck1)?;
    let deck2_list = DeckLoader::load_from_file(&deck2)?;

    let config = GameConfig::default().with_seed(seed).with_verbosity(verbosity);
    let mut game = GameInitializer::new(&db)
        .with_config(config)
        .init_two_player(("Player 1", &deck1_list), ("Player 2", &deck2_list))?;
    if json {
        game.logger.set_output_format(OutputFormat::Json);
    }

    let mut manager = TurnManager::new(game);
    let mut outcome = manager.start_game()?;
    while !matches!(outcome, ActionOutcome::GameOver(_)) && manager.game.turn.turn_number <= max_turns {
        let player = manager.game.active_player();
        outcome = autopilot_turn(&mut manager, player)?;
    }

    match manager.game.winner {
        Some(winner) => println!("{} wins on turn {}", manager.game.player(winner)?.name, manager.game.turn.turn_number),
        None => println!("no winner after {max_turns} turns"),
    }
    for player in &manager.game.players {
        println!("{}: {} lore", player.name, player.lore);
    }
    Ok(())
}

/// One simple turn: ink, play what is affordable, quest, pass
///
/// Illegal attempts are rejected by the engine and skipped; choices are
/// answered by the unattended policy.
fn autopilot_turn(manager: &mut TurnManager, player: PlayerId) -> anyhow::Result<ActionOutcome> {
    let hand = manager.game.cards_in(player, Zone::Hand);
    if let Some(card) = hand
        .iter()
        .copied()
        .find(|id| manager.game.card(*id).map(|c| c.card.inkable).unwrap_or(false))
    {
        if let Err(err) = manager.ink_card(player, card) {
            manager.game.logger.debug(&format!("skip ink: {err}"));
        }
    }

    let mut playable: Vec<CardId> = manager.game.cards_in(player, Zone::Hand);
    playable.sort_by_key(|id| std::cmp::Reverse(manager.game.effective_cost(*id)));
    for card in playable {
        if manager.game.effective_cost(card) > manager.game.available_ink(player) {
            continue;
        }
        if let Some(outcome) = attempt(manager, |m| m.play_card(player, card))? {
            return Ok(outcome);
        }
    }

    let characters: Vec<CardId> = manager
        .game
        .cards_in(player, Zone::Play)
        .into_iter()
        .filter(|id| manager.game.card(*id).map(|c| c.is_type(CardType::Character)).unwrap_or(false))
        .collect();
    for character in characters {
        if let Some(outcome) = attempt(manager, |m| m.quest(player, character))? {
            return Ok(outcome);
        }
    }

    Ok(manager.pass_turn(player)?)
}

/// Run an action; `Some` when the game ended
fn attempt<F>(manager: &mut TurnManager, action: F) -> anyhow::Result<Option<ActionOutcome>>
where
    F: FnOnce(&mut TurnManager) -> lore_engine::Result<ActionOutcome>,
{
    match action(manager) {
        Ok(outcome @ ActionOutcome::GameOver(_)) => Ok(Some(outcome)),
        Ok(ActionOutcome::AwaitingChoice(request)) => {
            bail!("game is waiting on a choice with no provider: {}", request.prompt)
        }
        Ok(ActionOutcome::Ready) => Ok(None),
        Err(err) => {
            manager.game.logger.debug(&format!("skip: {err}"));
            Ok(None)
        }
    }
}
