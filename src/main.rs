//! Brawl Simulator
//!
//! Headless driver: runs a scripted match, logs events and verifies the
//! result replays to the same state hash.
//!
//! Usage: `brawl-sim [config.json] [ticks]`

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use brawl_core::{
    TICK_RATE, VERSION,
    game::{
        config::MatchConfig,
        input::{InputIntentMapper, Key, RawInputSnapshot, ScriptedInput},
        intent::IntentSet,
        present::{PresentationSink, TracingPresenter},
        profile::ProfileTable,
        state::{MatchState, PlayerId},
        tick::{replay_match, tick},
    },
};

/// Default demo length (20 seconds).
const DEFAULT_TICKS: u64 = 1200;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Brawl Simulator v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
            MatchConfig::from_json_str(&json).with_context(|| format!("parsing config {}", path))?
        }
        None => MatchConfig::default(),
    };
    config.apply_env().context("applying environment overrides")?;

    let ticks = match args.next() {
        Some(n) => n.parse::<u64>().with_context(|| format!("invalid tick count '{}'", n))?,
        None => DEFAULT_TICKS,
    };

    demo_match(&config, ticks);
    Ok(())
}

/// Scripted inputs: both players approach, trade attacks, jump and shield.
fn demo_script(ticks: u64) -> Vec<RawInputSnapshot> {
    (0..ticks)
        .map(|t| {
            let mut keys = Vec::new();
            match t % 240 {
                0..=59 => {
                    keys.push(Key::D);
                    keys.push(Key::Left);
                }
                60..=63 => keys.push(Key::W),
                100..=140 => keys.push(Key::L),
                _ => {}
            }
            if t % 20 == 5 {
                keys.push(Key::F);
            }
            if t % 50 == 25 {
                keys.push(Key::K);
            }
            if t % 90 < 12 {
                keys.push(Key::Up);
            }
            RawInputSnapshot::with_keys(&keys)
        })
        .collect()
}

fn demo_match(config: &MatchConfig, ticks: u64) {
    info!("=== Starting Demo Match ===");

    let profiles = ProfileTable::builtin();
    let initial = MatchState::new(config, &profiles);
    let mut state = initial.clone();

    let mut mapper = InputIntentMapper::new(config.input.clone(), brawl_core::PLAYER_COUNT);
    let mut source = ScriptedInput::new(demo_script(ticks));
    let mut presenter = TracingPresenter::new();
    let mut total_events = 0;

    for _ in 0..ticks {
        let intents: BTreeMap<PlayerId, IntentSet> = mapper.poll(&mut source, state.tick).into_iter().collect();
        let result = tick(&mut state, &intents);
        total_events += result.events.len();
        presenter.present(&state.snapshot(), &result.events);

        if result.match_ended {
            match result.winner {
                Some(winner) => info!("Match ended at tick {}: {} wins", result.tick, winner),
                None => info!("Match ended at tick {} with no winner", result.tick),
            }
            break;
        }
        if result.restarted {
            info!("Match restarted");
            mapper.clear_pending_jumps();
        }
        if result.quit_requested {
            info!("Quit requested at tick {}", result.tick);
            break;
        }
    }

    info!("=== Match Results ===");
    for c in state.characters.values() {
        info!("{} ({}): {:.0}% {}", c.name, c.archetype, c.damage_percent, c.move_state);
    }
    info!("Total events: {}", total_events);

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let mut replay_mapper = InputIntentMapper::new(config.input.clone(), brawl_core::PLAYER_COUNT);
    let mut replay_source = ScriptedInput::new(demo_script(ticks));
    let (replayed, _) = replay_match(initial, &mut replay_mapper, &mut replay_source, ticks);
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        info!("DETERMINISM FAILURE: Hashes differ!");
    }
}
