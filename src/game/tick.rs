//! Simulation Tick
//!
//! One fixed 60 Hz step. The pipeline order is fixed:
//!
//! 1. System intents (restart, menu, quit)
//! 2. Stage tilt and rotated geometry, tilt repositioning
//! 3. Ground-beneath check for grounded characters
//! 4. Frame counters and intents, per character in player order
//! 5. Attack overlap: all hits collected first, then applied
//! 6. Physics, collision and blast zone, per character in player order
//! 7. End condition
//!
//! Given the same starting state and intents the result is identical.

use std::collections::BTreeMap;
use tracing::info;

use crate::game::character::HitOutcome;
use crate::game::collision;
use crate::game::config::TiltMode;
use crate::game::events::GameEvent;
use crate::game::input::{InputIntentMapper, RawInputSource};
use crate::game::intent::{Intent, IntentSet};
use crate::game::stage::TiltTransition;
use crate::game::state::{MatchPhase, MatchState, PlayerId};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick that was simulated
    pub tick: u64,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match is over
    pub match_ended: bool,
    /// Winner (if the match ended with one)
    pub winner: Option<PlayerId>,
    /// A Restart intent reset the match
    pub restarted: bool,
    /// A player asked for the menu
    pub menu_requested: bool,
    /// A player asked to quit
    pub quit_requested: bool,
}

/// A hit found during the overlap pass.
#[derive(Debug)]
struct PendingHit {
    attacker: PlayerId,
    defender: PlayerId,
    damage: f32,
    dir: f32,
}

/// Run one simulation tick.
///
/// Players missing from `intents` act as if no input were held.
pub fn tick(state: &mut MatchState, intents: &BTreeMap<PlayerId, IntentSet>) -> TickResult {
    let mut result = TickResult::default();

    // System intents are honored for every player, defeated or not.
    result.menu_requested = intents.values().any(|i| i.just_activated(Intent::Menu));
    result.quit_requested = intents.values().any(|i| i.just_activated(Intent::Quit));
    if intents.values().any(|i| i.just_activated(Intent::Restart)) {
        state.reset();
        result.restarted = true;
        result.tick = state.tick;
        return result;
    }

    if state.phase == MatchPhase::Ended {
        result.tick = state.tick;
        result.match_ended = true;
        result.winner = state.winner;
        return result;
    }

    state.tick += 1;
    result.tick = state.tick;

    let levelled = update_tilt(state, &mut result);
    check_ground(state, levelled, &mut result);
    apply_intents(state, intents, &mut result);
    process_hits(state, &mut result);
    update_physics(state, &mut result);
    check_end_conditions(state, &mut result);

    result
}

/// Advance the tilt, rotate the platforms, carry standing characters.
///
/// Returns true on the tick a tilt event levels the stage.
fn update_tilt(state: &mut MatchState, result: &mut TickResult) -> bool {
    let tick = state.tick;

    if state.tilt.should_start(state.tilt_mode, tick) {
        match state.tilt_mode {
            TiltMode::Continuous => state.tilt.start_continuous(),
            TiltMode::Periodic { .. } => state.tilt.start_event(),
            TiltMode::Off => {}
        }
        result.events.push(GameEvent::tilt_start(tick, state.tilt.continuous));
    }

    let stopped = state.tilt.update() == TiltTransition::Stopped;
    if stopped {
        result.events.push(GameEvent::tilt_stop(tick));
    }

    if !state.tilt.active && !stopped {
        return false;
    }

    let old_tops = state.stage.apply_rotation(state.tilt.angle);
    for character in state.characters.values_mut() {
        collision::reposition_for_tilt(character, &state.stage, &old_tops);
    }
    stopped
}

/// Put grounded characters with nothing under them in the air.
///
/// When the stage was just levelled the surface dropped out from under
/// them; they fall without a ledge-fall event.
fn check_ground(state: &mut MatchState, levelled: bool, result: &mut TickResult) {
    for (id, character) in state.characters.iter_mut() {
        if collision::check_ground_beneath(character, &state.stage) && !levelled {
            result.events.push(GameEvent::ledge_fall(state.tick, *id));
        }
    }
}

/// Frame counters, then intents, in player order.
fn apply_intents(state: &mut MatchState, intents: &BTreeMap<PlayerId, IntentSet>, result: &mut TickResult) {
    let idle = IntentSet::new();
    let slide = state.tilt.slide_force();

    for (id, character) in state.characters.iter_mut() {
        if character.begin_tick() {
            result.events.push(GameEvent::shield_break(state.tick, *id));
        }
        character.apply_intents(intents.get(id).unwrap_or(&idle), slide);
    }
}

/// Collect every attack overlap against pre-hit state, then apply them.
fn process_hits(state: &mut MatchState, result: &mut TickResult) {
    let mut hits = Vec::new();

    for (attacker_id, attacker) in &state.characters {
        let (Some(hitbox), Some(attack)) = (attacker.active_hitbox(), attacker.current_attack) else {
            continue;
        };

        for (defender_id, defender) in &state.characters {
            if defender_id == attacker_id || defender.is_defeated() {
                continue;
            }
            if hitbox.overlaps(&defender.hurtbox()) {
                let dir = if attacker.position.x < defender.position.x { 1.0 } else { -1.0 };
                hits.push(PendingHit {
                    attacker: *attacker_id,
                    defender: *defender_id,
                    damage: attacker.attack_damage(attack.kind),
                    dir,
                });
            }
        }
    }

    let tick = state.tick;
    for hit in hits {
        if let Some(attacker) = state.characters.get_mut(&hit.attacker) {
            attacker.mark_connected();
        }
        let Some(defender) = state.characters.get_mut(&hit.defender) else {
            continue;
        };

        match defender.take_hit(hit.damage, hit.dir) {
            HitOutcome::Launched(knockback) => {
                result.events.extend(GameEvent::knockback(tick, hit.defender, knockback.knockback));
                if knockback.tumble {
                    result.events.push(GameEvent::tumble(tick, hit.defender));
                }
                if defender.is_defeated() {
                    info!("{} defeated by {}", hit.defender, hit.attacker);
                    result.events.push(GameEvent::defeated(tick, hit.defender));
                }
            }
            HitOutcome::Blocked { shield_broken: true } => {
                result.events.push(GameEvent::shield_break(tick, hit.defender));
            }
            HitOutcome::Blocked { shield_broken: false } | HitOutcome::Ignored => {}
        }
    }
}

/// Integrate, resolve collision, check the blast zone.
fn update_physics(state: &mut MatchState, result: &mut TickResult) {
    let tick = state.tick;
    let blast_zone = state.blast_zone;

    for (id, character) in state.characters.iter_mut() {
        character.step_physics();

        let report = collision::resolve(character, &state.stage);
        if let Some(landing) = report.landing {
            if landing.l_cancelled {
                result.events.push(GameEvent::l_cancel(tick, *id, landing.lag));
            }
        }
        if report.lost_footing {
            result.events.push(GameEvent::ledge_fall(tick, *id));
        }

        if !blast_zone.contains(character.position) {
            info!("{} KO'd at ({:.0}, {:.0})", id, character.position.x, character.position.y);
            character.reset();
            character.place_at_height(state.stage.floor_top());
            result.events.push(GameEvent::ko(tick, *id));
        }
    }
}

/// End the match once a character reaches the damage cap.
fn check_end_conditions(state: &mut MatchState, result: &mut TickResult) {
    let any_defeated = state.characters.values().any(|c| c.is_defeated());
    if !any_defeated {
        return;
    }

    let standing: Vec<PlayerId> = state
        .characters
        .iter()
        .filter(|(_, c)| !c.is_defeated())
        .map(|(id, _)| *id)
        .collect();
    let winner = match standing.as_slice() {
        [only] => Some(*only),
        _ => None,
    };

    state.phase = MatchPhase::Ended;
    state.winner = winner;
    result.match_ended = true;
    result.winner = winner;

    match winner {
        Some(id) => info!("Match ended at tick {}: {} wins", state.tick, id),
        None => info!("Match ended at tick {}: no winner", state.tick),
    }
}

/// Drive a match from a raw input source.
///
/// Stops early when the match ends or a player quits. Returns the final
/// state and every event emitted.
pub fn replay_match(
    initial_state: MatchState,
    mapper: &mut InputIntentMapper,
    source: &mut dyn RawInputSource,
    tick_count: u64,
) -> (MatchState, Vec<GameEvent>) {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for _ in 0..tick_count {
        let intents: BTreeMap<PlayerId, IntentSet> = mapper.poll(source, state.tick).into_iter().collect();
        let result = tick(&mut state, &intents);
        all_events.extend(result.events);

        if result.restarted {
            mapper.clear_pending_jumps();
        }

        if result.match_ended || result.quit_requested {
            break;
        }
    }

    (state, all_events)
}
