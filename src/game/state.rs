//! Match State
//!
//! Everything one match owns: characters, stage geometry and tilt.
//! Characters live in a BTreeMap so every per-player pass runs in the same
//! fixed order (player 1, then player 2).

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::character::{Character, CharacterSnapshot, Direction};
use crate::game::config::{MatchConfig, TiltMode};
use crate::game::profile::ProfileTable;
use crate::game::stage::{PlatformId, PlatformKind, Stage, StageTilt};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Player slot, zero-based.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Slot index.
    #[inline]
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 as u16 + 1)
    }
}

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Active gameplay
    #[default]
    Playing,
    /// A character reached the damage cap
    Ended,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Current tick
    pub tick: u64,

    /// Current match phase
    pub phase: MatchPhase,

    /// All characters (BTreeMap for deterministic iteration)
    pub characters: BTreeMap<PlayerId, Character>,

    /// Stage geometry
    pub stage: Stage,

    /// Stage tilt
    pub tilt: StageTilt,

    /// When the tilt runs
    pub tilt_mode: TiltMode,

    /// Characters outside this rect are KO'd
    pub blast_zone: Rect,

    /// Winner once the match has ended
    pub winner: Option<PlayerId>,
}

impl MatchState {
    /// Create a match from configuration.
    ///
    /// Archetypes missing from `profiles` fall back to the generic profile.
    pub fn new(config: &MatchConfig, profiles: &ProfileTable) -> Self {
        let stage = Stage::from_layout(config.layout);

        let characters = config
            .archetypes
            .iter()
            .enumerate()
            .map(|(slot, archetype)| {
                let id = PlayerId(slot as u8);
                let direction = if slot % 2 == 0 { Direction::Right } else { Direction::Left };
                let character = Character::new(
                    id,
                    id.to_string(),
                    archetype.as_str(),
                    profiles.get(archetype).clone(),
                    stage.spawn(slot),
                    direction,
                );
                (id, character)
            })
            .collect();

        let blast_zone = stage.base_bounds().expand(config.blast_margin);

        info!(
            "Match created: layout={:?}, archetypes={:?}, tilt={:?}",
            config.layout, config.archetypes, config.tilt.mode
        );

        Self {
            tick: 0,
            phase: MatchPhase::Playing,
            characters,
            stage,
            tilt: StageTilt::new(&config.tilt),
            tilt_mode: config.tilt.mode,
            blast_zone,
            winner: None,
        }
    }

    /// Reset to the starting layout. Characters are reset, not recreated.
    pub fn reset(&mut self) {
        self.tick = 0;
        self.phase = MatchPhase::Playing;
        self.winner = None;
        for character in self.characters.values_mut() {
            character.reset();
        }
        if self.tilt.active {
            self.tilt.stop();
        }
        self.stage.apply_rotation(0.0);
        info!("Match reset");
    }

    /// Get a character by ID.
    pub fn character(&self, id: PlayerId) -> Option<&Character> {
        self.characters.get(&id)
    }

    /// Get a character mutably by ID.
    pub fn character_mut(&mut self, id: PlayerId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    /// Read-only view for rendering and audio.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            tick: self.tick,
            phase: self.phase,
            winner: self.winner,
            characters: self.characters.values().map(CharacterSnapshot::from).collect(),
            platforms: self
                .stage
                .platforms
                .iter()
                .map(|p| PlatformSnapshot {
                    id: p.id,
                    kind: p.kind,
                    corners: p.corners(),
                })
                .collect(),
            tilt_angle: self.tilt.angle,
            visual_angle: self.tilt.visual_angle(),
        }
    }

    /// Compute state hash for determinism checks.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            hasher.add(&(self.phase as u8));

            for character in self.characters.values() {
                hash_character(hasher, character);
            }

            hasher
                .add(&self.tilt.active)
                .add(&self.tilt.angle)
                .add(&self.tilt.direction)
                .add(&self.tilt.event_elapsed);
            for platform in &self.stage.platforms {
                hasher.add(&platform.corners()[..]);
            }
        })
    }
}

fn hash_character(hasher: &mut StateHasher, c: &Character) {
    hasher
        .add(&c.id.0)
        .add(&c.position)
        .add(&c.velocity)
        .add(&c.damage_percent)
        .add(&(c.move_state as u8))
        .add(&(c.direction as u8))
        .add(&c.in_air)
        .add(&c.is_knockback_air)
        .add(&c.hitstun_frames)
        .add(&c.lock_timer)
        .add(&c.lock_duration)
        .add(&c.shield.active)
        .add(&c.shield.health)
        .add(&c.shield.cooldown);
    let dropping: Vec<u32> = c.dropping_through.iter().map(|PlatformId(id)| *id as u32).collect();
    hasher.add(&dropping[..]);
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Platform geometry for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    /// Platform index
    pub id: PlatformId,
    /// Floor or one-way platform
    pub kind: PlatformKind,
    /// Corners (rotated when tilted)
    pub corners: [Vec2; 4],
}

/// Immutable per-tick view of the match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Tick number
    pub tick: u64,
    /// Match phase
    pub phase: MatchPhase,
    /// Winner once ended
    pub winner: Option<PlayerId>,
    /// Per-player views, in player order
    pub characters: Vec<CharacterSnapshot>,
    /// Platform views, in stage order
    pub platforms: Vec<PlatformSnapshot>,
    /// Physics tilt angle in degrees
    pub tilt_angle: f32,
    /// Render rotation in degrees
    pub visual_angle: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stage::StageLayout;

    fn new_match() -> MatchState {
        MatchState::new(&MatchConfig::default(), &ProfileTable::builtin())
    }

    #[test]
    fn test_new_match_layout() {
        let state = new_match();
        assert_eq!(state.characters.len(), 2);
        let p1 = state.character(PlayerId(0)).unwrap();
        let p2 = state.character(PlayerId(1)).unwrap();
        assert_eq!(p1.direction, Direction::Right);
        assert_eq!(p2.direction, Direction::Left);
        assert_eq!(p1.position.distance(p2.position), 300.0);
        assert!(!p1.in_air && !p2.in_air);
        assert_eq!(p1.name, "P1");
    }

    #[test]
    fn test_unknown_archetype_uses_generic() {
        let config = MatchConfig {
            archetypes: vec!["heavyweight".to_string(), "mystery".to_string()],
            ..MatchConfig::default()
        };
        let state = MatchState::new(&config, &ProfileTable::builtin());
        assert_eq!(state.character(PlayerId(0)).unwrap().weight(), 130.0);
        assert_eq!(state.character(PlayerId(1)).unwrap().weight(), 100.0);
    }

    #[test]
    fn test_blast_zone() {
        let state = new_match();
        assert!(state.blast_zone.contains(state.stage.spawn(0)));
        assert!(!state.blast_zone.contains(Vec2::new(-400.0, 500.0)));
        assert!(!state.blast_zone.contains(Vec2::new(640.0, 1100.0)));
    }

    #[test]
    fn test_reset_restores_characters() {
        let mut state = new_match();
        let before = state.compute_hash();
        state.tick = 50;
        if let Some(c) = state.character_mut(PlayerId(1)) {
            c.take_hit(12.0, -1.0);
            c.step_physics();
        }
        state.tilt.start_continuous();
        state.stage.apply_rotation(4.0);
        assert_ne!(state.compute_hash(), before);

        state.reset();
        assert_eq!(state.compute_hash(), before);
    }

    #[test]
    fn test_snapshot_contents() {
        let mut state = new_match();
        state.tilt.angle = 8.0;
        let snap = state.snapshot();
        assert_eq!(snap.characters.len(), 2);
        assert_eq!(snap.platforms.len(), 4);
        assert_eq!(snap.visual_angle, 4.0);
        assert!(serde_json::to_string(&snap).is_ok());
    }

    #[test]
    fn test_final_destination_has_no_platforms() {
        let config = MatchConfig {
            layout: StageLayout::FinalDestination,
            ..MatchConfig::default()
        };
        let state = MatchState::new(&config, &ProfileTable::builtin());
        assert_eq!(state.snapshot().platforms.len(), 1);
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(0).to_string(), "P1");
        assert_eq!(PlayerId(1).to_string(), "P2");
    }
}
