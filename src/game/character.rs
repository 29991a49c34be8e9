//! Character State Machine
//!
//! One character's kinematic and combat state. All frame counters
//! (animation lock, hitstun, L-cancel window, shield cooldown) are only
//! mutated here, from [`Character::begin_tick`] and the transition methods.
//!
//! Position is the feet point (bottom-center of the body) in screen space,
//! +Y down.
//!
//! Blocked actions (attacking while locked, jumping while airborne,
//! shielding while broken, anything while defeated) are silent no-ops.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::combat::{
    self, AttackKind, AttackTier, KnockbackResult, Shield, DEFEAT_PERCENT,
};
use crate::game::intent::{Intent, IntentSet, JumpKind};
use crate::game::physics::{Physics, StepInput};
use crate::game::profile::PhysicsProfile;
use crate::game::stage::PlatformId;
use crate::game::state::PlayerId;

/// Body width.
pub const CHARACTER_WIDTH: f32 = 50.0;

/// Body height.
pub const CHARACTER_HEIGHT: f32 = 80.0;

/// Landing lag after a normal aerial landing.
pub const LANDING_LAG: u32 = 4;

/// Landing lag when touching down mid-aerial-attack.
pub const AERIAL_LANDING_LAG: u32 = 16;

/// Ticks an airborne shield press keeps the L-cancel window open.
pub const L_CANCEL_WINDOW: u32 = 7;

// =============================================================================
// ENUMS
// =============================================================================

/// Facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Facing -X
    Left,
    /// Facing +X
    Right,
}

impl Direction {
    /// -1 for left, +1 for right.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Move state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveState {
    /// Idle on the ground
    Stand,
    /// Moving on the ground
    Walk,
    /// Weak attack in progress
    WeakAttack,
    /// Heavy attack in progress
    HeavyAttack,
    /// Hitstun or knockback
    Damaged,
    /// Shield held
    Shield,
    /// Landing lag
    Landing,
}

impl MoveState {
    /// Tag used in snapshots.
    pub fn tag(self) -> &'static str {
        match self {
            MoveState::Stand => "stand",
            MoveState::Walk => "walk",
            MoveState::WeakAttack => "weak_attack",
            MoveState::HeavyAttack => "heavy_attack",
            MoveState::Damaged => "damaged",
            MoveState::Shield => "shield",
            MoveState::Landing => "landing",
        }
    }

    /// States that block starting an attack or raising the shield.
    #[inline]
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            MoveState::WeakAttack | MoveState::HeavyAttack | MoveState::Damaged | MoveState::Landing
        )
    }

    #[inline]
    fn is_attack(self) -> bool {
        matches!(self, MoveState::WeakAttack | MoveState::HeavyAttack)
    }
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// SUB-STATES
// =============================================================================

/// An attack in progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveAttack {
    /// Button that started it
    pub kind: AttackKind,
    /// Frames since it started
    pub elapsed: u32,
    /// Hitbox already connected
    pub connected: bool,
}

/// Result of receiving a hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitOutcome {
    /// Defender is defeated and ignores hits
    Ignored,
    /// Shield absorbed the hit
    Blocked {
        /// The shield broke on this hit
        shield_broken: bool,
    },
    /// Defender was damaged and launched
    Launched(KnockbackResult),
}

/// Result of touching down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandingOutcome {
    /// Landing lag applied
    pub lag: u32,
    /// Lag was halved by an L-cancel
    pub l_cancelled: bool,
}

// =============================================================================
// CHARACTER
// =============================================================================

/// A fighter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Player slot
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Archetype key used to pick the profile
    pub archetype: String,
    /// Owned physics component
    pub physics: Physics,

    /// Feet position
    pub position: Vec2,
    /// Velocity (px/tick)
    pub velocity: Vec2,
    /// Acceleration for this tick
    pub acceleration: Vec2,
    /// Feet position at the start of the tick
    pub prev_position: Vec2,

    /// Smash-style damage percent, capped at 999
    pub damage_percent: f32,
    /// Current move state
    pub move_state: MoveState,
    /// Facing
    pub direction: Direction,

    /// Airborne
    pub in_air: bool,
    /// Airborne because of a hit (not a jump)
    pub is_knockback_air: bool,
    /// Remaining hitstun
    pub hitstun_frames: u32,
    /// Hitstun length captured at hit time
    pub initial_hitstun: u32,
    /// Knockback was strong enough to tumble
    pub tumble: bool,

    /// Animation lock active
    pub animation_locked: bool,
    /// Frames elapsed in the current lock
    pub lock_timer: u32,
    /// Length of the current lock
    pub lock_duration: u32,

    /// Shield sub-state
    pub shield: Shield,

    /// Drop intent is held
    pub drop_requested: bool,
    /// Platforms currently being dropped through
    pub dropping_through: BTreeSet<PlatformId>,
    /// Y of the last ground contact
    pub last_ground_y: Option<f32>,
    /// Platform stood on most recently
    pub last_platform: Option<PlatformId>,

    /// Remaining ticks of the L-cancel window
    pub l_cancel_window: u32,
    /// Attack in progress
    pub current_attack: Option<ActiveAttack>,
    /// Fast-falling
    pub fast_falling: bool,
    /// Horizontal input held this tick
    pub steering: bool,

    /// Respawn point
    pub spawn: Vec2,
    /// Respawn facing
    pub spawn_direction: Direction,
}

impl Character {
    /// Create a grounded character at `spawn`.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        archetype: impl Into<String>,
        profile: PhysicsProfile,
        spawn: Vec2,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            archetype: archetype.into(),
            physics: Physics::new(profile),
            position: spawn,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            prev_position: spawn,
            damage_percent: 0.0,
            move_state: MoveState::Stand,
            direction,
            in_air: false,
            is_knockback_air: false,
            hitstun_frames: 0,
            initial_hitstun: 0,
            tumble: false,
            animation_locked: false,
            lock_timer: 0,
            lock_duration: 0,
            shield: Shield::new(),
            drop_requested: false,
            dropping_through: BTreeSet::new(),
            last_ground_y: Some(spawn.y),
            last_platform: None,
            l_cancel_window: 0,
            current_attack: None,
            fast_falling: false,
            steering: false,
            spawn,
            spawn_direction: direction,
        }
    }

    /// Put the character back at its spawn with a clean slate.
    pub fn reset(&mut self) {
        let physics = self.physics.clone();
        *self = Self::new(
            self.id,
            std::mem::take(&mut self.name),
            std::mem::take(&mut self.archetype),
            physics.profile,
            self.spawn,
            self.spawn_direction,
        );
    }

    /// Stand at height `y` as if already there last tick.
    pub fn place_at_height(&mut self, y: f32) {
        self.position.y = y;
        self.prev_position = self.position;
        self.last_ground_y = Some(y);
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Damage cap reached; all intents are ignored.
    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.damage_percent >= DEFEAT_PERCENT
    }

    /// Knockback weight.
    #[inline]
    pub fn weight(&self) -> f32 {
        self.physics.profile.weight
    }

    /// Damage dealt by an attack kind.
    pub fn attack_damage(&self, kind: AttackKind) -> f32 {
        match kind {
            AttackKind::Weak => self.physics.profile.weak_damage,
            AttackKind::Heavy => self.physics.profile.heavy_damage,
        }
    }

    /// Body rectangle.
    #[inline]
    pub fn hurtbox(&self) -> Rect {
        Rect::from_feet(self.position, CHARACTER_WIDTH, CHARACTER_HEIGHT)
    }

    /// Hitbox of the current attack while it is active and unspent.
    pub fn active_hitbox(&self) -> Option<Rect> {
        let attack = self.current_attack?;
        if attack.connected || attack.elapsed >= attack.kind.active_frames() {
            return None;
        }
        Some(combat::attack_hitbox(
            self.position,
            self.direction,
            attack.kind,
            CHARACTER_WIDTH,
            CHARACTER_HEIGHT,
        ))
    }

    /// Check if an attack may start.
    pub fn can_attack(&self) -> bool {
        !self.is_defeated()
            && !self.animation_locked
            && !self.move_state.is_busy()
            && !self.shield.active
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Advance frame counters. Returns true if a held shield broke.
    pub fn begin_tick(&mut self) -> bool {
        self.prev_position = self.position;
        self.acceleration = Vec2::ZERO;
        self.steering = false;

        if let Some(attack) = self.current_attack.as_mut() {
            attack.elapsed += 1;
        }

        self.hitstun_frames = self.hitstun_frames.saturating_sub(1);

        if self.animation_locked {
            self.lock_timer += 1;
            if self.lock_timer >= self.lock_duration {
                self.animation_locked = false;
                self.lock_timer = 0;
                self.lock_duration = 0;
            }
        }

        if !self.animation_locked {
            match self.move_state {
                MoveState::WeakAttack | MoveState::HeavyAttack | MoveState::Landing => {
                    self.current_attack = None;
                    self.set_move(MoveState::Stand);
                }
                MoveState::Damaged if self.hitstun_frames == 0 => {
                    self.set_move(MoveState::Stand);
                }
                _ => {}
            }
        }

        self.l_cancel_window = self.l_cancel_window.saturating_sub(1);

        let shield_broke = self.shield.tick();
        if shield_broke {
            debug!("{} shield drained and broke", self.id);
            if self.move_state == MoveState::Shield {
                self.set_move(MoveState::Stand);
            }
        }
        shield_broke
    }

    /// Apply this tick's intents.
    ///
    /// `slide_force` is the stage tilt's lateral pseudo-force; it only
    /// affects grounded characters.
    pub fn apply_intents(&mut self, intents: &IntentSet, slide_force: f32) {
        if self.is_defeated() {
            return;
        }

        let holding_down = intents.vertical_axis() > 0.0;
        self.drop_requested = holding_down;

        if self.in_air && intents.just_activated(Intent::Shield) {
            self.l_cancel_window = L_CANCEL_WINDOW;
        }

        self.update_shield(intents.is_active(Intent::Shield));

        if let Some(kind) = intents.jump {
            self.try_jump(kind);
        }

        if intents.just_activated(Intent::WeakAttack) {
            self.try_attack(AttackKind::Weak);
        }
        if intents.just_activated(Intent::HeavyAttack) {
            self.try_attack(AttackKind::Heavy);
        }

        self.apply_movement(intents.horizontal_axis());

        self.fast_falling = self.in_air
            && !self.is_knockback_air
            && self.velocity.y > 0.0
            && holding_down;

        if !self.in_air {
            self.acceleration.x += slide_force;
        }

        if self.shield.active {
            self.velocity.x = 0.0;
            self.acceleration.x = 0.0;
        }
    }

    fn update_shield(&mut self, held: bool) {
        if held && !self.move_state.is_busy() && self.shield.can_raise() {
            if self.move_state != MoveState::Shield {
                self.shield.active = true;
                self.set_move(MoveState::Shield);
            }
        } else if self.move_state == MoveState::Shield {
            self.shield.active = false;
            self.set_move(MoveState::Stand);
        }
    }

    fn try_jump(&mut self, kind: JumpKind) {
        if self.in_air || self.animation_locked || self.move_state.is_busy() {
            return;
        }
        if self.move_state == MoveState::Shield {
            self.shield.active = false;
        }
        self.velocity.y = -self.physics.jump_speed(kind);
        self.in_air = true;
        self.last_platform = None;
        self.set_move(MoveState::Stand);
        debug!("{} {:?} from y={:.1}", self.id, kind, self.position.y);
    }

    fn try_attack(&mut self, kind: AttackKind) {
        if !self.can_attack() {
            return;
        }
        self.current_attack = Some(ActiveAttack {
            kind,
            elapsed: 0,
            connected: false,
        });
        self.set_move(match kind {
            AttackKind::Weak => MoveState::WeakAttack,
            AttackKind::Heavy => MoveState::HeavyAttack,
        });
        self.lock(kind.lock_frames());
    }

    fn apply_movement(&mut self, axis: f32) {
        if self.animation_locked || self.move_state == MoveState::Shield || self.move_state.is_busy() {
            return;
        }

        if axis != 0.0 {
            self.steering = true;
            self.acceleration.x = self.physics.horizontal_accel(axis, self.in_air);
            if !self.in_air {
                self.direction = if axis < 0.0 { Direction::Left } else { Direction::Right };
            }
        }

        if !self.in_air {
            self.set_move(if axis != 0.0 { MoveState::Walk } else { MoveState::Stand });
        }
    }

    /// Integrate velocity and position for this tick.
    pub fn step_physics(&mut self) {
        let gravity = if self.hitstun_frames > 0 {
            combat::hitstun_gravity(self.physics.gravity(), self.initial_hitstun, self.hitstun_frames)
        } else {
            self.physics.gravity()
        };

        let input = StepInput {
            gravity,
            steering: self.steering,
            fast_fall: self.fast_falling,
            uncapped: self.is_knockback_air,
        };
        let physics = &self.physics;
        physics.step(&mut self.position, &mut self.velocity, self.acceleration, self.in_air, input);
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Receive a hit from an attacker. `dir` is +1 to launch right.
    pub fn take_hit(&mut self, damage: f32, dir: f32) -> HitOutcome {
        if self.is_defeated() {
            return HitOutcome::Ignored;
        }

        if self.shield.is_blocking() {
            let shield_broken = self.shield.absorb(damage);
            if shield_broken {
                debug!("{} shield broke blocking {:.1} damage", self.id, damage);
                self.set_move(MoveState::Stand);
            }
            return HitOutcome::Blocked { shield_broken };
        }

        self.damage_percent = (self.damage_percent + damage).min(DEFEAT_PERCENT);
        let result = combat::resolve_knockback(
            self.damage_percent,
            damage,
            self.weight(),
            AttackTier::for_damage(damage),
            dir,
        );

        self.velocity = result.velocity;
        self.acceleration = Vec2::ZERO;
        self.in_air = true;
        self.is_knockback_air = true;
        self.dropping_through.clear();
        self.drop_requested = false;
        self.last_platform = None;
        self.fast_falling = false;
        self.hitstun_frames = result.hitstun_frames;
        self.initial_hitstun = result.hitstun_frames;
        self.tumble = result.tumble;
        self.shield.active = false;
        self.current_attack = None;
        self.set_move(MoveState::Damaged);
        self.lock(result.hitstun_frames);

        debug!(
            "{} hit for {:.1} -> {:.1}% (K={:.1}, hitstun={})",
            self.id, damage, self.damage_percent, result.knockback, result.hitstun_frames
        );
        HitOutcome::Launched(result)
    }

    /// Stand on a surface at `top`.
    ///
    /// Returns the landing lag when this ends an airborne phase.
    pub fn land(&mut self, top: f32, platform: PlatformId) -> Option<LandingOutcome> {
        let was_airborne = self.in_air;

        self.position.y = top;
        self.velocity.y = 0.0;
        self.in_air = false;
        self.is_knockback_air = false;
        self.hitstun_frames = 0;
        self.initial_hitstun = 0;
        self.tumble = false;
        self.fast_falling = false;
        self.dropping_through.clear();
        self.last_ground_y = Some(top);
        self.last_platform = Some(platform);

        if !was_airborne {
            return None;
        }

        let aerial = self.move_state.is_attack() && self.current_attack.is_some();
        let base = if aerial { AERIAL_LANDING_LAG } else { LANDING_LAG };
        let l_cancelled = self.l_cancel_window > 0;
        let lag = if l_cancelled { base / 2 } else { base };

        self.l_cancel_window = 0;
        self.current_attack = None;
        self.shield.active = false;
        self.set_move(MoveState::Landing);
        self.lock(lag);

        Some(LandingOutcome { lag, l_cancelled })
    }

    /// Lose ground contact without jumping (edge or tilt).
    pub fn fall(&mut self) {
        self.in_air = true;
        self.last_platform = None;
        if self.move_state == MoveState::Walk {
            self.set_move(MoveState::Stand);
        }
    }

    /// Start dropping through a one-way platform.
    pub fn start_drop(&mut self, platform: PlatformId) {
        self.dropping_through.insert(platform);
        debug!("{} dropping through platform {}", self.id, platform.0);
        self.fall();
    }

    /// Mark the active attack as spent.
    pub fn mark_connected(&mut self) {
        if let Some(attack) = self.current_attack.as_mut() {
            attack.connected = true;
        }
    }

    fn lock(&mut self, duration: u32) {
        self.animation_locked = duration > 0;
        self.lock_timer = 0;
        self.lock_duration = duration;
    }

    fn set_move(&mut self, next: MoveState) {
        if self.move_state != next {
            debug!("{} {} -> {}", self.id, self.move_state, next);
            self.move_state = next;
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Read-only per-tick view of a character for rendering and HUD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    /// Owning player
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Feet position
    pub position: Vec2,
    /// Facing
    pub direction: Direction,
    /// Current move state
    pub move_state: MoveState,
    /// Accumulated damage
    pub damage_percent: f32,
    /// Airborne
    pub in_air: bool,
    /// Shield up this tick
    pub shield_active: bool,
    /// Remaining shield health
    pub shield_health: f32,
    /// Shield broken and recovering
    pub shield_broken: bool,
    /// Damage cap reached
    pub defeated: bool,
}

impl From<&Character> for CharacterSnapshot {
    fn from(c: &Character) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            position: c.position,
            direction: c.direction,
            move_state: c.move_state,
            damage_percent: c.damage_percent,
            in_air: c.in_air,
            shield_active: c.shield.active,
            shield_health: c.shield.health,
            shield_broken: c.shield.broken,
            defeated: c.is_defeated(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::{hitstun_frames, calculate_knockback, SHIELD_DURATION};
    use crate::game::intent::IntentFlags;
    use proptest::prelude::*;

    fn fighter() -> Character {
        Character::new(
            PlayerId(0),
            "P1",
            "generic",
            PhysicsProfile::generic(),
            Vec2::new(400.0, 560.0),
            Direction::Right,
        )
    }

    fn intents(held: &[Intent], prev: &[Intent]) -> IntentSet {
        let mut set = IntentSet::new();
        set.advance(IntentFlags::from_intents(prev), 0.0, 0.0);
        set.advance(IntentFlags::from_intents(held), 0.0, 0.0);
        set
    }

    fn press(intent: Intent) -> IntentSet {
        intents(&[intent], &[])
    }

    fn tick(c: &mut Character, set: &IntentSet) {
        c.begin_tick();
        c.apply_intents(set, 0.0);
    }

    #[test]
    fn test_walk_and_stand() {
        let mut c = fighter();
        tick(&mut c, &intents(&[Intent::MoveLeft], &[]));
        assert_eq!(c.move_state, MoveState::Walk);
        assert_eq!(c.direction, Direction::Left);
        assert!(c.acceleration.x < 0.0);

        tick(&mut c, &IntentSet::new());
        assert_eq!(c.move_state, MoveState::Stand);
    }

    #[test]
    fn test_weak_attack_locks_twenty_frames() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::WeakAttack));
        assert_eq!(c.move_state, MoveState::WeakAttack);
        assert!(c.animation_locked);

        let held = intents(&[Intent::WeakAttack], &[Intent::WeakAttack]);
        for _ in 1..20 {
            tick(&mut c, &held);
            assert_eq!(c.move_state, MoveState::WeakAttack);
        }
        tick(&mut c, &held);
        assert_eq!(c.move_state, MoveState::Stand);
        assert!(!c.animation_locked);
    }

    #[test]
    fn test_attack_while_locked_is_noop() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::WeakAttack));
        let before = c.clone();
        c.apply_intents(&press(Intent::HeavyAttack), 0.0);
        assert_eq!(c.move_state, MoveState::WeakAttack);
        assert_eq!(c.current_attack, before.current_attack);
        assert_eq!(c.lock_duration, 20);
    }

    #[test]
    fn test_hitbox_active_frames() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::HeavyAttack));
        let idle = intents(&[], &[]);
        let mut active = 0;
        for _ in 0..35 {
            if c.active_hitbox().is_some() {
                active += 1;
            }
            tick(&mut c, &idle);
        }
        assert_eq!(active, AttackKind::Heavy.active_frames());
    }

    #[test]
    fn test_hitbox_connects_once() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::WeakAttack));
        assert!(c.active_hitbox().is_some());
        c.mark_connected();
        assert!(c.active_hitbox().is_none());
    }

    #[test]
    fn test_shield_zeroes_horizontal_and_releases_to_stand() {
        let mut c = fighter();
        c.velocity.x = 4.0;
        tick(&mut c, &intents(&[Intent::Shield, Intent::MoveRight], &[]));
        assert_eq!(c.move_state, MoveState::Shield);
        assert!(c.shield.active);
        assert_eq!(c.velocity.x, 0.0);
        assert_eq!(c.acceleration.x, 0.0);

        tick(&mut c, &intents(&[], &[Intent::Shield]));
        assert_eq!(c.move_state, MoveState::Stand);
        assert!(!c.shield.active);
    }

    #[test]
    fn test_cannot_attack_while_shielding() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::Shield));
        tick(&mut c, &intents(&[Intent::Shield, Intent::WeakAttack], &[Intent::Shield]));
        assert_eq!(c.move_state, MoveState::Shield);
        assert!(c.current_attack.is_none());
    }

    #[test]
    fn test_broken_shield_cannot_be_raised() {
        let mut c = fighter();
        c.shield.shatter();
        tick(&mut c, &press(Intent::Shield));
        assert_ne!(c.move_state, MoveState::Shield);
        assert!(!c.shield.active);
    }

    #[test]
    fn test_shield_blocks_damage() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::Shield));
        let outcome = c.take_hit(10.0, 1.0);
        assert_eq!(outcome, HitOutcome::Blocked { shield_broken: false });
        assert_eq!(c.damage_percent, 0.0);
        assert!(!c.in_air);
        assert!(c.shield.health < SHIELD_DURATION - 19.0);
    }

    #[test]
    fn test_shield_break_on_hit_returns_to_stand() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::Shield));
        c.shield.health = 5.0;
        assert_eq!(c.take_hit(5.0, 1.0), HitOutcome::Blocked { shield_broken: true });
        assert_eq!(c.move_state, MoveState::Stand);
        assert!(c.shield.broken);
        assert!(!c.shield.active);
    }

    #[test]
    fn test_take_hit_launches() {
        let mut c = fighter();
        c.dropping_through.insert(PlatformId(2));
        let outcome = c.take_hit(5.0, -1.0);
        let HitOutcome::Launched(result) = outcome else {
            panic!("expected launch, got {:?}", outcome);
        };
        let k = calculate_knockback(5.0, 5.0, 100.0, 80.0, 20.0);
        assert!((result.knockback - k).abs() < 1e-9);
        assert_eq!(c.damage_percent, 5.0);
        assert!(c.in_air);
        assert!(c.is_knockback_air);
        assert!(c.dropping_through.is_empty());
        assert_eq!(c.move_state, MoveState::Damaged);
        assert_eq!(c.hitstun_frames, hitstun_frames(k));
        assert_eq!(c.lock_duration, c.hitstun_frames);
        assert!(c.velocity.x < 0.0 && c.velocity.y < 0.0);
    }

    #[test]
    fn test_damaged_exits_when_hitstun_ends() {
        let mut c = fighter();
        c.take_hit(5.0, 1.0);
        let stun = c.hitstun_frames;
        let idle = IntentSet::new();
        for _ in 1..stun {
            tick(&mut c, &idle);
            assert_eq!(c.move_state, MoveState::Damaged);
        }
        tick(&mut c, &idle);
        assert_eq!(c.hitstun_frames, 0);
        assert_eq!(c.move_state, MoveState::Stand);
    }

    #[test]
    fn test_damage_caps_and_defeat_freezes() {
        let mut c = fighter();
        c.damage_percent = 995.0;
        c.take_hit(12.0, 1.0);
        assert_eq!(c.damage_percent, DEFEAT_PERCENT);
        assert!(c.is_defeated());

        let before = c.clone();
        c.apply_intents(&press(Intent::WeakAttack), 0.0);
        assert_eq!(c, before);
        assert_eq!(c.take_hit(5.0, 1.0), HitOutcome::Ignored);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut c = fighter();
        let mut set = IntentSet::new();
        set.jump = Some(JumpKind::FullJump);
        tick(&mut c, &set);
        assert!(c.in_air);
        assert_eq!(c.velocity.y, -14.0);

        c.velocity.y = -2.0;
        tick(&mut c, &set);
        assert_eq!(c.velocity.y, -2.0);
    }

    #[test]
    fn test_short_hop_velocity() {
        let mut c = fighter();
        let mut set = IntentSet::new();
        set.jump = Some(JumpKind::ShortHop);
        tick(&mut c, &set);
        assert_eq!(c.velocity.y, -8.5);
    }

    #[test]
    fn test_jump_out_of_shield() {
        let mut c = fighter();
        tick(&mut c, &press(Intent::Shield));
        let mut set = intents(&[Intent::Shield], &[Intent::Shield]);
        set.jump = Some(JumpKind::FullJump);
        c.begin_tick();
        c.apply_intents(&set, 0.0);
        assert!(c.in_air);
        assert!(!c.shield.active);
        assert_ne!(c.move_state, MoveState::Shield);
    }

    fn aerial_landing_lag(l_cancel: bool) -> LandingOutcome {
        let mut c = fighter();
        c.in_air = true;
        c.position.y = 300.0;
        tick(&mut c, &press(Intent::WeakAttack));
        assert!(c.current_attack.is_some());
        if l_cancel {
            c.apply_intents(&press(Intent::Shield), 0.0);
        }
        tick(&mut c, &IntentSet::new());
        c.land(560.0, PlatformId(0)).unwrap()
    }

    #[test]
    fn test_l_cancel_halves_landing_lag() {
        let plain = aerial_landing_lag(false);
        let cancelled = aerial_landing_lag(true);
        assert_eq!(plain.lag, AERIAL_LANDING_LAG);
        assert!(!plain.l_cancelled);
        assert!(cancelled.l_cancelled);
        assert_eq!(cancelled.lag * 2, plain.lag);
    }

    #[test]
    fn test_l_cancel_window_expires() {
        let mut c = fighter();
        c.in_air = true;
        tick(&mut c, &press(Intent::Shield));
        let idle = IntentSet::new();
        for _ in 0..L_CANCEL_WINDOW {
            tick(&mut c, &idle);
        }
        let outcome = c.land(560.0, PlatformId(0)).unwrap();
        assert!(!outcome.l_cancelled);
        assert_eq!(outcome.lag, LANDING_LAG);
    }

    #[test]
    fn test_landing_clears_air_state() {
        let mut c = fighter();
        c.take_hit(12.0, 1.0);
        c.dropping_through.insert(PlatformId(1));
        let outcome = c.land(420.0, PlatformId(1)).unwrap();
        assert_eq!(outcome.lag, LANDING_LAG);
        assert!(!c.in_air);
        assert!(!c.is_knockback_air);
        assert_eq!(c.hitstun_frames, 0);
        assert!(c.dropping_through.is_empty());
        assert_eq!(c.move_state, MoveState::Landing);
        assert_eq!(c.last_ground_y, Some(420.0));
    }

    #[test]
    fn test_grounded_land_has_no_lag() {
        let mut c = fighter();
        assert_eq!(c.land(560.0, PlatformId(0)), None);
        assert_eq!(c.move_state, MoveState::Stand);
    }

    #[test]
    fn test_slide_force_only_grounded() {
        let mut c = fighter();
        c.begin_tick();
        c.apply_intents(&IntentSet::new(), 0.2);
        assert_eq!(c.acceleration.x, 0.2);

        c.in_air = true;
        c.begin_tick();
        c.apply_intents(&IntentSet::new(), 0.2);
        assert_eq!(c.acceleration.x, 0.0);
    }

    #[test]
    fn test_hitstun_gravity_is_zero_at_launch() {
        let mut c = fighter();
        c.take_hit(5.0, 1.0);
        let vy = c.velocity.y;
        c.step_physics();
        assert_eq!(c.velocity.y, vy);
    }

    #[test]
    fn test_reset_restores_spawn() {
        let mut c = fighter();
        c.take_hit(12.0, 1.0);
        c.step_physics();
        c.reset();
        assert_eq!(c, fighter());
    }

    proptest! {
        #[test]
        fn prop_damage_is_sum_of_hits(hits in proptest::collection::vec(0.5f32..20.0, 1..30)) {
            let mut c = fighter();
            let mut expected = 0.0f32;
            let mut last = 0.0f32;
            for (i, damage) in hits.iter().enumerate() {
                let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
                c.take_hit(*damage, dir);
                expected += damage;
                prop_assert!(c.damage_percent >= last);
                prop_assert!((c.damage_percent - expected).abs() < 1e-2);
                last = c.damage_percent;
            }
        }

        #[test]
        fn prop_shield_never_in_busy_state(
            script in proptest::collection::vec(0u16..(1 << 7), 1..120),
        ) {
            let mut c = fighter();
            let mut set = IntentSet::new();
            for bits in script {
                let held: Vec<Intent> = Intent::ALL[..7]
                    .iter()
                    .copied()
                    .filter(|i| bits & i.bit() != 0)
                    .collect();
                set.advance(IntentFlags::from_intents(&held), 0.0, 0.0);
                c.begin_tick();
                c.apply_intents(&set, 0.0);
                prop_assert!(!(c.shield.active && c.move_state.is_busy()));
            }
        }
    }
}
