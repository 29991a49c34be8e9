//! Combat Resolution
//!
//! Knockback, hitstun, shield and hitbox rules. Everything here is a pure
//! function or a small value type; the character state machine decides
//! when to call it.
//!
//! ## Knockback
//!
//! ```text
//! K = (((p/10) + (p*d/20)) * 1.4 * (200/(w+100)) + 18) * (KBG/100) + BKB
//! ```
//!
//! `p` is the defender's percent after the hit, `d` the hit's damage,
//! `w` the defender's weight. Launch speed is `0.03 * K` at 45 degrees,
//! hitstun is `floor(0.4 * K)`, tumble when `K >= 80`.

use serde::{Serialize, Deserialize};

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::character::Direction;

/// Launch speed per unit of knockback.
pub const KNOCKBACK_SPEED_SCALE: f64 = 0.03;

/// Launch angle for every attack (degrees).
pub const LAUNCH_ANGLE_DEG: f64 = 45.0;

/// Weakest allowed upward launch speed (px/tick).
pub const MIN_LAUNCH_UP_SPEED: f32 = 2.5;

/// Hitstun frames per unit of knockback.
pub const HITSTUN_MULTIPLIER: f64 = 0.4;

/// Knockback at or above this tumbles.
pub const TUMBLE_THRESHOLD: f64 = 80.0;

/// Knockback at or above this is reported as powerful.
pub const POWERFUL_KNOCKBACK: f64 = 100.0;

/// Knockback at or above this is reported as massive.
pub const MASSIVE_KNOCKBACK: f64 = 150.0;

/// Damage percent at which a character is defeated.
pub const DEFEAT_PERCENT: f32 = 999.0;

/// Maximum shield health (ticks of continuous holding).
pub const SHIELD_DURATION: f32 = 180.0;

/// Shield health lost per point of blocked damage.
pub const SHIELD_DAMAGE_MULTIPLIER: f32 = 2.0;

/// Shield health regained per idle tick.
pub const SHIELD_REGEN_PER_TICK: f32 = 0.5;

/// Shield health drained per held tick.
pub const SHIELD_DECAY_PER_TICK: f32 = 1.0;

/// Ticks after a break before the shield can be raised again.
pub const SHIELD_BREAK_COOLDOWN: u32 = 120;

// =============================================================================
// ATTACKS
// =============================================================================

/// Knockback tier, chosen from the damage an attack deals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackTier {
    /// Light hits
    Weak,
    /// Mid-range hits
    Medium,
    /// Heavy hits
    Strong,
}

impl AttackTier {
    /// Tier for a damage value.
    pub fn for_damage(damage: f32) -> Self {
        if damage <= 6.0 {
            AttackTier::Weak
        } else if damage <= 10.0 {
            AttackTier::Medium
        } else {
            AttackTier::Strong
        }
    }

    /// Base knockback.
    pub fn base_knockback(self) -> f64 {
        match self {
            AttackTier::Weak => 20.0,
            AttackTier::Medium => 28.0,
            AttackTier::Strong => 35.0,
        }
    }

    /// Knockback growth.
    pub fn knockback_growth(self) -> f64 {
        match self {
            AttackTier::Weak => 80.0,
            AttackTier::Medium => 90.0,
            AttackTier::Strong => 100.0,
        }
    }
}

/// Attack button that started an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    /// Weak attack button
    Weak,
    /// Heavy attack button
    Heavy,
}

impl AttackKind {
    /// Recovery window (animation lock) in frames.
    pub fn lock_frames(self) -> u32 {
        match self {
            AttackKind::Weak => 20,
            AttackKind::Heavy => 35,
        }
    }

    /// Frames at the start of the attack during which the hitbox is out.
    pub fn active_frames(self) -> u32 {
        match self {
            AttackKind::Weak => 6,
            AttackKind::Heavy => 10,
        }
    }

    /// Horizontal reach in front of the body.
    pub fn reach(self) -> f32 {
        match self {
            AttackKind::Weak => 40.0,
            AttackKind::Heavy => 55.0,
        }
    }
}

/// Hitbox projected in front of a body whose feet are at `feet`.
pub fn attack_hitbox(feet: Vec2, facing: Direction, kind: AttackKind, body_w: f32, body_h: f32) -> Rect {
    let reach = kind.reach();
    let y = feet.y - body_h * 0.8;
    let h = body_h * 0.6;
    match facing {
        Direction::Right => Rect::new(feet.x + body_w * 0.5, y, reach, h),
        Direction::Left => Rect::new(feet.x - body_w * 0.5 - reach, y, reach, h),
    }
}

// =============================================================================
// KNOCKBACK
// =============================================================================

/// Canonical knockback formula.
pub fn calculate_knockback(percent: f64, damage: f64, weight: f64, kbg: f64, bkb: f64) -> f64 {
    let scaled = (percent / 10.0) + (percent * damage / 20.0);
    let weighted = scaled * 1.4 * (200.0 / (weight + 100.0)) + 18.0;
    weighted * (kbg / 100.0) + bkb
}

/// Hitstun frames for a knockback value.
#[inline]
pub fn hitstun_frames(knockback: f64) -> u32 {
    (HITSTUN_MULTIPLIER * knockback).floor().max(0.0) as u32
}

/// Tumble check.
#[inline]
pub fn is_tumble(knockback: f64) -> bool {
    knockback >= TUMBLE_THRESHOLD
}

/// Launch velocity for a knockback value. `dir` is +1 to launch right.
pub fn launch_velocity(knockback: f64, dir: f32) -> Vec2 {
    let speed = KNOCKBACK_SPEED_SCALE * knockback;
    let angle = LAUNCH_ANGLE_DEG.to_radians();
    let vx = (speed * angle.cos()) as f32 * dir;
    let vy = -(speed * angle.sin()) as f32;
    // Never weaker than the minimum upward launch, so the defender leaves the ground.
    Vec2::new(vx, vy.min(-MIN_LAUNCH_UP_SPEED))
}

/// Full outcome of a launching hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnockbackResult {
    /// Scalar knockback K
    pub knockback: f64,
    /// Launch velocity
    pub velocity: Vec2,
    /// Hitstun frames
    pub hitstun_frames: u32,
    /// Tumble flag
    pub tumble: bool,
}

/// Resolve a hit against a defender.
///
/// `percent_after` already includes this hit's damage.
pub fn resolve_knockback(percent_after: f32, damage: f32, weight: f32, tier: AttackTier, dir: f32) -> KnockbackResult {
    let knockback = calculate_knockback(
        percent_after as f64,
        damage as f64,
        weight as f64,
        tier.knockback_growth(),
        tier.base_knockback(),
    );
    KnockbackResult {
        knockback,
        velocity: launch_velocity(knockback, dir),
        hitstun_frames: hitstun_frames(knockback),
        tumble: is_tumble(knockback),
    }
}

/// Gravity for one tick of hitstun.
///
/// Zero for the first half of the window, then ramps linearly to full
/// gravity. The half is taken from the hitstun length captured at hit
/// time, not the remaining count.
pub fn hitstun_gravity(gravity: f32, initial_hitstun: u32, remaining: u32) -> f32 {
    if initial_hitstun == 0 {
        return gravity;
    }
    let total = initial_hitstun as f32;
    let elapsed = initial_hitstun.saturating_sub(remaining) as f32;
    let half = total * 0.5;
    if elapsed < half {
        return 0.0;
    }
    let progress = ((elapsed - half) / (total - half)).clamp(0.0, 1.0);
    gravity * progress
}

// =============================================================================
// SHIELD
// =============================================================================

/// Shield sub-state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    /// Shield is up
    pub active: bool,
    /// Remaining health in 0..=SHIELD_DURATION
    pub health: f32,
    /// Shield was broken and is cooling down
    pub broken: bool,
    /// Ticks until a broken shield can be raised again
    pub cooldown: u32,
}

impl Default for Shield {
    fn default() -> Self {
        Self {
            active: false,
            health: SHIELD_DURATION,
            broken: false,
            cooldown: 0,
        }
    }
}

impl Shield {
    /// Full, lowered shield.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the shield may be raised.
    #[inline]
    pub fn can_raise(&self) -> bool {
        !self.broken && self.cooldown == 0 && self.health > 0.0
    }

    /// True when the shield is up and intact.
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.active && !self.broken
    }

    /// Block a hit. Returns true if the shield broke.
    pub fn absorb(&mut self, damage: f32) -> bool {
        self.health -= SHIELD_DAMAGE_MULTIPLIER * damage;
        if self.health <= 0.0 {
            self.shatter();
            return true;
        }
        false
    }

    /// Break the shield and start the cooldown.
    pub fn shatter(&mut self) {
        self.health = 0.0;
        self.broken = true;
        self.active = false;
        self.cooldown = SHIELD_BREAK_COOLDOWN;
    }

    /// Advance one tick. Returns true if holding drained the shield to a break.
    pub fn tick(&mut self) -> bool {
        if self.broken {
            self.cooldown = self.cooldown.saturating_sub(1);
            if self.cooldown == 0 {
                self.broken = false;
            }
            return false;
        }

        if self.active {
            self.health -= SHIELD_DECAY_PER_TICK;
            if self.health <= 0.0 {
                self.shatter();
                return true;
            }
        } else {
            self.health = (self.health + SHIELD_REGEN_PER_TICK).min(SHIELD_DURATION);
        }
        false
    }
}

// =============================================================================
// TESTS
// =============================================================================
