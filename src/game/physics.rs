//! Character Physics
//!
//! Profile-driven integration, owned by each character. The state machine
//! decides the inputs (acceleration, gravity scale, fast fall); this module
//! only integrates them.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::intent::JumpKind;
use crate::game::profile::PhysicsProfile;

/// Per-tick integration inputs chosen by the state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepInput {
    /// Gravity to add this tick (already ramped during hitstun)
    pub gravity: f32,
    /// Horizontal input is being held
    pub steering: bool,
    /// Fall at fast-fall speed
    pub fast_fall: bool,
    /// Skip the horizontal speed cap (launch momentum)
    pub uncapped: bool,
}

/// Owned physics component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    /// Constant table
    pub profile: PhysicsProfile,
}

impl Physics {
    /// Wrap a profile.
    pub fn new(profile: PhysicsProfile) -> Self {
        Self { profile }
    }

    /// Horizontal acceleration for an input axis in [-1, 1].
    pub fn horizontal_accel(&self, axis: f32, in_air: bool) -> f32 {
        let accel = if in_air {
            self.profile.air_accel
        } else {
            self.profile.ground_accel
        };
        axis * accel
    }

    /// Upward launch speed for a resolved jump.
    pub fn jump_speed(&self, kind: JumpKind) -> f32 {
        match kind {
            JumpKind::ShortHop => self.profile.short_hop_velocity,
            JumpKind::FullJump => self.profile.jump_velocity,
        }
    }

    /// Normal per-tick gravity.
    #[inline]
    pub fn gravity(&self) -> f32 {
        self.profile.gravity
    }

    /// Integrate one tick.
    ///
    /// Velocity is updated from `acceleration`, friction and gravity, then
    /// `position += velocity`.
    pub fn step(&self, position: &mut Vec2, velocity: &mut Vec2, acceleration: Vec2, in_air: bool, input: StepInput) {
        let p = &self.profile;

        velocity.x += acceleration.x;
        if !input.steering {
            velocity.x *= if in_air { p.air_friction } else { p.ground_friction };
            if velocity.x.abs() < 0.01 {
                velocity.x = 0.0;
            }
        }

        if !input.uncapped {
            let max = if in_air { p.max_air_speed } else { p.max_ground_speed };
            velocity.x = velocity.x.clamp(-max, max);
        }

        if in_air {
            velocity.y += input.gravity + acceleration.y;
            let terminal = if input.fast_fall { p.fast_fall_speed } else { p.max_fall_speed };
            if input.fast_fall {
                velocity.y = velocity.y.max(terminal);
            }
            velocity.y = velocity.y.min(terminal);
        }

        *position += *velocity;
    }
}
