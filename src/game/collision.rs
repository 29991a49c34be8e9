//! Platform Collision
//!
//! Character-vs-platform resolution against the stage's (possibly rotated)
//! geometry, with one-way drop-through semantics.
//!
//! Overlapping platforms are collected first, filtered, then the highest
//! survivor is resolved. Geometry is never mutated here.

#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::game::character::{Character, LandingOutcome, CHARACTER_HEIGHT};
use crate::game::stage::{Platform, PlatformId, Stage};

/// Feet must be within this distance of a top edge to start a drop.
pub const DROP_TOLERANCE: f32 = 6.0;

/// A dropped platform re-arms once the feet are this far below its bottom.
pub const DROP_CLEAR_MARGIN: f32 = 4.0;

/// Vertical tolerance of the grounded support check.
pub const SUPPORT_TOLERANCE: f32 = 8.0;

/// Tilt moves standing characters only when a top rises more than this.
pub const TILT_REPOSITION_THRESHOLD: f32 = 2.0;

/// Feet within this distance of a pre-tilt top count as standing on it.
pub const TILT_STANDING_TOLERANCE: f32 = 3.0;

/// What happened to a character during resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Platform a drop-through started on
    pub dropped: Option<PlatformId>,
    /// Platform landed or stood on
    pub landed_on: Option<PlatformId>,
    /// Landing lag, when the landing ended an airborne phase
    pub landing: Option<LandingOutcome>,
    /// Hit a platform from below while rising
    pub bonked: bool,
    /// Grounded character found no support
    pub lost_footing: bool,
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve one character against the stage after integration.
pub fn resolve(character: &mut Character, stage: &Stage) -> CollisionReport {
    let mut report = CollisionReport::default();

    report.dropped = try_start_drop(character, stage);
    reconcile_drop_through(character, stage);

    let candidates = landing_candidates(character, stage);

    #[cfg(feature = "debug-tracing")]
    trace!(
        "{} feet=({:.1},{:.1}) vy={:.2} candidates={:?}",
        character.id,
        character.position.x,
        character.position.y,
        character.velocity.y,
        candidates.iter().map(|p| p.id.0).collect::<Vec<_>>()
    );

    if let Some(platform) = candidates.iter().find(|p| lands_on(character, p)) {
        let top = platform.top();
        report.landing = character.land(top, platform.id);
        report.landed_on = Some(platform.id);
        return report;
    }

    if character.velocity.y < 0.0 && candidates.iter().any(|p| hit_from_below(character, p)) {
        character.velocity.y = 0.0;
        report.bonked = true;
    }

    if !character.in_air {
        match find_support(character, stage) {
            Some(platform) => {
                character.land(platform.top(), platform.id);
                report.landed_on = Some(platform.id);
            }
            None => {
                character.fall();
                report.lost_footing = true;
            }
        }
    }

    report
}

/// Start a drop-through if the character is grounded on a one-way platform
/// with the drop intent held.
fn try_start_drop(character: &mut Character, stage: &Stage) -> Option<PlatformId> {
    if !character.drop_requested || character.in_air || character.is_knockback_air {
        return None;
    }

    let feet = character.prev_position;
    let platform = stage.platforms.iter().find(|p| {
        p.is_droppable() && p.spans_x(feet.x) && (feet.y - p.top()).abs() <= DROP_TOLERANCE
    })?;

    character.start_drop(platform.id);
    Some(platform.id)
}

/// Forget dropped platforms once the feet are clear of them.
fn reconcile_drop_through(character: &mut Character, stage: &Stage) {
    let feet_y = character.position.y;
    character.dropping_through.retain(|id| match stage.platform(*id) {
        Some(p) => feet_y <= p.bottom() + DROP_CLEAR_MARGIN,
        None => false,
    });
}

/// Overlapping platforms that still collide, highest first.
pub fn landing_candidates<'a>(character: &Character, stage: &'a Stage) -> Vec<&'a Platform> {
    let body = character.hurtbox();
    let mut candidates: Vec<&Platform> = stage
        .platforms
        .iter()
        .filter(|p| p.rect().overlaps(&body))
        .filter(|p| !is_suppressed(character, p))
        .collect();
    candidates.sort_by(|a, b| a.top().total_cmp(&b.top()).then(a.id.cmp(&b.id)));
    candidates
}

/// Landing test for one overlapping platform.
///
/// Feet must have started at or above the top while not rising. The floor
/// is solid: feet that started inside its box are pushed back onto the top.
fn lands_on(character: &Character, platform: &Platform) -> bool {
    if character.velocity.y < 0.0 {
        return false;
    }
    let prev_feet = character.prev_position.y;
    prev_feet <= platform.top() || (!platform.is_droppable() && prev_feet <= platform.bottom())
}

/// Head started at or below the platform's underside.
fn hit_from_below(character: &Character, platform: &Platform) -> bool {
    character.prev_position.y - CHARACTER_HEIGHT >= platform.bottom()
}

/// One-way and drop-through filtering. Knockback disables all of it.
fn is_suppressed(character: &Character, platform: &Platform) -> bool {
    if character.is_knockback_air {
        return false;
    }
    if character.dropping_through.contains(&platform.id) {
        return true;
    }
    platform.is_droppable()
        && character.velocity.y < 0.0
        && character.prev_position.y > platform.top()
}

/// Closest platform top under a grounded character's feet.
pub fn find_support<'a>(character: &Character, stage: &'a Stage) -> Option<&'a Platform> {
    let body = character.hurtbox();
    let feet_y = character.position.y;
    stage
        .platforms
        .iter()
        .filter(|p| !character.dropping_through.contains(&p.id))
        .filter(|p| body.left() < p.right() && body.right() > p.left())
        .filter(|p| (feet_y - p.top()).abs() <= SUPPORT_TOLERANCE)
        .min_by(|a, b| {
            (feet_y - a.top())
                .abs()
                .total_cmp(&(feet_y - b.top()).abs())
                .then(a.id.cmp(&b.id))
        })
}

/// Ground-beneath consistency check for grounded characters.
///
/// Returns true if the character had to be put in the air.
pub fn check_ground_beneath(character: &mut Character, stage: &Stage) -> bool {
    if character.in_air {
        return false;
    }
    if find_support(character, stage).is_some() {
        return false;
    }
    character.fall();
    true
}

// =============================================================================
// TILT CORRECTION
// =============================================================================

/// Carry a standing character up with a platform whose top just rose.
///
/// `old_tops` holds each platform's top before the rotation update.
/// Returns true if the character was moved.
pub fn reposition_for_tilt(character: &mut Character, stage: &Stage, old_tops: &[f32]) -> bool {
    if character.in_air || character.is_knockback_air || !character.dropping_through.is_empty() {
        return false;
    }

    let feet = character.position;
    for (platform, old_top) in stage.platforms.iter().zip(old_tops) {
        let rise = old_top - platform.top();
        if rise <= TILT_REPOSITION_THRESHOLD {
            continue;
        }
        if platform.spans_x(feet.x) && (feet.y - old_top).abs() <= TILT_STANDING_TOLERANCE {
            character.position.y -= rise;
            character.last_ground_y = Some(character.position.y);
            return true;
        }
    }
    false
}
