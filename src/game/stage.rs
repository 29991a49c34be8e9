//! Stage Geometry and Tilt
//!
//! Platforms keep their original rectangle forever. While the stage is
//! tilted, each platform's corner set is recomputed from that original
//! rectangle (never from the previous rotation) and the effective edges
//! become the min/max of the rotated corners.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::rect::{Rect, bounds_of};
use crate::core::vec2::Vec2;
use crate::game::config::{TiltConfig, TiltMode};

/// Lateral pseudo-force per unit `sin(angle)` applied to grounded characters.
pub const TILT_SLIDE_FACTOR: f32 = 0.3;

/// Visual (render) rotation relative to the physics angle.
pub const VISUAL_ANGLE_RATIO: f32 = 0.5;

// =============================================================================
// PLATFORMS
// =============================================================================

/// Index of a platform within its stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformId(pub usize);

/// Platform kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Solid main stage; never droppable
    Floor,
    /// One-way platform; can be dropped through and jumped through from below
    Platform,
}

/// A stage platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Platform id
    pub id: PlatformId,
    /// Kind
    pub kind: PlatformKind,
    /// Original, unrotated rectangle
    pub base: Rect,
    /// Current rotation in degrees (0 when untilted)
    pub rotation_angle: f32,
    corners: [Vec2; 4],
    bounds: Rect,
}

impl Platform {
    /// Create an untilted platform.
    pub fn new(id: PlatformId, kind: PlatformKind, base: Rect) -> Self {
        Self {
            id,
            kind,
            base,
            rotation_angle: 0.0,
            corners: base.corners(),
            bounds: base,
        }
    }

    /// True when the platform is currently rotated.
    #[inline]
    pub fn is_rotated(&self) -> bool {
        self.rotation_angle != 0.0
    }

    /// True for one-way platforms.
    #[inline]
    pub fn is_droppable(&self) -> bool {
        self.kind == PlatformKind::Platform
    }

    /// Rotate the original rectangle about `center`.
    pub fn rotate(&mut self, angle_deg: f32, center: Vec2) {
        self.rotation_angle = angle_deg;
        if angle_deg == 0.0 {
            self.corners = self.base.corners();
            self.bounds = self.base;
        } else {
            self.corners = self.base.rotated_corners(center, angle_deg.to_radians());
            self.bounds = bounds_of(&self.corners);
        }
    }

    /// Current corners (rotated when tilted).
    pub fn corners(&self) -> [Vec2; 4] {
        self.corners
    }

    /// Effective collision rectangle.
    pub fn rect(&self) -> Rect {
        if self.is_rotated() {
            self.bounds
        } else {
            self.base
        }
    }

    /// Topmost rotated corner.
    pub fn get_rotated_top(&self) -> f32 {
        self.corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min)
    }

    /// Bottommost rotated corner.
    pub fn get_rotated_bottom(&self) -> f32 {
        self.corners.iter().map(|c| c.y).fold(f32::NEG_INFINITY, f32::max)
    }

    /// Leftmost rotated corner.
    pub fn get_rotated_left(&self) -> f32 {
        self.corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min)
    }

    /// Rightmost rotated corner.
    pub fn get_rotated_right(&self) -> f32 {
        self.corners.iter().map(|c| c.x).fold(f32::NEG_INFINITY, f32::max)
    }

    /// Upper edge of the current collision box.
    #[inline]
    pub fn top(&self) -> f32 {
        self.rect().top()
    }

    /// Lower edge of the current collision box.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.rect().bottom()
    }

    /// Left edge of the current collision box.
    #[inline]
    pub fn left(&self) -> f32 {
        self.rect().left()
    }

    /// Right edge of the current collision box.
    #[inline]
    pub fn right(&self) -> f32 {
        self.rect().right()
    }

    /// Check if `x` lies within the horizontal span.
    #[inline]
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }
}

// =============================================================================
// STAGE
// =============================================================================

/// Named stage layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLayout {
    /// Floor plus three one-way platforms
    Battlefield,
    /// Floor only
    FinalDestination,
}

impl StageLayout {
    /// Parse a layout key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "battlefield" => Some(StageLayout::Battlefield),
            "final_destination" => Some(StageLayout::FinalDestination),
            _ => None,
        }
    }
}

/// Platform set plus the rotation pivot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Platforms, indexed by `PlatformId`
    pub platforms: Vec<Platform>,
    /// Rotation pivot
    pub center: Vec2,
    /// Spawn points in player order (feet positions)
    pub spawns: Vec<Vec2>,
}

impl Stage {
    /// Main floor rectangle shared by the layouts.
    pub const FLOOR: Rect = Rect::new(140.0, 560.0, 1000.0, 40.0);

    /// Build a layout.
    pub fn from_layout(layout: StageLayout) -> Self {
        let mut rects = vec![(PlatformKind::Floor, Self::FLOOR)];
        if layout == StageLayout::Battlefield {
            rects.push((PlatformKind::Platform, Rect::new(300.0, 420.0, 200.0, 16.0)));
            rects.push((PlatformKind::Platform, Rect::new(780.0, 420.0, 200.0, 16.0)));
            rects.push((PlatformKind::Platform, Rect::new(540.0, 290.0, 200.0, 16.0)));
        }

        let floor_top = Self::FLOOR.top();
        Self::new(
            rects,
            Vec2::new(640.0, 500.0),
            vec![Vec2::new(490.0, floor_top), Vec2::new(790.0, floor_top)],
        )
    }

    /// Build a stage from explicit platforms.
    pub fn new(platforms: Vec<(PlatformKind, Rect)>, center: Vec2, spawns: Vec<Vec2>) -> Self {
        let platforms = platforms
            .into_iter()
            .enumerate()
            .map(|(i, (kind, rect))| Platform::new(PlatformId(i), kind, rect))
            .collect();
        Self { platforms, center, spawns }
    }

    /// Look up a platform.
    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(id.0)
    }

    /// Spawn point for a player slot.
    pub fn spawn(&self, slot: usize) -> Vec2 {
        self.spawns
            .get(slot)
            .copied()
            .unwrap_or(Vec2::new(self.center.x, Self::FLOOR.top()))
    }

    /// Top of the floor at the current tilt.
    pub fn floor_top(&self) -> f32 {
        self.platforms
            .iter()
            .find(|p| p.kind == PlatformKind::Floor)
            .map_or(Self::FLOOR.top(), Platform::top)
    }

    /// Rotate every platform to `angle_deg`.
    ///
    /// Returns the top edge of each platform before the update.
    pub fn apply_rotation(&mut self, angle_deg: f32) -> Vec<f32> {
        let center = self.center;
        self.platforms
            .iter_mut()
            .map(|p| {
                let old_top = p.top();
                p.rotate(angle_deg, center);
                old_top
            })
            .collect()
    }

    /// Union of the untilted platform rectangles.
    pub fn base_bounds(&self) -> Rect {
        let points: Vec<Vec2> = self.platforms.iter().flat_map(|p| p.base.corners()).collect();
        bounds_of(&points)
    }
}

// =============================================================================
// TILT
// =============================================================================

/// Stage tilt state. Angles in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageTilt {
    /// Tilt currently running
    pub active: bool,
    /// Oscillating mode (false = one-shot event)
    pub continuous: bool,
    /// Current physics angle
    pub angle: f32,
    /// Oscillation direction (+1 / -1)
    pub direction: f32,
    /// Lower oscillation bound
    pub min_angle: f32,
    /// Upper oscillation bound
    pub max_angle: f32,
    /// Degrees per tick while oscillating
    pub oscillation_speed: f32,
    /// Cap of a one-shot event
    pub event_max_angle: f32,
    /// Degrees per tick while an event ramps
    pub event_ramp_speed: f32,
    /// Length of a one-shot event
    pub event_duration: u64,
    /// Ticks elapsed in the current event
    pub event_elapsed: u64,
}

/// Tilt lifecycle change reported by [`StageTilt::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TiltTransition {
    /// Nothing started or stopped
    None,
    /// A one-shot event ended and the angle reset
    Stopped,
}

impl StageTilt {
    /// Idle tilt built from configuration.
    pub fn new(config: &TiltConfig) -> Self {
        Self {
            active: false,
            continuous: false,
            angle: 0.0,
            direction: 1.0,
            min_angle: config.min_angle,
            max_angle: config.max_angle,
            oscillation_speed: config.oscillation_speed,
            event_max_angle: config.event_max_angle,
            event_ramp_speed: config.event_ramp_speed,
            event_duration: config.event_duration_ticks,
            event_elapsed: 0,
        }
    }

    /// Start oscillating between the bounds.
    pub fn start_continuous(&mut self) {
        self.active = true;
        self.continuous = true;
        self.direction = 1.0;
        info!("Stage tilt started (continuous)");
    }

    /// Start a one-shot ramp event.
    pub fn start_event(&mut self) {
        self.active = true;
        self.continuous = false;
        self.angle = 0.0;
        self.direction = 1.0;
        self.event_elapsed = 0;
        info!("Stage tilt event started");
    }

    /// Stop and level the stage.
    pub fn stop(&mut self) {
        self.active = false;
        self.continuous = false;
        self.angle = 0.0;
        self.event_elapsed = 0;
        info!("Stage tilt stopped");
    }

    /// Advance the angle by one tick.
    pub fn update(&mut self) -> TiltTransition {
        if !self.active {
            return TiltTransition::None;
        }

        if self.continuous {
            self.angle += self.direction * self.oscillation_speed;
            if self.angle >= self.max_angle {
                self.angle = self.max_angle;
                if self.direction > 0.0 {
                    self.direction = -1.0;
                }
            } else if self.angle <= self.min_angle {
                self.angle = self.min_angle;
                if self.direction < 0.0 {
                    self.direction = 1.0;
                }
            }
            return TiltTransition::None;
        }

        self.event_elapsed += 1;
        if self.event_elapsed >= self.event_duration {
            self.stop();
            return TiltTransition::Stopped;
        }
        self.angle = (self.angle + self.event_ramp_speed).min(self.event_max_angle);
        TiltTransition::None
    }

    /// Angle in radians.
    #[inline]
    pub fn angle_rad(&self) -> f32 {
        self.angle.to_radians()
    }

    /// Horizontal acceleration applied to grounded characters.
    pub fn slide_force(&self) -> f32 {
        if self.active {
            TILT_SLIDE_FACTOR * self.angle_rad().sin()
        } else {
            0.0
        }
    }

    /// Render rotation for the current physics angle.
    #[inline]
    pub fn visual_angle(&self) -> f32 {
        self.angle * VISUAL_ANGLE_RATIO
    }

    /// Decide whether a scheduled tilt starts on `tick`.
    pub fn should_start(&self, mode: TiltMode, tick: u64) -> bool {
        if self.active {
            return false;
        }
        match mode {
            TiltMode::Off => false,
            TiltMode::Continuous => true,
            TiltMode::Periodic { interval_ticks } => interval_ticks > 0 && tick % interval_ticks == 0,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn oscillating() -> StageTilt {
        let mut tilt = StageTilt::new(&TiltConfig {
            min_angle: -2.0,
            max_angle: 2.0,
            oscillation_speed: 0.75,
            ..TiltConfig::default()
        });
        tilt.start_continuous();
        tilt
    }

    #[test]
    fn test_rotated_edges_at_zero() {
        let mut p = Platform::new(PlatformId(0), PlatformKind::Platform, Rect::new(0.0, 0.0, 100.0, 20.0));
        p.rotate(0.0, Vec2::new(50.0, 10.0));
        assert!(!p.is_rotated());
        assert!(approx(p.get_rotated_top(), 0.0));
        assert!(approx(p.get_rotated_bottom(), 20.0));
        assert!(approx(p.get_rotated_left(), 0.0));
        assert!(approx(p.get_rotated_right(), 100.0));
    }

    #[test]
    fn test_rotated_edges_at_90() {
        // 100x20 rect centered on the pivot becomes 20x100.
        let mut p = Platform::new(PlatformId(0), PlatformKind::Platform, Rect::new(0.0, 0.0, 100.0, 20.0));
        p.rotate(90.0, Vec2::new(50.0, 10.0));
        assert!(approx(p.get_rotated_left(), 40.0));
        assert!(approx(p.get_rotated_right(), 60.0));
        assert!(approx(p.get_rotated_top(), -40.0));
        assert!(approx(p.get_rotated_bottom(), 60.0));
        assert!(approx(p.top(), -40.0));
    }

    #[test]
    fn test_rotated_edges_at_45() {
        // Square of side 20 centered on the origin: corners land on the axes.
        let mut p = Platform::new(PlatformId(0), PlatformKind::Floor, Rect::new(-10.0, -10.0, 20.0, 20.0));
        p.rotate(45.0, Vec2::ZERO);
        let half_diag = 10.0 * std::f32::consts::SQRT_2;
        assert!(approx(p.get_rotated_top(), -half_diag));
        assert!(approx(p.get_rotated_bottom(), half_diag));
        assert!(approx(p.get_rotated_left(), -half_diag));
        assert!(approx(p.get_rotated_right(), half_diag));
    }

    #[test]
    fn test_rotation_never_accumulates() {
        let mut a = Platform::new(PlatformId(0), PlatformKind::Platform, Rect::new(300.0, 420.0, 200.0, 16.0));
        let mut b = a.clone();
        let center = Vec2::new(640.0, 500.0);
        for step in 1..=100 {
            a.rotate(step as f32 * 0.1, center);
        }
        b.rotate(10.0, center);
        assert!(approx(a.top(), b.top()));
        assert!(approx(a.left(), b.left()));
        assert_eq!(a.base, b.base);
    }

    #[test]
    fn test_layouts() {
        let bf = Stage::from_layout(StageLayout::Battlefield);
        assert_eq!(bf.platforms.len(), 4);
        assert_eq!(bf.platforms[0].kind, PlatformKind::Floor);
        assert!(bf.platforms[1..].iter().all(|p| p.kind == PlatformKind::Platform));

        let fd = Stage::from_layout(StageLayout::FinalDestination);
        assert_eq!(fd.platforms.len(), 1);
        assert_eq!(fd.spawn(0).distance(fd.spawn(1)), 300.0);
    }

    #[test]
    fn test_apply_rotation_reports_old_tops() {
        let mut stage = Stage::from_layout(StageLayout::Battlefield);
        let old = stage.apply_rotation(5.0);
        assert_eq!(old, vec![560.0, 420.0, 420.0, 290.0]);
        assert!(stage.platforms.iter().all(Platform::is_rotated));
        stage.apply_rotation(0.0);
        assert_eq!(stage.platforms[1].top(), 420.0);
    }

    #[test]
    fn test_floor_top_follows_rotation() {
        let mut stage = Stage::from_layout(StageLayout::Battlefield);
        assert_eq!(stage.floor_top(), 560.0);
        stage.apply_rotation(15.0);
        assert_eq!(stage.floor_top(), stage.platforms[0].top());
        assert!(stage.floor_top() < 440.0);
    }

    #[test]
    fn test_bounce_flips_once_per_bound() {
        let mut tilt = oscillating();
        let mut flips = 0;
        let mut last_dir = tilt.direction;
        for _ in 0..200 {
            tilt.update();
            if tilt.direction != last_dir {
                flips += 1;
                // A flip only ever happens sitting on a bound.
                assert!(tilt.angle == tilt.max_angle || tilt.angle == tilt.min_angle);
                last_dir = tilt.direction;
            }
        }
        // 4 degrees of travel at 0.75/tick is ~5.33 ticks per sweep.
        assert!((30..=40).contains(&flips), "flips = {}", flips);
    }

    #[test]
    fn test_bound_reached_then_moves_away() {
        let mut tilt = oscillating();
        tilt.angle = 1.5;
        tilt.update();
        assert_eq!(tilt.angle, 2.0);
        assert_eq!(tilt.direction, -1.0);
        tilt.update();
        assert!(tilt.angle < 2.0);
        assert_eq!(tilt.direction, -1.0);
    }

    #[test]
    fn test_event_ramps_caps_and_resets() {
        let mut tilt = StageTilt::new(&TiltConfig {
            event_max_angle: 3.0,
            event_ramp_speed: 1.0,
            event_duration_ticks: 10,
            ..TiltConfig::default()
        });
        tilt.start_event();
        for _ in 0..9 {
            assert_eq!(tilt.update(), TiltTransition::None);
            assert!(tilt.angle <= 3.0);
        }
        assert_eq!(tilt.angle, 3.0);
        assert_eq!(tilt.update(), TiltTransition::Stopped);
        assert!(!tilt.active);
        assert_eq!(tilt.angle, 0.0);
    }

    #[test]
    fn test_slide_force() {
        let mut tilt = oscillating();
        tilt.angle = 30.0;
        assert!(approx(tilt.slide_force(), 0.15));
        tilt.angle = -30.0;
        assert!(approx(tilt.slide_force(), -0.15));
        tilt.stop();
        assert_eq!(tilt.slide_force(), 0.0);
    }

    #[test]
    fn test_visual_angle_is_half() {
        let mut tilt = oscillating();
        tilt.angle = 12.0;
        assert_eq!(tilt.visual_angle(), 6.0);
    }

    #[test]
    fn test_schedule() {
        let tilt = StageTilt::new(&TiltConfig::default());
        assert!(!tilt.should_start(TiltMode::Off, 10));
        assert!(tilt.should_start(TiltMode::Continuous, 1));
        assert!(tilt.should_start(TiltMode::Periodic { interval_ticks: 600 }, 1200));
        assert!(!tilt.should_start(TiltMode::Periodic { interval_ticks: 600 }, 1201));
    }

    proptest! {
        #[test]
        fn prop_oscillation_stays_in_bounds(
            min in -30.0f32..0.0,
            span in 0.5f32..40.0,
            speed in 0.01f32..5.0,
            ticks in 1usize..2000,
        ) {
            let mut tilt = StageTilt::new(&TiltConfig {
                min_angle: min,
                max_angle: min + span,
                oscillation_speed: speed,
                ..TiltConfig::default()
            });
            tilt.start_continuous();
            for _ in 0..ticks {
                tilt.update();
                prop_assert!(tilt.angle >= tilt.min_angle && tilt.angle <= tilt.max_angle);
            }
        }

        #[test]
        fn prop_rotated_edges_match_corners(
            x in -500.0f32..500.0,
            y in -500.0f32..500.0,
            w in 1.0f32..400.0,
            h in 1.0f32..100.0,
            angle in -180.0f32..180.0,
        ) {
            let center = Vec2::new(640.0, 500.0);
            let rect = Rect::new(x, y, w, h);
            let mut p = Platform::new(PlatformId(0), PlatformKind::Platform, rect);
            p.rotate(angle, center);

            let corners = rect.rotated_corners(center, angle.to_radians());
            let top = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
            let left = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
            let bottom = corners.iter().map(|c| c.y).fold(f32::NEG_INFINITY, f32::max);
            let right = corners.iter().map(|c| c.x).fold(f32::NEG_INFINITY, f32::max);

            prop_assert!((p.get_rotated_top() - top).abs() < 1e-3);
            prop_assert!((p.get_rotated_left() - left).abs() < 1e-3);
            prop_assert!((p.get_rotated_bottom() - bottom).abs() < 1e-3);
            prop_assert!((p.get_rotated_right() - right).abs() < 1e-3);
        }
    }
}
