//! Intent Sets
//!
//! Device-independent per-player intents. Every device (keyboard,
//! controller, scripted replay) is reduced to the same [`IntentSet`], and
//! edges are computed by diffing against the previous tick's flags, never
//! by polling raw device edges.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::config::InputConfig;

// =============================================================================
// INTENTS
// =============================================================================

/// A single boolean intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Intent {
    /// Walk or drift left
    MoveLeft = 0,
    /// Walk or drift right
    MoveRight = 1,
    /// Jump
    MoveUp = 2,
    /// Fast fall / drop through
    MoveDown = 3,
    /// Weak attack
    WeakAttack = 4,
    /// Heavy attack
    HeavyAttack = 5,
    /// Shield
    Shield = 6,
    /// Open the menu
    Menu = 7,
    /// Restart the match
    Restart = 8,
    /// Quit
    Quit = 9,
}

impl Intent {
    /// Number of intents.
    pub const COUNT: usize = 10;

    /// Every intent in declaration order.
    pub const ALL: [Intent; Intent::COUNT] = [
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::MoveUp,
        Intent::MoveDown,
        Intent::WeakAttack,
        Intent::HeavyAttack,
        Intent::Shield,
        Intent::Menu,
        Intent::Restart,
        Intent::Quit,
    ];

    /// Bit mask for this intent.
    #[inline]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Packed set of active intents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentFlags(u16);

impl IntentFlags {
    /// No intents active.
    pub const NONE: Self = Self(0);

    /// Build from a list of active intents.
    pub fn from_intents(intents: &[Intent]) -> Self {
        let mut flags = Self::NONE;
        for intent in intents {
            flags.set(*intent, true);
        }
        flags
    }

    /// Check an intent.
    #[inline]
    pub fn contains(self, intent: Intent) -> bool {
        self.0 & intent.bit() != 0
    }

    /// Set or clear an intent.
    #[inline]
    pub fn set(&mut self, intent: Intent, active: bool) {
        if active {
            self.0 |= intent.bit();
        } else {
            self.0 &= !intent.bit();
        }
    }

    /// True when nothing is held.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// How a jump press resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    /// Quick press and release
    ShortHop,
    /// Press held past the short-hop window
    FullJump,
}

// =============================================================================
// INTENT SET
// =============================================================================

/// Per-player intents for the current tick, with the previous tick's copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentSet {
    current: IntentFlags,
    previous: IntentFlags,
    /// Horizontal analog value in [-1, 1], negative is left
    pub horizontal: f32,
    /// Vertical analog value in [-1, 1], negative is up
    pub vertical: f32,
    /// Jump resolved on this tick, if any
    pub jump: Option<JumpKind>,
}

impl IntentSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll the current flags into `previous` and install `next`.
    pub fn advance(&mut self, next: IntentFlags, horizontal: f32, vertical: f32) {
        self.previous = self.current;
        self.current = next;
        self.horizontal = sanitize_axis(horizontal);
        self.vertical = sanitize_axis(vertical);
        self.jump = None;
    }

    /// Current flags.
    #[inline]
    pub fn flags(&self) -> IntentFlags {
        self.current
    }

    /// Intent held this tick.
    #[inline]
    pub fn is_active(&self, intent: Intent) -> bool {
        self.current.contains(intent)
    }

    /// Intent rose this tick.
    #[inline]
    pub fn just_activated(&self, intent: Intent) -> bool {
        self.current.contains(intent) && !self.previous.contains(intent)
    }

    /// Intent fell this tick.
    #[inline]
    pub fn just_deactivated(&self, intent: Intent) -> bool {
        !self.current.contains(intent) && self.previous.contains(intent)
    }

    /// Horizontal movement in [-1, 1].
    ///
    /// Uses the analog value when set, otherwise the digital left/right pair.
    pub fn horizontal_axis(&self) -> f32 {
        if self.horizontal != 0.0 {
            return self.horizontal;
        }
        match (self.is_active(Intent::MoveLeft), self.is_active(Intent::MoveRight)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Vertical movement in [-1, 1], positive is down.
    pub fn vertical_axis(&self) -> f32 {
        if self.vertical != 0.0 {
            return self.vertical;
        }
        match (self.is_active(Intent::MoveUp), self.is_active(Intent::MoveDown)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

fn sanitize_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

// =============================================================================
// SHORT HOP TIMER
// =============================================================================

/// Resolves jump presses into short hops or full jumps.
///
/// The jump fires when the press is released: released within the
/// short-hop window gives a short hop, released later gives a full jump.
/// A press held past the stale limit is dropped and never fires.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpTimer {
    pressed_at: Option<u64>,
}

impl JumpTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick the press was registered, if one is pending.
    pub fn pending_since(&self) -> Option<u64> {
        self.pressed_at
    }

    /// Feed this tick's jump edges.
    pub fn update(&mut self, rose: bool, fell: bool, tick: u64, config: &InputConfig) -> Option<JumpKind> {
        if rose {
            self.pressed_at = Some(tick);
            return None;
        }

        let pressed_at = self.pressed_at?;
        let held = tick.saturating_sub(pressed_at);

        if fell {
            self.pressed_at = None;
            if held <= config.short_hop_max_ticks {
                return Some(JumpKind::ShortHop);
            }
            if held <= config.stale_press_ticks {
                return Some(JumpKind::FullJump);
            }
            return None;
        }

        if held > config.stale_press_ticks {
            debug!("Discarding stale jump press from tick {}", pressed_at);
            self.pressed_at = None;
        }
        None
    }

    /// Forget any pending press.
    pub fn reset(&mut self) {
        self.pressed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press_release(hold: u64) -> Option<JumpKind> {
        let config = InputConfig::default();
        let mut timer = JumpTimer::new();
        let start = 100;
        assert_eq!(timer.update(true, false, start, &config), None);
        let mut result = None;
        for t in (start + 1)..(start + hold) {
            result = result.or(timer.update(false, false, t, &config));
        }
        result.or(timer.update(false, true, start + hold, &config))
    }

    #[test]
    fn test_flags_set_and_clear() {
        let mut flags = IntentFlags::NONE;
        assert!(flags.is_empty());
        flags.set(Intent::Shield, true);
        flags.set(Intent::MoveLeft, true);
        assert!(flags.contains(Intent::Shield));
        assert!(flags.contains(Intent::MoveLeft));
        assert!(!flags.contains(Intent::MoveRight));
        flags.set(Intent::Shield, false);
        assert!(!flags.contains(Intent::Shield));
    }

    #[test]
    fn test_all_bits_distinct() {
        let mut seen = 0u16;
        for intent in Intent::ALL {
            assert_eq!(seen & intent.bit(), 0);
            seen |= intent.bit();
        }
    }

    #[test]
    fn test_edges_from_snapshot_diff() {
        let mut set = IntentSet::new();
        set.advance(IntentFlags::from_intents(&[Intent::WeakAttack]), 0.0, 0.0);
        assert!(set.just_activated(Intent::WeakAttack));
        assert!(!set.just_deactivated(Intent::WeakAttack));

        set.advance(IntentFlags::from_intents(&[Intent::WeakAttack]), 0.0, 0.0);
        assert!(set.is_active(Intent::WeakAttack));
        assert!(!set.just_activated(Intent::WeakAttack));

        set.advance(IntentFlags::NONE, 0.0, 0.0);
        assert!(set.just_deactivated(Intent::WeakAttack));
    }

    #[test]
    fn test_horizontal_axis_digital_fallback() {
        let mut set = IntentSet::new();
        set.advance(IntentFlags::from_intents(&[Intent::MoveLeft]), 0.0, 0.0);
        assert_eq!(set.horizontal_axis(), -1.0);

        set.advance(IntentFlags::from_intents(&[Intent::MoveLeft, Intent::MoveRight]), 0.0, 0.0);
        assert_eq!(set.horizontal_axis(), 0.0);

        set.advance(IntentFlags::from_intents(&[Intent::MoveRight]), 0.4, 0.0);
        assert_eq!(set.horizontal_axis(), 0.4);
    }

    #[test]
    fn test_vertical_axis_digital_fallback() {
        let mut set = IntentSet::new();
        set.advance(IntentFlags::from_intents(&[Intent::MoveDown]), 0.0, 0.0);
        assert_eq!(set.vertical_axis(), 1.0);

        set.advance(IntentFlags::from_intents(&[Intent::MoveUp, Intent::MoveDown]), 0.0, 0.0);
        assert_eq!(set.vertical_axis(), 0.0);

        set.advance(IntentFlags::from_intents(&[Intent::MoveDown]), 0.0, 0.3);
        assert_eq!(set.vertical_axis(), 0.3);
    }

    #[test]
    fn test_axis_sanitized() {
        let mut set = IntentSet::new();
        set.advance(IntentFlags::NONE, 3.0, f32::NAN);
        assert_eq!(set.horizontal, 1.0);
        assert_eq!(set.vertical, 0.0);
    }

    #[test]
    fn test_short_hop_boundary() {
        assert_eq!(press_release(1), Some(JumpKind::ShortHop));
        assert_eq!(press_release(7), Some(JumpKind::ShortHop));
        assert_eq!(press_release(8), Some(JumpKind::FullJump));
        assert_eq!(press_release(10), Some(JumpKind::FullJump));
        assert_eq!(press_release(20), Some(JumpKind::FullJump));
    }

    #[test]
    fn test_stale_press_never_fires() {
        assert_eq!(press_release(21), None);
        assert_eq!(press_release(60), None);
    }

    #[test]
    fn test_held_press_does_not_auto_fire() {
        let config = InputConfig::default();
        let mut timer = JumpTimer::new();
        timer.update(true, false, 0, &config);
        for t in 1..40 {
            assert_eq!(timer.update(false, false, t, &config), None);
        }
        assert_eq!(timer.pending_since(), None);
    }

    #[test]
    fn test_release_without_press_ignored() {
        let config = InputConfig::default();
        let mut timer = JumpTimer::new();
        assert_eq!(timer.update(false, true, 5, &config), None);
    }
}
