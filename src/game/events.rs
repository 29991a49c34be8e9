//! Game Events
//!
//! Discrete events emitted during simulation for commentary, audio and
//! logging. Each event carries a stable string tag plus a human-readable
//! message. Events never feed back into physics.

use serde::{Serialize, Deserialize};

use crate::game::state::PlayerId;

/// Event kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Stage began tilting
    TiltStart,
    /// Stage levelled out
    TiltStop,
    /// Knockback of 150 or more
    MassiveKnockback,
    /// Knockback between 100 and 150
    PowerfulKnockback,
    /// Defender entered tumble
    Tumble,
    /// Landing lag halved by an L-cancel
    LCancel,
    /// Character walked or slid off an edge
    LedgeFall,
    /// Shield depleted
    ShieldBreak,
    /// Character left the blast zone
    Ko,
    /// Character reached the damage cap
    Defeated,
}

impl EventKind {
    /// Stable string tag.
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::TiltStart => "tilt_start",
            EventKind::TiltStop => "tilt_stop",
            EventKind::MassiveKnockback => "massive_knockback",
            EventKind::PowerfulKnockback => "powerful_knockback",
            EventKind::Tumble => "tumble",
            EventKind::LCancel => "l_cancel",
            EventKind::LedgeFall => "ledge_fall",
            EventKind::ShieldBreak => "shield_break",
            EventKind::Ko => "ko",
            EventKind::Defeated => "defeated",
        }
    }
}

/// A game event with timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred
    pub tick: u64,

    /// Kind
    pub kind: EventKind,

    /// Player involved, if any
    pub player: Option<PlayerId>,

    /// Human-readable description
    pub message: String,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, kind: EventKind, player: Option<PlayerId>, message: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            player,
            message: message.into(),
        }
    }

    /// String tag of this event.
    #[inline]
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Stage tilt started.
    pub fn tilt_start(tick: u64, continuous: bool) -> Self {
        let message = if continuous {
            "The stage begins to sway!"
        } else {
            "The stage is tilting!"
        };
        Self::new(tick, EventKind::TiltStart, None, message)
    }

    /// Stage tilt stopped.
    pub fn tilt_stop(tick: u64) -> Self {
        Self::new(tick, EventKind::TiltStop, None, "The stage settles back to level")
    }

    /// Knockback strength callout, if the hit was strong enough.
    pub fn knockback(tick: u64, player: PlayerId, knockback: f64) -> Option<Self> {
        use crate::game::combat::{MASSIVE_KNOCKBACK, POWERFUL_KNOCKBACK};

        if knockback >= MASSIVE_KNOCKBACK {
            Some(Self::new(
                tick,
                EventKind::MassiveKnockback,
                Some(player),
                format!("{} takes massive knockback ({:.0})!", player, knockback),
            ))
        } else if knockback >= POWERFUL_KNOCKBACK {
            Some(Self::new(
                tick,
                EventKind::PowerfulKnockback,
                Some(player),
                format!("{} is sent flying ({:.0})", player, knockback),
            ))
        } else {
            None
        }
    }

    /// Defender entered tumble.
    pub fn tumble(tick: u64, player: PlayerId) -> Self {
        Self::new(tick, EventKind::Tumble, Some(player), format!("{} is tumbling", player))
    }

    /// Successful L-cancel.
    pub fn l_cancel(tick: u64, player: PlayerId, lag: u32) -> Self {
        Self::new(
            tick,
            EventKind::LCancel,
            Some(player),
            format!("{} L-cancels ({} frames of lag)", player, lag),
        )
    }

    /// Character lost its footing.
    pub fn ledge_fall(tick: u64, player: PlayerId) -> Self {
        Self::new(tick, EventKind::LedgeFall, Some(player), format!("{} falls off the edge", player))
    }

    /// Shield broke.
    pub fn shield_break(tick: u64, player: PlayerId) -> Self {
        Self::new(tick, EventKind::ShieldBreak, Some(player), format!("{}'s shield shatters!", player))
    }

    /// Character left the blast zone.
    pub fn ko(tick: u64, player: PlayerId) -> Self {
        Self::new(tick, EventKind::Ko, Some(player), format!("{} is KO'd!", player))
    }

    /// Character hit the damage cap.
    pub fn defeated(tick: u64, player: PlayerId) -> Self {
        Self::new(tick, EventKind::Defeated, Some(player), format!("{} is defeated", player))
    }
}
