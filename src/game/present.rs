//! Presentation Seam
//!
//! Rendering and audio consume a read-only snapshot plus the tick's events.
//! Nothing here feeds back into the simulation.

use tracing::{debug, info};

use crate::game::events::GameEvent;
use crate::game::state::MatchSnapshot;

/// Consumer of per-tick output.
pub trait PresentationSink {
    /// Called once after every tick.
    fn present(&mut self, snapshot: &MatchSnapshot, events: &[GameEvent]);
}

/// Writes events to the tracing log.
#[derive(Debug, Default)]
pub struct TracingPresenter {
    frames: u64,
}

impl TracingPresenter {
    /// Create a presenter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames presented.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl PresentationSink for TracingPresenter {
    fn present(&mut self, snapshot: &MatchSnapshot, events: &[GameEvent]) {
        self.frames += 1;
        for event in events {
            info!(tick = event.tick, tag = event.tag(), "{}", event.message);
        }
        if snapshot.tick % 60 == 0 {
            for c in &snapshot.characters {
                debug!(
                    tick = snapshot.tick,
                    "{} {} at ({:.1}, {:.1}) {:.0}%",
                    c.name, c.move_state, c.position.x, c.position.y, c.damage_percent
                );
            }
        }
    }
}
