//! Game Logic Module
//!
//! All simulation code. Deterministic for a given config and intent stream.
//!
//! ## Module Structure
//!
//! - `profile`: Per-archetype physics constants
//! - `config`: Match configuration (JSON + environment)
//! - `intent`: Intent flags, edge detection, jump timing
//! - `input`: Raw device snapshots to per-player intents
//! - `stage`: Platforms, layouts and stage tilt
//! - `combat`: Knockback, hitstun, attack hitboxes, shield
//! - `physics`: Per-character integration
//! - `character`: Movement state machine
//! - `collision`: Platform landing, drop-through, tilt correction
//! - `events`: Game events for presentation and replay checks
//! - `state`: Match state and snapshots
//! - `tick`: Simulation step
//! - `present`: Presentation seam

pub mod profile;
pub mod config;
pub mod intent;
pub mod input;
pub mod stage;
pub mod combat;
pub mod physics;
pub mod character;
pub mod collision;
pub mod events;
pub mod state;
pub mod tick;
pub mod present;

// Re-export key types
pub use config::{ConfigError, MatchConfig, TiltMode};
pub use intent::{Intent, IntentSet};
pub use input::{InputIntentMapper, RawInputSnapshot, RawInputSource};
pub use character::{Character, MoveState};
pub use state::{MatchPhase, MatchSnapshot, MatchState, PlayerId};
pub use tick::TickResult;
pub use events::{EventKind, GameEvent};
pub use present::PresentationSink;
