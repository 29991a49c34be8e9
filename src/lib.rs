//! # Brawl Core
//!
//! Per-frame simulation for a two-player platform fighter.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BRAWL CORE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Geometry and hashing primitives           │
//! │  ├── vec2.rs     - 2D vector, rotation about a point         │
//! │  ├── rect.rs     - Axis-aligned rectangles                   │
//! │  └── hash.rs     - State hashing for determinism checks      │
//! │                                                              │
//! │  game/           - Simulation                                │
//! │  ├── input.rs    - Keyboard/controller to intents            │
//! │  ├── intent.rs   - Intent edges, jump timing                 │
//! │  ├── character.rs- Movement state machine                    │
//! │  ├── combat.rs   - Knockback, hitstun, shield                │
//! │  ├── collision.rs- Platforms, drop-through, tilt             │
//! │  ├── stage.rs    - Layouts and stage tilt                    │
//! │  ├── state.rs    - Match state and snapshots                 │
//! │  ├── tick.rs     - Fixed 60 Hz step                          │
//! │  └── present.rs  - Snapshot/event consumers                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! - Characters live in a BTreeMap and are processed in player order
//! - Attack overlaps are collected before any hit is applied
//! - No system time or randomness inside the step
//!
//! Given the same config and intent stream, a match produces the same
//! state hash every run on the same build.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rect::Rect;
pub use game::config::MatchConfig;
pub use game::state::{MatchState, PlayerId};
pub use game::tick::{tick, replay_match, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Players per match
pub const PLAYER_COUNT: usize = 2;
