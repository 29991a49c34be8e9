//! Core primitives.
//!
//! Math and hashing types shared by every simulation module. Nothing in
//! here knows about characters, stages or input devices.

pub mod vec2;
pub mod rect;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rect::{Rect, bounds_of};
pub use hash::{Hashable, StateHash, StateHasher, compute_state_hash};
