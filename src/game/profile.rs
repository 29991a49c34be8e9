//! Physics Profiles
//!
//! Per-archetype constant tables. Values are per tick at 60 Hz in pixels.
//! Lookup is a pure function over data; unknown archetypes degrade to the
//! generic profile rather than failing.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::config::ConfigError;

/// Key of the profile used when an archetype is missing.
pub const GENERIC_ARCHETYPE: &str = "generic";

/// Constant table for one character archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsProfile {
    /// Horizontal acceleration while grounded
    pub ground_accel: f32,
    /// Horizontal acceleration while airborne
    pub air_accel: f32,
    /// Max horizontal speed while grounded
    pub max_ground_speed: f32,
    /// Max horizontal speed while airborne (drift)
    pub max_air_speed: f32,
    /// Gravity added to vertical velocity each airborne tick
    pub gravity: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,
    /// Fall speed while fast-falling
    pub fast_fall_speed: f32,
    /// Upward speed of a full jump
    pub jump_velocity: f32,
    /// Upward speed of a short hop
    pub short_hop_velocity: f32,
    /// Velocity multiplier applied on the ground with no horizontal input
    pub ground_friction: f32,
    /// Velocity multiplier applied in the air with no horizontal input
    pub air_friction: f32,
    /// Knockback weight (100 = average)
    pub weight: f32,
    /// Damage dealt by a weak attack
    pub weak_damage: f32,
    /// Damage dealt by a heavy attack
    pub heavy_damage: f32,
}

impl PhysicsProfile {
    /// Generic all-rounder.
    pub fn generic() -> Self {
        Self {
            ground_accel: 0.8,
            air_accel: 0.4,
            max_ground_speed: 6.0,
            max_air_speed: 4.5,
            gravity: 0.6,
            max_fall_speed: 10.0,
            fast_fall_speed: 14.0,
            jump_velocity: 14.0,
            short_hop_velocity: 8.5,
            ground_friction: 0.8,
            air_friction: 0.98,
            weight: 100.0,
            weak_damage: 5.0,
            heavy_damage: 12.0,
        }
    }

    /// Slow, heavy archetype that is hard to launch.
    pub fn heavyweight() -> Self {
        Self {
            ground_accel: 0.6,
            air_accel: 0.3,
            max_ground_speed: 4.8,
            max_air_speed: 3.8,
            gravity: 0.7,
            max_fall_speed: 11.0,
            fast_fall_speed: 15.0,
            jump_velocity: 15.0,
            short_hop_velocity: 8.0,
            ground_friction: 0.75,
            air_friction: 0.98,
            weight: 130.0,
            weak_damage: 7.0,
            heavy_damage: 16.0,
        }
    }

    /// Fast, light archetype that flies far.
    pub fn featherweight() -> Self {
        Self {
            ground_accel: 1.0,
            air_accel: 0.5,
            max_ground_speed: 7.5,
            max_air_speed: 5.2,
            gravity: 0.5,
            max_fall_speed: 9.0,
            fast_fall_speed: 12.5,
            jump_velocity: 13.5,
            short_hop_velocity: 9.0,
            ground_friction: 0.85,
            air_friction: 0.985,
            weight: 75.0,
            weak_damage: 4.0,
            heavy_damage: 10.0,
        }
    }
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self::generic()
    }
}

/// Archetype-keyed profile table with a generic fallback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileTable {
    profiles: BTreeMap<String, PhysicsProfile>,
    #[serde(skip, default = "PhysicsProfile::generic")]
    fallback: PhysicsProfile,
}

impl ProfileTable {
    /// Table with the built-in archetypes.
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(GENERIC_ARCHETYPE.to_string(), PhysicsProfile::generic());
        profiles.insert("heavyweight".to_string(), PhysicsProfile::heavyweight());
        profiles.insert("featherweight".to_string(), PhysicsProfile::featherweight());
        Self {
            profiles,
            fallback: PhysicsProfile::generic(),
        }
    }

    /// Parse a table from a JSON object of `archetype -> profile`.
    ///
    /// Built-in archetypes not present in the document are kept. A
    /// `generic` entry in the document replaces the fallback too.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let parsed: BTreeMap<String, PhysicsProfile> = serde_json::from_str(json)?;
        let mut table = Self::builtin();
        for (key, profile) in parsed {
            if profile.weight <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}' has non-positive weight {}",
                    key, profile.weight
                )));
            }
            if key == GENERIC_ARCHETYPE {
                table.fallback = profile.clone();
            }
            table.profiles.insert(key, profile);
        }
        Ok(table)
    }

    /// Look up an archetype, substituting the generic profile when absent.
    pub fn get(&self, archetype: &str) -> &PhysicsProfile {
        match self.profiles.get(archetype) {
            Some(profile) => profile,
            None => {
                debug!("No physics profile for archetype '{}', using generic", archetype);
                &self.fallback
            }
        }
    }

    /// Check whether an archetype has its own entry.
    pub fn contains(&self, archetype: &str) -> bool {
        self.profiles.contains_key(archetype)
    }

    /// Archetype keys in sorted order.
    pub fn archetypes(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}
