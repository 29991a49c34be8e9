//! Input Capture and Normalization
//!
//! Turns raw keyboard and controller state into per-player [`IntentSet`]s.
//!
//! ## Rules
//!
//! - One [`RawInputSnapshot`] is taken per tick; keyboard and every
//!   controller are read together.
//! - Player `n` uses controller `n` when it is connected and responding,
//!   otherwise that player's keyboard bindings.
//! - Out-of-range button/axis/hat indices read as released / centered.
//!   Device faults never reach the simulation; they degrade to no intent.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::config::InputConfig;
use crate::game::intent::{Intent, IntentFlags, IntentSet, JumpTimer};
use crate::game::state::PlayerId;

// =============================================================================
// RAW DEVICE STATE
// =============================================================================

/// Keyboard keys the mapper understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Player one left
    A,
    /// Player one right
    D,
    /// Player one jump
    W,
    /// Player one down
    S,
    /// Player one weak attack
    F,
    /// Player one heavy attack
    G,
    /// Player one shield
    H,
    /// Player two weak attack
    J,
    /// Player two heavy attack
    K,
    /// Player two shield
    L,
    /// Player two left
    Left,
    /// Player two right
    Right,
    /// Player two jump
    Up,
    /// Player two down
    Down,
    /// Menu
    Escape,
    /// Restart
    R,
    /// Quit
    Q,
}

/// One controller's state at snapshot time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    /// Device name as reported by the driver
    pub name: String,
    /// Button states
    pub buttons: Vec<bool>,
    /// Axis values, nominally in [-1, 1]; +Y is down
    pub axes: Vec<f32>,
    /// Hat directions; +Y is up
    pub hats: Vec<(i8, i8)>,
    /// False when the device stopped reporting data
    pub responding: bool,
}

impl ControllerSnapshot {
    /// Button state; missing buttons read as released.
    pub fn button(&self, index: usize) -> bool {
        match self.buttons.get(index) {
            Some(pressed) => *pressed,
            None => {
                debug!("Controller '{}' has no button {}", self.name, index);
                false
            }
        }
    }

    /// Axis value clamped to [-1, 1]; missing or non-finite axes read as 0.
    pub fn axis(&self, index: usize) -> f32 {
        match self.axes.get(index) {
            Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
            _ => 0.0,
        }
    }

    /// Hat direction with components clamped to [-1, 1]; missing hats read as centered.
    pub fn hat(&self, index: usize) -> (i8, i8) {
        self.hats
            .get(index)
            .map(|(x, y)| ((*x).clamp(-1, 1), (*y).clamp(-1, 1)))
            .unwrap_or((0, 0))
    }

    fn any_button(&self, indices: &[usize]) -> bool {
        indices.iter().any(|i| self.button(*i))
    }
}

/// Everything read from the devices for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInputSnapshot {
    /// Keys currently held
    pub keys: BTreeSet<Key>,
    /// Controller slots in connection order; `None` = disconnected slot
    pub controllers: Vec<Option<ControllerSnapshot>>,
}

impl RawInputSnapshot {
    /// Snapshot with only keys held.
    pub fn with_keys(keys: &[Key]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            controllers: Vec::new(),
        }
    }

    /// Controller in `slot` if it is connected and responding.
    pub fn live_controller(&self, slot: usize) -> Option<&ControllerSnapshot> {
        self.controllers
            .get(slot)
            .and_then(Option::as_ref)
            .filter(|c| c.responding)
    }
}

/// Source of raw device state.
///
/// `snapshot` must read the keyboard and every controller together so a
/// tick never mixes reads taken at different times.
pub trait RawInputSource {
    /// Read all devices.
    fn snapshot(&mut self) -> RawInputSnapshot;
}

/// Replays a fixed list of snapshots, then reports no input.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: Vec<RawInputSnapshot>,
    cursor: usize,
}

impl ScriptedInput {
    /// Create from per-tick snapshots.
    pub fn new(frames: Vec<RawInputSnapshot>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl RawInputSource for ScriptedInput {
    fn snapshot(&mut self) -> RawInputSnapshot {
        let frame = self.frames.get(self.cursor).cloned().unwrap_or_default();
        self.cursor = self.cursor.saturating_add(1);
        frame
    }
}

// =============================================================================
// BINDINGS
// =============================================================================

/// Keyboard bindings for one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Move left
    pub left: Key,
    /// Move right
    pub right: Key,
    /// Jump
    pub up: Key,
    /// Fast fall / drop through
    pub down: Key,
    /// Weak attack
    pub weak_attack: Key,
    /// Heavy attack
    pub heavy_attack: Key,
    /// Shield
    pub shield: Key,
}

impl KeyBindings {
    /// WASD + F/G/H.
    pub fn player_one() -> Self {
        Self {
            left: Key::A,
            right: Key::D,
            up: Key::W,
            down: Key::S,
            weak_attack: Key::F,
            heavy_attack: Key::G,
            shield: Key::H,
        }
    }

    /// Arrows + J/K/L.
    pub fn player_two() -> Self {
        Self {
            left: Key::Left,
            right: Key::Right,
            up: Key::Up,
            down: Key::Down,
            weak_attack: Key::J,
            heavy_attack: Key::K,
            shield: Key::L,
        }
    }

    /// Default bindings for a player slot.
    pub fn for_player(id: PlayerId) -> Self {
        if id.0 == 0 {
            Self::player_one()
        } else {
            Self::player_two()
        }
    }
}

/// Keys shared by every keyboard player.
pub const MENU_KEY: Key = Key::Escape;
/// Restart key.
pub const RESTART_KEY: Key = Key::R;
/// Quit key.
pub const QUIT_KEY: Key = Key::Q;

/// Controller family, picked from the reported device name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerKind {
    /// Xbox family
    Xbox,
    /// DualShock / DualSense family
    PlayStation,
    /// Switch Pro family
    SwitchPro,
    /// Anything else
    Generic,
}

impl ControllerKind {
    /// Match on a case-insensitive substring of the device name.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("xbox") || name.contains("x-box") {
            ControllerKind::Xbox
        } else if ["playstation", "dualshock", "dualsense", "ps4", "ps5", "sony"]
            .iter()
            .any(|needle| name.contains(needle))
        {
            ControllerKind::PlayStation
        } else if name.contains("switch") || name.contains("pro controller") || name.contains("nintendo") {
            ControllerKind::SwitchPro
        } else {
            ControllerKind::Generic
        }
    }
}

/// Button and axis layout for a controller family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ButtonMap {
    /// Jump buttons
    pub jump: Vec<usize>,
    /// Weak attack buttons
    pub weak_attack: Vec<usize>,
    /// Heavy attack buttons
    pub heavy_attack: Vec<usize>,
    /// Shield buttons
    pub shield: Vec<usize>,
    /// Menu buttons
    pub menu: Vec<usize>,
    /// Restart buttons
    pub restart: Vec<usize>,
    /// Quit buttons
    pub quit: Vec<usize>,
    /// Stick X axis index
    pub horizontal_axis: usize,
    /// Stick Y axis index
    pub vertical_axis: usize,
}

impl ButtonMap {
    /// Layout for a controller family.
    pub fn for_kind(kind: ControllerKind) -> Self {
        match kind {
            ControllerKind::Xbox => Self {
                jump: vec![3],
                weak_attack: vec![0],
                heavy_attack: vec![1],
                shield: vec![4, 5],
                menu: vec![7],
                restart: vec![6],
                quit: vec![],
                horizontal_axis: 0,
                vertical_axis: 1,
            },
            ControllerKind::PlayStation => Self {
                jump: vec![3],
                weak_attack: vec![0],
                heavy_attack: vec![1],
                shield: vec![9, 10],
                menu: vec![6],
                restart: vec![4],
                quit: vec![],
                horizontal_axis: 0,
                vertical_axis: 1,
            },
            ControllerKind::SwitchPro => Self {
                jump: vec![2],
                weak_attack: vec![1],
                heavy_attack: vec![0],
                shield: vec![9, 10],
                menu: vec![6],
                restart: vec![4],
                quit: vec![],
                horizontal_axis: 0,
                vertical_axis: 1,
            },
            ControllerKind::Generic => Self {
                jump: vec![3],
                weak_attack: vec![0],
                heavy_attack: vec![1],
                shield: vec![4, 5],
                menu: vec![9],
                restart: vec![8],
                quit: vec![],
                horizontal_axis: 0,
                vertical_axis: 1,
            },
        }
    }
}

// =============================================================================
// MAPPER
// =============================================================================

/// Which device drove a player on the last tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputDevice {
    /// Keyboard bindings
    Keyboard,
    /// A controller of the given family
    Controller(ControllerKind),
}

#[derive(Clone, Debug)]
struct PlayerInput {
    id: PlayerId,
    bindings: KeyBindings,
    intents: IntentSet,
    jump_timer: JumpTimer,
    device: InputDevice,
}

/// Converts raw device snapshots into per-player intent sets.
#[derive(Clone, Debug)]
pub struct InputIntentMapper {
    config: InputConfig,
    players: Vec<PlayerInput>,
}

impl InputIntentMapper {
    /// Create a mapper for `player_count` players with default key bindings.
    pub fn new(config: InputConfig, player_count: usize) -> Self {
        let players = (0..player_count)
            .map(|i| {
                let id = PlayerId(i as u8);
                PlayerInput {
                    id,
                    bindings: KeyBindings::for_player(id),
                    intents: IntentSet::new(),
                    jump_timer: JumpTimer::new(),
                    device: InputDevice::Keyboard,
                }
            })
            .collect();
        Self { config, players }
    }

    /// Device that drove `id` on the last update.
    pub fn device(&self, id: PlayerId) -> Option<InputDevice> {
        self.players.iter().find(|p| p.id == id).map(|p| p.device)
    }

    /// Read the source once and map it.
    pub fn poll(&mut self, source: &mut dyn RawInputSource, tick: u64) -> Vec<(PlayerId, IntentSet)> {
        let snapshot = source.snapshot();
        self.update(&snapshot, tick)
    }

    /// Map one snapshot to every player's intent set.
    pub fn update(&mut self, snapshot: &RawInputSnapshot, tick: u64) -> Vec<(PlayerId, IntentSet)> {
        let deadzone = self.config.deadzone;
        let config = &self.config;

        for (slot, player) in self.players.iter_mut().enumerate() {
            let (flags, horizontal, vertical, device) = match snapshot.live_controller(slot) {
                Some(pad) => {
                    let kind = ControllerKind::from_name(&pad.name);
                    let (flags, h, v) = map_controller(pad, &ButtonMap::for_kind(kind), deadzone);
                    (flags, h, v, InputDevice::Controller(kind))
                }
                None => {
                    if let Some(Some(pad)) = snapshot.controllers.get(slot) {
                        debug!("Controller '{}' for player {} not responding, using keyboard", pad.name, player.id.0);
                    }
                    let (flags, h, v) = map_keyboard(&snapshot.keys, &player.bindings);
                    (flags, h, v, InputDevice::Keyboard)
                }
            };

            if player.device != device {
                debug!("Player {} input device now {:?}", player.id.0, device);
                player.device = device;
            }

            player.intents.advance(flags, horizontal, vertical);
            player.intents.jump = player.jump_timer.update(
                player.intents.just_activated(Intent::MoveUp),
                player.intents.just_deactivated(Intent::MoveUp),
                tick,
                config,
            );
        }

        self.players.iter().map(|p| (p.id, p.intents.clone())).collect()
    }

    /// Drop pending jump presses after the match clock rewinds.
    ///
    /// Edge history is kept, so keys held through a restart stay held
    /// without rising again.
    pub fn clear_pending_jumps(&mut self) {
        for player in &mut self.players {
            player.jump_timer.reset();
        }
    }
}

fn map_keyboard(keys: &BTreeSet<Key>, bindings: &KeyBindings) -> (IntentFlags, f32, f32) {
    let held = |k: Key| keys.contains(&k);
    let mut flags = IntentFlags::NONE;
    flags.set(Intent::MoveLeft, held(bindings.left));
    flags.set(Intent::MoveRight, held(bindings.right));
    flags.set(Intent::MoveUp, held(bindings.up));
    flags.set(Intent::MoveDown, held(bindings.down));
    flags.set(Intent::WeakAttack, held(bindings.weak_attack));
    flags.set(Intent::HeavyAttack, held(bindings.heavy_attack));
    flags.set(Intent::Shield, held(bindings.shield));
    flags.set(Intent::Menu, held(MENU_KEY));
    flags.set(Intent::Restart, held(RESTART_KEY));
    flags.set(Intent::Quit, held(QUIT_KEY));

    let horizontal = digital_axis(held(bindings.left), held(bindings.right));
    let vertical = digital_axis(held(bindings.up), held(bindings.down));
    (flags, horizontal, vertical)
}

fn map_controller(pad: &ControllerSnapshot, map: &ButtonMap, deadzone: f32) -> (IntentFlags, f32, f32) {
    let (hat_x, hat_y) = pad.hat(0);
    let stick_x = apply_deadzone(pad.axis(map.horizontal_axis), deadzone);
    let stick_y = apply_deadzone(pad.axis(map.vertical_axis), deadzone);

    // Hat Y is up-positive, stick Y is down-positive.
    let horizontal = if hat_x != 0 { hat_x as f32 } else { stick_x };
    let vertical = if hat_y != 0 { -(hat_y as f32) } else { stick_y };

    let mut flags = IntentFlags::NONE;
    flags.set(Intent::MoveLeft, horizontal < 0.0);
    flags.set(Intent::MoveRight, horizontal > 0.0);
    flags.set(Intent::MoveUp, vertical < 0.0 || pad.any_button(&map.jump));
    flags.set(Intent::MoveDown, vertical > 0.0);
    flags.set(Intent::WeakAttack, pad.any_button(&map.weak_attack));
    flags.set(Intent::HeavyAttack, pad.any_button(&map.heavy_attack));
    flags.set(Intent::Shield, pad.any_button(&map.shield));
    flags.set(Intent::Menu, pad.any_button(&map.menu));
    flags.set(Intent::Restart, pad.any_button(&map.restart));
    flags.set(Intent::Quit, pad.any_button(&map.quit));

    (flags, horizontal, vertical)
}

/// Zero values inside the deadzone; pass the rest through.
#[inline]
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() <= deadzone {
        0.0
    } else {
        value
    }
}

fn digital_axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

// =============================================================================
// TESTS
// =============================================================================
