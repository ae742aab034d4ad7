/// Gamepad input using gilrs, reported as the same key events as the
/// keyboard.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick left/right  →  Left / Right
///   D-pad / Stick up, A, B         →  Up (flap)
///   Start                          →  Space
///   Select                         →  Escape

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::sim::control::{InputEvent, Key};

const STICK_DEADZONE: f32 = 0.25;

/// Logical keys in the order of `Logical`'s slots.
const KEYS: [Key; 5] = [Key::Up, Key::Left, Key::Right, Key::Space, Key::Escape];

/// Down/up state per logical key, same order as `KEYS`.
type Logical = [bool; 5];

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// A press and release between two polls still counts as held for one poll.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn active(&self) -> bool {
        self.held || self.just_pressed
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    flap: Vec<Btn>,
    start: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            flap:  vec![Btn::A, Btn::B],
            start: vec![Btn::Start],
            quit:  vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    dpad_up: BtnState,
    dpad_left: BtnState,
    dpad_right: BtnState,

    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    /// What the game was last told.
    reported: Logical,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    #[cfg(feature = "gamepad")]
    pub fn new() -> Self {
        let mut state = Self::blank();
        match Gilrs::new() {
            Ok(g) => {
                state.connected = g.gamepads().next().is_some();
                state.gilrs = Some(g);
            }
            Err(e) => log::warn!("gamepad support unavailable: {e}"),
        }
        state
    }

    #[cfg(not(feature = "gamepad"))]
    pub fn new() -> Self {
        Self::blank()
    }

    fn blank() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); 10],
            dpad_up: BtnState::default(),
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            reported: [false; 5],
            connected: false,
        }
    }

    /// Load button mapping from config. Lists with no known button names
    /// keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let flap = parse_list(&cfg.flap);
        if !flap.is_empty() { map.flap = flap; }
        let start = parse_list(&cfg.start);
        if !start.is_empty() { map.start = start; }
        let quit = parse_list(&cfg.quit);
        if !quit.is_empty() { map.quit = quit; }
    }

    /// Read pending gamepad events and return key transitions since the
    /// last poll.
    pub fn poll(&mut self) -> Vec<InputEvent> {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        let now = self.logical();
        let events = transitions(&self.reported, &now);
        self.reported = now;
        events
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let state = match gilrs_btn {
            Button::DPadUp    => &mut self.dpad_up,
            Button::DPadLeft  => &mut self.dpad_left,
            Button::DPadRight => &mut self.dpad_right,
            other => match Btn::from_gilrs(other) {
                Some(btn) => &mut self.buttons[btn_index(btn)],
                None => return,
            },
        };
        state.held = held;
        if held {
            state.just_pressed = true;
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    fn any_active(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].active())
    }

    fn logical(&self) -> Logical {
        [
            self.dpad_up.active() || self.stick_y > STICK_DEADZONE || self.any_active(&self.action_map.flap),
            self.dpad_left.active() || self.stick_x < -STICK_DEADZONE,
            self.dpad_right.active() || self.stick_x > STICK_DEADZONE,
            self.any_active(&self.action_map.start),
            self.any_active(&self.action_map.quit),
        ]
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        self.dpad_up.just_pressed = false;
        self.dpad_left.just_pressed = false;
        self.dpad_right.just_pressed = false;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_up = BtnState::default();
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

fn transitions(prev: &Logical, now: &Logical) -> Vec<InputEvent> {
    KEYS.iter()
        .zip(prev.iter().zip(now.iter()))
        .filter_map(|(&key, (&was, &is))| match (was, is) {
            (false, true) => Some(InputEvent::KeyDown(key)),
            (true, false) => Some(InputEvent::KeyUp(key)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_report_edges_only() {
        let prev = [true, false, true, false, false];
        let now = [true, true, false, false, false];
        assert_eq!(
            transitions(&prev, &now),
            vec![InputEvent::KeyDown(Key::Left), InputEvent::KeyUp(Key::Right)]
        );
        assert!(transitions(&now, &now).is_empty());
    }

    #[test]
    fn tap_between_polls_gives_down_then_up() {
        let mut pad = GamepadState::blank();
        pad.buttons[btn_index(Btn::Start)].just_pressed = true;
        // poll() clears just_pressed first, so read the state directly.
        let now = pad.logical();
        assert_eq!(transitions(&pad.reported, &now), vec![InputEvent::KeyDown(Key::Space)]);
        pad.reported = now;

        assert_eq!(pad.poll(), vec![InputEvent::KeyUp(Key::Space)]);
    }

    #[test]
    fn stick_respects_deadzone() {
        let mut pad = GamepadState::blank();
        pad.stick_x = 0.2;
        assert_eq!(pad.logical(), [false; 5]);
        pad.stick_x = -0.6;
        pad.stick_y = 0.9;
        assert_eq!(pad.logical(), [true, true, false, false, false]);
    }

    #[test]
    fn config_overrides_flap_buttons() {
        let mut pad = GamepadState::blank();
        pad.load_button_config(&GamepadConfig {
            flap: vec!["rb".into()],
            start: vec!["nonsense".into()],
            quit: vec![],
        });
        assert_eq!(pad.action_map.flap, vec![Btn::R1]);
        assert_eq!(pad.action_map.start, vec![Btn::Start]);
        assert_eq!(pad.action_map.quit, vec![Btn::Select]);

        pad.buttons[btn_index(Btn::R1)].held = true;
        assert_eq!(pad.poll(), vec![InputEvent::KeyDown(Key::Up)]);
    }
}
