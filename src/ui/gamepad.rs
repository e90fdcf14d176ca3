/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad right / Left Stick right  →  Run
///   X / R1                          →  Run
///   A / B                           →  Jump
///   Start                           →  Restart
///   Select                          →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::{debug, warn};

use crate::config::GamepadConfig;
use crate::domain::entity::Intent;

const STICK_DEADZONE: f32 = 0.25;

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

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    move_forward: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:         vec![Btn::A, Btn::B],
            move_forward: vec![Btn::X, Btn::R1],
            restart:      vec![Btn::Start],
            quit:         vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    dpad_right: bool,
    stick_x: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad_right: false,
            stick_x: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists with no recognised names
    /// keep the default binding.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let jp = parse_list(&cfg.jump);
        if !jp.is_empty() { map.jump = jp; }
        let mf = parse_list(&cfg.move_forward);
        if !mf.is_empty() { map.move_forward = mf; }
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() { map.restart = rs; }
        let qt = parse_list(&cfg.quit);
        if !qt.is_empty() { map.quit = qt; }
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
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
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    self.connected = true;
                    self.stick_x = value;
                }
                EventType::Connected => {
                    debug!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    debug!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        if gilrs_btn == Button::DPadRight {
            self.dpad_right = held;
            return;
        }
        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.press(btn, held);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, btn: Btn, held: bool) {
        let state = &mut self.buttons[btn_index(btn)];
        if held && !state.held {
            state.just_pressed = true;
        }
        state.held = held;
    }

    // ── Action queries (config-driven) ──

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].held)
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// Continuous run / jump intent from the pad.
    pub fn intent(&self) -> Intent {
        Intent {
            wants_move: self.dpad_right
                || self.stick_x > STICK_DEADZONE
                || self.any_held(&self.action_map.move_forward),
            wants_jump: self.any_held(&self.action_map.jump),
        }
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    // ── Internal ──

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_right = false;
        self.stick_x = 0.0;
    }
}
