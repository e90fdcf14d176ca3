/// Input state tracker.
///
/// Tracks which keys are currently held down and where the pointer is
/// pressed, enabling:
///   - Continuous running / jumping while a key is held
///   - Edge-triggered restart and quit (only fire on initial press)
///   - Touch zones: press in the left half to run, right half to jump
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind, poll,
};

use crate::domain::entity::Intent;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const MOVE_KEYS: &[KeyCode] = &[
    KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D'), KeyCode::Char('l'), KeyCode::Char('L'),
];
pub const JUMP_KEYS: &[KeyCode] = &[
    KeyCode::Char(' '), KeyCode::Up,
    KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char('k'), KeyCode::Char('K'),
];
const RESTART_KEYS: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const QUIT_KEYS: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

/// Half of the screen a pointer press lands in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TouchZone {
    Move,
    Jump,
}

/// Left half → run, right half (including the middle column) → jump.
pub fn zone_for(column: u16, screen_cols: u16) -> TouchZone {
    if u32::from(column) * 2 < u32::from(screen_cols) {
        TouchZone::Move
    } else {
        TouchZone::Jump
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call. Used for edge-triggered actions.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    /// Zone under the pressed pointer, if any.
    touch: Option<TouchZone>,

    /// Terminal width in columns, for splitting the touch zones.
    screen_cols: u16,
}

impl InputState {
    pub fn new(screen_cols: u16) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            touch: None,
            screen_cols,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.handle_key(key),
                Ok(Event::Mouse(mouse)) => self.handle_mouse(mouse),
                Ok(Event::Resize(cols, _)) => self.screen_cols = cols,
                Ok(Event::FocusLost) => {
                    self.last_active.clear();
                    self.touch = None;
                }
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                // Explicit release: remove from active set
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Ignore release when enhancement not confirmed;
                // rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Pointer press picks a zone, dragging re-evaluates it (so sliding
    /// across the middle swaps run and jump), release clears it.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(_) | MouseEventKind::Drag(_) => {
                self.touch = Some(zone_for(mouse.column, self.screen_cols));
            }
            MouseEventKind::Up(_) => self.touch = None,
            _ => {}
        }
    }

    /// Movement intent from keyboard and touch for this frame.
    pub fn intent(&self) -> Intent {
        Intent {
            wants_move: self.any_held(MOVE_KEYS) || self.touch == Some(TouchZone::Move),
            wants_jump: self.any_held(JUMP_KEYS) || self.touch == Some(TouchZone::Jump),
        }
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(RESTART_KEYS)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(QUIT_KEYS) || self.ctrl_c_pressed()
    }

    /// Is this key currently held down?
    /// Used for continuous actions (running, jumping).
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseButton};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16) -> MouseEvent {
        MouseEvent { kind, column, row: 5, modifiers: KeyModifiers::NONE }
    }

    #[test]
    fn zones_split_the_screen() {
        assert_eq!(zone_for(0, 80), TouchZone::Move);
        assert_eq!(zone_for(39, 80), TouchZone::Move);
        assert_eq!(zone_for(40, 80), TouchZone::Jump);
        assert_eq!(zone_for(79, 80), TouchZone::Jump);
        assert_eq!(zone_for(0, 0), TouchZone::Jump);
    }

    #[test]
    fn held_keys_become_intent() {
        let mut input = InputState::new(80);
        assert_eq!(input.intent(), Intent::default());

        input.handle_key(press(KeyCode::Right));
        input.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(input.intent(), Intent { wants_move: true, wants_jump: true });
        assert!(input.was_pressed(KeyCode::Right));
    }

    #[test]
    fn release_is_honored_only_when_enabled() {
        let mut input = InputState::new(80);
        input.handle_key(press(KeyCode::Char('d')));
        input.handle_key(release(KeyCode::Char('d')));
        assert!(input.intent().wants_move);

        input.honor_release = true;
        input.handle_key(release(KeyCode::Char('d')));
        assert!(!input.intent().wants_move);
    }

    #[test]
    fn touch_drag_swaps_zone() {
        let mut input = InputState::new(80);
        input.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 10));
        assert_eq!(input.intent(), Intent { wants_move: true, wants_jump: false });

        input.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 60));
        assert_eq!(input.intent(), Intent { wants_move: false, wants_jump: true });

        input.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60));
        assert_eq!(input.intent(), Intent::default());
    }

    #[test]
    fn meta_keys() {
        let mut input = InputState::new(80);
        input.handle_key(press(KeyCode::Char('R')));
        assert!(input.restart_pressed());
        assert!(!input.quit_pressed());

        let mut input = InputState::new(80);
        input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(input.quit_pressed());

        let mut input = InputState::new(80);
        input.handle_key(press(KeyCode::Esc));
        assert!(input.quit_pressed());
    }
}
