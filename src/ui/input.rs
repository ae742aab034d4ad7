/// Terminal keyboard and mouse input.
///
/// Turns crossterm events into key-down / key-up transitions for the
/// game's fixed key set, plus raw left clicks (terminal cells; the
/// renderer knows how those map onto the level).
///
/// Release events are honored when the terminal supports keyboard
/// enhancement. Otherwise a key counts as released once no Press/Repeat
/// has been seen for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::sim::control::{InputEvent, Key};

/// After this long without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Input from the terminal, before clicks are resolved against the map.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RawInput {
    Key(InputEvent),
    Click { column: u16, row: u16 },
    /// Ctrl+C.
    Interrupt,
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each held key.
    held: HashMap<Key, Instant>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            held: HashMap::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) -> Vec<RawInput> {
        let mut out = Vec::new();
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.accept(ev, Instant::now(), &mut out),
                Err(e) => {
                    log::warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
        self.expire(Instant::now(), &mut out);
        out
    }

    fn accept(&mut self, ev: Event, now: Instant, out: &mut Vec<RawInput>) {
        match ev {
            Event::Key(key) if is_ctrl_c(&key) => out.push(RawInput::Interrupt),
            Event::Key(key) => {
                let Some(k) = map_key(key.code) else { return };
                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        if self.held.remove(&k).is_some() {
                            out.push(RawInput::Key(InputEvent::KeyUp(k)));
                        }
                    }
                    // Unreliable without enhancement; rely on the timeout.
                    KeyEventKind::Release => {}
                    _ => {
                        if self.held.insert(k, now).is_none() {
                            out.push(RawInput::Key(InputEvent::KeyDown(k)));
                        }
                    }
                }
            }
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                out.push(RawInput::Click { column: m.column, row: m.row });
            }
            _ => {}
        }
    }

    /// Synthesize releases for keys that stopped repeating.
    fn expire(&mut self, now: Instant, out: &mut Vec<RawInput>) {
        if self.honor_release {
            return;
        }
        let mut released: Vec<Key> = self.held.iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(k, _)| *k)
            .collect();
        released.sort_by_key(|k| *k as u8);
        for k in released {
            self.held.remove(&k);
            out.push(RawInput::Key(InputEvent::KeyUp(k)));
        }
    }
}
