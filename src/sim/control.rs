/// Discrete input events and the state changes they cause.
///
/// Adapters (terminal keyboard/mouse, gamepad) translate device input into
/// `InputEvent`s; anything they don't recognise never reaches here.

use super::event::GameEvent;
use super::level::LoadError;
use super::world::{GameState, Screen};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Up,
    Left,
    Right,
    Space,
    Escape,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer click in map pixels.
    Click { x: i32, y: i32 },
}

/// Apply one input event.
///
/// Space and Escape act on release. Starting a level can fail if its map
/// is malformed; the screen is unchanged in that case.
pub fn handle_input(game: &mut GameState, ev: InputEvent) -> Result<Vec<GameEvent>, LoadError> {
    let mut events = Vec::new();
    let speed = game.physics.move_speed;
    match ev {
        InputEvent::KeyDown(Key::Up) => game.flap = true,
        InputEvent::KeyUp(Key::Up) => game.flap = false,
        InputEvent::KeyDown(Key::Left) => set_vx(game, -speed),
        InputEvent::KeyDown(Key::Right) => set_vx(game, speed),
        InputEvent::KeyUp(Key::Left | Key::Right) => set_vx(game, 0.0),
        InputEvent::KeyDown(Key::Space | Key::Escape) => {}

        InputEvent::KeyUp(Key::Space) => match game.screen {
            Screen::Start | Screen::Failed => {
                let level = game.restart_level();
                game.start_level(level)?;
                events.push(GameEvent::LevelStarted(level));
            }
            Screen::Playing(_) | Screen::End => {}
        },

        InputEvent::KeyUp(Key::Escape) => {
            log::info!("quit requested");
            events.push(GameEvent::QuitRequested);
        }

        InputEvent::Click { x, y } => {
            if let Some(session) = game.screen.session_mut() {
                let col = x.div_euclid(session.grid.tile_width());
                let row = y.div_euclid(session.grid.tile_height());
                if let Some(pulled) = session.toggle_lever(col, row) {
                    log::info!("lever at ({col}, {row}) {}", if pulled { "pulled" } else { "released" });
                    events.push(GameEvent::LeverToggled { pulled });
                }
            }
        }
    }
    Ok(events)
}

fn set_vx(game: &mut GameState, vx: f32) {
    if let Some(session) = game.screen.session_mut() {
        session.player.vx = vx;
    }
}
