/// The frame update: advances the current level by `elapsed` milliseconds.
///
/// Processing order (only while a level is being played):
///   1. Gravity / flap lift on the player
///   2. Kinematic update of every entity
///   3. Goal line: past the right edge of the map ends the frame
///   4. Tile collisions (left → right → bottom → top)
///   5. Enemy contact: the player dies and the frame ends
///   6. Current collectible pickup
///   7. Enemy patrol
///
/// Screen transitions are decided inside the session and applied once the
/// session borrow ends, since some of them replace the session itself.

use crate::config::PhysicsConfig;
use crate::domain::entity::Advance;
use crate::domain::physics;
use super::event::GameEvent;
use super::level::{LevelId, LevelSession, LoadError};
use super::world::{GameState, Screen};

/// How the frame left the session.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Outcome {
    Continue,
    Died,
    GoalReached,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn update(game: &mut GameState, elapsed: f32) -> Result<Vec<GameEvent>, LoadError> {
    let mut events = Vec::new();
    let elapsed = elapsed.max(0.0);

    let outcome = match &mut game.screen {
        Screen::Playing(session) => advance(session, game.flap, elapsed, &game.physics, &mut events),
        Screen::Start | Screen::Failed | Screen::End => return Ok(events),
    };

    match outcome {
        Outcome::Continue => {}
        Outcome::Died => {
            log::info!("player died");
            game.screen = Screen::Failed;
        }
        Outcome::GoalReached if game.level1_cleared => {
            log::info!("final goal line reached");
            game.screen = Screen::End;
            events.push(GameEvent::GameCompleted);
        }
        Outcome::GoalReached => {
            game.start_level(LevelId::Two)?;
            game.level1_cleared = true;
            events.push(GameEvent::LevelStarted(LevelId::Two));
        }
    }
    Ok(events)
}

// ══════════════════════════════════════════════════════════════
// Per-session frame
// ══════════════════════════════════════════════════════════════

fn advance(
    session: &mut LevelSession,
    flap: bool,
    elapsed: f32,
    cfg: &PhysicsConfig,
    events: &mut Vec<GameEvent>,
) -> Outcome {
    physics::apply_lift(&mut session.player, flap, elapsed, cfg);

    for e in session.decorations.iter_mut()
        .chain(session.enemies.iter_mut())
        .chain(session.collectibles.iter_mut())
    {
        e.update(elapsed);
    }
    session.player.update(elapsed);

    if session.player.x > session.grid.pixel_width() as f32 {
        return Outcome::GoalReached;
    }

    let (bounds, hit) = physics::resolve_tiles(&mut session.player, &session.grid, elapsed, cfg);
    if hit.any() {
        log::trace!("tile contact {hit:?} at ({:.1}, {:.1})", session.player.x, session.player.y);
    }

    if session.enemies.iter().any(|e| physics::touches_enemy(&bounds, e)) {
        events.push(GameEvent::PlayerKilled);
        return Outcome::Died;
    }

    resolve_pickup(session, &bounds, events);

    for enemy in &mut session.enemies {
        physics::patrol(enemy, &session.grid);
    }
    Outcome::Continue
}

fn resolve_pickup(session: &mut LevelSession, bounds: &physics::PlayerBounds, events: &mut Vec<GameEvent>) {
    let touching = session.collectibles.current()
        .is_some_and(|item| physics::touches_collectible(bounds, item));
    if !touching {
        return;
    }

    let index = session.collectibles.cursor();
    match session.collectibles.advance() {
        Some(Advance::Next) => {
            log::debug!("collectible {} of {} picked", index + 1, session.collectibles.len());
            events.push(GameEvent::CollectiblePicked { index });
        }
        Some(Advance::Exhausted) => {
            log::info!("all collectibles picked, exit open");
            session.open_exit();
            events.push(GameEvent::AllCollected);
        }
        None => {}
    }
}
