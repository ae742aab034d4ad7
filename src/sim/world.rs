/// Game state: the current screen, persistent progress flags and the
/// collaborators needed to (re)build a level.
///
/// `Screen::Playing` owns the live `LevelSession`, so leaving the level
/// (death, goal line, restart) drops it and a new one is built from the
/// level tables on the next entry.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::PhysicsConfig;
use crate::domain::animation::Image;
use crate::domain::entity::Entity;
use crate::sim::assets::Assets;
use crate::sim::level::{LevelId, LevelSession, LoadError, MapSource};

/// Added to every entity position when drawing.
pub const CAMERA_OFFSET: (f32, f32) = (10.0, 10.0);

#[derive(Clone, Debug)]
pub enum Screen {
    Start,
    Playing(LevelSession),
    Failed,
    End,
}

impl Screen {
    pub fn session(&self) -> Option<&LevelSession> {
        match self {
            Screen::Playing(session) => Some(session),
            Screen::Start | Screen::Failed | Screen::End => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut LevelSession> {
        match self {
            Screen::Playing(session) => Some(session),
            Screen::Start | Screen::Failed | Screen::End => None,
        }
    }
}

pub struct GameState {
    pub screen: Screen,
    /// Set when the level-1 goal line is crossed; survives death and restarts.
    pub level1_cleared: bool,
    /// Up is held.
    pub flap: bool,
    pub physics: PhysicsConfig,
    assets: Assets,
    maps: MapSource,
    rng: Pcg32,
}

impl GameState {
    pub fn new(physics: PhysicsConfig, maps: MapSource, seed: u64) -> Self {
        GameState {
            screen: Screen::Start,
            level1_cleared: false,
            flap: false,
            physics,
            assets: Assets::load(),
            maps,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Level entered from Start or Failed.
    pub fn restart_level(&self) -> LevelId {
        if self.level1_cleared {
            LevelId::Two
        } else {
            LevelId::One
        }
    }

    /// Replace the screen with a freshly built session for `level`.
    /// On failure the current screen is left untouched.
    pub fn start_level(&mut self, level: LevelId) -> Result<(), LoadError> {
        let session = LevelSession::build(level, &self.maps, &self.assets, &mut self.rng)?;
        self.screen = Screen::Playing(session);
        log::info!("entering level {}", level.number());
        Ok(())
    }

    /// Draw list for the current frame. Empty outside of play.
    pub fn render_commands(&self) -> Vec<RenderCommand> {
        self.screen.session().map(render_commands).unwrap_or_default()
    }
}

/// One sprite to draw.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RenderCommand {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub flipped: bool,
    pub image: Image,
}

impl RenderCommand {
    fn of(e: &Entity) -> Self {
        RenderCommand {
            x: e.x + CAMERA_OFFSET.0,
            y: e.y + CAMERA_OFFSET.1,
            scale: e.scale,
            flipped: e.flipped,
            image: e.image(),
        }
    }
}

/// Visible entities back to front: decorations, collectibles, enemies, player.
fn render_commands(session: &LevelSession) -> Vec<RenderCommand> {
    session.decorations.iter()
        .chain(session.collectibles.iter())
        .chain(session.enemies.iter())
        .chain(std::iter::once(&session.player))
        .filter(|e| e.visible)
        .map(RenderCommand::of)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::ImageKey;

    fn game() -> GameState {
        GameState::new(PhysicsConfig::default(), MapSource::embedded(), 3)
    }

    #[test]
    fn starts_on_start_screen_without_commands() {
        let g = game();
        assert!(matches!(g.screen, Screen::Start));
        assert!(!g.level1_cleared);
        assert!(g.render_commands().is_empty());
    }

    #[test]
    fn restart_level_follows_cleared_flag() {
        let mut g = game();
        assert_eq!(g.restart_level(), LevelId::One);
        g.level1_cleared = true;
        assert_eq!(g.restart_level(), LevelId::Two);
    }

    #[test]
    fn render_order_and_offset() {
        let mut g = game();
        g.start_level(LevelId::One).unwrap();
        let cmds = g.render_commands();

        // 3 clouds, 1 visible dot, 6 aliens, the bird.
        let keys: Vec<ImageKey> = cmds.iter().map(|c| c.image.key).collect();
        assert_eq!(keys.len(), 11);
        assert!(keys[..3].iter().all(|k| *k == ImageKey::Cloud));
        assert_eq!(keys[3], ImageKey::Dot);
        assert!(keys[4..10].iter().all(|k| *k == ImageKey::Alien));
        assert_eq!(keys[10], ImageKey::Bird);

        let bird = cmds[10];
        assert_eq!((bird.x, bird.y), (74.0, 290.0));
        assert_eq!(cmds[3].scale, 3.0);
    }

    #[test]
    fn hidden_entities_not_drawn() {
        let mut g = game();
        g.start_level(LevelId::One).unwrap();
        if let Some(s) = g.screen.session_mut() {
            s.player.hide();
        }
        let cmds = g.render_commands();
        assert!(cmds.iter().all(|c| c.image.key != ImageKey::Bird));
    }
}
