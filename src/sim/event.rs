/// Events emitted by input handling and the frame update.
/// The presentation layer consumes these for sound; the simulation never
/// plays anything itself.

use super::level::LevelId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    /// Touched an enemy. Plays the "died" sound.
    PlayerKilled,
    /// Picked up a collectible and another one appeared.
    CollectiblePicked { index: usize },
    /// Picked up the last collectible; the exit passage opened.
    AllCollected,
    /// Lever clicked. `pulled` is the new lever position.
    LeverToggled { pulled: bool },
    LevelStarted(LevelId),
    GameCompleted,
    QuitRequested,
}
