/// Animation frame sets used by the game.
///
/// Stands in for image loading: each source image is described by its
/// pixel size, and frames are cut the same way a sprite sheet would be.
/// Clone an animation per entity so every sprite keeps its own clock.

use crate::domain::animation::{Animation, Image, ImageKey};

/// Bird sheet: 4 frames in one row.
const BIRD_SHEET: (i32, i32) = (224, 48);
const BIRD_FRAMES: u16 = 4;
const BIRD_FRAME_MS: f32 = 60.0;

const ALIEN_SIZE: (i32, i32) = (32, 23);
const ALIEN_FRAMES: u16 = 7;
const ALIEN_FRAME_MS: f32 = 100.0;

const DOT_SIZE: (i32, i32) = (8, 8);
const CLOUD_SIZE: (i32, i32) = (64, 32);

#[derive(Clone, Debug)]
pub struct Assets {
    pub bird: Animation,
    pub alien: Animation,
    pub dot: Animation,
    pub cloud: Animation,
}

impl Assets {
    pub fn load() -> Self {
        let bird = Animation::from_sheet(
            ImageKey::Bird, BIRD_SHEET.0, BIRD_SHEET.1, BIRD_FRAMES, 1, BIRD_FRAME_MS,
        );

        let (aw, ah) = ALIEN_SIZE;
        let alien = (1..ALIEN_FRAMES).fold(
            Animation::new(Image::new(ImageKey::Alien, 0, aw, ah), ALIEN_FRAME_MS),
            |anim, i| anim.with_frame(Image::new(ImageKey::Alien, i, aw, ah), ALIEN_FRAME_MS),
        );

        let dot = Animation::new(Image::new(ImageKey::Dot, 0, DOT_SIZE.0, DOT_SIZE.1), 100.0);
        let cloud = Animation::new(Image::new(ImageKey::Cloud, 0, CLOUD_SIZE.0, CLOUD_SIZE.1), 1000.0);

        Assets { bird, alien, dot, cloud }
    }
}
