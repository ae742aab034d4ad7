/// Entities: player, enemies, collectibles and background decorations.
///
/// All four share one type. Behaviour that differs by role lives in the
/// resolver (`physics`, `sim::step`), not here; an entity only knows how
/// to move itself and run its animation.

use super::animation::{Animation, Image};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Player,
    Enemy,
    Collectible,
    Decoration,
}

#[derive(Clone, Debug)]
pub struct Entity {
    #[allow(dead_code)]
    pub role: Role,
    pub x: f32,
    pub y: f32,
    /// Pixels per millisecond.
    pub vx: f32,
    pub vy: f32,
    pub animation: Animation,
    pub visible: bool,
    pub flipped: bool,
    pub anim_speed: f32,
    /// Draw scale. Collectibles use it for their hit box too.
    pub scale: f32,
}

impl Entity {
    pub fn new(role: Role, animation: Animation) -> Self {
        Entity {
            role,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            animation,
            visible: true,
            flipped: false,
            anim_speed: 1.0,
            scale: 1.0,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn moving(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    /// Pure kinematic step: move by velocity, advance the animation.
    pub fn update(&mut self, elapsed_ms: f32) {
        self.x += self.vx * elapsed_ms;
        self.y += self.vy * elapsed_ms;
        self.animation.update(elapsed_ms * self.anim_speed);
    }

    pub fn image(&self) -> Image {
        self.animation.image()
    }

    /// Unscaled width of the current frame.
    pub fn width(&self) -> i32 {
        self.image().width
    }

    /// Unscaled height of the current frame.
    pub fn height(&self) -> i32 {
        self.image().height
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Mirror the sprite horizontally.
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }
}

/// Result of moving the collectible cursor forward.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Advance {
    /// Another collectible is now current and visible.
    Next,
    /// That was the last one.
    Exhausted,
}

/// Ordered collectibles with a single active item.
///
/// Only the item under the cursor is visible. Once the cursor passes the
/// end there is no current item and `advance` does nothing, so the
/// completion transition can only be observed once.
#[derive(Clone, Debug)]
pub struct CollectibleSet {
    items: Vec<Entity>,
    cursor: usize,
}

impl CollectibleSet {
    pub fn new(mut items: Vec<Entity>) -> Self {
        for (i, item) in items.iter_mut().enumerate() {
            item.visible = i == 0;
        }
        CollectibleSet { items, cursor: 0 }
    }

    /// The active collectible, if any remain.
    pub fn current(&self) -> Option<&Entity> {
        self.items.get(self.cursor)
    }

    /// Hide the current item and show the next one.
    /// Returns `None` once the set is already exhausted.
    pub fn advance(&mut self) -> Option<Advance> {
        let item = self.items.get_mut(self.cursor)?;
        item.hide();
        self.cursor += 1;
        match self.items.get_mut(self.cursor) {
            Some(next) => {
                next.show();
                Some(Advance::Next)
            }
            None => Some(Advance::Exhausted),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[allow(dead_code)]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.items.iter_mut()
    }
}
