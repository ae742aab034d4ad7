/// Player physics and collision resolution against the tile grid,
/// enemies and collectibles, plus enemy edge patrol.
///
/// ## Player bounds
///
/// The player's hit box is inset from the raw sprite so collisions match
/// the bird's silhouette rather than its transparent margins:
///
///   left   = x + 15            right  = left + width − 25
///   top    = y + 5             bottom = top + height − 10
///
/// `PlayerBounds` is derived from the entity on demand and must be rebuilt
/// after every position change; nothing keeps it across frames.
///
/// ## Tile resolution order
///
/// Left, right, bottom, top, one at a time, re-deriving bounds after each
/// snap so later checks see corrected coordinates. In corners the order
/// decides where the player ends up, so it is fixed.

use super::entity::Entity;
use super::tile::{self, TileGrid};
use crate::config::PhysicsConfig;

// ── Hit box insets (pixels) ──

const PLAYER_INSET_LEFT: i32 = 15;
const PLAYER_INSET_WIDTH: i32 = 25;
const PLAYER_INSET_TOP: i32 = 5;
const PLAYER_INSET_HEIGHT: i32 = 10;

/// Distance kept from a wall after a horizontal snap.
const SNAP_LEFT: i32 = 13;
const SNAP_RIGHT: i32 = 18;
/// Distance kept from a floor or ceiling after a vertical snap.
const SNAP_VERTICAL: i32 = 5;

const ENEMY_INSET_SIDE: f32 = 15.0;
const ENEMY_INSET_TOP: f32 = 15.0;
const ENEMY_INSET_BOTTOM: f32 = 10.0;

const COLLECTIBLE_INSET: f32 = 10.0;

const PATROL_INSET_RIGHT: i32 = 10;
const PATROL_INSET_LEFT: f32 = 15.0;
/// How far below the sprite's bottom edge the ground probe sits.
const PATROL_FOOT: i32 = 20;
const PATROL_NUDGE: f32 = 3.0;

/// Inset pixel edges of the player and the grid cells they fall in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlayerBounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    pub col_left: i32,
    pub col_right: i32,
    pub row_top: i32,
    pub row_bottom: i32,
}

impl PlayerBounds {
    pub fn of(player: &Entity, grid: &TileGrid) -> Self {
        let left = player.x as i32 + PLAYER_INSET_LEFT;
        let right = left + player.width() - PLAYER_INSET_WIDTH;
        let top = player.y as i32 + PLAYER_INSET_TOP;
        let bottom = top + player.height() - PLAYER_INSET_HEIGHT;
        PlayerBounds {
            left,
            right,
            top,
            bottom,
            col_left: grid.col_at(left),
            col_right: grid.col_at(right),
            row_top: grid.row_at(top),
            row_bottom: grid.row_at(bottom),
        }
    }
}

/// Which tile checks fired this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TileContacts {
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
    pub top: bool,
}

impl TileContacts {
    pub fn any(&self) -> bool {
        self.left || self.right || self.bottom || self.top
    }
}

/// Gravity always; flapping overrides vertical velocity and speeds up the
/// wing animation.
pub fn apply_lift(player: &mut Entity, flap: bool, elapsed: f32, cfg: &PhysicsConfig) {
    player.vy += cfg.gravity * elapsed;
    if flap {
        player.anim_speed = cfg.flap_animation_speed;
        player.vy = cfg.flap_velocity;
    } else {
        player.anim_speed = 1.0;
    }
}

/// Push the player out of solid tiles.
///
/// Each check runs only when both cells it looks at are on the grid.
/// Horizontal snaps stop horizontal motion; vertical snaps bounce with a
/// damping factor proportional to the frame time.
pub fn resolve_tiles(
    player: &mut Entity,
    grid: &TileGrid,
    elapsed: f32,
    cfg: &PhysicsConfig,
) -> (PlayerBounds, TileContacts) {
    let tw = grid.tile_width();
    let th = grid.tile_height();
    let bounce = cfg.bounce_damping * elapsed;
    let mut b = PlayerBounds::of(player, grid);
    let mut hit = TileContacts::default();

    // Left: only the top-left cell decides.
    if grid.valid(b.col_left, b.row_top)
        && grid.valid(b.col_left, b.row_bottom)
        && tile::is_solid(grid.get(b.col_left, b.row_top))
    {
        player.x = ((b.col_left + 1) * tw - SNAP_LEFT) as f32;
        b = PlayerBounds::of(player, grid);
        player.vx = 0.0;
        hit.left = true;
    }

    // Right: only the top-right cell decides.
    if grid.valid(b.col_right, b.row_top)
        && grid.valid(b.col_right, b.row_bottom)
        && tile::is_solid(grid.get(b.col_right, b.row_top))
    {
        player.x = (b.col_right * tw - (b.right - b.left) - SNAP_RIGHT) as f32;
        b = PlayerBounds::of(player, grid);
        player.vx = 0.0;
        hit.right = true;
    }

    if grid.valid(b.col_left, b.row_bottom)
        && grid.valid(b.col_right, b.row_bottom)
        && (tile::is_solid(grid.get(b.col_left, b.row_bottom))
            || tile::is_solid(grid.get(b.col_right, b.row_bottom)))
    {
        player.y = (b.row_bottom * th - (b.bottom - b.top) - SNAP_VERTICAL) as f32;
        b = PlayerBounds::of(player, grid);
        player.vy = -player.vy * bounce;
        hit.bottom = true;
    }

    if grid.valid(b.col_left, b.row_top)
        && grid.valid(b.col_right, b.row_top)
        && (tile::is_solid(grid.get(b.col_left, b.row_top))
            || tile::is_solid(grid.get(b.col_right, b.row_top)))
    {
        player.y = ((b.row_top + 1) * th + SNAP_VERTICAL) as f32;
        b = PlayerBounds::of(player, grid);
        player.vy = -player.vy * bounce;
        hit.top = true;
    }

    (b, hit)
}

/// Does the player's hit box overlap the enemy's inset box?
pub fn touches_enemy(b: &PlayerBounds, enemy: &Entity) -> bool {
    b.right as f32 >= enemy.x + ENEMY_INSET_SIDE
        && b.left as f32 <= enemy.x + enemy.width() as f32 - ENEMY_INSET_SIDE
        && b.bottom as f32 >= enemy.y + ENEMY_INSET_TOP
        && b.top as f32 <= enemy.y + enemy.height() as f32 - ENEMY_INSET_BOTTOM
}

/// Does the player's hit box overlap the collectible's box?
/// The box follows the collectible's draw scale.
pub fn touches_collectible(b: &PlayerBounds, item: &Entity) -> bool {
    b.right as f32 >= item.x + COLLECTIBLE_INSET
        && b.left as f32 <= item.x + item.width() as f32 * item.scale
        && b.bottom as f32 >= item.y + COLLECTIBLE_INSET
        && b.top as f32 <= item.y + item.height() as f32 * item.scale
}

/// Turn an enemy around when the ground under its leading edge runs out.
/// At most one branch fires. Returns true if the enemy reversed.
pub fn patrol(enemy: &mut Entity, grid: &TileGrid) -> bool {
    let right = grid.col_at((enemy.x + (enemy.width() - PATROL_INSET_RIGHT) as f32) as i32);
    let left = grid.col_at((enemy.x + PATROL_INSET_LEFT) as i32);
    let foot = grid.row_at((enemy.y + (enemy.height() + PATROL_FOOT) as f32) as i32);

    if !tile::is_ground(grid.get(right, foot)) {
        enemy.x -= PATROL_NUDGE;
    } else if !tile::is_ground(grid.get(left, foot)) {
        enemy.x += PATROL_NUDGE;
    } else {
        return false;
    }
    enemy.flip();
    enemy.vx = -enemy.vx;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::{Animation, Image, ImageKey};
    use crate::domain::entity::Role;
    use crate::domain::tile::EMPTY;

    fn bird(x: f32, y: f32) -> Entity {
        let anim = Animation::new(Image::new(ImageKey::Bird, 0, 56, 48), 60.0);
        Entity::new(Role::Player, anim).at(x, y)
    }

    fn alien(x: f32, y: f32) -> Entity {
        let anim = Animation::new(Image::new(ImageKey::Alien, 0, 32, 23), 100.0);
        Entity::new(Role::Enemy, anim).at(x, y)
    }

    fn dot(x: f32, y: f32) -> Entity {
        let anim = Animation::new(Image::new(ImageKey::Dot, 0, 8, 8), 100.0);
        let mut e = Entity::new(Role::Collectible, anim).at(x, y);
        e.scale = 3.0;
        e
    }

    fn grid(rows: &[&str]) -> TileGrid {
        let mut g = TileGrid::filled(rows[0].len(), rows.len(), 32, 32, EMPTY);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                g.set(ch, c as i32, r as i32);
            }
        }
        g
    }

    #[test]
    fn bounds_use_insets() {
        let g = grid(&["......", "......", "......", "......"]);
        let b = PlayerBounds::of(&bird(60.0, 40.0), &g);
        assert_eq!((b.left, b.right, b.top, b.bottom), (75, 106, 45, 83));
        assert_eq!((b.col_left, b.col_right, b.row_top, b.row_bottom), (2, 3, 1, 2));
    }

    #[test]
    fn gravity_accumulates_and_flap_overrides() {
        let cfg = PhysicsConfig::default();
        let mut p = bird(0.0, 0.0);
        apply_lift(&mut p, false, 16.0, &cfg);
        assert!((p.vy - 0.0016).abs() < 1e-6);
        assert_eq!(p.anim_speed, 1.0);

        apply_lift(&mut p, true, 16.0, &cfg);
        assert_eq!(p.vy, cfg.flap_velocity);
        assert_eq!(p.anim_speed, cfg.flap_animation_speed);

        apply_lift(&mut p, false, 16.0, &cfg);
        assert_eq!(p.anim_speed, 1.0);
    }

    #[test]
    fn open_space_has_no_contacts() {
        let g = grid(&["......", "......", "......", "......"]);
        let mut p = bird(60.0, 40.0).moving(0.14, 0.01);
        let (_, hit) = resolve_tiles(&mut p, &g, 16.0, &PhysicsConfig::default());
        assert!(!hit.any());
        assert_eq!((p.x, p.y, p.vx, p.vy), (60.0, 40.0, 0.14, 0.01));
    }

    #[test]
    fn right_wall_snaps_and_stops() {
        let g = grid(&["...w..", "...w..", "...w..", "...w.."]);
        let mut p = bird(60.0, 40.0).moving(0.14, 0.0);
        let (b, hit) = resolve_tiles(&mut p, &g, 16.0, &PhysicsConfig::default());
        assert!(hit.right && !hit.left);
        // colR * tileWidth - (R - L) - 18
        assert_eq!(p.x, (3 * 32 - 31 - 18) as f32);
        assert_eq!(p.vx, 0.0);
        assert_eq!(b.col_right, 2);
    }

    #[test]
    fn left_wall_snaps_and_stops() {
        let g = grid(&["w.....", "w.....", "w.....", "w....."]);
        let mut p = bird(10.0, 40.0).moving(-0.14, 0.0);
        let (b, hit) = resolve_tiles(&mut p, &g, 16.0, &PhysicsConfig::default());
        assert!(hit.left);
        assert_eq!(p.x, (32 - 13) as f32);
        assert_eq!(p.vx, 0.0);
        assert_eq!(b.col_left, 1);
    }

    #[test]
    fn floor_bounces_with_damping() {
        let g = grid(&["......", "......", "......", "wwwwww"]);
        // bottom = 70 + 5 + 38 = 113 → row 3
        let mut p = bird(40.0, 70.0).moving(0.0, 0.1);
        let (b, hit) = resolve_tiles(&mut p, &g, 16.0, &PhysicsConfig::default());
        assert!(hit.bottom && !hit.top);
        assert_eq!(p.y, (3 * 32 - 38 - 5) as f32);
        assert!((p.vy + 0.1 * 0.03 * 16.0).abs() < 1e-6);
        assert_eq!(b.bottom, 96);
    }

    #[test]
    fn ceiling_bounces_down() {
        let g = grid(&["wwwwww", "......", "......", "......"]);
        let mut p = bird(40.0, 20.0).moving(0.0, -0.08);
        let (_, hit) = resolve_tiles(&mut p, &g, 16.0, &PhysicsConfig::default());
        assert!(hit.top);
        assert_eq!(p.y, (32 + 5) as f32);
        assert!(p.vy > 0.0);
    }

    #[test]
    fn corner_resolution_is_order_dependent_and_fixed() {
        // Solid at top-left cell and under both feet. Left runs first, so
        // the player is pushed right before the floor check sees it.
        let g = grid(&["......", "......", ".w....", ".ww...", "......", "......"]);
        let cfg = PhysicsConfig::default();
        let run = || {
            let mut p = bird(20.0, 60.0).moving(-0.1, 0.05);
            let (_, hit) = resolve_tiles(&mut p, &g, 16.0, &cfg);
            (p.x, p.y, p.vx, p.vy, hit)
        };
        let (x, y, vx, vy, hit) = run();
        assert_eq!((x, y), (51.0, 53.0));
        assert_eq!(vx, 0.0);
        assert!((vy + 0.05 * 0.48).abs() < 1e-6);
        assert_eq!(hit, TileContacts { left: true, right: false, bottom: true, top: false });
        assert!(hit.any());
        assert_eq!(run(), (x, y, vx, vy, hit));
    }

    #[test]
    fn checks_skip_when_cells_off_grid() {
        let g = grid(&["ww", "ww"]);
        // Entirely right of the grid: every column is out of range.
        let mut p = bird(200.0, 0.0).moving(0.1, 0.1);
        let (_, hit) = resolve_tiles(&mut p, &g, 16.0, &PhysicsConfig::default());
        assert!(!hit.any());
        assert_eq!(p.x, 200.0);
    }

    #[test]
    fn enemy_box_edges() {
        let g = grid(&["......"]);
        let e = alien(100.0, 100.0);
        // Player right edge exactly at enemy x + 15.
        let touching = PlayerBounds::of(&bird(100.0 + 15.0 - 46.0, 100.0), &g);
        assert_eq!(touching.right, 115);
        assert!(touches_enemy(&touching, &e));

        let short = PlayerBounds::of(&bird(100.0 + 14.0 - 46.0, 100.0), &g);
        assert!(!touches_enemy(&short, &e));

        // Player top below enemy y + height − 10 = 113.
        let below = PlayerBounds::of(&bird(100.0, 109.0), &g);
        assert_eq!(below.top, 114);
        assert!(!touches_enemy(&below, &e));
    }

    #[test]
    fn collectible_box_is_scaled() {
        let g = grid(&["......"]);
        let d = dot(200.0, 200.0);
        // Left edge exactly at x + 8 * 3.
        let at_edge = PlayerBounds::of(&bird(200.0 + 24.0 - 15.0, 200.0), &g);
        assert!(touches_collectible(&at_edge, &d));
        let past = PlayerBounds::of(&bird(200.0 + 25.0 - 15.0, 200.0), &g);
        assert!(!touches_collectible(&past, &d));

        let mut unscaled = d.clone();
        unscaled.scale = 1.0;
        assert!(!touches_collectible(&at_edge, &unscaled));
    }

    #[test]
    fn patrol_reverses_once_at_platform_edge() {
        let g = grid(&["..........", "..........", "..gggg....", ".........."]);
        let mut e = alien(4.0 * 32.0, 32.0 + 9.0).moving(0.04, 0.0);
        let mut reversals = 0;
        for _ in 0..120 {
            e.update(16.0);
            if patrol(&mut e, &g) {
                reversals += 1;
            }
        }
        assert_eq!(reversals, 1);
        assert!(e.vx < 0.0);
        assert!(e.flipped);
        // Still above the platform.
        assert!(e.x > 2.0 * 32.0 - 15.0 && e.x < 6.0 * 32.0 - 22.0);
    }

    #[test]
    fn patrol_left_edge_nudges_right() {
        let g = grid(&["..........", "..........", "..gggg....", ".........."]);
        // Left probe at x + 15 = 63 → column 1, which is not ground.
        let mut e = alien(48.0, 41.0).moving(-0.04, 0.0);
        assert!(patrol(&mut e, &g));
        assert_eq!(e.x, 51.0);
        assert!(e.vx > 0.0);
    }

    #[test]
    fn patrol_on_solid_ground_does_nothing() {
        let g = grid(&["..........", "..........", "..gggg....", ".........."]);
        let mut e = alien(96.0, 41.0).moving(0.04, 0.0);
        assert!(!patrol(&mut e, &g));
        assert_eq!(e.x, 96.0);
        assert!(!e.flipped);
    }
}
