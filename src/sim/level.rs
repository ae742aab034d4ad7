/// Level data and the per-level session.
///
/// ## Tile-map format (`maps/*.txt`):
///   ```
///   # comment lines start with '#'
///   <cols> <rows> <tile_width> <tile_height>
///   <rows lines of exactly cols characters>
///   ```
///
/// Maps are read from the configured maps directory when the file exists
/// there, otherwise from the copies built into the binary.
///
/// ## Level tables
///
/// Everything level-specific (spawn cells, lever hot-zone and its two tile
/// layouts, the exit passage, the hint text) is static data in `LevelDef`.
/// `LevelSession` consumes it generically.
///
/// ## Tile legend:
///   'w' = wall            'g' = ground (enemy platform)
///   'b' / 't' / 'p'       = gate cap top / cap bottom / gate body
///   'c' / 'z' / 'x'       = bridge cap left / cap right / bridge body
///   'l' / 'r'             = lever released / pulled
///   '.' = empty

use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

use crate::domain::entity::{CollectibleSet, Entity, Role};
use crate::domain::tile::TileGrid;
use crate::sim::assets::Assets;

// ── Spawn layout (pixels) ──

pub const PLAYER_SPAWN: (f32, f32) = (64.0, 280.0);
const ENEMY_Y_OFFSET: f32 = 9.0;
const ENEMY_SPEED: f32 = 0.04;
const COLLECTIBLE_Y_OFFSET: f32 = 5.0;
pub const COLLECTIBLE_SCALE: f32 = 3.0;

/// Clouds start past the right edge of the view and drift left.
const VIEW_WIDTH: f32 = 1056.0;
const CLOUD_COUNT: usize = 3;
const CLOUD_SPREAD_X: f32 = 200.0;
const CLOUD_TOP: f32 = 30.0;
const CLOUD_SPREAD_Y: f32 = 150.0;
const CLOUD_SPEED: f32 = -0.02;

pub const LEVER_RELEASED: char = 'l';
pub const LEVER_PULLED: char = 'r';

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("tile map {name} not found")]
    NotFound { name: String },
    #[error("could not read tile map {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tile map {name}: missing size header")]
    MissingHeader { name: String },
    #[error("tile map {name}: bad size header {line:?}")]
    BadHeader { name: String, line: String },
    #[error("tile map {name}: expected {expected} rows, found {found}")]
    RowCount { name: String, expected: usize, found: usize },
    #[error("tile map {name}: row {row} has {found} tiles, expected {expected}")]
    RowWidth { name: String, row: usize, expected: usize, found: usize },
    #[error("tile map {name}: {what} at ({col}, {row}) is outside the grid")]
    OutOfBounds { name: String, what: &'static str, col: i32, row: i32 },
    #[error("tile map {name}: lever at ({col}, {row}) is {found:?}, expected 'l' or 'r'")]
    MissingLever { name: String, col: i32, row: i32, found: char },
}

// ══════════════════════════════════════════════════════════════
// Level tables
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelId {
    One,
    Two,
}

impl LevelId {
    pub fn number(self) -> u8 {
        match self {
            LevelId::One => 1,
            LevelId::Two => 2,
        }
    }

    pub fn def(self) -> &'static LevelDef {
        match self {
            LevelId::One => &LEVEL_1,
            LevelId::Two => &LEVEL_2,
        }
    }
}

/// One fixed cell write.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileWrite {
    pub code: char,
    pub col: i32,
    pub row: i32,
}

const fn put(code: char, col: i32, row: i32) -> TileWrite {
    TileWrite { code, col, row }
}

/// A clickable lever that flips the grid between two layouts.
#[derive(Debug)]
pub struct Lever {
    /// Inclusive hot-zone in tile coordinates.
    pub cols: (i32, i32),
    pub rows: (i32, i32),
    /// Cell whose code tells the lever position.
    pub anchor: (i32, i32),
    /// Applied when the lever goes from released to pulled.
    pub pull: &'static [TileWrite],
    /// Applied when it goes back.
    pub release: &'static [TileWrite],
}

impl Lever {
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.cols.0 && col <= self.cols.1 && row >= self.rows.0 && row <= self.rows.1
    }
}

#[derive(Debug)]
pub struct LevelDef {
    pub map: &'static str,
    pub enemies: &'static [(i32, i32)],
    pub collectibles: &'static [(i32, i32)],
    pub hint: &'static str,
    pub lever: Lever,
    /// Opens the passage to the goal line once everything is collected.
    pub exit: &'static [TileWrite],
}

static LEVEL_1: LevelDef = LevelDef {
    map: "map.txt",
    enemies: &[(26, 6), (26, 14), (16, 8), (10, 10), (2, 14), (14, 13)],
    collectibles: &[(10, 4), (11, 15), (4, 15), (27, 5), (12, 10)],
    hint: "proceed here for level 2 ->",
    lever: Lever {
        cols: (18, 19),
        rows: (15, 16),
        anchor: (18, 15),
        pull: &[
            put('r', 18, 15),
            put('p', 5, 6), put('b', 5, 7), put('t', 5, 8), put('p', 5, 9),
            put('b', 20, 7), put('.', 20, 8), put('.', 20, 9), put('t', 20, 10),
        ],
        release: &[
            put('l', 18, 15),
            put('b', 5, 6), put('.', 5, 7), put('.', 5, 8), put('t', 5, 9),
            put('p', 20, 7), put('b', 20, 8), put('t', 20, 9), put('p', 20, 10),
        ],
    },
    exit: &[put('b', 31, 9), put('.', 31, 10), put('.', 31, 11), put('t', 31, 12)],
};

static LEVEL_2: LevelDef = LevelDef {
    map: "map2.txt",
    enemies: &[(4, 14), (23, 11), (16, 8), (25, 4), (2, 4)],
    collectibles: &[(2, 12), (20, 12), (15, 5), (7, 4), (21, 5)],
    hint: "proceed here to end demo ->",
    lever: Lever {
        cols: (15, 16),
        rows: (6, 7),
        anchor: (15, 6),
        pull: &[
            put('r', 15, 6),
            put('p', 10, 2), put('b', 10, 3), put('t', 10, 4), put('p', 10, 5),
            put('x', 4, 10), put('c', 5, 10), put('z', 6, 10), put('x', 7, 10),
            put('b', 20, 2), put('.', 20, 3), put('.', 20, 4), put('t', 20, 5),
            put('c', 24, 10), put('.', 25, 10), put('.', 26, 10), put('z', 27, 10),
        ],
        release: &[
            put('l', 15, 6),
            put('b', 10, 2), put('.', 10, 3), put('.', 10, 4), put('t', 10, 5),
            put('c', 4, 10), put('.', 5, 10), put('.', 6, 10), put('z', 7, 10),
            put('p', 20, 2), put('b', 20, 3), put('t', 20, 4), put('p', 20, 5),
            put('x', 24, 10), put('c', 25, 10), put('z', 26, 10), put('x', 27, 10),
        ],
    },
    exit: &[put('b', 31, 10), put('.', 31, 11), put('.', 31, 12), put('t', 31, 13)],
};

fn apply(grid: &mut TileGrid, writes: &[TileWrite]) {
    for w in writes {
        grid.set(w.code, w.col, w.row);
    }
}

// ══════════════════════════════════════════════════════════════
// Tile-map loading
// ══════════════════════════════════════════════════════════════

/// Where tile maps come from: an optional directory, then the built-in copies.
#[derive(Clone, Debug)]
pub struct MapSource {
    dir: Option<PathBuf>,
}

impl MapSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        MapSource { dir: Some(dir.into()) }
    }

    /// Built-in maps only.
    #[allow(dead_code)]
    pub fn embedded() -> Self {
        MapSource { dir: None }
    }

    pub fn load(&self, name: &str) -> Result<TileGrid, LoadError> {
        if let Some(path) = self.dir.as_deref().map(|d| d.join(name)).filter(|p| p.is_file()) {
            return load_file(name, &path);
        }
        match embedded_map(name) {
            Some(text) => parse_map(name, text),
            None => Err(LoadError::NotFound { name: name.to_string() }),
        }
    }
}

fn load_file(name: &str, path: &Path) -> Result<TileGrid, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loading tile map {name} from {}", path.display());
    parse_map(name, &text)
}

fn embedded_map(name: &str) -> Option<&'static str> {
    match name {
        "map.txt" => Some(include_str!("../../maps/map.txt")),
        "map2.txt" => Some(include_str!("../../maps/map2.txt")),
        _ => None,
    }
}

/// Parse a tile map. All-or-nothing: any malformed line fails the load.
pub fn parse_map(name: &str, text: &str) -> Result<TileGrid, LoadError> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.starts_with('#'));

    let header = lines
        .next()
        .ok_or_else(|| LoadError::MissingHeader { name: name.to_string() })?;
    let (width, height, tile_w, tile_h) = parse_header(header).ok_or_else(|| LoadError::BadHeader {
        name: name.to_string(),
        line: header.to_string(),
    })?;

    let rows: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();
    if rows.len() != height {
        return Err(LoadError::RowCount { name: name.to_string(), expected: height, found: rows.len() });
    }

    for (r, line) in rows.iter().enumerate() {
        let found = line.chars().count();
        if found != width {
            return Err(LoadError::RowWidth { name: name.to_string(), row: r, expected: width, found });
        }
    }

    let mut grid = TileGrid::filled(width, height, tile_w, tile_h, crate::domain::tile::EMPTY);
    for (r, line) in rows.iter().enumerate() {
        for (c, code) in line.chars().enumerate() {
            grid.set(code, c as i32, r as i32);
        }
    }
    Ok(grid)
}

fn parse_header(line: &str) -> Option<(usize, usize, i32, i32)> {
    let nums: Vec<usize> = line
        .split_whitespace()
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    match nums.as_slice() {
        &[w, h, tw, th] if w > 0 && h > 0 && tw > 0 && th > 0 => {
            let tw = i32::try_from(tw).ok()?;
            let th = i32::try_from(th).ok()?;
            // Cell count and pixel extents must stay in range.
            w.checked_mul(h)?;
            i32::try_from(w).ok()?.checked_mul(tw)?;
            i32::try_from(h).ok()?.checked_mul(th)?;
            Some((w, h, tw, th))
        }
        _ => None,
    }
}

/// Reject maps that don't fit the level's fixed coordinates.
fn validate(def: &LevelDef, grid: &TileGrid) -> Result<(), LoadError> {
    let out = |what: &'static str, col: i32, row: i32| LoadError::OutOfBounds {
        name: def.map.to_string(),
        what,
        col,
        row,
    };

    let spawn = (
        grid.col_at(PLAYER_SPAWN.0 as i32),
        grid.row_at(PLAYER_SPAWN.1 as i32),
    );
    let spawns = std::iter::once(("player spawn", spawn))
        .chain(def.enemies.iter().map(|&p| ("enemy spawn", p)))
        .chain(def.collectibles.iter().map(|&p| ("collectible spawn", p)));
    for (what, (col, row)) in spawns {
        if !grid.valid(col, row) {
            return Err(out(what, col, row));
        }
    }

    let writes = def.lever.pull.iter().map(|w| ("lever tile", w))
        .chain(def.lever.release.iter().map(|w| ("lever tile", w)))
        .chain(def.exit.iter().map(|w| ("exit tile", w)));
    for (what, w) in writes {
        if !grid.valid(w.col, w.row) {
            return Err(out(what, w.col, w.row));
        }
    }

    let (col, row) = def.lever.anchor;
    let found = grid.get(col, row);
    if !grid.valid(col, row) || (found != LEVER_RELEASED && found != LEVER_PULLED) {
        return Err(LoadError::MissingLever { name: def.map.to_string(), col, row, found });
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Level session
// ══════════════════════════════════════════════════════════════

/// Everything alive while one level is being played.
#[derive(Clone, Debug)]
pub struct LevelSession {
    pub level: LevelId,
    pub grid: TileGrid,
    pub player: Entity,
    pub enemies: Vec<Entity>,
    pub collectibles: CollectibleSet,
    pub decorations: Vec<Entity>,
    /// Direction hint shown once the exit is open.
    pub show_hint: bool,
}

impl LevelSession {
    /// Load the level's map and lay out its entities.
    pub fn build(
        level: LevelId,
        maps: &MapSource,
        assets: &Assets,
        rng: &mut impl Rng,
    ) -> Result<Self, LoadError> {
        let def = level.def();
        let grid = maps.load(def.map)?;
        validate(def, &grid)?;

        let tw = grid.tile_width() as f32;
        let th = grid.tile_height() as f32;

        let enemies = def.enemies.iter()
            .map(|&(c, r)| {
                Entity::new(Role::Enemy, assets.alien.clone())
                    .at(c as f32 * tw, r as f32 * th + ENEMY_Y_OFFSET)
                    .moving(ENEMY_SPEED, 0.0)
            })
            .collect();

        let collectibles = CollectibleSet::new(
            def.collectibles.iter()
                .map(|&(c, r)| {
                    let mut dot = Entity::new(Role::Collectible, assets.dot.clone())
                        .at(c as f32 * tw, r as f32 * th + COLLECTIBLE_Y_OFFSET);
                    dot.scale = COLLECTIBLE_SCALE;
                    dot
                })
                .collect(),
        );

        let decorations = (0..CLOUD_COUNT)
            .map(|_| {
                let x = VIEW_WIDTH + (rng.random::<f32>() * CLOUD_SPREAD_X).floor();
                let y = CLOUD_TOP + (rng.random::<f32>() * CLOUD_SPREAD_Y).floor();
                Entity::new(Role::Decoration, assets.cloud.clone())
                    .at(x, y)
                    .moving(CLOUD_SPEED, 0.0)
            })
            .collect();

        let player = Entity::new(Role::Player, assets.bird.clone())
            .at(PLAYER_SPAWN.0, PLAYER_SPAWN.1);

        log::info!(
            "level {} loaded: {}x{} tiles, {} enemies, {} collectibles",
            level.number(), grid.width(), grid.height(),
            def.enemies.len(), def.collectibles.len(),
        );

        Ok(LevelSession {
            level,
            grid,
            player,
            enemies,
            collectibles,
            decorations,
            show_hint: false,
        })
    }

    pub fn hint(&self) -> &'static str {
        self.level.def().hint
    }

    /// Handle a click on tile (col, row). If it hits the lever, flip the
    /// lever's layout and return the new position (`true` = pulled).
    pub fn toggle_lever(&mut self, col: i32, row: i32) -> Option<bool> {
        let lever = &self.level.def().lever;
        if !lever.contains(col, row) {
            return None;
        }
        let pulled = self.grid.get(lever.anchor.0, lever.anchor.1) == LEVER_RELEASED;
        apply(&mut self.grid, if pulled { lever.pull } else { lever.release });
        Some(pulled)
    }

    /// Open the passage to the goal line and show the hint.
    pub fn open_exit(&mut self) {
        apply(&mut self.grid, self.level.def().exit);
        self.show_hint = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn session(level: LevelId) -> LevelSession {
        let mut rng = Pcg32::seed_from_u64(7);
        LevelSession::build(level, &MapSource::embedded(), &Assets::load(), &mut rng)
            .expect("built-in level should load")
    }

    #[test]
    fn parses_header_and_rows() {
        let g = parse_map("t", "# demo\n3 2 16 8\n.w.\ngg.\n").unwrap();
        assert_eq!((g.width(), g.height(), g.tile_width(), g.tile_height()), (3, 2, 16, 8));
        assert_eq!(g.get(1, 0), 'w');
        assert_eq!(g.get(1, 1), 'g');
    }

    #[test]
    fn tolerates_crlf_and_trailing_blank_lines() {
        let g = parse_map("t", "2 1 32 32\r\n.w\r\n\r\n").unwrap();
        assert_eq!(g.get(1, 0), 'w');
    }

    #[test]
    fn rejects_malformed_maps() {
        assert!(matches!(parse_map("t", "# only comments\n"), Err(LoadError::MissingHeader { .. })));
        assert!(matches!(parse_map("t", "3 2 32\n...\n...\n"), Err(LoadError::BadHeader { .. })));
        assert!(matches!(parse_map("t", "3 2 0 32\n...\n...\n"), Err(LoadError::BadHeader { .. })));
        assert!(matches!(
            parse_map("t", "3 2 32 32\n...\n"),
            Err(LoadError::RowCount { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            parse_map("t", "3 2 32 32\n...\n....\n"),
            Err(LoadError::RowWidth { row: 1, found: 4, .. })
        ));
    }

    #[test]
    fn rejects_headers_that_overflow() {
        for header in [
            "18446744073709551615 1 32 32",
            "32 19 2147483647 32",
            "32 19 32 2147483647",
            "2147483648 1 1 1",
        ] {
            let text = format!("{header}\n.\n");
            assert!(
                matches!(parse_map("t", &text), Err(LoadError::BadHeader { .. })),
                "{header}"
            );
        }
    }

    #[test]
    fn row_width_checked_before_allocating() {
        assert!(matches!(
            parse_map("t", "1000000 1 1 1\n...\n"),
            Err(LoadError::RowWidth { row: 0, found: 3, .. })
        ));
    }

    #[test]
    fn unknown_map_is_not_found() {
        assert!(matches!(MapSource::embedded().load("nope.txt"), Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn map_dir_overrides_builtin() {
        let dir = std::env::temp_dir().join(format!("skybird-maps-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("map.txt"), "2 2 32 32\nww\n..\n").unwrap();

        let source = MapSource::new(&dir);
        let g = source.load("map.txt").unwrap();
        assert_eq!((g.width(), g.height()), (2, 2));
        // Not present on disk: falls back to the built-in copy.
        let g2 = source.load("map2.txt").unwrap();
        assert_eq!(g2.width(), 32);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn builtin_levels_lay_out_entities() {
        let s1 = session(LevelId::One);
        assert_eq!(s1.enemies.len(), 6);
        assert_eq!(s1.collectibles.len(), 5);
        assert_eq!(s1.decorations.len(), 3);
        assert_eq!((s1.player.x, s1.player.y), PLAYER_SPAWN);
        assert_eq!((s1.enemies[0].x, s1.enemies[0].y), (26.0 * 32.0, 6.0 * 32.0 + 9.0));
        assert!(s1.enemies.iter().all(|e| e.vx == ENEMY_SPEED && e.role == Role::Enemy));
        let first = s1.collectibles.current().unwrap();
        assert_eq!((first.x, first.y, first.scale), (320.0, 133.0, 3.0));
        assert!(s1.decorations.iter().all(|c| c.x >= VIEW_WIDTH && c.vx < 0.0));
        assert!(!s1.show_hint);

        let s2 = session(LevelId::Two);
        assert_eq!(s2.enemies.len(), 5);
        assert_eq!(s2.collectibles.len(), 5);
        assert_eq!(s2.hint(), "proceed here to end demo ->");
    }

    #[test]
    fn builtin_enemies_start_on_ground() {
        for level in [LevelId::One, LevelId::Two] {
            let mut s = session(level);
            let grid = s.grid.clone();
            for e in &mut s.enemies {
                assert!(!crate::domain::physics::patrol(e, &grid), "{level:?} enemy at {}", e.x);
            }
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a = session(LevelId::One);
        let b = session(LevelId::One);
        let pos = |s: &LevelSession| s.decorations.iter().map(|d| (d.x, d.y)).collect::<Vec<_>>();
        assert_eq!(pos(&a), pos(&b));
    }

    #[test]
    fn lever_flips_between_layouts() {
        let mut s = session(LevelId::One);
        let before = s.grid.clone();
        assert_eq!(s.grid.get(18, 15), LEVER_RELEASED);

        assert_eq!(s.toggle_lever(19, 16), Some(true));
        assert_eq!(s.grid.get(18, 15), LEVER_PULLED);
        assert_eq!(s.grid.get(5, 7), 'b');
        assert_eq!(s.grid.get(20, 8), '.');
        assert_eq!(s.grid.get(20, 9), '.');

        assert_eq!(s.toggle_lever(18, 15), Some(false));
        assert_eq!(s.grid, before);
    }

    #[test]
    fn level_two_lever_moves_both_bridges() {
        let mut s = session(LevelId::Two);
        assert_eq!(s.toggle_lever(16, 7), Some(true));
        assert_eq!(s.grid.get(15, 6), LEVER_PULLED);
        assert_eq!((s.grid.get(5, 10), s.grid.get(6, 10)), ('c', 'z'));
        assert_eq!((s.grid.get(25, 10), s.grid.get(26, 10)), ('.', '.'));
        assert_eq!((s.grid.get(20, 3), s.grid.get(20, 4)), ('.', '.'));
    }

    #[test]
    fn click_outside_hot_zone_ignored() {
        let mut s = session(LevelId::One);
        let before = s.grid.clone();
        assert_eq!(s.toggle_lever(17, 15), None);
        assert_eq!(s.toggle_lever(18, 17), None);
        assert_eq!(s.grid, before);
    }

    #[test]
    fn open_exit_writes_passage() {
        let mut s = session(LevelId::One);
        s.open_exit();
        let col: String = (9..=12).map(|r| s.grid.get(31, r)).collect();
        assert_eq!(col, "b..t");
        assert!(s.show_hint);
    }

    #[test]
    fn map_without_lever_fails_validation() {
        let grid = TileGrid::filled(32, 19, 32, 32, '.');
        assert!(matches!(
            validate(LevelId::One.def(), &grid),
            Err(LoadError::MissingLever { col: 18, row: 15, .. })
        ));
    }

    #[test]
    fn map_too_small_for_spawns_fails_validation() {
        let mut grid = TileGrid::filled(20, 19, 32, 32, '.');
        grid.set('l', 18, 15);
        assert!(matches!(
            validate(LevelId::One.def(), &grid),
            Err(LoadError::OutOfBounds { what: "enemy spawn", col: 26, .. })
        ));
    }
}
