/// Tile grid: a fixed rectangle of single-character tile codes.
///
/// Coordinates are (col, row) in tile units and may be negative; every
/// query validates first, so out-of-range access reads as empty and writes
/// are dropped. Collision code relies on this to stay branch-free at the
/// edges of the map.
///
/// ## Tile codes
///   '.' = empty (the only non-solid code)
///   'g' = ground (enemies patrol on it)
///   everything else is solid to the player

/// The non-solid sentinel.
pub const EMPTY: char = '.';

/// Enemy patrol surface.
pub const GROUND: char = 'g';

/// Does this code block the player?
#[inline]
pub fn is_solid(code: char) -> bool {
    code != EMPTY
}

/// Can an enemy walk on this code?
#[inline]
pub fn is_ground(code: char) -> bool {
    code == GROUND
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_width: i32,
    tile_height: i32,
    cells: Vec<char>,
}

impl TileGrid {
    /// A grid of `width × height` tiles, all set to `code`.
    pub fn filled(width: usize, height: usize, tile_width: i32, tile_height: i32, code: char) -> Self {
        TileGrid {
            width,
            height,
            tile_width,
            tile_height,
            cells: vec![code; width * height],
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn tile_width(&self) -> i32 { self.tile_width }
    pub fn tile_height(&self) -> i32 { self.tile_height }

    /// Total width in pixels. Crossing it is the goal line.
    pub fn pixel_width(&self) -> i32 {
        self.width as i32 * self.tile_width
    }

    #[allow(dead_code)]
    pub fn pixel_height(&self) -> i32 {
        self.height as i32 * self.tile_height
    }

    /// Is (col, row) inside `[0, width) × [0, height)`?
    #[inline]
    pub fn valid(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    /// Tile code at (col, row); `EMPTY` when out of range.
    #[inline]
    pub fn get(&self, col: i32, row: i32) -> char {
        if self.valid(col, row) {
            self.cells[row as usize * self.width + col as usize]
        } else {
            EMPTY
        }
    }

    /// Overwrite (col, row) with `code`. Out of range is a no-op.
    #[inline]
    pub fn set(&mut self, code: char, col: i32, row: i32) {
        if self.valid(col, row) {
            self.cells[row as usize * self.width + col as usize] = code;
        }
    }

    /// Tile column containing pixel x (truncating division).
    #[inline]
    pub fn col_at(&self, px: i32) -> i32 {
        px / self.tile_width
    }

    /// Tile row containing pixel y (truncating division).
    #[inline]
    pub fn row_at(&self, py: i32) -> i32 {
        py / self.tile_height
    }

    /// Rows top to bottom, for rendering.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.cells.chunks(self.width.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn set_then_get() {
        let mut g = TileGrid::filled(4, 3, 32, 32, EMPTY);
        g.set('w', 3, 2);
        assert_eq!(g.get(3, 2), 'w');
        assert_eq!(g.get(2, 2), EMPTY);
        assert_eq!(g.pixel_width(), 128);
        assert_eq!(g.pixel_height(), 96);
    }

    #[test]
    fn out_of_range_set_is_noop() {
        let mut g = TileGrid::filled(2, 2, 32, 32, EMPTY);
        let before = g.clone();
        g.set('w', -1, 0);
        g.set('w', 2, 0);
        g.set('w', 0, 2);
        assert_eq!(g, before);
    }

    #[test]
    fn solidity_convention() {
        assert!(!is_solid('.'));
        assert!(is_solid('w'));
        assert!(is_solid('g'));
        assert!(is_ground('g'));
        assert!(!is_ground('w'));
        assert!(!is_ground('.'));
    }

    #[test]
    fn pixel_to_cell_truncates() {
        let g = TileGrid::filled(4, 4, 32, 16, EMPTY);
        assert_eq!(g.col_at(63), 1);
        assert_eq!(g.col_at(64), 2);
        assert_eq!(g.row_at(31), 1);
        // Truncation toward zero: small negatives land in column 0.
        assert_eq!(g.col_at(-5), 0);
        assert_eq!(g.col_at(-40), -1);
    }

    #[test]
    fn rows_iterate_top_to_bottom() {
        let mut g = TileGrid::filled(3, 2, 32, 32, EMPTY);
        g.set('w', 1, 1);
        let rows: Vec<String> = g.rows().map(|r| r.iter().collect()).collect();
        assert_eq!(rows, vec!["...".to_string(), ".w.".to_string()]);
    }

    proptest! {
        #[test]
        fn outside_is_invalid_and_empty(
            w in 1usize..12,
            h in 1usize..12,
            col in -50i32..50,
            row in -50i32..50,
        ) {
            let g = TileGrid::filled(w, h, 32, 32, 'w');
            let inside = col >= 0 && row >= 0 && (col as usize) < w && (row as usize) < h;
            prop_assert_eq!(g.valid(col, row), inside);
            if !inside {
                prop_assert_eq!(g.get(col, row), EMPTY);
            } else {
                prop_assert_eq!(g.get(col, row), 'w');
            }
        }
    }
}
