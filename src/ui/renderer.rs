/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One map tile is drawn as two terminal columns on one row. Sprites are
/// placed on the tile under their centre, drawn in render-command order
/// so later ones cover earlier ones.

use std::io::{self, BufWriter, Write};
use std::mem::Discriminant;

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::animation::ImageKey;
use crate::domain::tile::{self, TileGrid};
use crate::sim::level::{LevelId, LevelSession};
use crate::sim::world::{GameState, RenderCommand, Screen, CAMERA_OFFSET};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // occupies 2 terminal columns
    cont: bool,    // right half of a wide char (skip render)
}

impl Cell {
    /// Explicit background for every "empty" cell. Using the same RGB for
    /// `Clear(ClearType::All)` and cell backgrounds keeps VTE terminals from
    /// showing lines between rows.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 48 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Differs from any real cell, so every position gets diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::from_char(c, fg, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Each map tile = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Where the direction hint is drawn, in map pixels.
const HINT_PX: (i32, i32) = (830, 380);

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const TEXT_FG: Color = Color::Rgb { r: 200, g: 200, b: 210 };
const KEY_FG: Color = Color::Rgb { r: 100, g: 200, b: 255 };

/// What's on screen, for clearing the terminal on transitions.
type ScreenKey = (Discriminant<Screen>, Option<LevelId>);

/// Geometry of the last drawn map, for click picking.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct MapView {
    cols: usize,
    rows: usize,
    tile_w: i32,
    tile_h: i32,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<ScreenKey>,
    map: Option<MapView>,
    enhanced_keys: bool,
    /// Shown in the HUD.
    pub gamepad_connected: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            map: None,
            enhanced_keys: false,
            gamepad_connected: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("keyboard enhancement: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, game: &GameState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        let key = (
            std::mem::discriminant(&game.screen),
            game.screen.session().map(|s| s.level),
        );
        if self.last_screen != Some(key) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(key);
        }

        self.compose(game);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Convert a clicked terminal cell to the pixel centre of the map tile
    /// under it. `None` outside the map or when no map is on screen.
    pub fn pick(&self, column: u16, row: u16) -> Option<(i32, i32)> {
        let map = self.map?;
        let col = column as usize / CELL_W;
        let row = (row as usize).checked_sub(MAP_ROW)?;
        if col >= map.cols || row >= map.rows {
            return None;
        }
        Some((
            col as i32 * map.tile_w + map.tile_w / 2,
            row as i32 * map.tile_h + map.tile_h / 2,
        ))
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal
        // default, which may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, game: &GameState) {
        self.front.clear();
        self.map = None;
        match &game.screen {
            Screen::Start => self.compose_start(),
            Screen::Playing(session) => self.compose_playing(session, &game.render_commands()),
            Screen::Failed => self.compose_failed(),
            Screen::End => self.compose_end(),
        }
    }

    fn compose_playing(&mut self, s: &LevelSession, sprites: &[RenderCommand]) {
        let grid = &s.grid;
        self.map = Some(MapView {
            cols: grid.width(),
            rows: grid.height(),
            tile_w: grid.tile_width(),
            tile_h: grid.tile_height(),
        });

        // ── HUD row ──
        let pad = if self.gamepad_connected { "  [pad]" } else { "" };
        let hud = format!(
            " SKYBIRD  Level {}  Dots {}/{}{}",
            s.level.number(), s.collectibles.cursor(), s.collectibles.len(), pad,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        for (gy, cells) in grid.rows().enumerate() {
            let row = MAP_ROW + gy;
            for (gx, &code) in cells.iter().enumerate() {
                let (c0, c1, fg, bg) = tile_glyph(code);
                let col = gx * CELL_W;
                self.front.set(col, row, Cell::from_char(c0, fg, bg));
                self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
            }
        }

        // ── Sprites ──
        for cmd in sprites {
            self.compose_sprite(grid, cmd);
        }

        if s.show_hint {
            let col = (HINT_PX.0 / grid.tile_width()) as usize * CELL_W;
            let row = MAP_ROW + (HINT_PX.1 / grid.tile_height()) as usize;
            self.front.put_str(col, row, s.hint(), TITLE_FG, Color::Reset);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + grid.height() + 1;
        self.front.put_str(
            0, help_row,
            " \u{2191}:Flap  \u{2190}/\u{2192}:Move  Click:Lever  Esc:Quit",
            Color::DarkGrey, Color::Reset,
        );
    }

    fn compose_sprite(&mut self, grid: &TileGrid, cmd: &RenderCommand) {
        let cx = cmd.x - CAMERA_OFFSET.0 + cmd.image.width as f32 * cmd.scale / 2.0;
        let cy = cmd.y - CAMERA_OFFSET.1 + cmd.image.height as f32 * cmd.scale / 2.0;
        let gx = (cx / grid.tile_width() as f32).floor() as i32;
        let gy = (cy / grid.tile_height() as f32).floor() as i32;
        if !grid.valid(gx, gy) {
            return;
        }

        let col = gx as usize * CELL_W;
        let row = MAP_ROW + gy as usize;
        let bg = tile_glyph(grid.get(gx, gy)).3;
        let wide = |glyph| (Cell::from_char_wide(glyph, Color::White, bg), Cell::WIDE_CONT);
        let (left, right) = match cmd.image.key {
            ImageKey::Bird => wide('\u{1F426}'),
            ImageKey::Alien => wide('\u{1F47E}'),
            ImageKey::Cloud => {
                let fg = Color::Rgb { r: 220, g: 220, b: 235 };
                (Cell::from_char('\u{2601}', fg, bg), Cell::from_char(' ', fg, bg))
            }
            ImageKey::Dot => {
                let fg = if cmd.image.frame % 2 == 0 { TITLE_FG } else { Color::Rgb { r: 255, g: 160, b: 40 } };
                (Cell::from_char('\u{25CF}', fg, bg), Cell::from_char(' ', fg, bg))
            }
        };
        self.front.set(col, row, left);
        self.front.set(col + 1, row, right);
    }

    // ── Static screens ──

    fn compose_text_screen(&mut self, title: &str, lines: &[&str], keys: &[&str]) {
        let x = 6;
        self.front.put_str(x, 3, title, TITLE_FG, Color::Reset);
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(x, 5 + i, line, TEXT_FG, Color::Reset);
        }
        let y = 6 + lines.len();
        for (i, line) in keys.iter().enumerate() {
            self.front.put_str(x, y + i, line, KEY_FG, Color::Reset);
        }
    }

    fn compose_start(&mut self) {
        self.compose_text_screen(
            "Welcome to the Skybird demo!",
            &[
                "Control the bird with arrow keys",
                "Collect 5 dots",
                "Click on the switch to open the road",
                "Do not touch the aliens!",
            ],
            &["Press Esc to exit", "Press Space to start the level"],
        );
    }

    fn compose_failed(&mut self) {
        self.compose_text_screen(
            "You died!",
            &[],
            &["Press space bar to restart the level", "Press Esc to exit"],
        );
    }

    fn compose_end(&mut self) {
        self.compose_text_screen("Demo over!", &["Thank you for playing!"], &["Press Esc to exit"]);
    }
}

/// Two glyphs plus colors for one map tile.
fn tile_glyph(code: char) -> (char, char, Color, Color) {
    let wall_fg = Color::Rgb { r: 120, g: 120, b: 130 };
    let wall_bg = Color::Rgb { r: 70, g: 70, b: 80 };
    let gate = Color::Rgb { r: 230, g: 90, b: 60 };
    let bridge = Color::Rgb { r: 180, g: 120, b: 60 };
    let lever = Color::Rgb { r: 240, g: 200, b: 80 };
    match code {
        tile::EMPTY => (' ', ' ', Color::Reset, Color::Reset),
        'w' => ('\u{2588}', '\u{2588}', wall_fg, wall_bg),
        tile::GROUND => ('\u{2580}', '\u{2580}', Color::Rgb { r: 90, g: 200, b: 90 }, Color::Rgb { r: 70, g: 50, b: 30 }),
        'b' => ('\u{2584}', '\u{2584}', gate, Color::Reset),
        't' => ('\u{2580}', '\u{2580}', gate, Color::Reset),
        'p' => ('\u{2551}', '\u{2551}', gate, Color::Reset),
        'c' => ('\u{2560}', '\u{2550}', bridge, Color::Reset),
        'z' => ('\u{2550}', '\u{2563}', bridge, Color::Reset),
        'x' => ('\u{2550}', '\u{2550}', bridge, Color::Reset),
        'l' => ('\u{2572}', '\u{25CB}', lever, Color::Reset),
        'r' => ('\u{25CB}', '\u{2571}', lever, Color::Reset),
        _ => ('\u{2592}', '\u{2592}', wall_fg, Color::Reset),
    }
}
