/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One tile is drawn as two terminal columns. The camera works in world
/// units, so each screen cell samples the world at its own centre.

use std::io::{self, BufWriter, Write};

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

use crate::domain::geometry::Vec2;
use crate::domain::grid::{OutOfRows, TileGrid};
use crate::domain::tile::{Layer, TileCoord};
use crate::sim::level::{BLOCK, BRICK, GROUND, SPIKES};
use crate::sim::world::{Ending, LossCause, Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16],  // up to 16 bytes (supports ZWJ emoji sequences)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, also used for
    /// `Clear(ClearType::All)` so row gaps match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Viewport: screen cells ↔ world positions ──

/// Tile-sized screen cells laid over the camera rectangle, top row first.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    /// World position of the view's bottom-left corner.
    origin: Vec2,
    tile: Vec2,
    cols: usize,
    rows: usize,
}

impl Viewport {
    /// World point at the centre of screen cell (vx, vy).
    fn world_point(&self, vx: usize, vy: usize) -> Vec2 {
        Vec2::new(
            self.origin.x + (vx as f32 + 0.5) * self.tile.x,
            self.origin.y + (self.rows as f32 - vy as f32 - 0.5) * self.tile.y,
        )
    }

    /// Screen cell containing world point `p`, if visible.
    fn screen_of(&self, p: Vec2) -> Option<(usize, usize)> {
        let fx = ((p.x - self.origin.x) / self.tile.x).floor();
        let fy = (self.rows as f32 - (p.y - self.origin.y) / self.tile.y).floor();
        if fx < 0.0 || fy < 0.0 || fx >= self.cols as f32 || fy >= self.rows as f32 {
            return None;
        }
        Some((fx as usize, fy as usize))
    }
}

// ── Renderer ──

/// Each tile = 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, gap + banner + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const SKY_BG: Color = Color::Rgb { r: 28, g: 36, b: 64 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns true when the
    /// terminal will report key releases.
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

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
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

    /// Terminal width in columns, as of the last init or render.
    pub fn term_width(&self) -> u16 {
        self.term_w as u16
    }

    /// Size the camera to the terminal: `cols / CELL_W` tiles wide and the
    /// rows left after the HUD and help lines, in world units.
    pub fn fit_camera(&mut self, world: &mut WorldState) {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        let (cols, rows) = view_cells(self.term_w, self.term_h);
        let tile = world.grid.tile_size();
        world.camera.view_size = Vec2::new(cols as f32 * tile.x, rows as f32 * tile.y);
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        // Detect terminal resize
        self.fit_camera(world);
        if self.front.width != self.term_w || self.front.height != self.term_h {
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        world.camera.follow(world.actor.position, world.grid.pixel_size());

        // Build front buffer
        self.front.clear();
        let view = self.viewport(world);
        self.compose_hud(world);
        self.compose_map(world, &view);
        if let Phase::GameOver(ending) = world.phase {
            self.compose_banner(ending, &view);
        }
        self.compose_help(&view);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn viewport(&self, world: &WorldState) -> Viewport {
        let (cols, rows) = view_cells(self.term_w, self.term_h);
        Viewport {
            origin: world.camera.origin(),
            tile: world.grid.tile_size(),
            cols,
            rows,
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide emoji)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
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
                    // Wide char printed: cursor advanced 2 columns
                    last_x = x + 1;
                    x += 2; // skip the continuation cell
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

    fn compose_hud(&mut self, w: &WorldState) {
        let a = &w.actor;
        let hud = format!(
            " {}   x:{:>5.0}/{:<5.0}  vx:{:>4.0}  vy:{:>5.0}  {}",
            w.level_name,
            a.position.x, w.finish_x,
            a.velocity.x, a.velocity.y,
            if a.is_on_ground { "▁ ground" } else { "↑ air" },
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_map(&mut self, w: &WorldState, view: &Viewport) {
        let finish_cell = view
            .screen_of(Vec2::new(w.finish_x, view.origin.y + view.tile.y * 0.5))
            .map(|(vx, _)| vx);

        for vy in 0..view.rows {
            let row = MAP_ROW + vy;
            if row >= self.front.height { break; }
            for vx in 0..view.cols {
                let col = vx * CELL_W;
                if col + 1 >= self.front.width { break; }
                let coord = w.grid.grid_of(view.world_point(vx, vy));
                let (c0, c1, fg, bg) = tile_glyph(&w.grid, coord, finish_cell == Some(vx));
                self.front.set(col, row, Cell::from_char(c0, fg, bg));
                self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
            }
        }

        // Player: koala emoji in the cell holding its centre
        if let Some((vx, vy)) = view.screen_of(w.actor.position) {
            let (col, row) = (vx * CELL_W, MAP_ROW + vy);
            if col + 1 < self.front.width {
                let ch = match w.phase {
                    Phase::GameOver(Ending::Lost(_)) => '💀',
                    _ => '🐨',
                };
                self.front.set(col, row, Cell::from_char_wide(ch, Color::Reset, SKY_BG));
                self.front.set(col + 1, row, Cell::WIDE_CONT);
            }
        }
    }

    fn compose_banner(&mut self, ending: Ending, view: &Viewport) {
        let (title, detail, color) = match ending {
            Ending::Won => ("You Won!", "Level cleared", Color::Rgb { r: 255, g: 220, b: 50 }),
            Ending::Lost(LossCause::Hazard) => {
                ("You have died!", "Spiked", Color::Rgb { r: 255, g: 60, b: 60 })
            }
            Ending::Lost(LossCause::FellThrough) => {
                ("You have died!", "Fell into a pit", Color::Rgb { r: 255, g: 60, b: 60 })
            }
        };
        let box_bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let lines = [
            format!("╔{}╗", "═".repeat(30)),
            format!("║{:^30}║", title),
            format!("║{:^30}║", detail),
            format!("║{:^30}║", "R: Play again   Q: Quit"),
            format!("╚{}╝", "═".repeat(30)),
        ];
        let view_cols = view.cols * CELL_W;
        let box_x = view_cols.saturating_sub(32) / 2;
        let box_y = MAP_ROW + view.rows.saturating_sub(lines.len()) / 2;
        for (i, l) in lines.iter().enumerate() {
            self.front.put_str(box_x, box_y + i, l, color, box_bg);
        }
    }

    fn compose_help(&mut self, view: &Viewport) {
        let help_row = MAP_ROW + view.rows + 1;
        if help_row < self.front.height {
            let help = " →/D:Run  Space/↑:Jump  R:Restart  Q:Quit  │  Touch: left=run right=jump";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }
}

/// Map viewport size in tiles for a terminal of `term_w` × `term_h`.
fn view_cells(term_w: usize, term_h: usize) -> (usize, usize) {
    let cols = (term_w / CELL_W).max(1);
    let rows = term_h.saturating_sub(RESERVED_ROWS).max(1);
    (cols, rows)
}

/// Glyph pair and colours for one grid cell. Rows above the level are sky,
/// rows below and columns outside it are void.
fn tile_glyph(grid: &TileGrid, coord: TileCoord, finish: bool) -> (char, char, Color, Color) {
    let inside = coord.col >= 0 && (coord.col as usize) < grid.width();
    let solid = grid.tile_id_at(Layer::Solid, coord);
    let hazard = grid.tile_id_at(Layer::Hazard, coord);
    match (solid, hazard) {
        (Ok(s), _) if inside && s == GROUND => ('█', '█', Color::Rgb { r: 150, g: 100, b: 50 }, Color::Rgb { r: 90, g: 60, b: 30 }),
        (Ok(s), _) if inside && s == BRICK => ('▓', '▓', Color::Rgb { r: 200, g: 90, b: 50 }, Color::Rgb { r: 110, g: 45, b: 25 }),
        (Ok(s), _) if inside && s == BLOCK => ('[', ']', Color::Rgb { r: 255, g: 200, b: 60 }, Color::Rgb { r: 140, g: 100, b: 20 }),
        (Ok(s), _) if inside && !s.is_empty() => ('▒', '▒', Color::Grey, Color::DarkGrey),
        (_, Ok(h)) if inside && h == SPIKES => ('▲', '▲', Color::Rgb { r: 230, g: 230, b: 240 }, SKY_BG),
        (Ok(_), Ok(_)) if inside && finish => ('┊', ' ', Color::Rgb { r: 80, g: 255, b: 80 }, SKY_BG),
        (Ok(_), Ok(_)) if inside => (' ', ' ', Color::Reset, SKY_BG),
        (Err(OutOfRows::Above), _) if inside => (' ', ' ', Color::Reset, SKY_BG),
        _ => (' ', ' ', Color::Reset, Color::Reset),
    }
}
