/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// The simulation runs in float pixel space; this module owns the mapping
/// to terminal cells. One cell covers 4x8 world pixels, so the 320x240
/// logical viewport fills an 80x30 cell grid. Sprites are authored directly
/// in cells: sprite row r, column c lands at cell (base + c, base + r).

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use rand::Rng;

use crate::domain::animation::Sprite;
use crate::domain::physics::{Rect, Vec2};
use crate::domain::tile::TileKind;
use crate::sim::world::{WorldState, VIEW_H, VIEW_W};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based Linux terminals the inter-row gap pixels use the
    /// background color from the last Clear. Using the SAME explicit RGB
    /// for the Clear and every cell keeps the gaps invisible.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 28 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '\0',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
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
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Layout ──

/// World pixels covered by one terminal cell.
const PX_PER_COL: f32 = 4.0;
const PX_PER_ROW: f32 = 8.0;

const MAP_COLS: usize = (VIEW_W / PX_PER_COL) as usize; // 80
const MAP_ROWS: usize = (VIEW_H / PX_PER_ROW) as usize; // 30

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_FG: Color = Color::Black;
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const SPARK_FG: Color = Color::Rgb { r: 255, g: 230, b: 150 };

/// Foreground tone used by menu/login screens.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Highlight,
    Error,
    Dim,
}

/// A static full-screen text page (login, account menu).
pub struct TextScreen {
    pub title: String,
    pub lines: Vec<(Tone, String)>,
    pub footer: String,
}

/// Mirror a character when a sprite is drawn facing left.
fn mirror_char(c: char) -> char {
    match c {
        '/' => '\\',
        '\\' => '/',
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        other => other,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Game,
    Screen,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Frame counter for blinking UI elements.
    frame: u32,
    last_mode: Option<Mode>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            frame: 0,
            last_mode: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Handle terminal resize and mode switches; both force a full repaint.
    fn begin_frame(&mut self, mode: Mode) -> io::Result<()> {
        self.frame = self.frame.wrapping_add(1);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        if resized {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
        }
        if resized || self.last_mode != Some(mode) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_mode = Some(mode);
        }
        self.front.clear();
        Ok(())
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        self.begin_frame(Mode::Game)?;

        // Screenshake jitters the render scroll, never the simulation.
        let shake = world.screenshake;
        let scroll = if shake > 0.0 {
            Vec2::new(
                world.scroll.x + world.rng.gen::<f32>() * shake - shake / 2.0,
                world.scroll.y + world.rng.gen::<f32>() * shake - shake / 2.0,
            )
        } else {
            world.scroll
        };

        self.compose_hud(world);
        self.compose_map(world, scroll);
        self.compose_mask(world);
        if world.paused {
            self.compose_pause_overlay();
        }
        self.compose_message(world);
        self.compose_help();

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Draw a static text page (login and account screens).
    pub fn render_screen(&mut self, screen: &TextScreen) -> io::Result<()> {
        self.begin_frame(Mode::Screen)?;

        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        self.front.put_str(4, 2, &screen.title, gold, Cell::BASE_BG);
        let underline: String = screen.title.chars().map(|_| '─').collect();
        self.front.put_str(4, 3, &underline, gold, Cell::BASE_BG);

        for (i, (tone, line)) in screen.lines.iter().enumerate() {
            let row = 5 + i;
            if row >= self.front.height {
                break;
            }
            let fg = match tone {
                Tone::Normal => Color::White,
                Tone::Highlight => Color::Rgb { r: 80, g: 255, b: 80 },
                Tone::Error => Color::Rgb { r: 255, g: 90, b: 90 },
                Tone::Dim => Color::DarkGrey,
            };
            self.front.put_str(4, row, line, fg, Cell::BASE_BG);
        }

        let footer_row = self.front.height.saturating_sub(2);
        if footer_row > 4 {
            self.front
                .put_str(4, footer_row, &screen.footer, Color::DarkGrey, Cell::BASE_BG);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here; it resets to the terminal's
        // native default, which may differ from BASE_BG and cause artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell == prev {
                    need_move = true;
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

                let mut buf = [0u8; 4];
                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut buf)))?;

                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Map composition ──

    /// Place a character at map cell (cx, cy), keeping whatever background
    /// is already there so sprites layer over tiles cleanly.
    fn set_map_cell(&mut self, cx: i32, cy: i32, ch: char, fg: Color) {
        if cx < 0 || cy < 0 || cx >= MAP_COLS as i32 || cy >= MAP_ROWS as i32 {
            return;
        }
        let x = cx as usize;
        let y = MAP_ROW + cy as usize;
        let bg = self.front.get(x, y).bg;
        self.front.set(x, y, Cell::new(ch, fg, bg));
    }

    /// Blit a sprite with its top-left corner at a world position.
    /// Space is transparent; `flip` mirrors columns and glyphs.
    fn blit(&mut self, sprite: &Sprite, pos: Vec2, flip: bool, scroll: Vec2) {
        let base_x = ((pos.x - scroll.x) / PX_PER_COL).floor() as i32;
        let base_y = ((pos.y - scroll.y) / PX_PER_ROW).floor() as i32;
        let fg = Color::Rgb {
            r: sprite.fg.0,
            g: sprite.fg.1,
            b: sprite.fg.2,
        };
        let width = sprite.width() as i32;
        for (r, row) in sprite.rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let (cx, ch) = if flip {
                    (base_x + width - 1 - c as i32, mirror_char(ch))
                } else {
                    (base_x + c as i32, ch)
                };
                self.set_map_cell(cx, base_y + r as i32, ch, fg);
            }
        }
    }

    /// One-cell-offset dark copy of an actor sprite, drawn before the
    /// sprite itself.
    fn blit_silhouette(&mut self, body: &crate::domain::physics::Body, scroll: Vec2) {
        const SHADOW: Color = Color::Rgb { r: 8, g: 8, b: 14 };
        let sprite = body.animation.current();
        let pos = Vec2::new(
            body.pos.x + body.anim_offset.x + PX_PER_COL,
            body.pos.y + body.anim_offset.y + PX_PER_ROW,
        );
        let base_x = ((pos.x - scroll.x) / PX_PER_COL).floor() as i32;
        let base_y = ((pos.y - scroll.y) / PX_PER_ROW).floor() as i32;
        let width = sprite.width() as i32;
        for (r, row) in sprite.rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let cx = if body.flip {
                    base_x + width - 1 - c as i32
                } else {
                    base_x + c as i32
                };
                self.set_map_cell(cx, base_y + r as i32, '░', SHADOW);
            }
        }
    }

    /// Solid tiles get a filled background so platforms read as mass.
    fn tile_bg(kind: TileKind) -> Color {
        match kind {
            TileKind::Grass => Color::Rgb { r: 28, g: 48, b: 24 },
            TileKind::Stone => Color::Rgb { r: 44, g: 44, b: 52 },
            _ => Cell::BASE_BG,
        }
    }

    fn blit_tile(&mut self, sprite: &Sprite, kind: TileKind, pos: Vec2, scroll: Vec2) {
        let base_x = ((pos.x - scroll.x) / PX_PER_COL).floor() as i32;
        let base_y = ((pos.y - scroll.y) / PX_PER_ROW).floor() as i32;
        let fg = Color::Rgb {
            r: sprite.fg.0,
            g: sprite.fg.1,
            b: sprite.fg.2,
        };
        let bg = Self::tile_bg(kind);
        for (r, row) in sprite.rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                let cx = base_x + c as i32;
                let cy = base_y + r as i32;
                if cx < 0 || cy < 0 || cx >= MAP_COLS as i32 || cy >= MAP_ROWS as i32 {
                    continue;
                }
                self.front
                    .set(cx as usize, MAP_ROW + cy as usize, Cell::new(ch, fg, bg));
            }
        }
    }

    fn compose_map(&mut self, w: &WorldState, scroll: Vec2) {
        // Back-to-front: decor, tiles, pickups, particles, sparks,
        // projectiles, then the actors on top.

        for tile in w.tilemap.offgrid_tiles() {
            if let Some(sprite) = w.assets.tile_sprite(tile.kind, tile.variant) {
                self.blit(sprite, tile.pos, false, scroll);
            }
        }

        let view = Rect::new(scroll.x, scroll.y, VIEW_W, VIEW_H);
        for (pos, tile) in w.tilemap.visible_tiles(view) {
            if let Some(sprite) = w.assets.tile_sprite(tile.kind, tile.variant) {
                self.blit_tile(sprite, tile.kind, pos, scroll);
            }
        }

        for pickup in &w.pickups {
            let sprite = w.assets.pickup_sprite(pickup.kind);
            self.blit(sprite, pickup.pos, false, scroll);
        }

        for particle in &w.particles {
            let sprite = particle.animation.current();
            let ch = sprite.rows[0].chars().next().unwrap_or('.');
            let fg = Color::Rgb {
                r: sprite.fg.0,
                g: sprite.fg.1,
                b: sprite.fg.2,
            };
            let pos = particle.pos;
            let cx = ((pos.x - scroll.x) / PX_PER_COL).floor() as i32;
            let cy = ((pos.y - scroll.y) / PX_PER_ROW).floor() as i32;
            self.set_map_cell(cx, cy, ch, fg);
        }

        for spark in &w.sparks {
            let (dx, dy) = (spark.angle.cos(), spark.angle.sin());
            let ch = if dx.abs() > dy.abs() * 2.0 {
                '-'
            } else if dy.abs() > dx.abs() * 2.0 {
                '|'
            } else if dx * dy > 0.0 {
                '\\'
            } else {
                '/'
            };
            let cx = ((spark.pos.x - scroll.x) / PX_PER_COL).floor() as i32;
            let cy = ((spark.pos.y - scroll.y) / PX_PER_ROW).floor() as i32;
            self.set_map_cell(cx, cy, ch, SPARK_FG);
        }

        for projectile in &w.projectiles {
            let sprite = w.assets.projectile_sprite(projectile.owner);
            let flip = projectile.dx < 0.0;
            self.blit(sprite, projectile.pos, flip, scroll);
        }

        // Silhouette pass: a dark offset copy under each actor so the
        // sprites read against busy tile art.
        for enemy in &w.enemies {
            self.blit_silhouette(&enemy.body, scroll);
        }
        if let Some(boss) = &w.boss {
            self.blit_silhouette(&boss.body, scroll);
        }
        if w.player.visible() && w.dead == 0 {
            self.blit_silhouette(&w.player.body, scroll);
        }

        for enemy in &w.enemies {
            let draw_pos = Vec2::new(
                enemy.body.pos.x + enemy.body.anim_offset.x,
                enemy.body.pos.y + enemy.body.anim_offset.y,
            );
            self.blit(enemy.body.animation.current(), draw_pos, enemy.body.flip, scroll);
        }

        if let Some(boss) = &w.boss {
            let draw_pos = Vec2::new(
                boss.body.pos.x + boss.body.anim_offset.x,
                boss.body.pos.y + boss.body.anim_offset.y,
            );
            self.blit(boss.body.animation.current(), draw_pos, boss.body.flip, scroll);
        }

        // The player vanishes for the core of the dash (speed blur) and
        // stays hidden after death (the sparks are the body).
        if w.player.visible() && w.dead == 0 {
            let draw_pos = Vec2::new(
                w.player.body.pos.x + w.player.body.anim_offset.x,
                w.player.body.pos.y + w.player.body.anim_offset.y,
            );
            let body = &w.player.body;
            self.blit(body.animation.current(), draw_pos, body.flip, scroll);
        }
    }

    // ── Circular transition mask ──

    /// Level fades run as a shrinking/growing circle of visibility around
    /// the viewport center. Radius 0 is full black, 240px covers the view.
    fn compose_mask(&mut self, w: &WorldState) {
        let radius = if w.transition != 0 {
            (30 - w.transition.abs()).max(0) as f32 * 8.0
        } else if w.dead >= 10 {
            (40_i32 - w.dead.min(40) as i32).max(0) as f32 * 8.0
        } else {
            return;
        };

        let center = Vec2::new(VIEW_W / 2.0, VIEW_H / 2.0);
        for cy in 0..MAP_ROWS {
            for cx in 0..MAP_COLS {
                let px = cx as f32 * PX_PER_COL + PX_PER_COL / 2.0;
                let py = cy as f32 * PX_PER_ROW + PX_PER_ROW / 2.0;
                if Vec2::new(px, py).distance(center) > radius {
                    self.front.set(cx, MAP_ROW + cy, Cell::BLANK);
                }
            }
        }
    }

    // ── Chrome ──

    fn compose_hud(&mut self, w: &WorldState) {
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }

        let health = w.player.max_hits().saturating_sub(w.player.hits);
        let hearts: String = std::iter::repeat('♥').take(health as usize).collect();
        let lost: String = std::iter::repeat('·')
            .take(w.player.hits.min(w.player.max_hits()) as usize)
            .collect();
        let cd = if w.player.kunai_cooldown > 0 { "~" } else { " " };
        let hud = format!(
            " Stage {:<2} {}{}  *x{:<2} !x{:<2}{}",
            w.level + 1,
            hearts,
            lost,
            w.player.shuriken_count,
            w.player.kunai_count,
            cd,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        if let Some(boss) = &w.boss {
            let filled = boss.hp as usize;
            let empty = (boss.max_hp() - boss.hp) as usize;
            let bar: String = std::iter::repeat('█')
                .take(filled)
                .chain(std::iter::repeat('░').take(empty))
                .collect();
            let label = format!("BOSS {bar} ");
            let x = self.front.width.saturating_sub(label.chars().count() + 1);
            self.front.put_str(
                x,
                HUD_ROW,
                &label,
                Color::Rgb { r: 230, g: 100, b: 230 },
                HUD_BG,
            );
        }
    }

    fn compose_message(&mut self, w: &WorldState) {
        let msg_row = MAP_ROW + MAP_ROWS;
        if msg_row >= self.front.height || w.message.is_empty() {
            return;
        }
        let msg = format!(" ◈ {} ", w.message);
        for x in 0..self.front.width {
            self.front.set(x, msg_row, Cell::new(' ', MSG_FG, MSG_BG));
        }
        self.front.put_str(0, msg_row, &msg, MSG_FG, MSG_BG);
    }

    fn compose_help(&mut self) {
        let help_row = MAP_ROW + MAP_ROWS + 1;
        if help_row >= self.front.height {
            return;
        }
        let help = " A/D:Move  W/Space:Jump  X:Dash  Z:Throw  C:Strike  R:Retry  ESC:Pause";
        self.front
            .put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_pause_overlay(&mut self) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        let blink = (self.frame / 8) % 2 == 0;

        let box_w = 26_usize;
        let box_h = 8_usize;
        let box_x = MAP_COLS.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + MAP_ROWS.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::Reset, dim));
            }
        }

        let label = if blink { "║  ▶  PAUSED  ◀  ║" } else { "║     PAUSED     ║" };
        self.front.put_str(box_x + 4, box_y + 1, "╔════════════════╗", hdr, dim);
        self.front.put_str(box_x + 4, box_y + 2, label, hdr, dim);
        self.front.put_str(box_x + 4, box_y + 3, "╚════════════════╝", hdr, dim);
        self.front.put_str(box_x + 3, box_y + 5, "ESC     Resume", key_c, dim);
        self.front.put_str(box_x + 3, box_y + 6, "Ctrl+C  Quit", key_c, dim);
    }
}
