use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use particle_text::{PixelCanvas, Rgb, Surface};
use std::io::{self, Write};

/// Rows kept free at the bottom for the status line.
const STATUS_ROWS: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

/// Row-major grid of styled cells for one terminal frame.
pub(crate) struct CellBuffer {
    w: u16,
    h: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16, bg: Color) -> Self {
        let blank = Cell {
            ch: ' ',
            fg: Color::White,
            bg,
        };
        Self {
            w,
            h,
            cells: vec![blank; w as usize * h as usize],
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[y as usize * self.w as usize + x as usize])
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            self.cells[y as usize * self.w as usize + x as usize] = c;
        }
    }

    fn row(&self, y: u16) -> &[Cell] {
        let start = y as usize * self.w as usize;
        &self.cells[start..start + self.w as usize]
    }

    pub(crate) fn fill(&mut self, bg: Color) {
        self.cells.fill(Cell {
            ch: ' ',
            fg: Color::White,
            bg,
        });
    }

    /// Writes `s` from column `x`, cut off at the right edge.
    pub(crate) fn put_str(&mut self, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
        for (col, ch) in (x..self.w).zip(s.chars()) {
            self.set(col, y, Cell { ch, fg, bg });
        }
    }
}

/// Where the pixel canvas sits in the terminal, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) origin_col: u16,
    pub(crate) origin_row: u16,
    pub(crate) canvas_w: u32,
    pub(crate) canvas_h: u32,
}

impl Layout {
    /// Braille gives 2×4 dots per cell; the canvas is centered when it fits.
    pub(crate) fn compute(cols: u16, rows: u16, want_w: Option<u32>, want_h: Option<u32>) -> Self {
        let usable_rows = rows.saturating_sub(STATUS_ROWS);
        let canvas_w = want_w.unwrap_or(cols as u32 * 2);
        let canvas_h = want_h.unwrap_or(usable_rows as u32 * 4);
        let cells_w = canvas_w.div_ceil(2);
        let cells_h = canvas_h.div_ceil(4);
        let origin_col = (cols as u32).saturating_sub(cells_w) / 2;
        let origin_row = (usable_rows as u32).saturating_sub(cells_h) / 2;
        Self {
            origin_col: origin_col as u16,
            origin_row: origin_row as u16,
            canvas_w,
            canvas_h,
        }
    }

    pub(crate) fn is_drawable(&self) -> bool {
        self.canvas_w > 0 && self.canvas_h > 0
    }

    /// Canvas position of the center of a terminal cell.
    pub(crate) fn cell_to_canvas(&self, col: u16, row: u16) -> Option<(f32, f32)> {
        let dc = col.checked_sub(self.origin_col)? as u32;
        let dr = row.checked_sub(self.origin_row)? as u32;
        let x = dc * 2 + 1;
        let y = dr * 4 + 2;
        (x < self.canvas_w && y < self.canvas_h).then_some((x as f32, y as f32))
    }
}

/// Owns the terminal modes for the lifetime of the animation. The modes are
/// restored when this is dropped, including when `enter` itself fails.
pub(crate) struct Terminal<W: Write = io::Stdout> {
    out: W,
    rows: u16,
    shown: CellBuffer,
    frame: CellBuffer,
    canvas: Option<PixelCanvas>,
    layout: Layout,
    want: (Option<u32>, Option<u32>),
    bg: Color,
    active: bool,
}

impl Terminal {
    pub(crate) fn begin(want_w: Option<u32>, want_h: Option<u32>, background: Rgb) -> Result<Self> {
        let (cols, rows) = terminal::size().context("failed to query terminal size")?;
        let mut term = Self::with_writer(io::stdout(), cols, rows, (want_w, want_h), background);
        term.enter()?;
        log::info!(
            "terminal {cols}x{rows}, canvas {}x{}",
            term.layout.canvas_w,
            term.layout.canvas_h
        );
        Ok(term)
    }
}

impl<W: Write> Terminal<W> {
    pub(crate) fn with_writer(
        out: W,
        cols: u16,
        rows: u16,
        want: (Option<u32>, Option<u32>),
        background: Rgb,
    ) -> Self {
        let bg = to_color(background);
        let layout = Layout::compute(cols, rows, want.0, want.1);
        Self {
            out,
            rows,
            shown: CellBuffer::new(cols, rows, bg),
            frame: CellBuffer::new(cols, rows, bg),
            canvas: layout
                .is_drawable()
                .then(|| PixelCanvas::new(layout.canvas_w, layout.canvas_h)),
            layout,
            want,
            bg,
            active: false,
        }
    }

    /// Switches the terminal into animation mode. Armed before the first
    /// write, so a failure part-way still gets undone on drop.
    pub(crate) fn enter(&mut self) -> Result<()> {
        self.active = true;
        execute!(
            self.out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            Clear(ClearType::All)
        )
        .context("failed to set up the terminal")?;
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        Ok(())
    }

    pub(crate) fn end(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        // raw mode goes first: it is the state that leaves a shell unusable
        let raw = terminal::disable_raw_mode();
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            DisableFocusChange,
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        raw?;
        Ok(())
    }

    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }

    /// `None` while the terminal has no room for a canvas.
    pub(crate) fn canvas_mut(&mut self) -> Option<&mut PixelCanvas> {
        self.canvas.as_mut()
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) -> Option<(u32, u32)> {
        self.rows = rows;
        self.shown = CellBuffer::new(cols, rows, self.bg);
        self.frame = CellBuffer::new(cols, rows, self.bg);
        self.layout = Layout::compute(cols, rows, self.want.0, self.want.1);
        if !self.layout.is_drawable() {
            log::debug!("terminal {cols}x{rows} too small, canvas released");
            self.canvas = None;
            return None;
        }
        let size = (self.layout.canvas_w, self.layout.canvas_h);
        if self.canvas.as_ref().map(|c| (c.width(), c.height())) != Some(size) {
            self.canvas = Some(PixelCanvas::new(size.0, size.1));
        }
        // the emulator wiped the screen; repaint everything next present
        self.shown.fill(Color::Reset);
        Some(size)
    }

    pub(crate) fn compose(&mut self, status: Option<&str>) {
        self.frame.fill(self.bg);
        if let Some(canvas) = &self.canvas {
            canvas_to_cells(canvas, &mut self.frame, self.layout, self.bg);
        }
        if let Some(s) = status {
            let y = self.rows.saturating_sub(1);
            self.frame.put_str(1, y, s, Color::DarkGrey, self.bg);
        }
    }

    /// Writes only the runs of cells that changed since the last present.
    pub(crate) fn present(&mut self) -> Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        let mut style: Option<(Color, Color)> = None;
        let mut run = String::new();

        for y in 0..self.rows {
            let (old, new) = (self.shown.row(y), self.frame.row(y));
            let mut x = 0;
            while x < new.len() {
                if old[x] == new[x] {
                    x += 1;
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x as u16, y))?;
                while x < new.len() && old[x] != new[x] {
                    let c = new[x];
                    if style != Some((c.fg, c.bg)) {
                        if !run.is_empty() {
                            queue!(self.out, Print(&run))?;
                            run.clear();
                        }
                        queue!(self.out, SetForegroundColor(c.fg), SetBackgroundColor(c.bg))?;
                        style = Some((c.fg, c.bg));
                    }
                    run.push(c.ch);
                    x += 1;
                }
                queue!(self.out, Print(&run))?;
                run.clear();
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        std::mem::swap(&mut self.shown, &mut self.frame);
        Ok(())
    }
}

impl<W: Write> Drop for Terminal<W> {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            log::warn!("failed to restore terminal: {e:#}");
        }
    }
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Braille dot bits indexed by `[dx][dy]` inside a 2×4 cell (U+2800 block).
const BRAILLE_DOTS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Packs the canvas into braille cells tinted with the mean ink colour.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, layout: Layout, bg: Color) {
    let cols = canvas.width().div_ceil(2);
    let rows = canvas.height().div_ceil(4);

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let mut sum = [0u32; 3];
            let mut ink: u32 = 0;

            for (dx, column) in BRAILLE_DOTS.iter().enumerate() {
                for (dy, bit) in column.iter().enumerate() {
                    let Some(p) = canvas.pixel(cx * 2 + dx as u32, cy * 4 + dy as u32) else {
                        continue;
                    };
                    // black ink is indistinguishable from the background
                    if p.a > 0 && (p.r, p.g, p.b) != (0, 0, 0) {
                        mask |= bit;
                        sum[0] += p.r as u32;
                        sum[1] += p.g as u32;
                        sum[2] += p.b as u32;
                        ink += 1;
                    }
                }
            }
            if ink == 0 {
                continue;
            }

            let (Ok(x), Ok(y)) = (
                u16::try_from(layout.origin_col as u32 + cx),
                u16::try_from(layout.origin_row as u32 + cy),
            ) else {
                continue;
            };
            out.set(
                x,
                y,
                Cell {
                    ch: char::from_u32(0x2800 + mask as u32).unwrap_or(' '),
                    fg: Color::Rgb {
                        r: (sum[0] / ink) as u8,
                        g: (sum[1] / ink) as u8,
                        b: (sum[2] / ink) as u8,
                    },
                    bg,
                },
            );
        }
    }
}
