use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Braille-resolution drawing surface: 2x4 pixels per terminal cell.
/// This is the trail canvas — it is cleared on session start, resize and
/// reset only, never between frames, so each frame paints over the last.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }

    /// Source-over blend of `src` onto the stored pixel. Out-of-range
    /// coordinates are dropped silently.
    pub(crate) fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }
}

/// Short line segment from a point along a velocity, for the field overlay.
pub(crate) fn draw_segment(canvas: &mut PixelCanvas, x0: f32, y0: f32, dx: f32, dy: f32, ink: Pixel) {
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        canvas.blend_over((x0 + dx * t).round() as i32, (y0 + dy * t).round() as i32, ink);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::Reset,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = cell;
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
}

/// Raw-mode terminal session plus double-buffered presentation.
/// `begin` is the one place that can fail before the loop starts; if it
/// errors there is no surface and the caller must not animate.
pub(crate) struct Surface {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Surface {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Tracks the host terminal's size; on change all buffers are rebuilt
    /// (which also drops the accumulated trails).
    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        Ok(true)
    }

    pub(crate) fn clear_frame(&mut self) {
        self.cur.clear();
    }

    /// Push the current buffer, emitting only cells that changed since the
    /// previous frame and eliding redundant color switches.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let cell = self.cur.cells[i];
                if cell == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(cell.fg) {
                    queue!(self.out, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                queue!(self.out, Print(cell.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2x4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Threshold below which a pixel's alpha does not count as ink.
const INK_ALPHA: u32 = 32;

pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
            let mut ink = 0u32;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = px0 + dx;
                    let y = py0 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a as u32 >= INK_ALPHA {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink += 1;
                    }
                }
            }

            if mask == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            let fg = Color::Rgb {
                r: (sum_r / ink) as u8,
                g: (sum_g / ink) as u8,
                b: (sum_b / ink) as u8,
            };
            out.set(cx as u16, cy as u16, Cell { ch, fg });
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_over_full_alpha_replaces() {
        let mut canvas = PixelCanvas::new(4, 4);
        let red = Pixel {
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        };
        canvas.blend_over(1, 1, red);
        assert_eq!(canvas.px[canvas.idx(1, 1)], red);
    }

    #[test]
    fn blend_over_ignores_out_of_range() {
        let mut canvas = PixelCanvas::new(4, 4);
        let ink = Pixel {
            r: 10,
            g: 10,
            b: 10,
            a: 200,
        };
        canvas.blend_over(-1, 0, ink);
        canvas.blend_over(0, -3, ink);
        canvas.blend_over(4, 0, ink);
        canvas.blend_over(0, 4, ink);
        assert!(canvas.px.iter().all(|p| *p == Pixel::default()));
    }

    #[test]
    fn repeated_low_alpha_blends_accumulate() {
        let mut canvas = PixelCanvas::new(2, 2);
        let ink = Pixel {
            r: 200,
            g: 40,
            b: 40,
            a: 102, // ~0.4
        };
        canvas.blend_over(0, 0, ink);
        let first = canvas.px[0].a;
        canvas.blend_over(0, 0, ink);
        assert!(canvas.px[0].a > first);
    }

    #[test]
    fn inked_pixels_become_braille_cells() {
        let mut canvas = PixelCanvas::new(2, 4);
        let mut cells = CellBuffer::new(1, 1);
        canvas.blend_over(
            0,
            0,
            Pixel {
                r: 0,
                g: 255,
                b: 0,
                a: 255,
            },
        );
        canvas_to_cells(&canvas, &mut cells);
        assert_eq!(cells.cells[0].ch, '\u{2801}'); // dot 1 only
    }

    #[test]
    fn faint_pixels_do_not_ink() {
        let mut canvas = PixelCanvas::new(2, 4);
        let mut cells = CellBuffer::new(1, 1);
        canvas.blend_over(
            0,
            0,
            Pixel {
                r: 255,
                g: 255,
                b: 255,
                a: 8,
            },
        );
        canvas_to_cells(&canvas, &mut cells);
        assert_eq!(cells.cells[0].ch, ' ');
    }
}
