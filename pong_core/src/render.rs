//! Dirty-cell renderer: square drawing with colour coalescing over any writer.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use rand::Rng;
use std::io::{self, Write};

use crate::config::Court;
use crate::types::Cell;

/// Colours used by the entities
pub mod palette {
    use crossterm::style::Color;

    /// Empty court
    pub const BLANK: Color = Color::Reset;
    pub const BALL: Color = Color::Green;
    pub const PLAYER_ONE: Color = Color::Blue;
    pub const PLAYER_TWO: Color = Color::Red;
    pub const NET: Color = Color::White;
    pub const SCORE: Color = Color::White;
    pub const BANNER: Color = Color::Yellow;
}

/// Something that lives on the court, steps once per tick and knows how to
/// paint itself either completely or incrementally.
pub trait Renderable {
    /// Advance one tick
    fn update(&mut self);

    /// Return to the start-of-round state
    fn reset<R: Rng + ?Sized>(&mut self, court: &Court, rng: &mut R);

    /// Paint every cell this entity occupies
    fn draw<W: Write>(&mut self, ctx: &mut RenderContext<W>);

    /// Paint only the cells that changed since the previous tick
    fn redraw<W: Write>(&mut self, ctx: &mut RenderContext<W>);
}

/// Per-frame counters, reset on flush
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub squares: u32,
    pub colour_changes: u32,
}

/// Render state for one output surface.
///
/// Writes are queued into the underlying writer and only pushed out by
/// [`RenderContext::flush`], once per tick. Write failures never reach the
/// caller: the first one of a frame is kept and logged at flush time.
pub struct RenderContext<W: Write> {
    out: W,
    width: u16,
    height: u16,
    last_colour: Option<Color>,
    fault: Option<io::Error>,
    stats: FrameStats,
}

impl<W: Write> RenderContext<W> {
    pub fn new(out: W, width: u16, height: u16) -> Self {
        RenderContext {
            out,
            width,
            height,
            last_colour: None,
            fault: None,
            stats: FrameStats::default(),
        }
    }

    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Record new surface dimensions. Returns true when they changed.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let changed = (width, height) != (self.width, self.height);
        self.width = width;
        self.height = height;
        changed
    }

    /// Paint one cell. Cells outside the surface are skipped.
    pub fn draw_square(&mut self, cell: Cell, colour: Color) {
        if cell.x >= self.width || cell.y >= self.height {
            return;
        }

        let mut result = queue!(self.out, MoveTo(cell.x, cell.y));
        if self.last_colour != Some(colour) {
            result = result.and_then(|_| queue!(self.out, SetBackgroundColor(colour)));
            self.last_colour = Some(colour);
            self.stats.colour_changes += 1;
        }
        result = result.and_then(|_| queue!(self.out, Print(' ')));
        self.stats.squares += 1;
        self.record(result);
    }

    /// Paint a cell with the empty-court colour
    pub fn erase_square(&mut self, cell: Cell) {
        self.draw_square(cell, palette::BLANK);
    }

    /// Write text starting at a cell, truncated to the surface width
    pub fn print_at(&mut self, x: u16, y: u16, text: &str, colour: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let room = (self.width - x) as usize;
        let text: String = text.chars().take(room).collect();
        let result = queue!(
            self.out,
            MoveTo(x, y),
            ResetColor,
            SetForegroundColor(colour),
            Print(text),
            ResetColor
        );
        self.last_colour = None;
        self.record(result);
    }

    /// Blank the whole surface and forget the colour state
    pub fn clear(&mut self) {
        let result = queue!(self.out, ResetColor, Clear(ClearType::All));
        self.last_colour = None;
        self.record(result);
    }

    /// Push the frame out. Returns false if any write of the frame failed.
    pub fn flush(&mut self) -> bool {
        let flushed = self.out.flush();
        self.record(flushed);
        self.stats = FrameStats::default();

        match self.fault.take() {
            Some(err) => {
                tracing::warn!("Frame output failed: {}", err);
                // The terminal is in an unknown colour state after a failed write
                self.last_colour = None;
                false
            }
            None => true,
        }
    }

    /// Counters for the frame queued so far
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if self.fault.is_none() {
                self.fault = Some(err);
            }
        }
    }
}

/// Reads an emitted escape stream back into the background colour of every
/// cell it touched. Test support for checking what ends up on screen.
#[cfg(test)]
pub(crate) mod screen {
    use super::*;
    use crossterm::Command;
    use std::collections::HashMap;

    /// Parameters of the escape a colour is set with, e.g. `48;5;12`
    pub(crate) fn background_code(colour: Color) -> String {
        let mut escape = String::new();
        let _ = SetBackgroundColor(colour).write_ansi(&mut escape);
        escape
            .trim_start_matches("\x1b[")
            .trim_end_matches('m')
            .to_owned()
    }

    pub(crate) fn background_grid(bytes: &[u8]) -> HashMap<Cell, String> {
        let text = String::from_utf8_lossy(bytes);
        let blank = background_code(Color::Reset);
        let mut grid = HashMap::new();
        let (mut x, mut y) = (0u16, 0u16);
        let mut background = blank.clone();

        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\x1b' || chars.peek() != Some(&'[') {
                grid.insert(Cell::new(x, y), background.clone());
                x += 1;
                continue;
            }
            chars.next();
            let mut params = String::new();
            let mut command = ' ';
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    command = c;
                    break;
                }
                params.push(c);
            }
            match command {
                'H' => {
                    let mut parts = params.split(';').map(|p| p.parse::<u16>().unwrap_or(1));
                    y = parts.next().unwrap_or(1) - 1;
                    x = parts.next().unwrap_or(1) - 1;
                }
                'm' if params == "0" => background = blank.clone(),
                'm' if params.starts_with("48") || params.starts_with("49") => {
                    background = params
                }
                'J' => grid.clear(),
                _ => {}
            }
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(ctx: &RenderContext<Vec<u8>>) -> String {
        String::from_utf8_lossy(ctx.get_ref()).into_owned()
    }

    #[test]
    fn test_same_colour_writes_are_coalesced() {
        let mut ctx = RenderContext::new(Vec::new(), 10, 10);
        ctx.draw_square(Cell::new(1, 1), Color::Blue);
        ctx.draw_square(Cell::new(1, 2), Color::Blue);
        ctx.draw_square(Cell::new(1, 3), Color::Blue);

        assert_eq!(ctx.stats().squares, 3);
        assert_eq!(ctx.stats().colour_changes, 1);

        ctx.draw_square(Cell::new(5, 5), Color::Green);
        assert_eq!(ctx.stats().colour_changes, 2);

        let out = output(&ctx);
        // One background escape per colour change
        assert_eq!(out.matches("\x1b[48;").count(), 2);
    }

    #[test]
    fn test_screen_model_follows_cursor_and_colour() {
        let mut ctx = RenderContext::new(Vec::new(), 10, 10);
        ctx.draw_square(Cell::new(3, 4), Color::Blue);
        ctx.draw_square(Cell::new(3, 5), Color::Blue);
        ctx.erase_square(Cell::new(3, 4));

        let grid = screen::background_grid(ctx.get_ref());
        assert_eq!(grid[&Cell::new(3, 4)], screen::background_code(palette::BLANK));
        assert_eq!(grid[&Cell::new(3, 5)], screen::background_code(Color::Blue));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_clear_forgets_last_colour() {
        let mut ctx = RenderContext::new(Vec::new(), 10, 10);
        ctx.draw_square(Cell::new(0, 1), Color::Blue);
        ctx.clear();
        ctx.draw_square(Cell::new(0, 2), Color::Blue);

        assert_eq!(ctx.stats().colour_changes, 2);
    }

    #[test]
    fn test_out_of_bounds_squares_are_skipped() {
        let mut ctx = RenderContext::new(Vec::new(), 10, 5);
        ctx.draw_square(Cell::new(10, 0), Color::Blue);
        ctx.draw_square(Cell::new(0, 5), Color::Blue);

        assert_eq!(ctx.stats().squares, 0);
        assert!(ctx.get_ref().is_empty());
    }

    #[test]
    fn test_flush_resets_stats() {
        let mut ctx = RenderContext::new(Vec::new(), 10, 10);
        ctx.draw_square(Cell::new(2, 2), Color::Red);
        assert!(ctx.flush());
        assert_eq!(ctx.stats(), FrameStats::default());
    }

    #[test]
    fn test_resize_reports_change() {
        let mut ctx = RenderContext::new(Vec::new(), 80, 24);
        assert!(!ctx.resize(80, 24));
        assert!(ctx.resize(100, 30));
        assert_eq!(ctx.dimensions(), (100, 30));
    }

    #[test]
    fn test_print_at_truncates_to_width() {
        let mut ctx = RenderContext::new(Vec::new(), 8, 2);
        ctx.print_at(4, 0, "GAME OVER", Color::Yellow);
        let out = output(&ctx);
        assert!(out.contains("GAME"));
        assert!(!out.contains("GAME "));
    }

    /// Writer that rejects everything
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_write_faults_are_swallowed() {
        let mut ctx = RenderContext::new(BrokenPipe, 10, 10);
        ctx.draw_square(Cell::new(1, 1), Color::Blue);
        ctx.print_at(0, 0, "hello", Color::White);

        assert!(!ctx.flush());
        // Next frame starts clean
        assert_eq!(ctx.stats(), FrameStats::default());
    }
}
