//! Output surfaces the renderer writes escape sequences into.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    style::ResetColor,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Stdout, Write},
    path::Path,
};

/// Frames are a few kilobytes at most; one flush per tick
const FRAME_BUFFER: usize = 64 * 1024;

/// A character-cell output the game can be drawn on
pub trait Surface: Write {
    /// Current size in cells
    fn dimensions(&self) -> io::Result<(u16, u16)>;
}

/// The controlling terminal, switched to the alternate screen for the
/// lifetime of the value
pub struct TerminalSurface {
    out: BufWriter<Stdout>,
}

impl TerminalSurface {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut out = BufWriter::with_capacity(FRAME_BUFFER, io::stdout());
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out })
    }
}

impl Write for TerminalSurface {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Surface for TerminalSurface {
    fn dimensions(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// A display on the other end of a serial line. The line is expected to be
/// configured (baud rate etc.) before the game starts; its size is fixed.
pub struct SerialSurface {
    out: BufWriter<File>,
    width: u16,
    height: u16,
}

impl SerialSurface {
    pub fn open(device: &Path, width: u16, height: u16) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).open(device)?;
        tracing::info!(
            "Drawing to serial device {} ({}x{})",
            device.display(),
            width,
            height
        );
        Ok(Self {
            out: BufWriter::with_capacity(FRAME_BUFFER, file),
            width,
            height,
        })
    }
}

impl Write for SerialSurface {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Surface for SerialSurface {
    fn dimensions(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }
}

impl Drop for SerialSurface {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, Show);
    }
}
