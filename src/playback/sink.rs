//! Display sinks.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::compute::{ColorMap, DISPLAY_HEIGHT, DISPLAY_WIDTH, QuantizedFrame};
use crate::schema::{ConfigError, DisplayConfig};

/// Errors raised while pushing a frame to the panel.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Display write failed: {0}")]
    Io(#[from] io::Error),
    #[error("Display rejected frame: {0}")]
    Rejected(String),
}

/// The panel. Each call must apply the whole frame at once.
pub trait DisplaySink {
    fn present(&mut self, frame: &QuantizedFrame, colors: &ColorMap) -> Result<(), SinkError>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn present(&mut self, frame: &QuantizedFrame, colors: &ColorMap) -> Result<(), SinkError> {
        (**self).present(frame, colors)
    }
}

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '\u{2580}';

/// Terminal preview of the panel using 24-bit ANSI colour.
///
/// Two panel rows share one text line. The frame is rendered into a buffer
/// first and emitted with a single write, so a terminal never shows half of
/// two frames.
pub struct AnsiSink<W: Write> {
    out: W,
    mask: u8,
    buffer: String,
}

impl<W: Write> AnsiSink<W> {
    pub fn new(out: W, display: &DisplayConfig) -> Result<Self, ConfigError> {
        display.validate()?;
        Ok(Self {
            out,
            mask: 0xFFu8 << (8 - display.bit_depth),
            buffer: String::with_capacity(DISPLAY_WIDTH * DISPLAY_HEIGHT * 40),
        })
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, frame: &QuantizedFrame, colors: &ColorMap) {
        self.buffer.clear();
        self.buffer.push_str("\x1b[H");
        for y in (0..DISPLAY_HEIGHT).step_by(2) {
            for x in 0..DISPLAY_WIDTH {
                let [tr, tg, tb] = frame.rgb_at(x, y, colors).map(|c| c & self.mask);
                let [br, bg, bb] = frame.rgb_at(x, y + 1, colors).map(|c| c & self.mask);
                let _ = write!(
                    self.buffer,
                    "\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m{HALF_BLOCK}"
                );
            }
            self.buffer.push_str("\x1b[0m\n");
        }
    }
}

impl<W: Write> DisplaySink for AnsiSink<W> {
    fn present(&mut self, frame: &QuantizedFrame, colors: &ColorMap) -> Result<(), SinkError> {
        self.render(frame, colors);
        self.out.write_all(self.buffer.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Records every presented frame. Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<(QuantizedFrame, ColorMap)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[(QuantizedFrame, ColorMap)] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl DisplaySink for MemorySink {
    fn present(&mut self, frame: &QuantizedFrame, colors: &ColorMap) -> Result<(), SinkError> {
        self.frames.push((frame.clone(), colors.clone()));
        Ok(())
    }
}
