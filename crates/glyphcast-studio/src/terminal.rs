use std::io::{self, Write};

use glyphcast_engine::raster::Frame;
use glyphcast_engine::render::Presenter;

const CLEAR: &str = "\x1b[2J";
const HOME: &str = "\x1b[H";

/// Redraws each frame in place over the previous one.
pub struct TerminalPresenter<W: Write> {
    out: W,
    buf: String,
    cleared: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: String::new(),
            cleared: false,
        }
    }

    /// Moves the cursor below the last frame.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.cleared {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        self.buf.clear();
        if !self.cleared {
            self.buf.push_str(CLEAR);
            self.cleared = true;
        }
        self.buf.push_str(HOME);
        for (i, row) in frame.rows().enumerate() {
            if i > 0 {
                self.buf.push('\n');
            }
            self.buf.extend(row.iter());
        }
        // One write per frame keeps tearing down.
        self.out.write_all(self.buf.as_bytes())?;
        self.out.flush()
    }
}
