/// Depth-buffer value meaning "nothing drawn yet".
pub const DEPTH_FAR: f32 = f32::INFINITY;

/// Glyph grid plus depth buffer, one cell per pixel.
///
/// Row 0 is the top of the image. Both grids are reset together by
/// [`Frame::clear`].
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    background: char,
    glyphs: Vec<char>,
    depth: Vec<f32>,
}

impl Frame {
    pub fn new(width: u32, height: u32, background: char) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            background,
            glyphs: vec![background; len],
            depth: vec![DEPTH_FAR; len],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn background(&self) -> char {
        self.background
    }

    /// Resets every cell to the background glyph and far depth.
    pub fn clear(&mut self) {
        self.glyphs.fill(self.background);
        self.depth.fill(DEPTH_FAR);
    }

    /// Reallocates for new dimensions; contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        let len = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.glyphs.clear();
        self.glyphs.resize(len, self.background);
        self.depth.clear();
        self.depth.resize(len, DEPTH_FAR);
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn glyph(&self, x: u32, y: u32) -> Option<char> {
        self.offset(x, y).map(|i| self.glyphs[i])
    }

    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.offset(x, y).map(|i| self.depth[i])
    }

    /// Depth-tested write. Only a strictly nearer depth replaces the cell.
    ///
    /// Returns whether the cell was written.
    #[inline]
    pub fn put(&mut self, x: u32, y: u32, depth: f32, glyph: char) -> bool {
        let Some(i) = self.offset(x, y) else { return false };
        if depth < self.depth[i] {
            self.depth[i] = depth;
            self.glyphs[i] = glyph;
            true
        } else {
            false
        }
    }

    /// Overwrites glyphs starting at `(col, row)`, ignoring depth. Clipped at the
    /// right edge.
    pub fn stamp(&mut self, row: u32, col: u32, text: &str) {
        if row >= self.height {
            return;
        }
        for (x, ch) in (col..self.width).zip(text.chars()) {
            if let Some(i) = self.offset(x, row) {
                self.glyphs[i] = ch;
            }
        }
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> + '_ {
        self.glyphs.chunks(self.width.max(1) as usize)
    }

    /// Joins rows into one string, appending `terminator` after every row.
    pub fn to_text(&self, terminator: &str) -> String {
        let mut out =
            String::with_capacity(self.glyphs.len() + self.height as usize * terminator.len());
        for row in self.rows() {
            out.extend(row.iter());
            out.push_str(terminator);
        }
        out
    }
}
