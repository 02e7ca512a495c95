/// Presentation remap applied to brightness before glyph lookup:
/// `t = clamp(b * exposure + bias, 0, 1).powf(gamma)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadeParams {
    pub exposure: f32,
    pub bias: f32,
    pub gamma: f32,
}

impl ShadeParams {
    /// No remapping.
    pub const IDENTITY: ShadeParams = ShadeParams {
        exposure: 1.0,
        bias: 0.0,
        gamma: 1.0,
    };

    #[inline]
    pub fn apply(&self, brightness: f32) -> f32 {
        let b = brightness.clamp(0.0, 1.0);
        (b * self.exposure + self.bias).clamp(0.0, 1.0).powf(self.gamma)
    }
}

impl Default for ShadeParams {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            bias: 0.05,
            gamma: 0.6,
        }
    }
}

/// Glyphs ordered from least to most ink; brighter faces get denser glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    pub const DEFAULT: &'static str = ".;ox#%@";

    /// Returns `None` for an empty ramp.
    pub fn new(glyphs: &str) -> Option<Self> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        (!glyphs.is_empty()).then_some(Self { glyphs })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// `round(t * (len - 1))` for `t` clamped to `[0, 1]`.
    #[inline]
    pub fn index_for(&self, t: f32) -> usize {
        let last = self.glyphs.len().saturating_sub(1);
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        ((t * last as f32).round() as usize).min(last)
    }

    #[inline]
    pub fn glyph(&self, brightness: f32, shade: &ShadeParams) -> char {
        self.glyphs[self.index_for(shade.apply(brightness))]
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            glyphs: Self::DEFAULT.chars().collect(),
        }
    }
}
