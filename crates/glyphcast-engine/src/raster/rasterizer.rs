use crate::transform::ScreenVertex;

use super::{Frame, GlyphRamp, ShadeParams};

/// How a covered pixel's depth is derived from the triangle's vertices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DepthMode {
    /// Exact barycentric interpolation from the edge functions.
    #[default]
    Barycentric,
    /// Mean of the three vertex depths (flat per triangle).
    Average,
}

/// Edge-function triangle filler with depth testing and glyph shading.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    pub ramp: GlyphRamp,
    pub shade: ShadeParams,
    pub depth_mode: DepthMode,
}

/// Twice the signed area of `(a, b, p)`.
#[inline]
fn edge(a: ScreenVertex, b: ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

impl Rasterizer {
    pub fn new(ramp: GlyphRamp, shade: ShadeParams, depth_mode: DepthMode) -> Self {
        Self {
            ramp,
            shade,
            depth_mode,
        }
    }

    /// Fills one triangle. Returns the number of cells that won the depth test.
    pub fn draw_triangle(&self, frame: &mut Frame, tri: [ScreenVertex; 3], brightness: f32) -> usize {
        let [v0, v1, v2] = tri;
        let area = edge(v0, v1, v2.x, v2.y);
        if area == 0.0 || !area.is_finite() || frame.width() == 0 || frame.height() == 0 {
            return 0;
        }

        let max_x = (frame.width() - 1) as f32;
        let max_y = (frame.height() - 1) as f32;
        let lo_x = v0.x.min(v1.x).min(v2.x).floor();
        let hi_x = v0.x.max(v1.x).max(v2.x).ceil();
        let lo_y = v0.y.min(v1.y).min(v2.y).floor();
        let hi_y = v0.y.max(v1.y).max(v2.y).ceil();
        if hi_x < 0.0 || hi_y < 0.0 || lo_x > max_x || lo_y > max_y {
            return 0;
        }
        let (x0, x1) = (lo_x.max(0.0) as u32, hi_x.min(max_x) as u32);
        let (y0, y1) = (lo_y.max(0.0) as u32, hi_y.min(max_y) as u32);

        let glyph = self.ramp.glyph(brightness, &self.shade);
        let flat_depth = (v0.depth + v1.depth + v2.depth) / 3.0;
        let mut written = 0;

        for py in y0..=y1 {
            let cy = py as f32 + 0.5;
            for px in x0..=x1 {
                let cx = px as f32 + 0.5;
                let e0 = edge(v0, v1, cx, cy);
                let e1 = edge(v1, v2, cx, cy);
                let e2 = edge(v2, v0, cx, cy);
                let inside = (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0)
                    || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0);
                if !inside {
                    continue;
                }

                let depth = match self.depth_mode {
                    DepthMode::Barycentric => {
                        // e0 is opposite v2, e1 opposite v0.
                        let w0 = e0 / area;
                        let w1 = e1 / area;
                        let w2 = 1.0 - w0 - w1;
                        w0 * v2.depth + w1 * v0.depth + w2 * v1.depth
                    }
                    DepthMode::Average => flat_depth,
                };

                if frame.put(px, py, depth, glyph) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Draws every triangle in mesh order.
    ///
    /// `screen[i]` is `None` for vertices that failed projection; triangles
    /// touching one are skipped. `brightness[t]` belongs to triangle `t`.
    pub fn draw_mesh(
        &self,
        frame: &mut Frame,
        triangles: impl Iterator<Item = [usize; 3]>,
        screen: &[Option<ScreenVertex>],
        brightness: &[f32],
    ) -> usize {
        let mut drawn = 0;
        for (t, [a, b, c]) in triangles.enumerate() {
            let (Some(Some(va)), Some(Some(vb)), Some(Some(vc))) =
                (screen.get(a), screen.get(b), screen.get(c))
            else {
                continue;
            };
            let b = brightness.get(t).copied().unwrap_or(0.0);
            if self.draw_triangle(frame, [*va, *vb, *vc], b) > 0 {
                drawn += 1;
            }
        }
        drawn
    }
}
