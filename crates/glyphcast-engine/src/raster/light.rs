use crate::math::{cross, dot, Vec3, Vec4};

/// Lambertian term for one triangle.
///
/// The face normal is `normalize(cross(p2 - p1, p3 - p1))` of the
/// homogeneous-divided vertices; the result is `max(0, n · light)` clamped to
/// `[0, 1]`. `light` points towards the light and is expected to be unit
/// length. Zero-area faces are unlit.
pub fn face_brightness(v1: Vec4, v2: Vec4, v3: Vec4, light: Vec3) -> f32 {
    let p1 = dehomogenize(v1);
    let p2 = dehomogenize(v2);
    let p3 = dehomogenize(v3);

    let Some(normal) = cross(p2 - p1, p3 - p1).try_normalize() else {
        return 0.0;
    };
    dot(normal, light).clamp(0.0, 1.0)
}

#[inline]
fn dehomogenize(v: Vec4) -> Vec3 {
    if v.w == 1.0 || v.w == 0.0 {
        v.xyz()
    } else {
        v.project()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Vec4 {
        Vec4::new(x, y, z, 1.0)
    }

    const TOWARD_VIEWER: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    #[test]
    fn facing_light_is_full_brightness() {
        let b = face_brightness(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), TOWARD_VIEWER);
        assert!((b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn facing_away_is_dark() {
        let b = face_brightness(p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 0.0, 0.0), TOWARD_VIEWER);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn oblique_face_is_cosine() {
        // Normal tilted 60 degrees from +Z around X.
        let b = face_brightness(
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 0.5, -(0.75f32).sqrt()),
            TOWARD_VIEWER,
        );
        assert!((b - 0.5).abs() < 1e-5, "{b}");
    }

    #[test]
    fn degenerate_face_is_dark() {
        let b = face_brightness(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0), TOWARD_VIEWER);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn homogeneous_divide_is_applied() {
        let a = face_brightness(
            Vec4::new(0.0, 0.0, 0.0, 2.0),
            Vec4::new(2.0, 0.0, 0.0, 2.0),
            Vec4::new(0.0, 2.0, 0.0, 2.0),
            TOWARD_VIEWER,
        );
        assert!((a - 1.0).abs() < 1e-6);
    }
}
