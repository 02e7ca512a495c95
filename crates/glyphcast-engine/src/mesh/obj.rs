use std::path::Path;

use crate::error::{RenderError, Result};
use crate::math::Vec3;

use super::Mesh;

/// Parses the triangle subset of Wavefront OBJ.
///
/// Supported:
/// - `v x y z [w]` (the optional `w` is ignored)
/// - `f a b c` with 1-based indices; `a/t/n` tokens use only the position index
///
/// Blank lines, `#` comments and every other record type are skipped. Faces
/// with any arity other than three are an error; nothing is triangulated.
/// On error no partial mesh is returned.
pub fn parse_obj(src: &str) -> Result<Mesh> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    // Source line of each face, for range errors found after the last `v`.
    let mut face_lines: Vec<usize> = Vec::new();

    for (n, raw) in src.lines().enumerate() {
        let line_no = n + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut xyz = [0.0f32; 3];
                for (axis, slot) in xyz.iter_mut().enumerate() {
                    let tok = parts.next().ok_or_else(|| {
                        RenderError::malformed(line_no, format!("vertex is missing component {axis}"))
                    })?;
                    *slot = tok
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| {
                            RenderError::malformed(line_no, format!("invalid vertex component `{tok}`"))
                        })?;
                }
                positions.push(Vec3::from(xyz));
            }
            Some("f") => {
                let tokens: Vec<&str> = parts.collect();
                if tokens.len() != 3 {
                    return Err(RenderError::malformed(
                        line_no,
                        format!(
                            "face has {} vertices; only triangles are supported",
                            tokens.len()
                        ),
                    ));
                }
                for tok in tokens {
                    indices.push(parse_face_index(tok, line_no)?);
                }
                face_lines.push(line_no);
            }
            _ => {}
        }
    }

    let vertex_count = positions.len();
    for (face, chunk) in indices.chunks_exact(3).enumerate() {
        if let Some(&bad) = chunk.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RenderError::malformed(
                face_lines[face],
                format!(
                    "index {} out of range ({vertex_count} vertices)",
                    bad as u64 + 1
                ),
            ));
        }
    }

    log::debug!(
        "parsed mesh: {} vertices, {} triangles",
        vertex_count,
        indices.len() / 3
    );

    Ok(Mesh::from_parts(positions, indices))
}

/// Reads and parses an OBJ file. Each call is a fresh parse.
pub fn load_obj_file(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(&text)
}

fn parse_face_index(tok: &str, line_no: usize) -> Result<u32> {
    let head = tok.split('/').next().unwrap_or(tok);
    let one_based: u32 = head
        .parse()
        .map_err(|_| RenderError::malformed(line_no, format!("invalid face index `{tok}`")))?;
    one_based
        .checked_sub(1)
        .ok_or_else(|| RenderError::malformed(line_no, "face indices are 1-based; found 0"))
}
