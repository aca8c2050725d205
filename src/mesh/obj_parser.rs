//! Face-format mesh parser
//!
//! Reads the line-oriented `v` / `vn` / `vt` / `f` text format into an
//! unwelded [`MeshData`]: every face corner becomes its own vertex and the
//! index buffer is the identity permutation.
//!
//! Parsing is two passes. The first pass collects attribute lists and raw
//! face records, the second resolves each face corner into a full vertex.

use glam::{Vec2, Vec3};

use super::vertex_data::{MeshData, Vertex};
use super::vertex_operations::compute_tangent_basis;
use crate::constants::geometry::VERTICES_PER_TRIANGLE;

/// Errors raised by a malformed mesh asset
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshParseError {
    #[error("line {line}: {kind} index {index} out of range (have {available})")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        available: usize,
    },
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: invalid face vertex '{token}'")]
    InvalidFaceVertex { line: usize, token: String },
    #[error("line {line}: face has {count} vertices, only triangles are supported")]
    NonTriangularFace { line: usize, count: usize },
    #[error("line {line}: '{directive}' needs {expected} components, found {found}")]
    MissingComponents {
        line: usize,
        directive: &'static str,
        expected: usize,
        found: usize,
    },
}

pub type MeshParseResult<T> = Result<T, MeshParseError>;

/// One `f` corner before resolution. Indices are raw 1-based values.
#[derive(Debug, Clone, Copy)]
struct FaceCorner {
    position: i64,
    uv: Option<i64>,
    normal: Option<i64>,
}

#[derive(Debug)]
struct FaceRecord {
    line: usize,
    corners: [FaceCorner; 3],
    // attribute counts when the face was read, for negative indices
    counts: [usize; 3],
}

#[derive(Debug, Default)]
struct RawMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    faces: Vec<FaceRecord>,
    ignored_lines: usize,
}

/// Parse mesh text and derive the per-triangle tangent basis.
pub fn parse_mesh(text: &str) -> MeshParseResult<MeshData> {
    let raw = collect_records(text)?;

    log::debug!(
        "[parse_mesh] {} positions, {} normals, {} uvs, {} faces ({} lines ignored)",
        raw.positions.len(),
        raw.normals.len(),
        raw.uvs.len(),
        raw.faces.len(),
        raw.ignored_lines
    );

    if raw.ignored_lines > 0 {
        log::warn!(
            "[parse_mesh] Ignored {} lines with unsupported directives",
            raw.ignored_lines
        );
    }

    let mut mesh = assemble_vertices(&raw)?;
    compute_tangent_basis(&mut mesh.vertices);
    Ok(mesh)
}

/// First pass: attribute lists plus unresolved face records.
fn collect_records(text: &str) -> MeshParseResult<RawMesh> {
    let mut raw = RawMesh::default();

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw_line.replace(['\t', '\r'], " ");
        let line = line.trim_start();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        let fields: Vec<&str> = tokens.collect();

        match directive {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&fields, line_number, "v", 3)?;
                raw.positions.push(Vec3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&fields, line_number, "vn", 3)?;
                raw.normals.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&fields, line_number, "vt", 1)?;
                raw.uvs.push(Vec2::new(u, v));
            }
            "f" => {
                if fields.len() != VERTICES_PER_TRIANGLE {
                    return Err(MeshParseError::NonTriangularFace {
                        line: line_number,
                        count: fields.len(),
                    });
                }
                let corners = [
                    parse_corner(fields[0], line_number)?,
                    parse_corner(fields[1], line_number)?,
                    parse_corner(fields[2], line_number)?,
                ];
                raw.faces.push(FaceRecord {
                    line: line_number,
                    corners,
                    counts: [raw.positions.len(), raw.uvs.len(), raw.normals.len()],
                });
            }
            other => {
                log::trace!("[parse_mesh] line {}: ignoring '{}'", line_number, other);
                raw.ignored_lines += 1;
            }
        }
    }

    Ok(raw)
}

/// Read up to `N` floats, requiring at least `required`. Missing optional
/// components are zero and extra components (e.g. `w`) are ignored.
fn parse_floats<const N: usize>(
    fields: &[&str],
    line: usize,
    directive: &'static str,
    required: usize,
) -> MeshParseResult<[f32; N]> {
    if fields.len() < required {
        return Err(MeshParseError::MissingComponents {
            line,
            directive,
            expected: required,
            found: fields.len(),
        });
    }

    let mut out = [0.0f32; N];
    for (slot, token) in out.iter_mut().zip(fields.iter()) {
        *slot = token.parse::<f32>().map_err(|_| MeshParseError::InvalidNumber {
            line,
            token: (*token).to_string(),
        })?;
    }
    Ok(out)
}

/// `i`, `i/j`, `i//k` or `i/j/k`
fn parse_corner(token: &str, line: usize) -> MeshParseResult<FaceCorner> {
    let invalid = || MeshParseError::InvalidFaceVertex {
        line,
        token: token.to_string(),
    };

    let mut parts = token.split('/');
    let position = parse_index(parts.next(), token, line)?.ok_or_else(invalid)?;
    let uv = parse_index(parts.next(), token, line)?;
    let normal = parse_index(parts.next(), token, line)?;

    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(FaceCorner {
        position,
        uv,
        normal,
    })
}

/// An absent or empty slot (the middle of `i//k`) is `None`.
fn parse_index(part: Option<&str>, token: &str, line: usize) -> MeshParseResult<Option<i64>> {
    match part {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<i64>()
            .map(Some)
            .map_err(|_| MeshParseError::InvalidFaceVertex {
                line,
                token: token.to_string(),
            }),
    }
}

/// Map a 1-based (or negative, relative) index onto a list position.
fn resolve_index(
    index: i64,
    count_at_face: usize,
    available: usize,
    line: usize,
    kind: &'static str,
) -> MeshParseResult<usize> {
    let resolved = if index > 0 {
        Some(index - 1)
    } else if index < 0 {
        Some(count_at_face as i64 + index)
    } else {
        None
    };

    match resolved {
        Some(i) if i >= 0 && (i as usize) < available => Ok(i as usize),
        _ => Err(MeshParseError::IndexOutOfRange {
            line,
            kind,
            index,
            available,
        }),
    }
}

/// Second pass: one emitted vertex and index per face corner.
fn assemble_vertices(raw: &RawMesh) -> MeshParseResult<MeshData> {
    let corner_count = raw.faces.len() * VERTICES_PER_TRIANGLE;
    let mut vertices = Vec::with_capacity(corner_count);

    for face in &raw.faces {
        let [position_count, uv_count, normal_count] = face.counts;

        for corner in &face.corners {
            let mut vertex = Vertex::default();

            let p = resolve_index(
                corner.position,
                position_count,
                raw.positions.len(),
                face.line,
                "position",
            )?;
            vertex.position = raw.positions[p].to_array();

            if let Some(uv) = corner.uv {
                let t = resolve_index(uv, uv_count, raw.uvs.len(), face.line, "texture")?;
                vertex.uv = raw.uvs[t].to_array();
            }

            if let Some(normal) = corner.normal {
                let n = resolve_index(normal, normal_count, raw.normals.len(), face.line, "normal")?;
                vertex.normal = raw.normals[n].to_array();
            }

            vertices.push(vertex);
        }
    }

    let indices = (0..vertices.len() as u32).collect();
    Ok(MeshData { vertices, indices })
}
