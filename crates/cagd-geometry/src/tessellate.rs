//! Tessellation utilities for converting curves and surfaces to discrete representations.

use cagd_core::{CagdError, Result};
use cagd_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::Curve;
use crate::surface::Surface;

/// Convert a curve to a polyline of `divisions + 1` points at uniform parameter steps.
pub fn curve_polyline(curve: &dyn Curve, divisions: usize) -> Result<Vec<Point3>> {
    curve.points(divisions)
}

/// Indexed triangle mesh sampled from a surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    pub vertices: Vec<Point3>,
    /// Per-vertex unit normals, area-weighted from the adjacent triangles.
    pub normals: Vec<Vector3>,
    pub triangles: Vec<[u32; 3]>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Sample `surface` on a uniform `(divisions + 1)²` grid and triangulate it.
///
/// Vertex `i * (divisions + 1) + j` sits at `t1 = j / divisions`,
/// `t2 = i / divisions`. Each grid cell yields the triangles `(a, b, d)` and
/// `(b, c, d)` where `b` is the cell's lower corner, `a` its `t1` neighbour,
/// `c` its `t2` neighbour and `d` the opposite corner. With this winding the
/// mesh normals point along `-(S_u x S_v)`.
pub fn surface_grid(surface: &dyn Surface, divisions: usize) -> Result<SurfaceMesh> {
    if divisions == 0 {
        return Err(CagdError::InvalidArgument(
            "surface grid needs at least one division".into(),
        ));
    }

    let count = divisions + 1;
    let vertex_count = count
        .checked_mul(count)
        .filter(|&n| u32::try_from(n).is_ok())
        .ok_or_else(|| {
            CagdError::InvalidArgument(format!(
                "surface grid with {divisions} divisions exceeds the u32 index range"
            ))
        })?;

    let mut vertices = Vec::with_capacity(vertex_count);
    for i in 0..count {
        let t2 = i as f64 / divisions as f64;
        for j in 0..count {
            let t1 = j as f64 / divisions as f64;
            vertices.push(surface.point_at(t1, t2)?);
        }
    }

    // Every index is below `vertex_count`, which fits in u32
    let idx = |i: usize, j: usize| -> u32 { (i * count + j) as u32 };
    let mut triangles = Vec::with_capacity(divisions * divisions * 2);
    for i in 0..divisions {
        for j in 0..divisions {
            let a = idx(i, j + 1);
            let b = idx(i, j);
            let c = idx(i + 1, j);
            let d = idx(i + 1, j + 1);
            triangles.push([a, b, d]);
            triangles.push([b, c, d]);
        }
    }

    let normals = vertex_normals(&vertices, &triangles);
    debug!(
        divisions,
        vertices = vertices.len(),
        triangles = triangles.len(),
        "tessellated surface"
    );

    Ok(SurfaceMesh {
        vertices,
        normals,
        triangles,
    })
}

/// Sum unnormalized face normals into their vertices, then normalize.
///
/// The cross product length is twice the triangle area, so larger faces weigh
/// more. Vertices touched only by degenerate faces get a zero normal.
fn vertex_normals(vertices: &[Point3], triangles: &[[u32; 3]]) -> Vec<Vector3> {
    let mut normals = vec![Vector3::ZERO; vertices.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| i as usize);
        let face = (vertices[c] - vertices[b]).cross(vertices[a] - vertices[b]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}
