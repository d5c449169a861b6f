//! Moving frames along a curve.
//!
//! Frames are propagated by parallel transport: each normal is the previous one
//! rotated by the turn between consecutive tangents.

use cagd_core::{CagdError, Result, Tolerance};
use cagd_math::{DQuat, DVec3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arc_length::parameter_at_length;
use super::Curve;

/// Tangent, normal and binormal vectors at `segments + 1` arc-length-uniform samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrenetFrames {
    pub tangents: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub binormals: Vec<Vector3>,
}

impl FrenetFrames {
    pub fn len(&self) -> usize {
        self.tangents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tangents.is_empty()
    }

    /// Whether every frame is made of mutually orthogonal unit vectors.
    pub fn is_orthonormal(&self, tol: Tolerance) -> bool {
        self.tangents
            .iter()
            .zip(&self.normals)
            .zip(&self.binormals)
            .all(|((t, n), b)| {
                tol.is_unit(t.length())
                    && tol.is_unit(n.length())
                    && tol.is_unit(b.length())
                    && tol.is_zero(t.dot(*n))
                    && tol.is_zero(t.dot(*b))
                    && tol.is_zero(n.dot(*b))
            })
    }
}

pub(crate) fn compute<C: Curve + ?Sized>(
    curve: &C,
    segments: usize,
    closed: bool,
) -> Result<FrenetFrames> {
    if segments == 0 {
        return Err(CagdError::InvalidArgument(
            "frame computation needs at least one segment".into(),
        ));
    }

    let lengths = curve.lengths()?;
    let total = lengths[lengths.len() - 1];

    let mut tangents = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let u = i as f64 / segments as f64;
        let t = parameter_at_length(&lengths, u * total);
        tangents.push(curve.tangent_at(t)?.normalize());
    }

    // Initial normal along the axis of the smallest tangent component
    let t0 = tangents[0];
    let mut min = f64::MAX;
    let mut axis = DVec3::ZERO;
    let (tx, ty, tz) = (t0.x.abs(), t0.y.abs(), t0.z.abs());
    if tx <= min {
        min = tx;
        axis = DVec3::X;
    }
    if ty <= min {
        min = ty;
        axis = DVec3::Y;
    }
    if tz <= min {
        axis = DVec3::Z;
    }

    let side = t0.cross(axis).normalize();
    let mut normals = Vec::with_capacity(segments + 1);
    let mut binormals = Vec::with_capacity(segments + 1);
    normals.push(t0.cross(side));
    binormals.push(t0.cross(normals[0]));

    for i in 1..=segments {
        let mut normal = normals[i - 1];
        let turn = tangents[i - 1].cross(tangents[i]);
        if turn.length() > f64::EPSILON {
            let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
            normal = DQuat::from_axis_angle(turn.normalize(), theta) * normal;
        }
        normals.push(normal);
        binormals.push(tangents[i].cross(normal));
    }

    if closed {
        // Spread the mismatch between the first and last normal over all frames
        let mut theta = normals[0].dot(normals[segments]).clamp(-1.0, 1.0).acos() / segments as f64;
        if tangents[0].dot(normals[0].cross(normals[segments])) > 0.0 {
            theta = -theta;
        }
        for i in 1..=segments {
            normals[i] = DQuat::from_axis_angle(tangents[i], theta * i as f64) * normals[i];
            binormals[i] = tangents[i].cross(normals[i]);
        }
    }

    debug!(segments, closed, "computed curve frames");
    Ok(FrenetFrames {
        tangents,
        normals,
        binormals,
    })
}
