use super::{PlanPoint, Vector3, TOLERANCE};
use crate::error::{MeshError, Result};

/// Computes the signed area of a floor-plan polygon (shoelace formula).
///
/// The sign follows the `x·z' − x'·z` convention; use [`polygon_area`] for
/// the orientation-independent room area.
#[must_use]
pub fn signed_area(points: &[PlanPoint]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].z - points[j].x * points[i].z;
    }
    sum * 0.5
}

/// Unsigned polygon area: `|Σ(x_i·z_{i+1} − x_{i+1}·z_i)| / 2`.
#[must_use]
pub fn polygon_area(points: &[PlanPoint]) -> f64 {
    signed_area(points).abs()
}

/// Vertex average of a polygon. Returns the origin for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vertex_centroid(points: &[PlanPoint]) -> PlanPoint {
    if points.is_empty() {
        return PlanPoint::default();
    }
    let n = points.len() as f64;
    let (sx, sz) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sz), p| (sx + p.x, sz + p.z));
    PlanPoint::new(sx / n, sz / n)
}

/// Computes the normalized plan direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns `MeshError::DegenerateSegment` if the segment has zero length.
pub fn segment_direction(a: &PlanPoint, b: &PlanPoint) -> Result<Vector3> {
    let d = a.to(b);
    let len = d.norm();
    if len < TOLERANCE {
        return Err(MeshError::DegenerateSegment(format!(
            "({}, {}) to ({}, {})",
            a.x, a.z, b.x, b.z
        ))
        .into());
    }
    Ok(d / len)
}

/// Returns the horizontal normal `dir × up` of a plan direction.
///
/// This is the local Z axis of a wall whose local X runs along `dir` with
/// local Y up.
#[must_use]
pub fn wall_normal(dir: Vector3) -> Vector3 {
    Vector3::new(-dir.z, 0.0, dir.x)
}
