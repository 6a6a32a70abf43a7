use serde::{Deserialize, Serialize};

use super::{Point3, Vector3};

/// A point on the floor plan. `x` and `z` are world X and Z; Y is up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanPoint {
    pub x: f64,
    pub z: f64,
}

impl PlanPoint {
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Euclidean distance to another plan point.
    #[must_use]
    pub fn distance(&self, other: &PlanPoint) -> f64 {
        (other.x - self.x).hypot(other.z - self.z)
    }

    /// Lifts the point into world space at height `y`.
    #[must_use]
    pub fn at_height(&self, y: f64) -> Point3 {
        Point3::new(self.x, y, self.z)
    }

    /// Vector from `self` to `other`, lying in the floor plane.
    #[must_use]
    pub fn to(&self, other: &PlanPoint) -> Vector3 {
        Vector3::new(other.x - self.x, 0.0, other.z - self.z)
    }

    /// Midpoint between two plan points.
    #[must_use]
    pub fn midpoint(&self, other: &PlanPoint) -> PlanPoint {
        PlanPoint::new((self.x + other.x) * 0.5, (self.z + other.z) * 0.5)
    }
}
