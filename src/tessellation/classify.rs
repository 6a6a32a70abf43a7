use crate::config::ClassifierThresholds;
use crate::math::{Point3, TOLERANCE};

use super::FaceRole;

/// Assigns a face role to a wall triangle from its normal alone.
///
/// Triangles are given in wall-local space: X along the wall, Y up, Z through
/// the thickness from `0` (front) to `thickness` (back).
#[derive(Debug, Clone, Copy)]
pub struct FaceClassifier {
    thresholds: ClassifierThresholds,
    thickness: f64,
}

impl FaceClassifier {
    #[must_use]
    pub fn new(thresholds: ClassifierThresholds, thickness: f64) -> Self {
        Self {
            thresholds,
            thickness,
        }
    }

    /// Classifies one triangle by the normal implied by its winding.
    ///
    /// Degenerate triangles fall back to [`FaceRole::Side`].
    #[must_use]
    pub fn classify(&self, corners: &[Point3; 3]) -> FaceRole {
        let [a, b, c] = corners;
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < TOLERANCE {
            return FaceRole::Side;
        }
        let n = n / len;
        let cutoff = self.thresholds.axis;

        if n.z.abs() > cutoff {
            return if n.z < 0.0 {
                FaceRole::Front
            } else {
                FaceRole::Back
            };
        }
        if n.y.abs() > cutoff {
            return if n.y > 0.0 {
                FaceRole::Top
            } else {
                FaceRole::Bottom
            };
        }
        if n.x.abs() > cutoff {
            return FaceRole::Side;
        }
        let inside = corners
            .iter()
            .all(|p| p.z > TOLERANCE && p.z < self.thickness - TOLERANCE);
        if inside {
            FaceRole::HoleEdge
        } else {
            FaceRole::Side
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FaceClassifier {
        FaceClassifier::new(ClassifierThresholds::default(), 0.3)
    }

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn front_and_back_from_z_normal() {
        let c = classifier();
        // Clockwise seen from +Z → normal −Z.
        assert_eq!(
            c.classify(&[p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 0.0, 0.0)]),
            FaceRole::Front
        );
        assert_eq!(
            c.classify(&[p(0.0, 0.0, 0.3), p(1.0, 0.0, 0.3), p(0.0, 1.0, 0.3)]),
            FaceRole::Back
        );
    }

    #[test]
    fn top_bottom_and_side() {
        let c = classifier();
        assert_eq!(
            c.classify(&[p(0.0, 3.0, 0.0), p(0.0, 3.0, 0.3), p(1.0, 3.0, 0.0)]),
            FaceRole::Top
        );
        assert_eq!(
            c.classify(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.3)]),
            FaceRole::Bottom
        );
        assert_eq!(
            c.classify(&[p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.3), p(0.0, 1.0, 0.0)]),
            FaceRole::Side
        );
    }

    #[test]
    fn oblique_face_inside_thickness_is_hole_edge() {
        let c = classifier();
        // Normal along (1, 1, 1).
        let tri = [p(0.2, 0.0, 0.1), p(0.0, 0.2, 0.1), p(0.0, 0.1, 0.2)];
        assert_eq!(c.classify(&tri), FaceRole::HoleEdge);
    }

    #[test]
    fn oblique_face_touching_surface_falls_back_to_side() {
        let c = classifier();
        let tri = [p(0.3, 0.0, 0.0), p(0.0, 0.2, 0.1), p(0.0, 0.1, 0.2)];
        assert_eq!(c.classify(&tri), FaceRole::Side);
    }

    #[test]
    fn degenerate_triangle_is_side() {
        let c = classifier();
        let tri = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert_eq!(c.classify(&tri), FaceRole::Side);
    }

    #[test]
    fn thresholds_are_configurable() {
        let loose = FaceClassifier::new(ClassifierThresholds { axis: 0.5 }, 0.3);
        // Normal (0, 0.6, 0.8).
        let tri = [p(0.0, 0.0, 0.2), p(1.0, 0.0, 0.2), p(0.0, 0.2, 0.05)];
        assert_eq!(loose.classify(&tri), FaceRole::Back);
        assert_eq!(classifier().classify(&tri), FaceRole::HoleEdge);
    }
}
