use crate::config::{ClassifierThresholds, EngineConfig};
use crate::error::{MeshError, Result};
use crate::math::polygon_2d::{segment_direction, wall_normal};
use crate::math::{Isometry3, Point2, Point3, Vector3, TOLERANCE};
use crate::walls::{FeatureKind, WallFeature, WallKey, WallSegment};

use super::{FaceClassifier, FaceGroup, FaceRole, TriangleMesh};

/// Dimensions used to extrude every wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallParams {
    pub height: f64,
    pub thickness: f64,
    pub window_base: f64,
    pub door_base: f64,
    pub thresholds: ClassifierThresholds,
}

impl Default for WallParams {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl WallParams {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            height: config.wall_height,
            thickness: config.wall_thickness,
            window_base: config.window_base_height,
            door_base: config.door_base_height,
            thresholds: config.classification,
        }
    }

    /// Height at which an opening of `kind` starts.
    #[must_use]
    pub fn base_height(&self, kind: FeatureKind) -> f64 {
        match kind {
            FeatureKind::Window => self.window_base,
            FeatureKind::Door => self.door_base,
        }
    }
}

/// Axis-aligned opening rectangle in the wall profile (local X/Y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl HoleRect {
    fn for_feature(feature: &WallFeature, length: f64, base: f64) -> Self {
        let centre = feature.position * length;
        let half = feature.width * 0.5;
        Self {
            x_min: centre - half,
            x_max: centre + half,
            y_min: base,
            y_max: base + feature.height,
        }
    }

    fn clipped(&self, length: f64, height: f64) -> Option<Self> {
        let clipped = Self {
            x_min: self.x_min.max(0.0),
            x_max: self.x_max.min(length),
            y_min: self.y_min.max(0.0),
            y_max: self.y_max.min(height),
        };
        let empty = clipped.x_max - clipped.x_min < TOLERANCE
            || clipped.y_max - clipped.y_min < TOLERANCE;
        (!empty).then_some(clipped)
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        x > self.x_min && x < self.x_max && y > self.y_min && y < self.y_max
    }
}

/// Extruded wall geometry with one triangle group per face role.
///
/// `mesh` is in wall-local space: X runs from the segment start to its end,
/// Y is up, Z spans `0..thickness`. `transform` maps local to world space and
/// centres the slab on the wall line.
#[derive(Debug, Clone, PartialEq)]
pub struct WallMesh {
    pub key: WallKey,
    pub transform: Isometry3,
    /// Rotation about world Y applied by `transform`.
    pub yaw: f64,
    pub length: f64,
    pub thickness: f64,
    /// One rectangle per merged feature, as requested (before clipping).
    pub holes: Vec<HoleRect>,
    pub mesh: TriangleMesh,
    pub groups: Vec<FaceGroup>,
}

impl WallMesh {
    /// Triangle group of `role`, if the wall has any such triangles.
    #[must_use]
    pub fn group(&self, role: FaceRole) -> Option<&FaceGroup> {
        self.groups.iter().find(|g| g.role == role)
    }

    /// Maps a wall-local point to world space.
    #[must_use]
    pub fn to_world(&self, local: &Point3) -> Point3 {
        self.transform * local
    }

    /// World direction of local +Z (the back face normal).
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.transform * Vector3::z()
    }
}

/// Extrudes one wall segment into a multi-material mesh with cut openings.
pub struct BuildWallMesh<'a> {
    segment: &'a WallSegment,
    params: WallParams,
}

impl<'a> BuildWallMesh<'a> {
    /// Creates a new `BuildWallMesh` operation.
    #[must_use]
    pub fn new(segment: &'a WallSegment, params: WallParams) -> Self {
        Self { segment, params }
    }

    /// Executes the extrusion.
    ///
    /// The profile `length × height` minus every opening is decomposed into a
    /// grid of cells along all opening edges. Solid cells emit front and back
    /// quads and every solid/empty boundary emits a quad through the
    /// thickness, so overlapping openings need no special handling.
    ///
    /// # Errors
    ///
    /// Returns `MeshError::DegenerateSegment` for a zero-length segment.
    pub fn execute(&self) -> Result<WallMesh> {
        let segment = self.segment;
        let length = segment.length();
        if length < TOLERANCE {
            return Err(MeshError::DegenerateSegment(segment.key.to_string()).into());
        }
        let height = self.params.height;
        let thickness = self.params.thickness;

        let dir = segment_direction(&segment.start, &segment.end)?;
        let normal = wall_normal(dir);
        let yaw = (-dir.z).atan2(dir.x);
        let translation = segment.start.at_height(0.0).coords - normal * (thickness * 0.5);
        let transform = Isometry3::new(translation, Vector3::y() * yaw);

        let holes: Vec<HoleRect> = segment
            .features
            .iter()
            .map(|f| HoleRect::for_feature(f, length, self.params.base_height(f.kind)))
            .collect();
        let cut: Vec<HoleRect> = holes
            .iter()
            .filter_map(|h| {
                let clipped = h.clipped(length, height);
                if clipped.is_none() {
                    tracing::debug!(wall = %segment.key, ?h, "opening lies outside the wall");
                }
                clipped
            })
            .collect();

        let xs = grid_lines(length, cut.iter().flat_map(|h| [h.x_min, h.x_max]));
        let ys = grid_lines(height, cut.iter().flat_map(|h| [h.y_min, h.y_max]));
        let nx = xs.len() - 1;
        let ny = ys.len() - 1;
        let solid = |i: isize, j: isize| -> bool {
            let (Ok(i), Ok(j)) = (usize::try_from(i), usize::try_from(j)) else {
                return false;
            };
            if i >= nx || j >= ny {
                return false;
            }
            let cx = (xs[i] + xs[i + 1]) * 0.5;
            let cy = (ys[j] + ys[j + 1]) * 0.5;
            !cut.iter().any(|h| h.contains(cx, cy))
        };

        let mut extruder = Extruder {
            classifier: FaceClassifier::new(self.params.thresholds, thickness),
            buckets: Default::default(),
        };
        let t = thickness;
        for (j, y) in ys.windows(2).enumerate() {
            for (i, x) in xs.windows(2).enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let (ii, jj) = (i as isize, j as isize);
                if !solid(ii, jj) {
                    continue;
                }
                let (x0, x1, y0, y1) = (x[0], x[1], y[0], y[1]);
                let p = Point3::new;

                extruder.quad(
                    [p(x0, y0, 0.0), p(x1, y0, 0.0), p(x1, y1, 0.0), p(x0, y1, 0.0)],
                    -Vector3::z(),
                );
                extruder.quad(
                    [p(x0, y0, t), p(x1, y0, t), p(x1, y1, t), p(x0, y1, t)],
                    Vector3::z(),
                );

                if !solid(ii - 1, jj) {
                    extruder.quad(
                        [p(x0, y0, 0.0), p(x0, y1, 0.0), p(x0, y1, t), p(x0, y0, t)],
                        -Vector3::x(),
                    );
                }
                if !solid(ii + 1, jj) {
                    extruder.quad(
                        [p(x1, y0, 0.0), p(x1, y1, 0.0), p(x1, y1, t), p(x1, y0, t)],
                        Vector3::x(),
                    );
                }
                if !solid(ii, jj - 1) {
                    extruder.quad(
                        [p(x0, y0, 0.0), p(x1, y0, 0.0), p(x1, y0, t), p(x0, y0, t)],
                        -Vector3::y(),
                    );
                }
                if !solid(ii, jj + 1) {
                    extruder.quad(
                        [p(x0, y1, 0.0), p(x1, y1, 0.0), p(x1, y1, t), p(x0, y1, t)],
                        Vector3::y(),
                    );
                }
            }
        }

        let (mesh, groups) = extruder.finish();
        Ok(WallMesh {
            key: segment.key.clone(),
            transform,
            yaw,
            length,
            thickness,
            holes,
            mesh,
            groups,
        })
    }
}

/// Collects emitted triangles into one bucket per face role.
struct Extruder {
    classifier: FaceClassifier,
    buckets: [TriangleMesh; 6],
}

impl Extruder {
    /// Emits a planar quad wound so its normal matches `outward`.
    fn quad(&mut self, mut corners: [Point3; 4], outward: Vector3) {
        let n = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
        if n.dot(&outward) < 0.0 {
            corners.reverse();
        }
        let [a, b, c, d] = corners;
        self.triangle([a, b, c], outward);
        self.triangle([a, c, d], outward);
    }

    fn triangle(&mut self, corners: [Point3; 3], normal: Vector3) {
        let role = self.classifier.classify(&corners);
        let uvs = corners.map(|p| remap_uv(role, &p));
        self.buckets[role.slot()].push_triangle(corners, normal, uvs);
    }

    /// Concatenates the buckets in slot order.
    fn finish(self) -> (TriangleMesh, Vec<FaceGroup>) {
        let mut mesh = TriangleMesh::default();
        let mut groups = Vec::new();
        for role in FaceRole::ALL {
            let bucket = &self.buckets[role.slot()];
            if bucket.is_empty() {
                continue;
            }
            groups.push(FaceGroup {
                role,
                start: mesh.indices.len(),
                count: bucket.indices.len(),
            });
            mesh.merge(bucket);
        }
        (mesh, groups)
    }
}

/// Per-role UV projection that keeps texel size independent of wall length
/// and thickness.
fn remap_uv(role: FaceRole, p: &Point3) -> Point2 {
    match role {
        FaceRole::Front | FaceRole::Back => Point2::new(p.x, p.y),
        FaceRole::Side | FaceRole::HoleEdge => Point2::new(p.z, p.y),
        FaceRole::Top | FaceRole::Bottom => Point2::new(p.x, p.z),
    }
}

/// Sorted, de-duplicated cut positions spanning `0..extent`.
fn grid_lines(extent: f64, cuts: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut lines: Vec<f64> = std::iter::once(0.0)
        .chain(std::iter::once(extent))
        .chain(cuts)
        .collect();
    lines.sort_by(f64::total_cmp);
    lines.dedup_by(|a, b| (*a - *b).abs() < TOLERANCE);
    lines
}
