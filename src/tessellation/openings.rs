use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::math::polygon_2d::wall_normal;
use crate::math::{PlanPoint, Point3, Vector3, TOLERANCE};
use crate::walls::{FeatureKind, WallKey, WallSegment};

use super::{WallMesh, WallParams};

/// Bounding size of a loaded opening model, in model units.
///
/// Only the face extent is kept; proxy depth scales with the face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelExtent {
    pub width: f64,
    pub height: f64,
}

impl ModelExtent {
    fn is_usable(&self) -> bool {
        self.width > TOLERANCE && self.height > TOLERANCE
    }
}

/// Door and window models whose extents have been resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpeningModels {
    door: Option<(String, ModelExtent)>,
    window: Option<(String, ModelExtent)>,
}

impl OpeningModels {
    /// Records the extent of the model used for `kind`.
    pub fn register(&mut self, kind: FeatureKind, asset: impl Into<String>, extent: ModelExtent) {
        let entry = Some((asset.into(), extent));
        match kind {
            FeatureKind::Door => self.door = entry,
            FeatureKind::Window => self.window = entry,
        }
    }

    #[must_use]
    pub fn get(&self, kind: FeatureKind) -> Option<(&str, ModelExtent)> {
        let entry = match kind {
            FeatureKind::Door => self.door.as_ref(),
            FeatureKind::Window => self.window.as_ref(),
        };
        entry.map(|(asset, extent)| (asset.as_str(), *extent))
    }
}

/// Placement of an opening model inside a wall, in world space.
///
/// Models are assumed to be centred on their bounding box and to face along
/// their local +Z.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningProxy {
    pub wall: WallKey,
    /// Index into the wall's merged feature list.
    pub feature: usize,
    pub kind: FeatureKind,
    pub model: String,
    pub translation: Point3,
    /// Rotation about world Y.
    pub yaw: f64,
    pub scale: Vector3,
}

/// Places scaled proxy models into a wall's openings.
pub struct PlaceOpenings<'a> {
    wall: &'a WallMesh,
    segment: &'a WallSegment,
    room_centroid: PlanPoint,
    params: WallParams,
}

impl<'a> PlaceOpenings<'a> {
    /// Creates a new `PlaceOpenings` operation.
    ///
    /// `room_centroid` is the centroid of the room the windows should face.
    #[must_use]
    pub fn new(
        wall: &'a WallMesh,
        segment: &'a WallSegment,
        room_centroid: PlanPoint,
        params: WallParams,
    ) -> Self {
        Self {
            wall,
            segment,
            room_centroid,
            params,
        }
    }

    /// Executes the placement. Features whose model is not loaded are skipped.
    #[must_use]
    pub fn execute(&self, models: &OpeningModels) -> Vec<OpeningProxy> {
        let length = self.wall.length;
        let centre_z = self.wall.thickness * 0.5;
        let window_yaw = if self.faces_room() { 0.0 } else { PI };

        let mut proxies = Vec::new();
        for (index, feature) in self.segment.features.iter().enumerate() {
            let Some((model, extent)) = models.get(feature.kind) else {
                tracing::debug!(
                    wall = %self.wall.key,
                    kind = ?feature.kind,
                    "opening model not loaded"
                );
                continue;
            };
            if !extent.is_usable() {
                continue;
            }
            let base = self.params.base_height(feature.kind);
            let x = feature.position * length;

            let (local, local_yaw, scale) = match feature.kind {
                FeatureKind::Door => {
                    let s = (feature.width / extent.width).min(feature.height / extent.height);
                    let centre_y = base + extent.height * s * 0.5;
                    (Point3::new(x, centre_y, centre_z), FRAC_PI_2, Vector3::repeat(s))
                }
                FeatureKind::Window => {
                    let sx = feature.width / extent.width;
                    let sy = feature.height / extent.height;
                    let centre_y = base + feature.height * 0.5;
                    (Point3::new(x, centre_y, centre_z), window_yaw, Vector3::new(sx, sy, sx))
                }
            };

            proxies.push(OpeningProxy {
                wall: self.wall.key.clone(),
                feature: index,
                kind: feature.kind,
                model: model.to_owned(),
                translation: self.wall.to_world(&local),
                yaw: self.wall.yaw + local_yaw,
                scale,
            });
        }
        proxies
    }

    /// Returns `true` if the wall's local +Z already points toward the room.
    fn faces_room(&self) -> bool {
        let dir = self.segment.start.to(&self.segment.end);
        let normal = wall_normal(dir);
        let mid = self.segment.start.midpoint(&self.segment.end);
        normal.dot(&mid.to(&self.room_centroid)) >= 0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tessellation::BuildWallMesh;
    use crate::topology::RoomId;
    use crate::walls::{EdgeRef, WallFeature};
    use approx::assert_relative_eq;

    fn segment(features: Vec<WallFeature>) -> WallSegment {
        let start = PlanPoint::new(0.0, 0.0);
        let end = PlanPoint::new(4.0, 0.0);
        WallSegment {
            key: WallKey::new(&start, &end),
            start,
            end,
            edges: vec![EdgeRef {
                room: RoomId::default(),
                edge: 0,
                reversed: false,
            }],
            features,
        }
    }

    fn models() -> OpeningModels {
        let mut models = OpeningModels::default();
        let door = ModelExtent {
            width: 1.0,
            height: 2.0,
        };
        let window = ModelExtent {
            width: 2.0,
            height: 1.0,
        };
        models.register(FeatureKind::Door, "door.glb", door);
        models.register(FeatureKind::Window, "window.glb", window);
        models
    }

    fn place(features: Vec<WallFeature>, centroid: PlanPoint) -> Vec<OpeningProxy> {
        let seg = segment(features);
        let params = WallParams::default();
        let wall = BuildWallMesh::new(&seg, params).execute().unwrap();
        PlaceOpenings::new(&wall, &seg, centroid, params).execute(&models())
    }

    #[test]
    fn door_scales_uniformly_and_turns_quarter() {
        let proxies = place(vec![WallFeature::door(0.5, 0.9, 2.1)], PlanPoint::new(2.0, 2.0));
        let door = &proxies[0];
        assert_relative_eq!(door.scale.x, 0.9);
        assert_relative_eq!(door.scale.y, 0.9);
        assert_relative_eq!(door.scale.z, 0.9);
        assert_relative_eq!(door.yaw, FRAC_PI_2);
        assert_relative_eq!(door.translation.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(door.translation.y, 0.9, epsilon = 1e-9);
        assert_relative_eq!(door.translation.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn window_scales_per_axis() {
        let proxies = place(vec![WallFeature::window(0.25, 1.0, 1.5)], PlanPoint::new(2.0, 2.0));
        let window = &proxies[0];
        assert_relative_eq!(window.scale.x, 0.5);
        assert_relative_eq!(window.scale.y, 1.5);
        assert_relative_eq!(window.scale.z, 0.5);
        assert_relative_eq!(window.translation.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(window.translation.y, 1.75, epsilon = 1e-9);
    }

    #[test]
    fn window_turns_toward_the_room() {
        // Local +Z of a wall along +X is world +Z.
        let inside = place(vec![WallFeature::window(0.5, 1.0, 1.0)], PlanPoint::new(2.0, 2.0));
        let outside = place(vec![WallFeature::window(0.5, 1.0, 1.0)], PlanPoint::new(2.0, -2.0));
        assert_relative_eq!(inside[0].yaw, 0.0);
        assert_relative_eq!(outside[0].yaw, PI);
    }

    #[test]
    fn unloaded_models_are_skipped() {
        let seg = segment(vec![WallFeature::door(0.5, 0.9, 2.0)]);
        let params = WallParams::default();
        let wall = BuildWallMesh::new(&seg, params).execute().unwrap();
        let proxies = PlaceOpenings::new(&wall, &seg, PlanPoint::new(2.0, 2.0), params)
            .execute(&OpeningModels::default());
        assert!(proxies.is_empty());
    }
}
