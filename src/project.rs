//! Project documents: a snapshot of vertices, rooms and appearance.
//!
//! The document holds no mesh or renderer state; importing one rebuilds all
//! geometry from the topology it describes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::appearance::{AppearanceStore, SurfaceStyle, WallAppearance};
use crate::error::{ProjectError, Result};
use crate::math::polygon_2d::polygon_area;
use crate::math::PlanPoint;
use crate::topology::{Room, RoomId, RoomTopology, RoomType, VertexPool};
use crate::walls::WallFeature;

/// Serializable project state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default)]
    pub global_vertices: Vec<PlanPoint>,
    #[serde(default)]
    pub room_vertex_indices: Vec<Vec<i64>>,
    #[serde(default)]
    pub room_metadata: Vec<RoomMetadata>,
    #[serde(default)]
    pub wall_appearance: WallAppearance,
    #[serde(default)]
    pub floor_appearance: BTreeMap<String, SurfaceStyle>,
}

impl ProjectDocument {
    /// Parses a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Json` if the text is not a project document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProjectError::Json(e).into())
    }

    /// Serializes the document to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::Json(e).into())
    }
}

/// Stored metadata of one room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub area: f64,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_features: Option<Vec<Vec<WallFeature>>>,
}

/// A recoverable problem found while importing a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportWarning {
    #[error("room {room} skipped: vertex index {index} is out of range")]
    VertexOutOfRange { room: usize, index: i64 },

    #[error("room {room} skipped: {vertices} vertices is too few for a polygon")]
    TooFewVertices { room: usize, vertices: usize },

    #[error("room {room} has no metadata; defaults used")]
    MissingMetadata { room: usize },

    #[error("room {room} lists features for {found} edges but has {expected}")]
    FeatureCountMismatch {
        room: usize,
        expected: usize,
        found: usize,
    },

    #[error("room {room} edge {edge}: dropped invalid feature")]
    InvalidFeature { room: usize, edge: usize },

    #[error("floor appearance key {key:?} matches no imported room")]
    UnresolvedFloorKey { key: String },
}

/// Outcome of an import that succeeded, possibly partially.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rooms_imported: usize,
    pub warnings: Vec<ImportWarning>,
}

/// State rebuilt from a document.
#[derive(Debug)]
pub struct ImportedProject {
    pub pool: VertexPool,
    pub rooms: RoomTopology,
    pub appearance: AppearanceStore,
    pub report: ImportReport,
}

/// Snapshots the topology and appearance into a document.
pub struct ExportProject<'a> {
    pool: &'a VertexPool,
    rooms: &'a RoomTopology,
    appearance: &'a AppearanceStore,
}

impl<'a> ExportProject<'a> {
    /// Creates a new `ExportProject` operation.
    #[must_use]
    pub fn new(
        pool: &'a VertexPool,
        rooms: &'a RoomTopology,
        appearance: &'a AppearanceStore,
    ) -> Self {
        Self {
            pool,
            rooms,
            appearance,
        }
    }

    /// Executes the export. Rooms are written in creation order and floor
    /// styles are keyed by that position.
    ///
    /// Floor styles of deleted rooms have no position and are not written.
    /// Detached keys from an earlier import are kept unless a live room
    /// now occupies the same position.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn execute(&self) -> ProjectDocument {
        let mut doc = ProjectDocument {
            global_vertices: self.pool.points().to_vec(),
            wall_appearance: self.appearance.walls().clone(),
            ..ProjectDocument::default()
        };

        for (ordinal, (id, room)) in self.rooms.iter().enumerate() {
            doc.room_vertex_indices
                .push(room.indices.iter().map(|&i| i as i64).collect());
            let has_features =
                room.features_listed || room.wall_features.iter().any(|f| !f.is_empty());
            doc.room_metadata.push(RoomMetadata {
                name: room.name.clone(),
                room_type: room.room_type,
                area: room.area,
                color: room.color.clone(),
                wall_features: has_features.then(|| room.wall_features.clone()),
            });
            if let Some(style) = self.appearance.floor_style(id) {
                doc.floor_appearance.insert(ordinal.to_string(), style.clone());
            }
        }

        for (key, style) in self.appearance.detached_floors() {
            doc.floor_appearance
                .entry(key.clone())
                .or_insert_with(|| style.clone());
        }

        doc
    }
}

/// Rebuilds topology and appearance from a document.
pub struct ImportProject<'a> {
    doc: &'a ProjectDocument,
    epsilon: f64,
}

impl<'a> ImportProject<'a> {
    /// Creates a new `ImportProject` operation. `epsilon` is the merge
    /// distance of the rebuilt vertex pool.
    #[must_use]
    pub fn new(doc: &'a ProjectDocument, epsilon: f64) -> Self {
        Self { doc, epsilon }
    }

    /// Executes the import.
    ///
    /// Rooms with out-of-range indices or fewer than three vertices are
    /// skipped with a warning; everything else still imports. Areas are
    /// recomputed from the stored vertices.
    #[must_use]
    pub fn execute(&self) -> ImportedProject {
        let doc = self.doc;
        let pool = VertexPool::from_points(doc.global_vertices.clone(), self.epsilon);
        let mut rooms = RoomTopology::new();
        let mut report = ImportReport::default();
        let mut by_ordinal: BTreeMap<usize, RoomId> = BTreeMap::new();

        for (ordinal, raw) in doc.room_vertex_indices.iter().enumerate() {
            let Some(indices) = self.resolve_indices(ordinal, raw, &pool, &mut report) else {
                continue;
            };

            let meta = doc.room_metadata.get(ordinal).cloned().unwrap_or_else(|| {
                report.warnings.push(ImportWarning::MissingMetadata { room: ordinal });
                RoomMetadata {
                    name: format!("Room {}", ordinal + 1),
                    ..RoomMetadata::default()
                }
            });

            let edges = indices.len();
            let features_listed = meta.wall_features.is_some();
            let wall_features =
                Self::restore_features(ordinal, edges, meta.wall_features, &mut report);
            let area = pool.resolve(&indices).map_or(0.0, |pts| polygon_area(&pts));

            let id = rooms.insert(Room {
                indices,
                name: meta.name,
                room_type: meta.room_type,
                area,
                color: meta.color,
                wall_features,
                features_listed,
            });
            by_ordinal.insert(ordinal, id);
        }
        report.rooms_imported = rooms.len();

        let mut appearance = AppearanceStore::new();
        appearance.replace_walls(doc.wall_appearance.clone());
        for (key, style) in &doc.floor_appearance {
            let room = key.parse::<usize>().ok().and_then(|o| by_ordinal.get(&o));
            match room {
                Some(&id) => {
                    appearance.set_floor(id, style);
                }
                None => {
                    report
                        .warnings
                        .push(ImportWarning::UnresolvedFloorKey { key: key.clone() });
                    appearance.insert_detached_floor(key.clone(), style.clone());
                }
            }
        }

        for warning in &report.warnings {
            tracing::warn!(%warning, "project import");
        }

        ImportedProject {
            pool,
            rooms,
            appearance,
            report,
        }
    }

    fn resolve_indices(
        &self,
        ordinal: usize,
        raw: &[i64],
        pool: &VertexPool,
        report: &mut ImportReport,
    ) -> Option<Vec<usize>> {
        if raw.len() < 3 {
            report.warnings.push(ImportWarning::TooFewVertices {
                room: ordinal,
                vertices: raw.len(),
            });
            return None;
        }
        let mut indices = Vec::with_capacity(raw.len());
        for &index in raw {
            match usize::try_from(index) {
                Ok(i) if i < pool.len() => indices.push(i),
                _ => {
                    report
                        .warnings
                        .push(ImportWarning::VertexOutOfRange { room: ordinal, index });
                    return None;
                }
            }
        }
        Some(indices)
    }

    fn restore_features(
        ordinal: usize,
        edges: usize,
        stored: Option<Vec<Vec<WallFeature>>>,
        report: &mut ImportReport,
    ) -> Vec<Vec<WallFeature>> {
        let Some(mut lists) = stored else {
            return vec![Vec::new(); edges];
        };
        if lists.len() != edges {
            report.warnings.push(ImportWarning::FeatureCountMismatch {
                room: ordinal,
                expected: edges,
                found: lists.len(),
            });
            lists.resize_with(edges, Vec::new);
        }
        for (edge, list) in lists.iter_mut().enumerate() {
            let before = list.len();
            list.retain(|f| f.validate().is_ok());
            for _ in list.len()..before {
                report
                    .warnings
                    .push(ImportWarning::InvalidFeature { room: ordinal, edge });
            }
        }
        lists
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tessellation::FaceRole;
    use crate::topology::ClosePolygon;
    use crate::walls::WallKey;

    const DOC: &str = r##"{
        "globalVertices": [
            {"x": 0, "z": 0}, {"x": 4, "z": 0}, {"x": 4, "z": 3}, {"x": 0, "z": 3},
            {"x": 8, "z": 0}, {"x": 8, "z": 3}
        ],
        "roomVertexIndices": [[0, 1, 2, 3], [2, 1, 4, 5]],
        "roomMetadata": [
            {"name": "Kitchen", "type": "kitchen", "area": 12, "color": "#aabbcc",
             "wallFeatures": [
                [],
                [{"type": "door", "position": 0.5, "width": 0.9, "height": 2.1}],
                [],
                []
             ]},
            {"name": "Room 2", "type": "generic", "area": 12, "color": "#ddeeff"}
        ],
        "wallAppearance": {
            "4,0|4,3": {"front": {"color": "#ff0000"}, "hole-edge": {"texture": "trim"}}
        },
        "floorAppearance": {"1": {"texture": "oak"}}
    }"##;

    #[test]
    fn import_rebuilds_rooms_and_appearance() {
        let doc = ProjectDocument::from_json(DOC).unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        assert!(imported.report.warnings.is_empty(), "{:?}", imported.report.warnings);
        assert_eq!(imported.report.rooms_imported, 2);

        let ids: Vec<RoomId> = imported.rooms.ids().to_vec();
        let kitchen = imported.rooms.room(ids[0]).unwrap();
        assert_eq!(kitchen.room_type, RoomType::Kitchen);
        assert_eq!(kitchen.features(1).len(), 1);
        assert!((kitchen.area - 12.0).abs() < 1e-12);

        let key = WallKey::from_raw("4,0|4,3");
        assert!(imported.appearance.wall_style(&key, FaceRole::HoleEdge).is_some());
        assert_eq!(
            imported.appearance.floor_style(ids[1]).unwrap().texture.as_deref(),
            Some("oak")
        );
    }

    #[test]
    fn export_of_import_reproduces_the_document() {
        let original: serde_json::Value = serde_json::from_str(DOC).unwrap();
        let doc = ProjectDocument::from_json(DOC).unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        let exported =
            ExportProject::new(&imported.pool, &imported.rooms, &imported.appearance).execute();
        let exported: serde_json::Value = serde_json::to_value(&exported).unwrap();
        assert_eq!(exported, normalise_numbers(original));
    }

    /// Integers in the hand-written document come back as floats.
    fn normalise_numbers(value: serde_json::Value) -> serde_json::Value {
        use serde_json::Value;
        match value {
            Value::Number(n) if n.is_i64() && !n.is_f64() => {
                serde_json::to_value(n.as_f64().unwrap_or_default()).unwrap()
            }
            Value::Array(items) => Value::Array(items.into_iter().map(normalise_numbers).collect()),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let keep_int = k == "roomVertexIndices";
                        (k, if keep_int { v } else { normalise_numbers(v) })
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let doc = ProjectDocument::from_json("{}").unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        assert!(imported.rooms.is_empty());
        assert!(imported.pool.is_empty());
        assert!(imported.report.warnings.is_empty());
    }

    #[test]
    fn bad_room_is_skipped_and_rest_imports() {
        let text = r#"{
            "globalVertices": [{"x": 0, "z": 0}, {"x": 1, "z": 0}, {"x": 1, "z": 1}],
            "roomVertexIndices": [[0, 1, 7], [0, 1, 2], [0, -1, 2], [0, 1]],
            "roomMetadata": [{"name": "A"}, {"name": "B"}]
        }"#;
        let doc = ProjectDocument::from_json(text).unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        assert_eq!(imported.report.rooms_imported, 1);
        let (_, room) = imported.rooms.iter().next().unwrap();
        assert_eq!(room.name, "B");
        assert!(imported
            .report
            .warnings
            .contains(&ImportWarning::VertexOutOfRange { room: 0, index: 7 }));
        assert!(imported
            .report
            .warnings
            .contains(&ImportWarning::VertexOutOfRange { room: 2, index: -1 }));
        assert!(imported
            .report
            .warnings
            .contains(&ImportWarning::TooFewVertices { room: 3, vertices: 2 }));
    }

    #[test]
    fn mismatched_feature_lists_are_padded() {
        let text = r#"{
            "globalVertices": [{"x": 0, "z": 0}, {"x": 4, "z": 0}, {"x": 4, "z": 3}],
            "roomVertexIndices": [[0, 1, 2]],
            "roomMetadata": [{
                "name": "A",
                "wallFeatures": [[{"type": "window", "position": 2, "width": 1, "height": 1}]]
            }]
        }"#;
        let doc = ProjectDocument::from_json(text).unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        let (_, room) = imported.rooms.iter().next().unwrap();
        assert_eq!(room.wall_features.len(), 3);
        assert!(room.wall_features.iter().all(Vec::is_empty));
        assert_eq!(imported.report.warnings.len(), 2);
    }

    #[test]
    fn unresolved_floor_keys_survive_round_trip() {
        let text = r##"{ "floorAppearance": { "5": { "color": "#010203" } } }"##;
        let doc = ProjectDocument::from_json(text).unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        assert_eq!(imported.report.warnings.len(), 1);
        let exported =
            ExportProject::new(&imported.pool, &imported.rooms, &imported.appearance).execute();
        assert_eq!(exported.floor_appearance, doc.floor_appearance);
    }

    #[test]
    fn export_keys_floors_by_room_position() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let p = PlanPoint::new;
        let a = ClosePolygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#000000".into())
            .unwrap();
        let b = ClosePolygon::new(vec![p(5.0, 0.0), p(6.0, 0.0), p(6.0, 1.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#000000".into())
            .unwrap();
        let mut appearance = AppearanceStore::new();
        appearance.set_floor(a, &SurfaceStyle::color("#ff0000"));
        appearance.set_floor(b, &SurfaceStyle::color("#00ff00"));
        rooms.remove(a).unwrap();

        let doc = ExportProject::new(&pool, &rooms, &appearance).execute();
        assert_eq!(doc.room_vertex_indices, vec![vec![3, 4, 5]]);
        assert_eq!(doc.global_vertices.len(), 6);
        // The deleted room's floor is dropped; b now sits at position 0.
        assert_eq!(doc.floor_appearance.len(), 1);
        assert_eq!(doc.floor_appearance["0"].color.as_deref(), Some("#00ff00"));
        assert!(doc.room_metadata[0].wall_features.is_none());
        // The style itself stays in the store.
        assert!(appearance.floor_style(a).is_some());
    }

    #[test]
    fn empty_feature_lists_survive_round_trip() {
        let text = r##"{
            "globalVertices": [{"x": 0.0, "z": 0.0}, {"x": 4.0, "z": 0.0}, {"x": 4.0, "z": 3.0}],
            "roomVertexIndices": [[0, 1, 2]],
            "roomMetadata": [
                {"name": "A", "type": "generic", "area": 6.0, "color": "#aabbcc",
                 "wallFeatures": [[], [], []]}
            ]
        }"##;
        let doc = ProjectDocument::from_json(text).unwrap();
        let imported = ImportProject::new(&doc, 0.01).execute();
        assert!(imported.report.warnings.is_empty());
        let exported =
            ExportProject::new(&imported.pool, &imported.rooms, &imported.appearance).execute();
        assert_eq!(exported.room_metadata[0].wall_features, Some(vec![Vec::new(); 3]));
        assert_eq!(exported, doc);
    }

    #[test]
    fn cleared_features_are_still_listed() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let p = PlanPoint::new;
        let a = ClosePolygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#000000".into())
            .unwrap();
        rooms
            .set_wall_features(a, 0, vec![WallFeature::door(0.5, 0.9, 2.0)])
            .unwrap();
        rooms.set_wall_features(a, 0, Vec::new()).unwrap();

        let doc = ExportProject::new(&pool, &rooms, &AppearanceStore::new()).execute();
        assert_eq!(doc.room_metadata[0].wall_features, Some(vec![Vec::new(); 3]));
    }
}
