use serde::{Deserialize, Serialize};

use crate::walls::WallFeature;

slotmap::new_key_type! {
    /// Unique identifier for a room in the room topology.
    pub struct RoomId;
}

/// Room category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomType {
    #[default]
    Generic,
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    DiningRoom,
    Office,
    Hallway,
    Storage,
    Garage,
    Utility,
}

/// A closed room outline plus its metadata.
///
/// The outline is an ordered list of vertex-pool indices with an implicit
/// closing edge from the last vertex back to the first. `wall_features[i]`
/// holds the openings on edge `i` (from vertex `i` to vertex `i + 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub indices: Vec<usize>,
    pub name: String,
    pub room_type: RoomType,
    /// Derived from the resolved outline; never set directly.
    pub area: f64,
    pub color: String,
    pub wall_features: Vec<Vec<WallFeature>>,
    /// Set once feature lists were assigned or imported, even if all are
    /// empty; exports keep the lists in that case.
    pub features_listed: bool,
}

impl Room {
    /// Creates a room with default metadata and no openings.
    #[must_use]
    pub fn new(indices: Vec<usize>, name: String, color: String) -> Self {
        let edges = indices.len();
        Self {
            indices,
            name,
            room_type: RoomType::Generic,
            area: 0.0,
            color,
            wall_features: vec![Vec::new(); edges],
            features_listed: false,
        }
    }

    /// Number of edges (equal to the number of vertices).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.indices.len()
    }

    /// Pool indices of edge `edge`, or `None` if out of range.
    #[must_use]
    pub fn edge(&self, edge: usize) -> Option<(usize, usize)> {
        let n = self.indices.len();
        if edge >= n {
            return None;
        }
        Some((self.indices[edge], self.indices[(edge + 1) % n]))
    }

    /// Openings on edge `edge`; empty when none are defined.
    #[must_use]
    pub fn features(&self, edge: usize) -> &[WallFeature] {
        self.wall_features.get(edge).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the outline uses pool vertex `index`.
    #[must_use]
    pub fn uses_vertex(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_wrap_around() {
        let room = Room::new(vec![4, 5, 6], "Room 1".into(), "#ffffff".into());
        assert_eq!(room.edge(0), Some((4, 5)));
        assert_eq!(room.edge(2), Some((6, 4)));
        assert_eq!(room.edge(3), None);
        assert_eq!(room.wall_features.len(), 3);
        assert!(room.features(7).is_empty());
    }

    #[test]
    fn room_type_wire_names() {
        let json = serde_json::to_string(&RoomType::LivingRoom).unwrap_or_default();
        assert_eq!(json, r#""living-room""#);
    }
}
