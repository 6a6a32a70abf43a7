use std::collections::BTreeMap;

use crate::error::Result;
use crate::math::PlanPoint;
use crate::topology::{RoomId, RoomTopology, VertexPool};

use super::{WallFeature, WallKey};

/// One room edge that lies on a wall segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub room: RoomId,
    pub edge: usize,
    /// `true` if the room traverses the edge opposite to the segment's
    /// `start → end` direction.
    pub reversed: bool,
}

/// A unique physical wall derived from one or more room edges.
///
/// The first bordering edge owns the wall: `start`/`end` follow its
/// traversal, and every merged feature position is measured from `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct WallSegment {
    pub key: WallKey,
    pub start: PlanPoint,
    pub end: PlanPoint,
    pub edges: Vec<EdgeRef>,
    /// Openings contributed by every bordering edge, owner first. Overlapping
    /// openings are kept as-is.
    pub features: Vec<WallFeature>,
}

impl WallSegment {
    /// Room that owns the generated mesh.
    #[must_use]
    pub fn owner(&self) -> RoomId {
        self.edges[0].room
    }

    /// Distance between the two endpoints.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Returns `true` if the wall separates two rooms.
    #[must_use]
    pub fn is_interior(&self) -> bool {
        self.edges.iter().any(|e| e.room != self.owner())
    }

    /// Returns `true` if `room` borders this wall.
    #[must_use]
    pub fn borders(&self, room: RoomId) -> bool {
        self.edges.iter().any(|e| e.room == room)
    }
}

/// All wall segments of the current rooms, keyed canonically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallGraph {
    segments: BTreeMap<WallKey, WallSegment>,
}

impl WallGraph {
    #[must_use]
    pub fn get(&self, key: &WallKey) -> Option<&WallSegment> {
        self.segments.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &WallKey) -> bool {
        self.segments.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WallSegment> + '_ {
        self.segments.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &WallKey> + '_ {
        self.segments.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Derives the wall graph from every room edge.
pub struct DeriveWalls<'a> {
    pool: &'a VertexPool,
    rooms: &'a RoomTopology,
}

impl<'a> DeriveWalls<'a> {
    /// Creates a new `DeriveWalls` operation.
    #[must_use]
    pub fn new(pool: &'a VertexPool, rooms: &'a RoomTopology) -> Self {
        Self { pool, rooms }
    }

    /// Executes the derivation.
    ///
    /// Rooms are visited in creation order, so the earliest room bordering a
    /// wall owns it regardless of which room was edited last.
    ///
    /// # Errors
    ///
    /// Returns an error if a room references a vertex outside the pool.
    pub fn execute(&self) -> Result<WallGraph> {
        let mut segments: BTreeMap<WallKey, WallSegment> = BTreeMap::new();

        for (room_id, room) in self.rooms.iter() {
            let outline = self.pool.resolve(&room.indices)?;
            let n = outline.len();
            for edge in 0..n {
                let a = outline[edge];
                let b = outline[(edge + 1) % n];
                let key = WallKey::new(&a, &b);
                let features = room.features(edge);

                match segments.get_mut(&key) {
                    Some(segment) => {
                        let reversed = a.distance(&segment.end) < a.distance(&segment.start);
                        segment.edges.push(EdgeRef {
                            room: room_id,
                            edge,
                            reversed,
                        });
                        if reversed {
                            segment
                                .features
                                .extend(features.iter().map(WallFeature::mirrored));
                        } else {
                            segment.features.extend_from_slice(features);
                        }
                        if segment.edges.len() > 2 {
                            tracing::debug!(
                                wall = %key,
                                edges = segment.edges.len(),
                                "wall bordered by more than two room edges"
                            );
                        }
                    }
                    None => {
                        segments.insert(
                            key.clone(),
                            WallSegment {
                                key,
                                start: a,
                                end: b,
                                edges: vec![EdgeRef {
                                    room: room_id,
                                    edge,
                                    reversed: false,
                                }],
                                features: features.to_vec(),
                            },
                        );
                    }
                }
            }
        }

        Ok(WallGraph { segments })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::ClosePolygon;
    use approx::assert_relative_eq;

    fn p(x: f64, z: f64) -> PlanPoint {
        PlanPoint::new(x, z)
    }

    fn two_rooms() -> (VertexPool, RoomTopology, RoomId, RoomId) {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let a = ClosePolygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#aaaaaa".into())
            .unwrap();
        let b = ClosePolygon::new(vec![p(4.0, 3.0), p(4.0, 0.0), p(8.0, 0.0), p(8.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#bbbbbb".into())
            .unwrap();
        (pool, rooms, a, b)
    }

    #[test]
    fn single_room_has_one_wall_per_edge() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        ClosePolygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#aaaaaa".into())
            .unwrap();
        let graph = DeriveWalls::new(&pool, &rooms).execute().unwrap();
        assert_eq!(graph.len(), 4);
        assert!(graph.iter().all(|s| !s.is_interior()));
    }

    #[test]
    fn shared_edge_yields_single_segment() {
        let (pool, rooms, a, b) = two_rooms();
        let graph = DeriveWalls::new(&pool, &rooms).execute().unwrap();
        assert_eq!(graph.len(), 7);

        let key = WallKey::new(&p(4.0, 0.0), &p(4.0, 3.0));
        let shared = graph.get(&key).unwrap();
        assert!(shared.is_interior());
        assert_eq!(shared.owner(), a);
        assert!(shared.borders(b));
        assert_eq!(shared.edges.len(), 2);
        assert!(shared.edges[1].reversed);
        assert_relative_eq!(shared.length(), 3.0);
    }

    #[test]
    fn owner_does_not_depend_on_edit_order() {
        let (mut pool, mut rooms, a, _) = two_rooms();
        let shared = pool.find(&p(4.0, 3.0)).unwrap();
        rooms.move_vertex(&mut pool, shared, p(4.0, 3.5)).unwrap();
        let graph = DeriveWalls::new(&pool, &rooms).execute().unwrap();
        let key = WallKey::new(&p(4.0, 0.0), &p(4.0, 3.5));
        assert_eq!(graph.get(&key).unwrap().owner(), a);
        assert_eq!(graph.len(), 7);
    }

    #[test]
    fn features_from_both_rooms_are_concatenated() {
        let (pool, mut rooms, a, b) = two_rooms();
        // Room a edge 1 runs (4,0)→(4,3); room b edge 0 runs (4,3)→(4,0).
        rooms
            .set_wall_features(a, 1, vec![WallFeature::window(0.25, 1.0, 1.0)])
            .unwrap();
        rooms
            .set_wall_features(b, 0, vec![WallFeature::door(0.25, 0.9, 2.0)])
            .unwrap();

        let graph = DeriveWalls::new(&pool, &rooms).execute().unwrap();
        let shared = graph.get(&WallKey::new(&p(4.0, 0.0), &p(4.0, 3.0))).unwrap();
        assert_eq!(shared.features.len(), 2);
        assert_relative_eq!(shared.features[0].position, 0.25);
        // Mirrored into the owner's direction.
        assert_relative_eq!(shared.features[1].position, 0.75);
    }

    #[test]
    fn overlapping_openings_are_not_deduplicated() {
        let (pool, mut rooms, a, b) = two_rooms();
        rooms
            .set_wall_features(a, 1, vec![WallFeature::window(0.5, 1.0, 1.0)])
            .unwrap();
        rooms
            .set_wall_features(b, 0, vec![WallFeature::window(0.5, 1.0, 1.0)])
            .unwrap();
        let graph = DeriveWalls::new(&pool, &rooms).execute().unwrap();
        let shared = graph.get(&WallKey::new(&p(4.0, 0.0), &p(4.0, 3.0))).unwrap();
        assert_eq!(shared.features.len(), 2);
    }
}
