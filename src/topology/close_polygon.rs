use crate::error::{Result, TopologyError};
use crate::math::polygon_2d::polygon_area;
use crate::math::{PlanPoint, TOLERANCE};

use super::{Room, RoomId, RoomTopology, VertexPool};

/// Turns a sketched outline into a room.
///
/// Points are resolved against the vertex pool without mutating it until the
/// outline has been validated, so a rejected outline leaves no trace.
pub struct ClosePolygon {
    points: Vec<PlanPoint>,
    snap_distance: f64,
}

impl ClosePolygon {
    /// Creates a new `ClosePolygon` operation.
    ///
    /// A trailing point within `snap_distance` of the first point is treated
    /// as the closing click and dropped.
    #[must_use]
    pub fn new(points: Vec<PlanPoint>, snap_distance: f64) -> Self {
        Self {
            points,
            snap_distance,
        }
    }

    /// Executes the operation, inserting the room with default metadata.
    ///
    /// `color` is only called once the outline has been accepted.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::TooFewVertices` if fewer than 3 distinct
    /// vertices remain after merging, or `TopologyError::Degenerate` if the
    /// outline encloses no area.
    pub fn execute(
        &self,
        pool: &mut VertexPool,
        rooms: &mut RoomTopology,
        color: impl FnOnce() -> String,
    ) -> Result<RoomId> {
        let mut points = self.points.as_slice();
        if let [first, .., last] = points {
            if first.distance(last) <= self.snap_distance {
                points = &points[..points.len() - 1];
            }
        }

        let base = pool.len();
        let mut staged: Vec<PlanPoint> = Vec::new();
        let mut indices: Vec<usize> = Vec::with_capacity(points.len());
        for point in points {
            let index = match pool.find(point) {
                Some(existing) => existing,
                None => match staged
                    .iter()
                    .position(|s| s.distance(point) <= pool.epsilon())
                {
                    Some(k) => base + k,
                    None => {
                        staged.push(*point);
                        base + staged.len() - 1
                    }
                },
            };
            if indices.last() != Some(&index) {
                indices.push(index);
            }
        }
        while indices.len() > 1 && indices.first() == indices.last() {
            indices.pop();
        }

        let mut distinct = indices.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 3 {
            return Err(TopologyError::TooFewVertices {
                distinct: distinct.len(),
            }
            .into());
        }

        let coords: Vec<PlanPoint> = indices
            .iter()
            .map(|&i| {
                if i < base {
                    pool.get(i)
                } else {
                    Ok(staged[i - base])
                }
            })
            .collect::<Result<_>>()?;
        let area = polygon_area(&coords);
        if area < TOLERANCE {
            return Err(TopologyError::Degenerate("outline encloses no area".into()).into());
        }

        for point in staged {
            pool.append(point);
        }

        let mut room = Room::new(indices, rooms.next_name(), color());
        room.area = area;
        Ok(rooms.insert(room))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RoomshellError;

    fn p(x: f64, z: f64) -> PlanPoint {
        PlanPoint::new(x, z)
    }

    #[test]
    fn rectangle_has_area_12() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let id = ClosePolygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#123456".into())
            .unwrap();
        let room = rooms.room(id).unwrap();
        assert_eq!(rooms.len(), 1);
        assert!((room.area - 12.0).abs() < 1e-9);
        assert_eq!(room.name, "Room 1");
        assert_eq!(room.indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn closing_click_is_dropped() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let id = ClosePolygon::new(
            vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.1, 0.05)],
            0.2,
        )
        .execute(&mut pool, &mut rooms, || "#123456".into())
        .unwrap();
        assert_eq!(rooms.room(id).unwrap().indices.len(), 3);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn too_few_distinct_vertices_leaves_state_untouched() {
        let mut pool = VertexPool::default();
        pool.add_or_get(p(9.0, 9.0));
        let mut rooms = RoomTopology::new();
        let err = ClosePolygon::new(vec![p(0.0, 0.0), p(0.001, 0.0), p(4.0, 0.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#123456".into())
            .unwrap_err();
        assert!(matches!(
            err,
            RoomshellError::Topology(TopologyError::TooFewVertices { distinct: 2 })
        ));
        assert_eq!(pool.len(), 1);
        assert!(rooms.is_empty());
    }

    #[test]
    fn collinear_outline_is_degenerate() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let err = ClosePolygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#123456".into())
            .unwrap_err();
        assert!(matches!(
            err,
            RoomshellError::Topology(TopologyError::Degenerate(_))
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn rejected_outline_never_picks_a_color() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        let mut picked = 0;
        let result = ClosePolygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)], 0.2).execute(
            &mut pool,
            &mut rooms,
            || {
                picked += 1;
                "#123456".into()
            },
        );
        assert!(result.is_err());
        assert_eq!(picked, 0);
    }

    #[test]
    fn adjacent_room_reuses_shared_vertices() {
        let mut pool = VertexPool::default();
        let mut rooms = RoomTopology::new();
        ClosePolygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 3.0), p(0.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#123456".into())
            .unwrap();
        let b = ClosePolygon::new(vec![p(4.0, 3.0), p(4.0, 0.0), p(8.0, 0.0), p(8.0, 3.0)], 0.2)
            .execute(&mut pool, &mut rooms, || "#654321".into())
            .unwrap();
        assert_eq!(pool.len(), 6);
        assert_eq!(rooms.room(b).unwrap().indices, vec![2, 1, 4, 5]);
    }
}
