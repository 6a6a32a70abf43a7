mod close_polygon;
pub mod room;
pub mod vertex_pool;

pub use close_polygon::ClosePolygon;
pub use room::{Room, RoomId, RoomType};
pub use vertex_pool::VertexPool;

use slotmap::SlotMap;

use crate::error::{Result, TopologyError};
use crate::math::polygon_2d::{polygon_area, vertex_centroid};
use crate::math::PlanPoint;
use crate::walls::WallFeature;

/// Arena that owns every room.
///
/// Rooms reference vertices by pool index and are addressed by generational
/// [`RoomId`]s. Creation order is tracked separately so that the position of
/// a room in that order (its "room index") is stable for export.
#[derive(Debug, Default)]
pub struct RoomTopology {
    rooms: SlotMap<RoomId, Room>,
    order: Vec<RoomId>,
    created: usize,
}

impl RoomTopology {
    /// Creates a new, empty room topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a room and returns its ID.
    pub fn insert(&mut self, room: Room) -> RoomId {
        let id = self.rooms.insert(room);
        self.order.push(id);
        self.created += 1;
        id
    }

    /// Removes a room record. The vertex pool is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn remove(&mut self, id: RoomId) -> Result<Room> {
        let room = self.rooms.remove(id).ok_or(TopologyError::RoomNotFound)?;
        self.order.retain(|&other| other != id);
        Ok(room)
    }

    /// Returns a reference to the room, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn room(&self, id: RoomId) -> Result<&Room> {
        self.rooms.get(id).ok_or_else(|| TopologyError::RoomNotFound.into())
    }

    fn room_mut(&mut self, id: RoomId) -> Result<&mut Room> {
        self.rooms
            .get_mut(id)
            .ok_or_else(|| TopologyError::RoomNotFound.into())
    }

    /// Returns `true` if the room exists.
    #[must_use]
    pub fn contains(&self, id: RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// Rooms in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (RoomId, &Room)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.rooms.get(id).map(|room| (id, room)))
    }

    /// Room IDs in creation order.
    #[must_use]
    pub fn ids(&self) -> &[RoomId] {
        &self.order
    }

    /// Position of the room in creation order.
    #[must_use]
    pub fn ordinal(&self, id: RoomId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if there are no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Default name for the next created room.
    #[must_use]
    pub fn next_name(&self) -> String {
        format!("Room {}", self.created + 1)
    }

    /// Resolves a room's outline into coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the room does not exist or references a vertex
    /// outside the pool.
    pub fn outline(&self, pool: &VertexPool, id: RoomId) -> Result<Vec<PlanPoint>> {
        pool.resolve(&self.room(id)?.indices)
    }

    /// Vertex average of a room's outline.
    ///
    /// # Errors
    ///
    /// Returns an error if the outline cannot be resolved.
    pub fn centroid(&self, pool: &VertexPool, id: RoomId) -> Result<PlanPoint> {
        Ok(vertex_centroid(&self.outline(pool, id)?))
    }

    /// Recomputes the derived area of a room from the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the outline cannot be resolved.
    pub fn refresh_area(&mut self, pool: &VertexPool, id: RoomId) -> Result<f64> {
        let area = polygon_area(&self.outline(pool, id)?);
        self.room_mut(id)?.area = area;
        Ok(area)
    }

    /// Rooms whose outline uses pool vertex `index`, in creation order.
    #[must_use]
    pub fn rooms_using_vertex(&self, index: usize) -> Vec<RoomId> {
        self.iter()
            .filter(|(_, room)| room.uses_vertex(index))
            .map(|(id, _)| id)
            .collect()
    }

    /// Moves a pool vertex and refreshes the area of every room using it.
    ///
    /// Returns the affected rooms so the caller can regenerate them.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::VertexOutOfRange` for an unknown index.
    pub fn move_vertex(
        &mut self,
        pool: &mut VertexPool,
        index: usize,
        point: PlanPoint,
    ) -> Result<Vec<RoomId>> {
        pool.update(index, point)?;
        let affected = self.rooms_using_vertex(index);
        for &id in &affected {
            self.refresh_area(pool, id)?;
        }
        Ok(affected)
    }

    /// Replaces the openings on one edge of a room.
    ///
    /// # Errors
    ///
    /// Returns an error if the room does not exist, the edge index is out of
    /// range, or any feature is invalid. Nothing changes on error.
    pub fn set_wall_features(
        &mut self,
        id: RoomId,
        edge: usize,
        features: Vec<WallFeature>,
    ) -> Result<()> {
        for feature in &features {
            feature.validate()?;
        }
        let room = self.room_mut(id)?;
        let edges = room.edge_count();
        if edge >= edges {
            return Err(TopologyError::EdgeOutOfRange { index: edge, edges }.into());
        }
        room.wall_features.resize_with(edges, Vec::new);
        room.wall_features[edge] = features;
        room.features_listed = true;
        Ok(())
    }

    /// Renames a room.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn rename(&mut self, id: RoomId, name: impl Into<String>) -> Result<()> {
        self.room_mut(id)?.name = name.into();
        Ok(())
    }

    /// Changes a room's category.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn set_room_type(&mut self, id: RoomId, room_type: RoomType) -> Result<()> {
        self.room_mut(id)?.room_type = room_type;
        Ok(())
    }
}
