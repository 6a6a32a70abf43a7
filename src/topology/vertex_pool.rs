use crate::error::{Result, RoomshellError, TopologyError};
use crate::math::{PlanPoint, VERTEX_EPSILON};

/// Proximity-deduplicated, append-only store of floor-plan vertices.
///
/// Rooms refer to vertices by their index in the pool, so a vertex shared by
/// several rooms has exactly one coordinate. The pool never shrinks: deleting
/// a room leaves its vertices in place.
#[derive(Debug, Clone)]
pub struct VertexPool {
    points: Vec<PlanPoint>,
    epsilon: f64,
}

impl Default for VertexPool {
    fn default() -> Self {
        Self::new(VERTEX_EPSILON)
    }
}

impl VertexPool {
    /// Creates an empty pool that merges points closer than `epsilon`.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            points: Vec::new(),
            epsilon,
        }
    }

    /// Rebuilds a pool from stored coordinates, keeping their indices as-is.
    #[must_use]
    pub fn from_points(points: Vec<PlanPoint>, epsilon: f64) -> Self {
        Self { points, epsilon }
    }

    /// Returns the index of the first vertex within epsilon of `point`.
    #[must_use]
    pub fn find(&self, point: &PlanPoint) -> Option<usize> {
        self.points
            .iter()
            .position(|p| p.distance(point) <= self.epsilon)
    }

    /// Returns the index of an existing vertex within epsilon of `point`, or
    /// appends `point` and returns its new index.
    pub fn add_or_get(&mut self, point: PlanPoint) -> usize {
        if let Some(index) = self.find(&point) {
            return index;
        }
        self.points.push(point);
        self.points.len() - 1
    }

    /// Appends without a proximity check. Only for points already known not
    /// to be in the pool.
    pub(crate) fn append(&mut self, point: PlanPoint) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    /// Returns the coordinate stored at `index`.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::VertexOutOfRange` for an unknown index.
    pub fn get(&self, index: usize) -> Result<PlanPoint> {
        self.points
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_range(index))
    }

    /// Moves the vertex at `index` in place.
    ///
    /// Every room that references the index sees the new coordinate; callers
    /// are responsible for regenerating those rooms.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::VertexOutOfRange` for an unknown index.
    pub fn update(&mut self, index: usize, point: PlanPoint) -> Result<()> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(TopologyError::VertexOutOfRange { index, len })?;
        *slot = point;
        Ok(())
    }

    /// Resolves a list of indices into coordinates.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::VertexOutOfRange` on the first unknown index.
    pub fn resolve(&self, indices: &[usize]) -> Result<Vec<PlanPoint>> {
        indices.iter().map(|&i| self.get(i)).collect()
    }

    /// Number of stored vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the pool holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All stored vertices in index order.
    #[must_use]
    pub fn points(&self) -> &[PlanPoint] {
        &self.points
    }

    /// Merge distance of this pool.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn out_of_range(&self, index: usize) -> RoomshellError {
        TopologyError::VertexOutOfRange {
            index,
            len: self.points.len(),
        }
        .into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, z: f64) -> PlanPoint {
        PlanPoint::new(x, z)
    }

    #[test]
    fn nearby_point_reuses_existing_index() {
        let mut pool = VertexPool::default();
        let a = pool.add_or_get(p(1.0, 1.0));
        let b = pool.add_or_get(p(1.005, 0.998));
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn distant_point_is_appended() {
        let mut pool = VertexPool::default();
        let a = pool.add_or_get(p(0.0, 0.0));
        let b = pool.add_or_get(p(0.02, 0.0));
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn find_does_not_insert() {
        let pool = VertexPool::default();
        assert!(pool.find(&p(0.0, 0.0)).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn update_moves_in_place() {
        let mut pool = VertexPool::default();
        let i = pool.add_or_get(p(0.0, 0.0));
        pool.update(i, p(5.0, 5.0)).unwrap();
        assert_eq!(pool.get(i).unwrap(), p(5.0, 5.0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut pool = VertexPool::default();
        assert!(pool.get(0).is_err());
        assert!(pool.update(3, p(0.0, 0.0)).is_err());
        assert!(pool.resolve(&[0]).is_err());
    }
}
