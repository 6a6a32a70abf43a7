use std::collections::{HashMap, HashSet};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{MeshError, Result};
use crate::math::{PlanPoint, Point2, Vector3};
use crate::topology::RoomId;

use super::TriangleMesh;

/// Triangulated floor polygon of one room, in world space at `y = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorMesh {
    pub room: RoomId,
    pub mesh: TriangleMesh,
}

/// Tessellates a room outline into a floor mesh using CDT.
pub struct TessellateFloor<'a> {
    outline: &'a [PlanPoint],
}

impl<'a> TessellateFloor<'a> {
    /// Creates a new `TessellateFloor` operation.
    #[must_use]
    pub fn new(outline: &'a [PlanPoint]) -> Self {
        Self { outline }
    }

    /// Executes the tessellation. Normals point up; UVs are plan `(x, z)`.
    ///
    /// # Errors
    ///
    /// Returns `MeshError::Triangulation` if the outline has fewer than three
    /// points or crosses itself.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self) -> Result<TriangleMesh> {
        let outline: Vec<SpadePoint2<f64>> = self
            .outline
            .iter()
            .map(|p| SpadePoint2::new(p.x, p.z))
            .collect();

        let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
        constrain_outline(&mut cdt, &outline)?;
        let exterior = exterior_faces(&cdt);

        let mut mesh = TriangleMesh::default();
        let mut vertex_map: HashMap<usize, u32> = HashMap::new();

        for face_handle in cdt.inner_faces() {
            if exterior.contains(&face_handle.fix().index()) {
                continue;
            }

            let verts = face_handle.vertices();
            let mut tri_indices = [0u32; 3];

            for (i, vh) in verts.iter().enumerate() {
                let idx = vh.fix().index();
                let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                    existing
                } else {
                    let pos = vh.position();
                    let new_idx = mesh.vertices.len() as u32;
                    mesh.vertices.push(PlanPoint::new(pos.x, pos.y).at_height(0.0));
                    mesh.normals.push(Vector3::y());
                    mesh.uvs.push(Point2::new(pos.x, pos.y));
                    vertex_map.insert(idx, new_idx);
                    new_idx
                };
                tri_indices[i] = mesh_idx;
            }

            // CDT faces are counter-clockwise in (x, z); flip so the winding
            // normal points up.
            tri_indices.swap(1, 2);
            mesh.indices.push(tri_indices);
        }

        Ok(mesh)
    }
}

/// Adds the outline as a closed ring of constraint edges.
fn constrain_outline(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    outline: &[SpadePoint2<f64>],
) -> Result<()> {
    if outline.len() < 3 {
        return Err(MeshError::Triangulation("floor outline needs at least 3 points".into()).into());
    }

    let ring = outline
        .iter()
        .map(|&pt| cdt.insert(pt))
        .collect::<std::result::Result<Vec<_>, InsertionError>>()
        .map_err(|e| MeshError::Triangulation(format!("CDT insert: {e}")))?;

    for (&from, &to) in ring.iter().zip(ring.iter().cycle().skip(1)) {
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(MeshError::Triangulation("floor outline crosses itself".into()).into());
        }
        cdt.add_constraint(from, to);
    }
    Ok(())
}

/// Inner faces reachable from the hull without crossing the outline.
///
/// The outline is a single simple ring, so every other inner face lies
/// inside the room.
fn exterior_faces(cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>) -> HashSet<usize> {
    let outer = cdt.outer_face().fix();
    let mut seen = HashSet::new();
    let mut stack: Vec<FixedFaceHandle<InnerTag>> = cdt
        .directed_edges()
        .filter(|e| e.face().fix() == outer && !cdt.is_constraint_edge(e.as_undirected().fix()))
        .filter_map(|e| e.rev().face().as_inner().map(|f| f.fix()))
        .collect();

    while let Some(face) = stack.pop() {
        if !seen.insert(face.index()) {
            continue;
        }
        for edge in cdt.face(face).adjacent_edges() {
            if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                continue;
            }
            if let Some(next) = edge.rev().face().as_inner() {
                stack.push(next.fix());
            }
        }
    }
    seen
}
