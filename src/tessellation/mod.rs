mod classify;
mod floor;
mod openings;
mod wall_mesh;

pub use classify::FaceClassifier;
pub use floor::{FloorMesh, TessellateFloor};
pub use openings::{ModelExtent, OpeningModels, OpeningProxy, PlaceOpenings};
pub use wall_mesh::{BuildWallMesh, HoleRect, WallMesh, WallParams};

use serde::{Deserialize, Serialize};

use crate::math::{Point2, Point3, Vector3};

/// Role of a wall triangle, used to pick one of six material slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceRole {
    Front,
    Back,
    Side,
    Top,
    Bottom,
    HoleEdge,
}

impl FaceRole {
    /// Every role, in material-slot order.
    pub const ALL: [FaceRole; 6] = [
        FaceRole::Front,
        FaceRole::Back,
        FaceRole::Side,
        FaceRole::Top,
        FaceRole::Bottom,
        FaceRole::HoleEdge,
    ];

    /// Material slot index of this role.
    #[must_use]
    pub fn slot(self) -> usize {
        match self {
            FaceRole::Front => 0,
            FaceRole::Back => 1,
            FaceRole::Side => 2,
            FaceRole::Top => 3,
            FaceRole::Bottom => 4,
            FaceRole::HoleEdge => 5,
        }
    }
}

/// A contiguous run of triangles sharing one face role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceGroup {
    pub role: FaceRole,
    /// Index of the first triangle in [`TriangleMesh::indices`].
    pub start: usize,
    /// Number of triangles.
    pub count: usize,
}

/// A triangle mesh approximation of a surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// UV coordinates.
    pub uvs: Vec<Point2>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Appends another mesh, offsetting its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices.extend(
            other
                .indices
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }

    /// Appends one unshared triangle with a flat normal.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_triangle(&mut self, corners: [Point3; 3], normal: Vector3, uvs: [Point2; 3]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.normals.extend_from_slice(&[normal; 3]);
        self.uvs.extend_from_slice(&uvs);
        self.indices.push([base, base + 1, base + 2]);
    }

    /// Corner positions of triangle `i`.
    #[must_use]
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        let [a, b, c] = self.indices[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Sum of triangle areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        (0..self.indices.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Returns `true` if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
