pub mod plan;
pub mod polygon_2d;

pub use plan::PlanPoint;

/// 2D point type (UV coordinates).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type. World space is Y-up; plan coordinates map to X and Z.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Rigid transform from wall-local to world space.
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Default distance under which two plan points are the same vertex.
pub const VERTEX_EPSILON: f64 = 0.01;
