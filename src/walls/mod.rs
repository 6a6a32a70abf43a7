mod feature;
mod graph;
mod key;

pub use feature::{FeatureKind, WallFeature};
pub use graph::{DeriveWalls, EdgeRef, WallGraph, WallSegment};
pub use key::WallKey;
