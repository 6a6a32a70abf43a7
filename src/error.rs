use thiserror::Error;

/// Top-level error type for the room shell engine.
#[derive(Debug, Error)]
pub enum RoomshellError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Errors related to geometric input values.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid wall feature: {0}")]
    InvalidFeature(String),

    #[error("parameter {parameter} = {value} must be positive")]
    NonPositive { parameter: &'static str, value: f64 },
}

/// Errors related to the vertex pool and room topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("polygon needs at least 3 distinct vertices, got {distinct}")]
    TooFewVertices { distinct: usize },

    #[error("degenerate room outline: {0}")]
    Degenerate(String),

    #[error("room not found")]
    RoomNotFound,

    #[error("vertex index {index} is out of range (pool size {len})")]
    VertexOutOfRange { index: usize, len: usize },

    #[error("edge index {index} is out of range (room has {edges} edges)")]
    EdgeOutOfRange { index: usize, edges: usize },
}

/// Errors related to wall and floor mesh generation.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("zero-length wall segment {0}")]
    DegenerateSegment(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Errors related to project documents.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("malformed project document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to asynchronous texture and model resolution.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no pending asset request with ticket {0}")]
    UnknownTicket(u64),

    #[error("failed to resolve asset {asset}: {reason}")]
    Resolution { asset: String, reason: String },

    #[error("asset {asset} resolved to the wrong kind of payload")]
    PayloadMismatch { asset: String },
}

/// Convenience type alias for results using [`RoomshellError`].
pub type Result<T> = std::result::Result<T, RoomshellError>;
