pub mod appearance;
pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod project;
pub mod sink;
pub mod tessellation;
pub mod topology;
pub mod walls;

pub use appearance::{AppearanceStore, SurfaceStyle};
pub use assets::{AssetKind, AssetOutcome, AssetPayload, AssetRequest};
pub use config::EngineConfig;
pub use engine::{Engine, RegenerationReport};
pub use error::{Result, RoomshellError};
pub use project::{ImportReport, ImportWarning, ProjectDocument};
pub use sink::{NullSink, Surface, SurfaceId, SurfaceSink};
