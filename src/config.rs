use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, ProjectError, Result};
use crate::math::VERTEX_EPSILON;

/// Dot-product cutoffs used to assign face roles from triangle normals.
///
/// The defaults are tuned for axis-aligned extrusions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// A normal whose component along a local axis exceeds this magnitude is
    /// treated as facing along that axis.
    pub axis: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self { axis: 0.9 }
    }
}

/// Parameters controlling room capture and wall generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Height of every generated wall.
    pub wall_height: f64,
    /// Extrusion depth of every generated wall.
    pub wall_thickness: f64,
    /// Points closer than this share one pool vertex.
    pub vertex_epsilon: f64,
    /// A closing point this close to the first point closes the outline.
    pub snap_distance: f64,
    /// Sill height of window openings.
    pub window_base_height: f64,
    /// Base height of door openings.
    pub door_base_height: f64,
    /// Face-role classification cutoffs.
    pub classification: ClassifierThresholds,
    /// Asset id of the door proxy model.
    pub door_model: Option<String>,
    /// Asset id of the window proxy model.
    pub window_model: Option<String>,
    /// Seed for the random room colors. `None` seeds from entropy.
    pub color_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wall_height: 3.0,
            wall_thickness: 0.3,
            vertex_epsilon: VERTEX_EPSILON,
            snap_distance: 0.2,
            window_base_height: 1.0,
            door_base_height: 0.0,
            classification: ClassifierThresholds::default(),
            door_model: None,
            window_model: None,
            color_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Json` if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProjectError::Json(e).into())
    }

    /// Checks that every dimension is usable.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonPositive` for the first dimension that is
    /// not strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (parameter, value) in [
            ("wall_height", self.wall_height),
            ("wall_thickness", self.wall_thickness),
            ("vertex_epsilon", self.vertex_epsilon),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(GeometryError::NonPositive { parameter, value }.into());
            }
        }
        if self.snap_distance < 0.0 {
            return Err(GeometryError::NonPositive {
                parameter: "snap_distance",
                value: self.snap_distance,
            }
            .into());
        }
        Ok(())
    }
}
