use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// Kind of opening cut into a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Window,
    Door,
}

/// A rectangular opening on one room edge.
///
/// `position` is the fraction along the wall where the opening is centred;
/// the opening's base height is fixed by its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallFeature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub position: f64,
    pub width: f64,
    pub height: f64,
}

impl WallFeature {
    #[must_use]
    pub fn window(position: f64, width: f64, height: f64) -> Self {
        Self {
            kind: FeatureKind::Window,
            position,
            width,
            height,
        }
    }

    #[must_use]
    pub fn door(position: f64, width: f64, height: f64) -> Self {
        Self {
            kind: FeatureKind::Door,
            position,
            width,
            height,
        }
    }

    /// Checks `position ∈ [0, 1]`, `width > 0` and `height > 0`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidFeature` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.position) {
            return Err(GeometryError::InvalidFeature(format!(
                "position {} is outside [0, 1]",
                self.position
            ))
            .into());
        }
        if self.width.is_nan() || self.width <= 0.0 {
            return Err(GeometryError::InvalidFeature(format!(
                "width {} must be positive",
                self.width
            ))
            .into());
        }
        if self.height.is_nan() || self.height <= 0.0 {
            return Err(GeometryError::InvalidFeature(format!(
                "height {} must be positive",
                self.height
            ))
            .into());
        }
        Ok(())
    }

    /// The same opening seen from the other end of the wall.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            position: 1.0 - self.position,
            ..*self
        }
    }
}
