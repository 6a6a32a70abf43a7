use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::PlanPoint;

/// Canonical, direction-independent identifier of a wall segment.
///
/// Formatted as `"x1,z1|x2,z2"` with the smaller endpoint (by `x`, then `z`)
/// first, so `WallKey::new(a, b) == WallKey::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallKey(String);

impl WallKey {
    /// Builds the key of the wall between two plan points.
    #[must_use]
    pub fn new(a: &PlanPoint, b: &PlanPoint) -> Self {
        let (first, second) = if endpoint_order(a, b) == Ordering::Greater {
            (b, a)
        } else {
            (a, b)
        };
        Self(format!(
            "{},{}|{},{}",
            coord(first.x),
            coord(first.z),
            coord(second.x),
            coord(second.z)
        ))
    }

    /// Wraps a key read back from a stored document.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Orders endpoints by `x`, breaking ties by `z`.
fn endpoint_order(a: &PlanPoint, b: &PlanPoint) -> Ordering {
    let by_x = a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal);
    by_x.then_with(|| a.z.partial_cmp(&b.z).unwrap_or(Ordering::Equal))
}

/// Shortest round-trip decimal form; negative zero prints as `0`.
fn coord(v: f64) -> String {
    if v == 0.0 {
        "0".to_owned()
    } else {
        format!("{v}")
    }
}
