use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::sink::{MaterialSlot, SurfaceId};
use crate::tessellation::FaceRole;
use crate::topology::RoomId;
use crate::walls::WallKey;

/// Color and texture assignment of one material slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

impl SurfaceStyle {
    #[must_use]
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            texture: None,
        }
    }

    #[must_use]
    pub fn texture(texture: impl Into<String>) -> Self {
        Self {
            color: None,
            texture: Some(texture.into()),
        }
    }

    /// Merge-patch: only fields present in `patch` change.
    pub fn merge(&mut self, patch: &SurfaceStyle) {
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
        if let Some(texture) = &patch.texture {
            self.texture = Some(texture.clone());
        }
    }
}

/// Per-face styles of every wall, keyed by wall key.
pub type WallAppearance = BTreeMap<WallKey, BTreeMap<FaceRole, SurfaceStyle>>;

/// One stored style matched to a live surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleAssignment<'a> {
    pub surface: SurfaceId,
    pub slot: MaterialSlot,
    pub style: &'a SurfaceStyle,
}

/// Color/texture assignments that outlive mesh regeneration.
///
/// Wall styles are keyed by coordinate-derived wall keys and floor styles by
/// room, so they re-attach to whatever geometry is generated next. Entries
/// for walls or rooms that no longer exist are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppearanceStore {
    walls: WallAppearance,
    floors: HashMap<RoomId, SurfaceStyle>,
    /// Floor entries from a document that matched no imported room.
    detached_floors: BTreeMap<String, SurfaceStyle>,
}

impl AppearanceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patches the style of one wall face and returns the merged result.
    pub fn set_wall(
        &mut self,
        key: &WallKey,
        role: FaceRole,
        patch: &SurfaceStyle,
    ) -> &SurfaceStyle {
        let style = self
            .walls
            .entry(key.clone())
            .or_default()
            .entry(role)
            .or_default();
        style.merge(patch);
        style
    }

    /// Patches the floor style of a room and returns the merged result.
    pub fn set_floor(&mut self, room: RoomId, patch: &SurfaceStyle) -> &SurfaceStyle {
        let style = self.floors.entry(room).or_default();
        style.merge(patch);
        style
    }

    #[must_use]
    pub fn wall_style(&self, key: &WallKey, role: FaceRole) -> Option<&SurfaceStyle> {
        self.walls.get(key).and_then(|faces| faces.get(&role))
    }

    #[must_use]
    pub fn floor_style(&self, room: RoomId) -> Option<&SurfaceStyle> {
        self.floors.get(&room)
    }

    #[must_use]
    pub fn walls(&self) -> &WallAppearance {
        &self.walls
    }

    #[must_use]
    pub fn detached_floors(&self) -> &BTreeMap<String, SurfaceStyle> {
        &self.detached_floors
    }

    pub(crate) fn replace_walls(&mut self, walls: WallAppearance) {
        self.walls = walls;
    }

    pub(crate) fn insert_detached_floor(&mut self, key: String, style: SurfaceStyle) {
        self.detached_floors.insert(key, style);
    }

    /// Forgets the floor style of a deleted room.
    pub fn prune_room(&mut self, room: RoomId) -> Option<SurfaceStyle> {
        self.floors.remove(&room)
    }

    /// Returns `true` if any stored style uses texture `asset`.
    #[must_use]
    pub fn references_texture(&self, asset: &str) -> bool {
        let uses = |s: &SurfaceStyle| s.texture.as_deref() == Some(asset);
        self.walls.values().flat_map(BTreeMap::values).any(uses)
            || self.floors.values().any(uses)
            || self.detached_floors.values().any(uses)
    }

    /// Matches stored styles to generated surfaces.
    ///
    /// `walls` and `floors` list the live surfaces; stored entries with no
    /// matching surface are skipped but kept.
    pub fn apply_all<'a, 'k>(
        &'a self,
        walls: impl IntoIterator<Item = (&'k WallKey, SurfaceId)>,
        floors: impl IntoIterator<Item = (RoomId, SurfaceId)>,
    ) -> Vec<StyleAssignment<'a>> {
        let mut out = Vec::new();
        for (key, surface) in walls {
            let Some(faces) = self.walls.get(key) else {
                continue;
            };
            for (&role, style) in faces {
                out.push(StyleAssignment {
                    surface,
                    slot: MaterialSlot::Wall(role),
                    style,
                });
            }
        }
        for (room, surface) in floors {
            if let Some(style) = self.floors.get(&room) {
                out.push(StyleAssignment {
                    surface,
                    slot: MaterialSlot::Floor,
                    style,
                });
            }
        }
        out
    }
}
