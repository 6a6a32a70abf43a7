use crate::tessellation::{FaceRole, FloorMesh, OpeningProxy, WallMesh};

/// Identifier the engine assigns to every surface it hands to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Opaque handle of a texture loaded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// A generated surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Wall(WallMesh),
    Floor(FloorMesh),
    Opening(OpeningProxy),
}

/// Material slot of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Wall(FaceRole),
    Floor,
}

/// Material values to apply to one slot. `texture` is `None` until the
/// host has resolved the texture id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedStyle {
    pub color: Option<String>,
    pub texture: Option<TextureHandle>,
}

/// A host resource the engine no longer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Surface(SurfaceId),
    Texture(TextureHandle),
}

/// Write-only rendering collaborator.
///
/// The engine never reads geometry back from the sink.
pub trait SurfaceSink {
    fn add(&mut self, id: SurfaceId, surface: &Surface);

    fn remove(&mut self, id: SurfaceId);

    fn dispose(&mut self, resource: Resource);

    fn apply_style(&mut self, id: SurfaceId, slot: MaterialSlot, style: &AppliedStyle);
}

/// Sink that discards everything, for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SurfaceSink for NullSink {
    fn add(&mut self, _id: SurfaceId, _surface: &Surface) {}

    fn remove(&mut self, _id: SurfaceId) {}

    fn dispose(&mut self, _resource: Resource) {}

    fn apply_style(&mut self, _id: SurfaceId, _slot: MaterialSlot, _style: &AppliedStyle) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use std::collections::BTreeMap;

    use super::*;

    /// Sink that mirrors the live surface set for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub live: BTreeMap<SurfaceId, Surface>,
        pub styles: Vec<(SurfaceId, MaterialSlot, AppliedStyle)>,
        pub disposed: Vec<Resource>,
        pub adds: usize,
        pub removes: usize,
    }

    impl RecordingSink {
        pub(crate) fn walls(&self) -> impl Iterator<Item = &WallMesh> + '_ {
            self.live.values().filter_map(|s| match s {
                Surface::Wall(w) => Some(w),
                _ => None,
            })
        }

        pub(crate) fn floors(&self) -> impl Iterator<Item = &FloorMesh> + '_ {
            self.live.values().filter_map(|s| match s {
                Surface::Floor(f) => Some(f),
                _ => None,
            })
        }

        pub(crate) fn openings(&self) -> impl Iterator<Item = &OpeningProxy> + '_ {
            self.live.values().filter_map(|s| match s {
                Surface::Opening(o) => Some(o),
                _ => None,
            })
        }

        /// Most recent style applied to a slot.
        pub(crate) fn last_style(
            &self,
            id: SurfaceId,
            slot: MaterialSlot,
        ) -> Option<&AppliedStyle> {
            self.styles
                .iter()
                .rev()
                .find(|(sid, s, _)| *sid == id && *s == slot)
                .map(|(_, _, style)| style)
        }
    }

    impl SurfaceSink for RecordingSink {
        fn add(&mut self, id: SurfaceId, surface: &Surface) {
            assert!(self.live.insert(id, surface.clone()).is_none(), "surface {id:?} added twice");
            self.adds += 1;
        }

        fn remove(&mut self, id: SurfaceId) {
            assert!(self.live.remove(&id).is_some(), "surface {id:?} removed while not live");
            self.removes += 1;
        }

        fn dispose(&mut self, resource: Resource) {
            self.disposed.push(resource);
        }

        fn apply_style(&mut self, id: SurfaceId, slot: MaterialSlot, style: &AppliedStyle) {
            self.styles.push((id, slot, style.clone()));
        }
    }
}
