//! The engine owns the authoritative room state and keeps a surface sink in
//! sync with it.
//!
//! Every entry point runs to completion before returning. Structural edits
//! re-derive the wall graph and rebuild only the surfaces whose inputs
//! changed; stored appearance is then pushed to the live surfaces again.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::appearance::{AppearanceStore, StyleAssignment, SurfaceStyle};
use crate::assets::{AssetKind, AssetOutcome, AssetPayload, AssetRequest, AssetTracker};
use crate::config::EngineConfig;
use crate::error::{AssetError, Result};
use crate::math::PlanPoint;
use crate::project::{ExportProject, ImportProject, ImportReport, ProjectDocument};
use crate::sink::{
    AppliedStyle, MaterialSlot, Resource, Surface, SurfaceId, SurfaceSink, TextureHandle,
};
use crate::tessellation::{
    BuildWallMesh, FaceRole, FloorMesh, ModelExtent, OpeningModels, PlaceOpenings,
    TessellateFloor, WallMesh, WallParams,
};
use crate::topology::{ClosePolygon, RoomId, RoomTopology, RoomType, VertexPool};
use crate::walls::{DeriveWalls, FeatureKind, WallFeature, WallKey, WallSegment};

/// Counts of what one regeneration pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegenerationReport {
    pub walls_built: usize,
    pub walls_kept: usize,
    pub walls_removed: usize,
    pub floors_built: usize,
    /// Walls that could not be meshed, such as zero-length segments.
    pub skipped: Vec<WallKey>,
    /// Rooms whose floor outline could not be triangulated.
    pub skipped_floors: Vec<RoomId>,
}

#[derive(Debug)]
struct LiveWall {
    segment: WallSegment,
    /// Owner centroid, tracked only while the wall carries windows.
    centroid: Option<PlanPoint>,
    surface: SurfaceId,
    mesh: WallMesh,
    proxies: Vec<SurfaceId>,
}

#[derive(Debug)]
struct LiveFloor {
    surface: SurfaceId,
    outline: Vec<PlanPoint>,
}

/// Room editing engine driving a [`SurfaceSink`].
pub struct Engine<S: SurfaceSink> {
    config: EngineConfig,
    params: WallParams,
    pool: VertexPool,
    rooms: RoomTopology,
    appearance: AppearanceStore,
    assets: AssetTracker,
    models: OpeningModels,
    rng: StdRng,
    sink: S,
    next_surface: u64,
    walls: BTreeMap<WallKey, LiveWall>,
    floors: HashMap<RoomId, LiveFloor>,
}

impl<S: SurfaceSink> Engine<S> {
    /// Creates an empty engine. Configured opening models are queued for
    /// resolution immediately.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonPositive` if a configured dimension is
    /// unusable.
    pub fn new(config: EngineConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let rng = match config.color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut assets = AssetTracker::default();
        for (kind, model) in [
            (FeatureKind::Door, &config.door_model),
            (FeatureKind::Window, &config.window_model),
        ] {
            if let Some(model) = model {
                assets.request(model, AssetKind::Model(kind));
            }
        }

        Ok(Self {
            params: WallParams::from_config(&config),
            pool: VertexPool::new(config.vertex_epsilon),
            rooms: RoomTopology::new(),
            appearance: AppearanceStore::new(),
            assets,
            models: OpeningModels::default(),
            rng,
            sink,
            next_surface: 0,
            walls: BTreeMap::new(),
            floors: HashMap::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &VertexPool {
        &self.pool
    }

    #[must_use]
    pub fn rooms(&self) -> &RoomTopology {
        &self.rooms
    }

    #[must_use]
    pub fn appearance(&self) -> &AppearanceStore {
        &self.appearance
    }

    #[must_use]
    pub fn models(&self) -> &OpeningModels {
        &self.models
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Live wall meshes in key order.
    pub fn walls(&self) -> impl Iterator<Item = &WallMesh> + '_ {
        self.walls.values().map(|w| &w.mesh)
    }

    #[must_use]
    pub fn wall_surface(&self, key: &WallKey) -> Option<SurfaceId> {
        self.walls.get(key).map(|w| w.surface)
    }

    #[must_use]
    pub fn floor_surface(&self, room: RoomId) -> Option<SurfaceId> {
        self.floors.get(&room).map(|f| f.surface)
    }

    /// Closes a polygon into a new room with a random display color.
    ///
    /// # Errors
    ///
    /// Returns a topology error if the points do not form a valid room;
    /// nothing changes in that case.
    pub fn close_polygon(&mut self, points: Vec<PlanPoint>) -> Result<RoomId> {
        let rng = &mut self.rng;
        let id = ClosePolygon::new(points, self.config.snap_distance).execute(
            &mut self.pool,
            &mut self.rooms,
            || format!("#{:06x}", rng.gen_range(0..=0x00ff_ffff_u32)),
        )?;
        self.regenerate()?;
        Ok(id)
    }

    /// Moves a pool vertex and regenerates every affected surface.
    ///
    /// Returns the rooms that use the vertex.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::VertexOutOfRange` for an unknown index.
    pub fn update_vertex(&mut self, index: usize, point: PlanPoint) -> Result<Vec<RoomId>> {
        let affected = self.rooms.move_vertex(&mut self.pool, index, point)?;
        self.regenerate()?;
        Ok(affected)
    }

    /// Deletes a room. Its pool vertices and appearance entries are kept.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn delete_room(&mut self, id: RoomId) -> Result<()> {
        self.rooms.remove(id)?;
        self.regenerate()?;
        Ok(())
    }

    /// Replaces the openings on one edge of a room.
    ///
    /// # Errors
    ///
    /// Returns an error if the room or edge does not exist or a feature is
    /// invalid.
    pub fn set_wall_features(
        &mut self,
        id: RoomId,
        edge: usize,
        features: Vec<WallFeature>,
    ) -> Result<()> {
        self.rooms.set_wall_features(id, edge, features)?;
        self.regenerate()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn rename_room(&mut self, id: RoomId, name: impl Into<String>) -> Result<()> {
        self.rooms.rename(id, name)
    }

    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn set_room_type(&mut self, id: RoomId, room_type: RoomType) -> Result<()> {
        self.rooms.set_room_type(id, room_type)
    }

    /// Patches the style of one wall face. The style is stored even if no
    /// such wall exists yet.
    pub fn set_wall_appearance(&mut self, key: &WallKey, role: FaceRole, patch: &SurfaceStyle) {
        let style = self.appearance.set_wall(key, role, patch).clone();
        if let Some(live) = self.walls.get(key) {
            let assignment = StyleAssignment {
                surface: live.surface,
                slot: MaterialSlot::Wall(role),
                style: &style,
            };
            push_styles(&mut self.sink, &mut self.assets, &[assignment]);
        }
        self.evict_unused_textures();
    }

    /// Patches the floor style of a room.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::RoomNotFound` if the room does not exist.
    pub fn set_floor_appearance(&mut self, room: RoomId, patch: &SurfaceStyle) -> Result<()> {
        self.rooms.room(room)?;
        let style = self.appearance.set_floor(room, patch).clone();
        if let Some(live) = self.floors.get(&room) {
            let assignment = StyleAssignment {
                surface: live.surface,
                slot: MaterialSlot::Floor,
                style: &style,
            };
            push_styles(&mut self.sink, &mut self.assets, &[assignment]);
        }
        self.evict_unused_textures();
        Ok(())
    }

    #[must_use]
    pub fn export_project(&self) -> ProjectDocument {
        ExportProject::new(&self.pool, &self.rooms, &self.appearance).execute()
    }

    /// # Errors
    ///
    /// Returns `ProjectError::Json` if serialization fails.
    pub fn export_json(&self) -> Result<String> {
        self.export_project().to_json()
    }

    /// Replaces all state with the contents of `doc` and regenerates every
    /// surface. Rooms that cannot be rebuilt are reported, not fatal.
    ///
    /// # Errors
    ///
    /// Returns an error only if regeneration of the imported state fails.
    pub fn import_project(&mut self, doc: &ProjectDocument) -> Result<ImportReport> {
        let walls = std::mem::take(&mut self.walls);
        for (_, live) in walls {
            self.retire_wall(live);
        }
        let floors = std::mem::take(&mut self.floors);
        for (_, live) in floors {
            self.retire_surface(live.surface);
        }

        let imported = ImportProject::new(doc, self.config.vertex_epsilon).execute();
        self.pool = imported.pool;
        self.rooms = imported.rooms;
        self.appearance = imported.appearance;
        self.regenerate()?;
        Ok(imported.report)
    }

    /// # Errors
    ///
    /// Returns `ProjectError::Json` for malformed text; otherwise as
    /// [`Engine::import_project`].
    pub fn import_json(&mut self, text: &str) -> Result<ImportReport> {
        let doc = ProjectDocument::from_json(text)?;
        self.import_project(&doc)
    }

    /// Drains the asset resolutions the host should start.
    pub fn take_asset_requests(&mut self) -> Vec<AssetRequest> {
        self.assets.take_requests()
    }

    /// Completes an asset request started by the host.
    ///
    /// A texture that no live surface uses anymore is disposed and reported
    /// as [`AssetOutcome::Stale`].
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnknownTicket` for a ticket that is not pending,
    /// `AssetError::Resolution` if the host failed to resolve the asset and
    /// `AssetError::PayloadMismatch` if the payload does not fit the request.
    /// Materials are left unchanged on error.
    pub fn complete_asset(
        &mut self,
        ticket: u64,
        result: std::result::Result<AssetPayload, String>,
    ) -> Result<AssetOutcome> {
        let (asset, kind) = self.assets.complete(ticket)?;
        let payload = match result {
            Ok(payload) => payload,
            Err(reason) => {
                tracing::warn!(%asset, %reason, "asset resolution failed");
                return Err(AssetError::Resolution { asset, reason }.into());
            }
        };

        match (kind, payload) {
            (AssetKind::Texture, AssetPayload::Texture(handle)) => {
                Ok(self.apply_texture(asset, handle))
            }
            (AssetKind::Model(feature), AssetPayload::Model(extent)) => {
                Ok(self.apply_model(feature, asset, extent))
            }
            (_, payload) => {
                if let AssetPayload::Texture(handle) = payload {
                    self.sink.dispose(Resource::Texture(handle));
                }
                Err(AssetError::PayloadMismatch { asset }.into())
            }
        }
    }

    /// Re-derives walls and floors from the current rooms and brings the sink
    /// up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if a room references a vertex outside the pool.
    pub fn regenerate(&mut self) -> Result<RegenerationReport> {
        let graph = DeriveWalls::new(&self.pool, &self.rooms).execute()?;
        let mut report = RegenerationReport::default();

        let vanished: Vec<WallKey> = self
            .walls
            .keys()
            .filter(|key| !graph.contains(key))
            .cloned()
            .collect();
        for key in vanished {
            if let Some(live) = self.walls.remove(&key) {
                self.retire_wall(live);
                report.walls_removed += 1;
            }
        }

        for segment in graph.iter() {
            let has_windows = segment.features.iter().any(|f| f.kind == FeatureKind::Window);
            let centroid = if has_windows {
                Some(self.rooms.centroid(&self.pool, segment.owner())?)
            } else {
                None
            };

            if let Some(live) = self.walls.get(&segment.key) {
                if live.segment == *segment && live.centroid == centroid {
                    report.walls_kept += 1;
                    continue;
                }
            }
            if let Some(live) = self.walls.remove(&segment.key) {
                self.retire_wall(live);
            }

            let mesh = match BuildWallMesh::new(segment, self.params).execute() {
                Ok(mesh) => mesh,
                Err(err) => {
                    tracing::warn!(wall = %segment.key, %err, "skipping wall");
                    report.skipped.push(segment.key.clone());
                    continue;
                }
            };
            let surface = self.add_surface(&Surface::Wall(mesh.clone()));
            let mut live = LiveWall {
                segment: segment.clone(),
                centroid,
                surface,
                mesh,
                proxies: Vec::new(),
            };
            self.place_proxies(&mut live)?;
            self.walls.insert(segment.key.clone(), live);
            report.walls_built += 1;
        }

        self.regenerate_floors(&mut report)?;
        self.apply_styles();

        tracing::debug!(
            built = report.walls_built,
            kept = report.walls_kept,
            removed = report.walls_removed,
            floors = report.floors_built,
            skipped = report.skipped.len(),
            "regenerated"
        );
        Ok(report)
    }

    fn regenerate_floors(&mut self, report: &mut RegenerationReport) -> Result<()> {
        let gone: Vec<RoomId> = self
            .floors
            .keys()
            .filter(|id| !self.rooms.contains(**id))
            .copied()
            .collect();
        for id in gone {
            if let Some(live) = self.floors.remove(&id) {
                self.retire_surface(live.surface);
            }
        }

        let outlines = self
            .rooms
            .ids()
            .iter()
            .map(|&id| self.rooms.outline(&self.pool, id).map(|outline| (id, outline)))
            .collect::<Result<Vec<_>>>()?;

        for (room, outline) in outlines {
            if self.floors.get(&room).is_some_and(|f| f.outline == outline) {
                continue;
            }
            if let Some(live) = self.floors.remove(&room) {
                self.retire_surface(live.surface);
            }
            match TessellateFloor::new(&outline).execute() {
                Ok(mesh) => {
                    let surface = self.add_surface(&Surface::Floor(FloorMesh { room, mesh }));
                    self.floors.insert(room, LiveFloor { surface, outline });
                    report.floors_built += 1;
                }
                Err(err) => {
                    tracing::warn!(?room, %err, "skipping floor");
                    report.skipped_floors.push(room);
                }
            }
        }
        Ok(())
    }

    /// Replaces the opening proxies of one live wall.
    fn place_proxies(&mut self, live: &mut LiveWall) -> Result<()> {
        for id in live.proxies.drain(..) {
            self.sink.remove(id);
            self.sink.dispose(Resource::Surface(id));
        }
        if live.segment.features.is_empty() {
            return Ok(());
        }
        let centroid = match live.centroid {
            Some(c) => c,
            None => self.rooms.centroid(&self.pool, live.segment.owner())?,
        };
        let proxies = PlaceOpenings::new(&live.mesh, &live.segment, centroid, self.params)
            .execute(&self.models);
        for proxy in proxies {
            let id = self.add_surface(&Surface::Opening(proxy));
            live.proxies.push(id);
        }
        Ok(())
    }

    fn apply_texture(&mut self, asset: String, handle: TextureHandle) -> AssetOutcome {
        let uses = |style: &SurfaceStyle| style.texture.as_deref() == Some(asset.as_str());
        let assignments: Vec<StyleAssignment<'_>> = self
            .appearance
            .apply_all(
                self.walls.iter().map(|(key, w)| (key, w.surface)),
                self.floors.iter().map(|(&room, f)| (room, f.surface)),
            )
            .into_iter()
            .filter(|a| uses(a.style))
            .collect();

        if assignments.is_empty() {
            tracing::debug!(%asset, "texture no longer referenced");
            self.sink.dispose(Resource::Texture(handle));
            return AssetOutcome::Stale;
        }

        let mut surfaces: Vec<SurfaceId> = assignments.iter().map(|a| a.surface).collect();
        surfaces.sort_unstable();
        surfaces.dedup();

        if let Some(old) = self.assets.cache_texture(asset, handle) {
            self.sink.dispose(Resource::Texture(old));
        }
        push_styles(&mut self.sink, &mut self.assets, &assignments);
        AssetOutcome::Applied {
            surfaces: surfaces.len(),
        }
    }

    fn apply_model(
        &mut self,
        kind: FeatureKind,
        asset: String,
        extent: ModelExtent,
    ) -> AssetOutcome {
        tracing::debug!(%asset, ?kind, "opening model resolved");
        self.models.register(kind, asset, extent);

        let keys: Vec<WallKey> = self
            .walls
            .iter()
            .filter(|(_, w)| w.segment.features.iter().any(|f| f.kind == kind))
            .map(|(key, _)| key.clone())
            .collect();
        let mut surfaces = 0;
        for key in keys {
            let Some(mut live) = self.walls.remove(&key) else {
                continue;
            };
            if let Err(err) = self.place_proxies(&mut live) {
                tracing::warn!(wall = %key, %err, "could not place openings");
            }
            surfaces += live.proxies.len();
            self.walls.insert(key, live);
        }
        AssetOutcome::Applied { surfaces }
    }

    /// Pushes every stored style onto the live surfaces.
    fn apply_styles(&mut self) {
        let assignments = self.appearance.apply_all(
            self.walls.iter().map(|(key, w)| (key, w.surface)),
            self.floors.iter().map(|(&room, f)| (room, f.surface)),
        );
        push_styles(&mut self.sink, &mut self.assets, &assignments);
        self.evict_unused_textures();
    }

    fn evict_unused_textures(&mut self) {
        let appearance = &self.appearance;
        for handle in self.assets.evict_textures(|asset| appearance.references_texture(asset)) {
            self.sink.dispose(Resource::Texture(handle));
        }
    }

    fn add_surface(&mut self, surface: &Surface) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.sink.add(id, surface);
        id
    }

    fn retire_wall(&mut self, live: LiveWall) {
        for id in live.proxies {
            self.retire_surface(id);
        }
        self.retire_surface(live.surface);
    }

    fn retire_surface(&mut self, id: SurfaceId) {
        self.sink.remove(id);
        self.sink.dispose(Resource::Surface(id));
    }
}

/// Sends styles to the sink, requesting textures that are not resolved yet.
fn push_styles<S: SurfaceSink>(
    sink: &mut S,
    assets: &mut AssetTracker,
    assignments: &[StyleAssignment<'_>],
) {
    for assignment in assignments {
        let texture = assignment.style.texture.as_deref().and_then(|asset| {
            let handle = assets.texture(asset);
            if handle.is_none() {
                assets.request(asset, AssetKind::Texture);
            }
            handle
        });
        let applied = AppliedStyle {
            color: assignment.style.color.clone(),
            texture,
        };
        sink.apply_style(assignment.surface, assignment.slot, &applied);
    }
}
