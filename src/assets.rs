use std::collections::HashMap;

use crate::error::{AssetError, Result};
use crate::sink::TextureHandle;
use crate::tessellation::ModelExtent;
use crate::walls::FeatureKind;

/// What an asset id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Model(FeatureKind),
}

/// A resolution the host should start. Completed later through
/// [`Engine::complete_asset`](crate::Engine::complete_asset) with `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub ticket: u64,
    pub asset: String,
    pub kind: AssetKind,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssetPayload {
    Texture(TextureHandle),
    Model(ModelExtent),
}

/// What completing an asset request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOutcome {
    /// The asset was applied to this many live surfaces.
    Applied { surfaces: usize },
    /// Nothing references the asset anymore; the result was dropped.
    Stale,
}

/// Bookkeeping of outstanding and resolved assets. Only identifiers and host
/// handles are kept; loading itself happens outside the engine.
#[derive(Debug, Default)]
pub struct AssetTracker {
    next_ticket: u64,
    pending: HashMap<u64, (String, AssetKind)>,
    queued: Vec<AssetRequest>,
    textures: HashMap<String, TextureHandle>,
}

impl AssetTracker {
    /// Queues a request unless the asset is already cached or in flight.
    pub fn request(&mut self, asset: &str, kind: AssetKind) -> Option<u64> {
        if kind == AssetKind::Texture && self.textures.contains_key(asset) {
            return None;
        }
        let in_flight = self
            .pending
            .values()
            .any(|(pending, k)| pending == asset && *k == kind);
        if in_flight {
            return None;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(ticket, (asset.to_owned(), kind));
        self.queued.push(AssetRequest {
            ticket,
            asset: asset.to_owned(),
            kind,
        });
        Some(ticket)
    }

    /// Hands queued requests to the host.
    pub fn take_requests(&mut self) -> Vec<AssetRequest> {
        std::mem::take(&mut self.queued)
    }

    /// Closes a pending request and returns what it was for.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnknownTicket` if the ticket is not pending.
    pub fn complete(&mut self, ticket: u64) -> Result<(String, AssetKind)> {
        self.pending
            .remove(&ticket)
            .ok_or_else(|| AssetError::UnknownTicket(ticket).into())
    }

    #[must_use]
    pub fn texture(&self, asset: &str) -> Option<TextureHandle> {
        self.textures.get(asset).copied()
    }

    /// Caches a resolved texture, returning any handle it replaces.
    pub fn cache_texture(&mut self, asset: String, handle: TextureHandle) -> Option<TextureHandle> {
        self.textures.insert(asset, handle)
    }

    /// Drops every cached texture for which `keep` is false.
    pub fn evict_textures(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<TextureHandle> {
        let evicted: Vec<String> = self
            .textures
            .keys()
            .filter(|asset| !keep(asset))
            .cloned()
            .collect();
        evicted
            .iter()
            .filter_map(|asset| self.textures.remove(asset))
            .collect()
    }
}
