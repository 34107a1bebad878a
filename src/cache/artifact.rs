use crate::foundation::core::RectI;

/// Which cached artifacts exist, or which ones a decision wants discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCacheType {
    /// Nothing.
    #[default]
    None,
    /// The unfiltered capture.
    Snapshot,
    /// The post-filter result.
    FilteredSnapshot,
    /// Both artifacts.
    Both,
}

impl FilterCacheType {
    /// Return `true` when the snapshot artifact is covered.
    pub fn includes_snapshot(self) -> bool {
        matches!(self, Self::Snapshot | Self::Both)
    }

    /// Return `true` when the filtered artifact is covered.
    pub fn includes_filtered(self) -> bool {
        matches!(self, Self::FilteredSnapshot | Self::Both)
    }
}

/// A GPU image handle paired with the device-space rect it represents.
///
/// The artifact exclusively owns its image; dropping the artifact releases it.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheArtifact<I> {
    image: I,
    region: RectI,
    content_hash: u32,
}

impl<I> CacheArtifact<I> {
    /// Pair `image` with the rect it covers and the filter hash current when it was produced.
    pub fn new(image: I, region: RectI, content_hash: u32) -> Self {
        Self {
            image,
            region,
            content_hash,
        }
    }

    /// The image handle.
    pub fn image(&self) -> &I {
        &self.image
    }

    /// Device-space rect represented by the image.
    pub fn region(&self) -> RectI {
        self.region
    }

    /// Filter content hash recorded at capture/regeneration time.
    pub fn content_hash(&self) -> u32 {
        self.content_hash
    }

    /// Give up the artifact and return its image.
    pub fn into_image(self) -> I {
        self.image
    }
}

/// Holds the snapshot and filtered-snapshot artifacts of one filter cache.
#[derive(Debug)]
pub struct ArtifactStore<I> {
    snapshot: Option<CacheArtifact<I>>,
    filtered: Option<CacheArtifact<I>>,
    // Capture source rect, before any magnifier offset or inset.
    snapshot_region: RectI,
    filtered_from_hardware: bool,
}

impl<I> Default for ArtifactStore<I> {
    fn default() -> Self {
        Self {
            snapshot: None,
            filtered: None,
            snapshot_region: RectI::default(),
            filtered_from_hardware: false,
        }
    }
}

impl<I> ArtifactStore<I> {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Which artifacts are present.
    pub fn cached_type(&self) -> FilterCacheType {
        match (self.snapshot.is_some(), self.filtered.is_some()) {
            (false, false) => FilterCacheType::None,
            (true, false) => FilterCacheType::Snapshot,
            (false, true) => FilterCacheType::FilteredSnapshot,
            (true, true) => FilterCacheType::Both,
        }
    }

    /// Return `true` when a snapshot is present, the minimum needed to skip a recapture.
    pub fn is_valid(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Return `true` when either artifact is present.
    pub fn has_any(&self) -> bool {
        self.snapshot.is_some() || self.filtered.is_some()
    }

    /// Release the artifacts selected by `which`. Releasing an absent artifact is a no-op.
    pub fn invalidate(&mut self, which: FilterCacheType) {
        if which.includes_snapshot() && self.snapshot.take().is_some() {
            tracing::trace!("invalidated snapshot");
        }
        if which.includes_filtered() && self.filtered.take().is_some() {
            tracing::trace!("invalidated filtered snapshot");
            self.filtered_from_hardware = false;
        }
    }

    /// Drop artifacts whose image no longer passes `alive`.
    ///
    /// Returns the cache type that was dropped. A stale handle is a cache miss, never an error.
    pub fn check_liveness(&mut self, alive: impl Fn(&I) -> bool) -> FilterCacheType {
        let snapshot_dead = self.snapshot.as_ref().is_some_and(|a| !alive(&a.image));
        let filtered_dead = self.filtered.as_ref().is_some_and(|a| !alive(&a.image));
        let dropped = match (snapshot_dead, filtered_dead) {
            (false, false) => FilterCacheType::None,
            (true, false) => FilterCacheType::Snapshot,
            (false, true) => FilterCacheType::FilteredSnapshot,
            (true, true) => FilterCacheType::Both,
        };
        if dropped != FilterCacheType::None {
            tracing::warn!(?dropped, "cached image no longer valid in gpu context");
            self.invalidate(dropped);
        }
        dropped
    }

    /// The snapshot artifact, if present.
    pub fn snapshot(&self) -> Option<&CacheArtifact<I>> {
        self.snapshot.as_ref()
    }

    /// The filtered artifact, if present.
    pub fn filtered(&self) -> Option<&CacheArtifact<I>> {
        self.filtered.as_ref()
    }

    /// Whether the filtered artifact came from the hardware path (scaled relative to the canvas).
    pub fn filtered_from_hardware(&self) -> bool {
        self.filtered_from_hardware
    }

    /// Region the cached images were captured from; empty when nothing is cached.
    pub fn cached_image_region(&self) -> RectI {
        if self.has_any() {
            self.snapshot_region
        } else {
            RectI::default()
        }
    }

    pub(crate) fn store_snapshot(&mut self, artifact: CacheArtifact<I>, source_region: RectI) {
        self.snapshot_region = source_region;
        self.snapshot = Some(artifact);
    }

    pub(crate) fn store_filtered(&mut self, artifact: CacheArtifact<I>) {
        self.filtered = Some(artifact);
        self.filtered_from_hardware = false;
    }

    /// Replace both artifacts with the ones produced by the hardware path.
    pub(crate) fn reset_from_hardware(
        &mut self,
        snapshot: Option<CacheArtifact<I>>,
        filtered: Option<CacheArtifact<I>>,
        region: RectI,
    ) {
        self.snapshot = snapshot;
        self.filtered_from_hardware = filtered.is_some();
        self.filtered = filtered;
        self.snapshot_region = region;
    }

    /// Drop the filtered artifact when it was produced with a different filter hash.
    ///
    /// Returns `true` when something was dropped.
    pub fn expire_filtered_on_hash(&mut self, content_hash: u32) -> bool {
        let stale = self
            .filtered
            .as_ref()
            .is_some_and(|a| a.content_hash() != content_hash);
        if stale {
            tracing::debug!(
                content_hash,
                "filtered snapshot expired: filter hash no longer matches"
            );
            self.invalidate(FilterCacheType::FilteredSnapshot);
        }
        stale
    }

    /// Human-readable description of what a draw would reuse.
    pub fn cache_state(&self) -> String {
        if let Some(f) = &self.filtered {
            format!("filtered image found in cache, reusing {}", f.region())
        } else if let Some(s) = &self.snapshot {
            format!("snapshot found in cache, filtering cached {}", s.region())
        } else {
            "no valid cache found".to_string()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/artifact.rs"]
mod tests;
