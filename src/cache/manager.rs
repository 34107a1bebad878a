//! Per-node filter cache manager.
//!
//! One manager per filtered node. The producer walk marks intent through the `mark_*` methods,
//! [`FilterCacheManager::on_sync`] commits it and applies the decision, then the render pass
//! calls [`FilterCacheManager::draw_filter`] and finally
//! [`FilterCacheManager::compact_filter_cache`].

use crate::cache::artifact::{ArtifactStore, CacheArtifact, FilterCacheType};
use crate::cache::decision::{self, Hysteresis, Verdict};
use crate::cache::intent::{CommittedRecord, IntentRecord, Synchronizer};
use crate::cache::opts::FilterCacheOpts;
use crate::foundation::core::{NodeId, RectI};
use crate::render::backend::{DirtyOracle, FilterCanvas, FilterCategory, FilterProvider};
use crate::render::capture;
use crate::render::damage::covered_area;
use crate::render::hardware::{HardwareOutcome, HardwarePath, HardwareSeed};

/// What a sync applied, for callers that purge GPU memory or report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SyncOutcome {
    /// Decision taken for the committed frame.
    pub verdict: Verdict,
    /// The region changed and the cache became empty: GPU memory held for it can be purged.
    pub needs_gpu_purge: bool,
    /// Drop the filtered result (keep the snapshot) after drawing this frame.
    pub clear_filtered_after_drawing: bool,
    /// Cache type the next frame's decision will start from.
    pub last_cache_type: FilterCacheType,
    /// Artifacts present right after the decision was applied.
    pub cached_type: FilterCacheType,
}

/// Per-draw options of [`FilterCacheManager::draw_filter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawFilterOpts {
    /// Use `should_clear_filtered` instead of the retention policy computed at sync.
    pub manually_handle: bool,
    /// Caller's retention choice when `manually_handle` is set.
    pub should_clear_filtered: bool,
    /// Capture rect; defaults to the rounded-in device clip.
    pub src: Option<RectI>,
    /// Destination rect; defaults to `src`.
    pub dst: Option<RectI>,
}

/// How a draw was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOutcome {
    /// The hardware path drew the filter.
    Hardware,
    /// Empty clip or empty rects: nothing to draw.
    Skipped,
    /// The filter ran straight from the snapshot.
    FromSnapshot,
    /// The cached filtered result was drawn.
    FromFilteredCache,
    /// Capture or regeneration failed; nothing was drawn this frame.
    Missed,
}

/// Filter cache of one node: artifacts, intent handoff and amortization state.
pub struct FilterCacheManager<C: FilterCanvas> {
    sync: Synchronizer,
    store: ArtifactStore<C::Image>,
    hysteresis: Hysteresis,
    opts: FilterCacheOpts,
    last_verdict: Option<Verdict>,
    last_cache_type: FilterCacheType,
    clear_filtered_after_drawing: bool,
    take_new_snapshot: bool,
    hardware_content_changed: bool,
    snapshot_need_update: bool,
}

impl<C: FilterCanvas> Default for FilterCacheManager<C> {
    fn default() -> Self {
        Self::new(FilterCacheOpts::default())
    }
}

impl<C: FilterCanvas> std::fmt::Debug for FilterCacheManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCacheManager")
            .field("cached_type", &self.store.cached_type())
            .field("last_cache_type", &self.last_cache_type)
            .field("hysteresis", &self.hysteresis)
            .field("last_verdict", &self.last_verdict)
            .field(
                "clear_filtered_after_drawing",
                &self.clear_filtered_after_drawing,
            )
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl<C: FilterCanvas> FilterCacheManager<C> {
    /// Empty cache tuned by `opts`.
    pub fn new(opts: FilterCacheOpts) -> Self {
        Self {
            sync: Synchronizer::new(),
            store: ArtifactStore::new(),
            hysteresis: Hysteresis::default(),
            opts,
            last_verdict: None,
            last_cache_type: FilterCacheType::None,
            clear_filtered_after_drawing: false,
            take_new_snapshot: false,
            hardware_content_changed: false,
            snapshot_need_update: false,
        }
    }

    // --- producer phase -------------------------------------------------------------------

    /// Record hash, category and skip eligibility of the attached filter.
    pub fn record_filter_info<F: FilterProvider<C> + ?Sized>(&mut self, filter: &F) {
        self.sync.record_filter(
            filter.content_hash(),
            filter.category(),
            filter.can_skip_frame(),
        );
    }

    /// Freeze (or unfreeze) the cache for this frame.
    pub fn mark_filter_force_use_cache(&mut self, force_use_cache: bool) {
        self.sync.staging_mut().force_use_cache = force_use_cache;
    }

    /// Request an unconditional full invalidation.
    pub fn mark_filter_force_clear_cache(&mut self) {
        self.sync.staging_mut().force_clear = true;
    }

    /// The filter region moved or resized.
    pub fn mark_filter_region_changed(&mut self) {
        self.sync.staging_mut().region_changed = true;
    }

    /// Content beneath the region intersects frame damage.
    pub fn mark_filter_region_interact_with_dirty(&mut self) {
        self.sync.staging_mut().interacts_with_dirty = true;
    }

    /// This is the last frame before vsync stops.
    pub fn mark_force_clear_cache_with_last_frame(&mut self) {
        self.sync.staging_mut().force_clear_from_last_frame = true;
    }

    /// The region counts as a large-area blur.
    pub fn mark_filter_region_is_large_area(&mut self) {
        self.sync.staging_mut().is_large_area = true;
    }

    /// The screen rotated.
    pub fn mark_rotation_changed(&mut self) {
        self.sync.staging_mut().rotation_changed = true;
    }

    /// Whether the node is fully covered by opaque content.
    pub fn mark_node_is_occluded(&mut self, is_occluded: bool) {
        self.sync.staging_mut().is_occluded = is_occluded;
    }

    /// The node is an effect node.
    pub fn mark_effect_node(&mut self) {
        self.sync.staging_mut().is_effect_node = true;
    }

    /// Log a summary at sync when the dirty interaction flips.
    pub fn mark_debug_enabled(&mut self) {
        self.sync.staging_mut().debug_enabled = true;
    }

    /// Record the offscreen-canvas node this filter draws into, forcing a clear when it differs
    /// from last frame's and something is cached.
    pub fn mark_in_foreground_filter(&mut self, offscreen_node: NodeId) {
        let node = offscreen_node.is_valid().then_some(offscreen_node);
        self.sync.staging_mut().in_foreground_filter = node;
        if node != self.sync.committed().in_foreground_filter
            && self.last_cache_type != FilterCacheType::None
        {
            self.mark_filter_force_clear_cache();
        }
    }

    /// Record AI-bar interaction with hardware-composition damage and, while an amortization
    /// window runs, freeze the cache.
    ///
    /// Returns `true` when the cache was frozen. Always `false` for other categories.
    pub fn check_and_update_aibar_cache_status(&mut self, intersects_hwc_damage: bool) -> bool {
        if self.sync.filter().category != FilterCategory::AiBar {
            return false;
        }
        if intersects_hwc_damage {
            self.sync.staging_mut().aibar_interacts_with_hwc = true;
        }
        if self.hysteresis.cache_update_interval == 0
            || self.sync.staging().force_clear_from_last_frame
        {
            return false;
        }
        self.mark_filter_force_use_cache(true);
        true
    }

    /// Ask `oracle` whether the cached region overlaps frame damage and mark the dirty
    /// interaction if so.
    pub fn mark_dirty_overlap(&mut self, oracle: &dyn DirtyOracle) -> bool {
        let region = self.store.cached_image_region();
        let overlaps = !region.is_empty() && oracle.overlaps(region);
        if overlaps {
            self.mark_filter_region_interact_with_dirty();
        }
        overlaps
    }

    /// Staged force-use-cache flag.
    pub fn is_force_use_cache(&self) -> bool {
        self.sync.staging().force_use_cache
    }

    /// Staged force-clear flag.
    pub fn is_force_clear_cache(&self) -> bool {
        self.sync.staging().force_clear
    }

    /// A deferred purge is due, given what is staged.
    pub fn need_pending_purge(&self) -> bool {
        self.hysteresis.need_pending_purge(self.sync.staging().interacts_with_dirty)
    }

    /// Dirty or rotated content that is still within its amortization window.
    pub fn is_skipping_frame(&self) -> bool {
        let s = self.sync.staging();
        (s.interacts_with_dirty || s.rotation_changed) && self.hysteresis.cache_update_interval > 0
    }

    /// Cheap estimate of whether this frame will run a large-area blur.
    pub fn would_draw_large_area_blur(&self) -> bool {
        let s = self.sync.staging();
        tracing::trace!(
            large_area = s.is_large_area,
            can_skip = s.can_skip_frame,
            interval = self.hysteresis.cache_update_interval,
            dirty = s.interacts_with_dirty,
            "would draw large area blur"
        );
        if !s.is_large_area {
            return false;
        }
        if !s.can_skip_frame {
            return true;
        }
        self.hysteresis.cache_update_interval == 1 && s.interacts_with_dirty
    }

    /// Whether this frame will run a large-area blur, mirroring the decision table.
    pub fn would_draw_large_area_blur_precisely(&self) -> bool {
        let s = self.sync.staging();
        if !s.is_large_area {
            return false;
        }
        if s.force_clear {
            return true;
        }
        if !s.can_skip_frame && !s.hash_changed {
            return true;
        }
        if !s.interacts_with_dirty && !s.hash_changed && !s.region_changed {
            return false;
        }
        if self.hysteresis.cache_update_interval == 0 {
            return true;
        }
        self.last_cache_type == FilterCacheType::FilteredSnapshot && s.hash_changed
    }

    /// Staged intent.
    pub fn staging(&self) -> &IntentRecord {
        self.sync.staging()
    }

    // --- sync point -----------------------------------------------------------------------

    /// Commit the staged intent, evaluate the decision table and apply it.
    #[tracing::instrument(level = "debug", skip_all, fields(node = node.0))]
    pub fn on_sync(&mut self, node: NodeId) -> SyncOutcome {
        let record = *self.sync.commit();
        self.print_debug_info(node, &record);
        let verdict = self.mark_need_clear_filter_cache(&record);
        let needs_gpu_purge = self.clear_filter_cache(&record, &verdict);
        SyncOutcome {
            verdict,
            needs_gpu_purge,
            clear_filtered_after_drawing: self.clear_filtered_after_drawing,
            last_cache_type: self.last_cache_type,
            cached_type: self.store.cached_type(),
        }
    }

    fn mark_need_clear_filter_cache(&mut self, record: &CommittedRecord) -> Verdict {
        let verdict = decision::evaluate(
            record,
            self.last_cache_type,
            &mut self.hysteresis,
            &self.opts,
        );
        self.last_verdict = Some(verdict);
        verdict
    }

    // Returns whether GPU memory held for the region can be purged.
    fn clear_filter_cache(&mut self, record: &CommittedRecord, verdict: &Verdict) -> bool {
        let region_cached = record.region_changed && self.store.has_any();
        self.store.invalidate(verdict.decision.clear_type);
        let cached = self.store.cached_type();
        let needs_gpu_purge = region_cached && cached == FilterCacheType::None;

        let save_snapshot = record.hash_changed || cached == FilterCacheType::None;
        let is_aibar = record.filter_category == FilterCategory::AiBar;
        let mut clear_after = (!is_aibar || record.force_clear_from_last_frame) && save_snapshot;
        if record.is_effect_node || verdict.is_skipping_frame {
            clear_after = record.hash_changed;
        }
        self.clear_filtered_after_drawing = clear_after;
        self.last_cache_type = if record.is_occluded {
            cached
        } else if clear_after {
            FilterCacheType::Snapshot
        } else {
            FilterCacheType::FilteredSnapshot
        };

        tracing::debug!(
            clear = ?verdict.decision.clear_type,
            occluded = record.is_occluded,
            last_cache_type = ?self.last_cache_type,
            needs_gpu_purge,
            clear_filtered_after_drawing = clear_after,
            "applied filter cache decision"
        );
        needs_gpu_purge
    }

    fn print_debug_info(&self, node: NodeId, record: &CommittedRecord) {
        if !record.debug_enabled
            || self.sync.previous_interacts_with_dirty() == record.interacts_with_dirty
        {
            return;
        }
        tracing::info!(
            node = node.0,
            force_use_cache = record.force_use_cache,
            force_clear = record.force_clear,
            below_dirty = record.interacts_with_dirty,
            interval = self.hysteresis.cache_update_interval,
            pending_purge = self.hysteresis.pending_purge,
            "filter cache dirty interaction changed"
        );
    }

    // --- render phase ---------------------------------------------------------------------

    /// Capture, decide, regenerate and draw the filter for one node and frame.
    pub fn draw_filter<F: FilterProvider<C> + ?Sized>(
        &mut self,
        canvas: &mut C,
        filter: &F,
        node: NodeId,
        hardware: &mut HardwarePath<'_, C>,
        opts: DrawFilterOpts,
    ) -> DrawOutcome {
        self.take_new_snapshot = false;
        if self.draw_filter_using_hardware(canvas, node, hardware) {
            return DrawOutcome::Hardware;
        }
        let Some((src, dst)) = self.resolve_rects(canvas, opts.src, opts.dst) else {
            return DrawOutcome::Skipped;
        };
        tracing::debug!(state = %self.store.cache_state(), %src, %dst, "draw filter");

        if !self.store.has_any() {
            self.take_snapshot(canvas, filter, src);
        }
        if self.store.filtered().is_none() {
            let clear_after = if opts.manually_handle {
                opts.should_clear_filtered
            } else {
                self.clear_filtered_after_drawing
            };
            if self.draw_filter_without_snapshot(canvas, filter, dst, clear_after) {
                return DrawOutcome::FromSnapshot;
            }
            self.generate_filtered_snapshot(canvas, filter, dst);
        }
        if self.draw_cached_filtered_snapshot(canvas, filter.category(), dst) {
            DrawOutcome::FromFilteredCache
        } else {
            DrawOutcome::Missed
        }
    }

    /// Like [`FilterCacheManager::draw_filter`] but hand the filtered result back instead of
    /// drawing it, for effect nodes sharing it with their children.
    pub fn generate_cached_effect_data<F: FilterProvider<C> + ?Sized>(
        &mut self,
        canvas: &mut C,
        filter: &F,
        src: Option<RectI>,
        dst: Option<RectI>,
    ) -> Option<&CacheArtifact<C::Image>> {
        self.take_new_snapshot = false;
        let (src, dst) = self.resolve_rects(canvas, src, dst)?;
        tracing::debug!(
            state = %self.store.cache_state(),
            %src,
            %dst,
            "generate cached effect data"
        );

        if !self.store.has_any() {
            self.take_snapshot(canvas, filter, src);
        } else if self.snapshot_need_update {
            tracing::debug!(%src, "hardware blur content changed, forcing a new snapshot");
            if let Some(captured) = capture::capture_snapshot(canvas, filter, src, &self.opts) {
                self.store.store_snapshot(captured.artifact, captured.source_region);
                self.store.invalidate(FilterCacheType::FilteredSnapshot);
                self.take_new_snapshot = true;
            }
        }
        let committed = self.sync.committed();
        self.snapshot_need_update = self.hardware_content_changed
            && !committed.force_use_cache
            && committed.filter_category != FilterCategory::AiBar;

        if self.store.filtered().is_none() {
            self.generate_filtered_snapshot(canvas, filter, dst);
        }
        self.store.filtered()
    }

    /// Drop one artifact after drawing to save memory: the filtered result when the retention
    /// policy says so, else the snapshot.
    pub fn compact_filter_cache(&mut self) {
        if self.force_update_by_hardware() {
            tracing::debug!("hardware blur content changed, dropping filtered snapshot");
            self.clear_filtered_after_drawing = true;
        }
        self.store.invalidate(if self.clear_filtered_after_drawing {
            FilterCacheType::FilteredSnapshot
        } else {
            FilterCacheType::Snapshot
        });
    }

    fn force_update_by_hardware(&self) -> bool {
        let c = self.sync.committed();
        !c.interacts_with_dirty
            && !c.force_use_cache
            && c.filter_category != FilterCategory::AiBar
            && self.hardware_content_changed
    }

    /// Invalidate the cache when this draw captured a new snapshot but the canvas had drawn only
    /// part of `filter_bound` beforehand, so the capture mixes old and new content.
    pub fn clear_effect_cache_with_drawn_region(&mut self, canvas: &C, filter_bound: RectI) {
        if !self.take_new_snapshot || filter_bound.is_empty() {
            return;
        }
        let drawn = canvas.drawn_region().unwrap_or_default();
        let covered = covered_area(filter_bound, &drawn);
        if covered > 0 && covered < filter_bound.area() {
            tracing::debug!(%filter_bound, covered, "snapshot partially covered by drawn region");
            self.store.invalidate(FilterCacheType::Both);
        }
    }

    /// Drop artifacts whose image is no longer valid on `canvas`' GPU context.
    pub fn check_cached_images(&mut self, canvas: &C) -> FilterCacheType {
        self.store.check_liveness(|image| canvas.is_image_handle_valid(image))
    }

    /// Drop the filtered result if it was produced for a different filter hash.
    pub fn update_cache_state_with_filter_hash<F: FilterProvider<C> + ?Sized>(
        &mut self,
        filter: &F,
    ) -> bool {
        self.store.expire_filtered_on_hash(filter.content_hash())
    }

    /// Release the artifacts selected by `which`.
    pub fn invalidate_filter_cache(&mut self, which: FilterCacheType) {
        self.store.invalidate(which);
    }

    /// Discard everything: the node left the visible tree.
    pub fn release_cache_off_tree(&mut self) {
        tracing::trace!("release filter cache off tree");
        self.store.invalidate(FilterCacheType::Both);
    }

    fn resolve_rects(
        &mut self,
        canvas: &mut C,
        src: Option<RectI>,
        dst: Option<RectI>,
    ) -> Option<(RectI, RectI)> {
        if canvas.device_clip_bounds().is_empty() {
            return None;
        }
        let (src, dst) = capture::validate_params(canvas, src, dst);
        if src.is_empty() || dst.is_empty() {
            return None;
        }
        self.check_cached_images(canvas);
        Some((src, dst))
    }

    fn draw_filter_using_hardware(
        &mut self,
        canvas: &mut C,
        node: NodeId,
        hardware: &mut HardwarePath<'_, C>,
    ) -> bool {
        if matches!(hardware, HardwarePath::Unavailable) {
            return false;
        }
        let seed = HardwareSeed {
            snapshot: self.store.snapshot(),
            filtered: self.store.filtered(),
            region: self.store.cached_image_region(),
            clear_filtered_after_drawing: self.clear_filtered_after_drawing,
        };
        match hardware.try_draw(canvas, node, seed) {
            HardwareOutcome::Handled {
                snapshot,
                filtered,
                region,
                content_changed,
            } => {
                tracing::debug!(node = node.0, content_changed, "drawn by hardware");
                self.store.reset_from_hardware(snapshot, filtered, region);
                self.hardware_content_changed = content_changed;
                true
            }
            HardwareOutcome::NotHandled => {
                self.hardware_content_changed = false;
                false
            }
        }
    }

    fn take_snapshot<F: FilterProvider<C> + ?Sized>(
        &mut self,
        canvas: &mut C,
        filter: &F,
        src: RectI,
    ) {
        if let Some(captured) = capture::capture_snapshot(canvas, filter, src, &self.opts) {
            self.store.store_snapshot(captured.artifact, captured.source_region);
            self.take_new_snapshot = true;
        }
    }

    fn generate_filtered_snapshot<F: FilterProvider<C> + ?Sized>(
        &mut self,
        canvas: &mut C,
        filter: &F,
        dst: RectI,
    ) {
        // Capture may have failed (no surface); nothing to filter then.
        if self.store.snapshot().is_none() {
            tracing::debug!(%dst, "no snapshot to filter");
            return;
        }
        let generated =
            capture::generate_filtered_snapshot(canvas, filter, self.store.snapshot(), dst);
        match generated {
            Ok(Some(filtered)) => self.store.store_filtered(filtered),
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "filtered snapshot not generated"),
        }
    }

    fn draw_filter_without_snapshot<F: FilterProvider<C> + ?Sized>(
        &self,
        canvas: &mut C,
        filter: &F,
        dst: RectI,
        clear_filtered_after_drawing: bool,
    ) -> bool {
        if !self.opts.draw_without_snapshot || !clear_filtered_after_drawing {
            return false;
        }
        let Some(snapshot) = self.store.snapshot() else {
            return false;
        };
        capture::draw_filter_without_snapshot(canvas, filter, snapshot, dst, &self.opts);
        true
    }

    fn draw_cached_filtered_snapshot(
        &self,
        canvas: &mut C,
        category: FilterCategory,
        dst: RectI,
    ) -> bool {
        let Some(filtered) = self.store.filtered() else {
            return false;
        };
        capture::draw_cached_filtered_snapshot(
            canvas,
            filtered,
            self.store.filtered_from_hardware(),
            dst,
            category,
            &self.opts,
        );
        true
    }

    // --- queries --------------------------------------------------------------------------

    /// Which artifacts are present.
    pub fn cached_type(&self) -> FilterCacheType {
        self.store.cached_type()
    }

    /// Cache type the next decision starts from.
    pub fn last_cache_type(&self) -> FilterCacheType {
        self.last_cache_type
    }

    /// Human-readable description of what a draw would reuse.
    pub fn cache_state(&self) -> String {
        self.store.cache_state()
    }

    /// Region the cached images were captured from; empty when nothing is cached.
    pub fn cached_image_region(&self) -> RectI {
        self.store.cached_image_region()
    }

    /// Whether the last decision left the cache servable.
    pub fn is_filter_cache_valid(&self) -> bool {
        self.last_verdict.is_some_and(|v| v.decision.cache_valid)
    }

    /// Whether anything is cached, for occlusion culling after sync.
    pub fn is_filter_cache_valid_for_occlusion(&self) -> bool {
        self.store.cached_type() != FilterCacheType::None
    }

    /// Retention policy computed at the last sync.
    pub fn clear_cache_after_drawing(&self) -> bool {
        self.clear_filtered_after_drawing
    }

    /// Whether the last draw captured a new snapshot.
    pub fn took_new_snapshot(&self) -> bool {
        self.take_new_snapshot
    }

    /// Amortization state.
    pub fn hysteresis(&self) -> Hysteresis {
        self.hysteresis
    }

    /// Verdict of the last sync.
    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    /// Most recent committed intent.
    pub fn committed(&self) -> &CommittedRecord {
        self.sync.committed()
    }

    /// The artifacts.
    pub fn store(&self) -> &ArtifactStore<C::Image> {
        &self.store
    }

    /// Tunables.
    pub fn opts(&self) -> &FilterCacheOpts {
        &self.opts
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/manager.rs"]
mod tests;
