//! Frame-trace replay.
//!
//! A trace is a JSON list of frames, each describing what the producer walk would have marked.
//! Replaying drives one [`FilterCacheManager`] over the headless backend and reports what the
//! cache decided and kept, frame by frame.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::cache::artifact::FilterCacheType;
use crate::cache::decision::RuleId;
use crate::cache::manager::{DrawFilterOpts, DrawOutcome, FilterCacheManager};
use crate::cache::opts::FilterCacheOpts;
use crate::filter::params::{FilterParams, ParamFilter};
use crate::foundation::core::{NodeId, RectI};
use crate::foundation::error::{FxCacheError, FxCacheResult};
use crate::render::backend::FilterCategory;
use crate::render::damage::DamageRegion;
use crate::render::hardware::HardwarePath;
use crate::render::headless::HeadlessCanvas;

/// A recorded sequence of frames for one filtered node.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trace {
    /// Canvas width in pixels.
    #[serde(default = "default_width")]
    pub width: i32,
    /// Canvas height in pixels.
    #[serde(default = "default_height")]
    pub height: i32,
    /// Node the filter belongs to.
    #[serde(default = "default_node")]
    pub node: NodeId,
    /// Frames in order.
    pub frames: Vec<TraceFrame>,
}

fn default_width() -> i32 {
    1080
}

fn default_height() -> i32 {
    1920
}

fn default_node() -> NodeId {
    NodeId(1)
}

/// What the producer marked for one frame, plus backend events.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceFrame {
    /// New filter parameters; the previous ones stay in effect when absent.
    pub filter: Option<FilterParams>,
    /// Filter region; the previous one stays in effect when absent. A different region marks a
    /// region change.
    pub region: Option<RectI>,
    /// Frame damage, checked against the cached region.
    pub damage: DamageRegion,
    /// Request a full invalidation.
    pub force_clear: bool,
    /// Freeze the cache.
    pub force_use_cache: bool,
    /// The screen rotated.
    pub rotation_changed: bool,
    /// The region is a large-area blur.
    pub large_area: bool,
    /// The node is occluded.
    pub occluded: bool,
    /// Last frame before vsync stops.
    pub last_frame: bool,
    /// The node is an effect node.
    pub effect_node: bool,
    /// Log dirty-interaction flips.
    pub debug: bool,
    /// AI-bar content overlaps hardware-composition damage.
    pub aibar_hwc_damage: bool,
    /// Offscreen-canvas node the filter draws into.
    pub in_foreground_filter: Option<NodeId>,
    /// Run the draw pass.
    pub draw: bool,
    /// Compact the cache after drawing.
    pub compact: bool,
    /// Lose the GPU context before this frame.
    pub device_lost: bool,
    /// Make captures fail this frame.
    pub fail_snapshot: bool,
}

impl Default for TraceFrame {
    fn default() -> Self {
        Self {
            filter: None,
            region: None,
            damage: DamageRegion::default(),
            force_clear: false,
            force_use_cache: false,
            rotation_changed: false,
            large_area: false,
            occluded: false,
            last_frame: false,
            effect_node: false,
            debug: false,
            aibar_hwc_damage: false,
            in_foreground_filter: None,
            draw: true,
            compact: true,
            device_lost: false,
            fail_snapshot: false,
        }
    }
}

impl Trace {
    /// Parse a trace from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FxCacheResult<Self> {
        let trace: Self = serde_json::from_reader(r)?;
        if trace.width <= 0 || trace.height <= 0 {
            return Err(FxCacheError::config(format!(
                "trace canvas must be non-empty, got {}x{}",
                trace.width, trace.height
            )));
        }
        Ok(trace)
    }

    /// Parse a trace from a JSON string.
    pub fn from_json_str(s: &str) -> FxCacheResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a trace from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FxCacheResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| FxCacheError::config(format!("open trace '{}': {e}", path.display())))?;
        Self::from_reader(BufReader::new(f))
    }
}

/// Outcome of one replayed frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameReport {
    /// Frame index, from 0.
    pub frame: usize,
    /// Rule that decided the frame.
    pub rule: RuleId,
    /// Artifacts the decision discarded.
    pub clear_type: FilterCacheType,
    /// Whether the decision left the cache servable.
    pub cache_valid: bool,
    /// Amortization frames left after the decision.
    pub interval: i32,
    /// Deferred purge pending after the decision.
    pub pending_purge: bool,
    /// GPU memory held for the region can be purged.
    pub needs_gpu_purge: bool,
    /// How the draw was served, if one ran.
    pub draw: Option<DrawOutcome>,
    /// Artifacts left at the end of the frame.
    pub cached_type: FilterCacheType,
    /// Captures made so far, offscreen ones included.
    pub snapshots: u64,
}

/// Replay `trace` through a fresh cache tuned by `opts`.
pub fn replay(trace: &Trace, opts: FilterCacheOpts) -> FxCacheResult<Vec<FrameReport>> {
    opts.validate()?;
    let mut canvas = HeadlessCanvas::new(trace.width, trace.height);
    let mut mgr = FilterCacheManager::<HeadlessCanvas>::new(opts);
    let mut filter = ParamFilter::new(FilterParams::default());
    let mut region = canvas_bounds(trace);
    let mut reports = Vec::with_capacity(trace.frames.len());

    for (idx, frame) in trace.frames.iter().enumerate() {
        canvas.begin_frame();
        if frame.device_lost {
            canvas.device().lose_context();
        }
        canvas.device().set_fail_snapshots(frame.fail_snapshot);

        if let Some(params) = &frame.filter {
            params.validate()?;
            filter = ParamFilter::new(params.clone());
        }
        produce(&mut mgr, &filter, frame, &mut region);

        let sync = mgr.on_sync(trace.node);
        let draw = frame.draw.then(|| {
            mgr.draw_filter(
                &mut canvas,
                &filter,
                trace.node,
                &mut HardwarePath::Unavailable,
                DrawFilterOpts {
                    src: Some(region),
                    ..DrawFilterOpts::default()
                },
            )
        });
        if frame.compact {
            mgr.compact_filter_cache();
        }

        let h = mgr.hysteresis();
        let report = FrameReport {
            frame: idx,
            rule: sync.verdict.rule,
            clear_type: sync.verdict.decision.clear_type,
            cache_valid: sync.verdict.decision.cache_valid,
            interval: h.cache_update_interval,
            pending_purge: h.pending_purge,
            needs_gpu_purge: sync.needs_gpu_purge,
            draw,
            cached_type: mgr.cached_type(),
            snapshots: canvas.device().snapshot_count(),
        };
        tracing::debug!(?report, "replayed frame");
        reports.push(report);
    }
    Ok(reports)
}

fn canvas_bounds(trace: &Trace) -> RectI {
    RectI::new(0, 0, trace.width, trace.height)
}

// Producer walk for one frame.
fn produce(
    mgr: &mut FilterCacheManager<HeadlessCanvas>,
    filter: &ParamFilter,
    frame: &TraceFrame,
    region: &mut RectI,
) {
    mgr.record_filter_info(filter);
    if let Some(r) = frame.region
        && r != *region
    {
        *region = r;
        mgr.mark_filter_region_changed();
    }
    if frame.force_clear {
        mgr.mark_filter_force_clear_cache();
    }
    if frame.force_use_cache {
        mgr.mark_filter_force_use_cache(true);
    }
    if frame.rotation_changed {
        mgr.mark_rotation_changed();
    }
    if frame.large_area {
        mgr.mark_filter_region_is_large_area();
    }
    if frame.last_frame {
        mgr.mark_force_clear_cache_with_last_frame();
    }
    if frame.effect_node {
        mgr.mark_effect_node();
    }
    if frame.debug {
        mgr.mark_debug_enabled();
    }
    mgr.mark_node_is_occluded(frame.occluded);
    if let Some(node) = frame.in_foreground_filter {
        mgr.mark_in_foreground_filter(node);
    }
    mgr.mark_dirty_overlap(&frame.damage);
    if filter.params().category == FilterCategory::AiBar {
        mgr.check_and_update_aibar_cache_status(frame.aibar_hwc_damage);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trace/replay.rs"]
mod tests;
