//! fxcache is the render-effect (blur/filter) result cache of a frame-based scene-graph
//! compositor.
//!
//! Every frame, a producer walk declares why a node's filter cache might be stale, a sync point
//! commits that intent and an ordered decision table picks what to discard. The draw pass then
//! reuses, regenerates or recaptures the two cached artifacts (the raw snapshot beneath the
//! region and the filtered result) through narrow backend traits:
//!
//! - Implement [`FilterCanvas`] for the GPU surface and [`FilterProvider`] for each filter
//! - Keep one [`FilterCacheManager`] per filtered node
//! - Call the `mark_*` methods while walking, [`FilterCacheManager::on_sync`] at the sync point,
//!   then [`FilterCacheManager::draw_filter`] and [`FilterCacheManager::compact_filter_cache`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod cache;
pub(crate) mod filter;
pub(crate) mod render;
pub(crate) mod trace;

pub use crate::foundation::core::{NodeId, Rect, RectI};
pub use crate::foundation::error::{FxCacheError, FxCacheResult};

pub use crate::cache::artifact::{ArtifactStore, CacheArtifact, FilterCacheType};
pub use crate::cache::decision::{
    Decision, DecisionInput, Hysteresis, RULES, Rule, RuleId, Verdict, amortization_window,
    evaluate, select_rule,
};
pub use crate::cache::intent::{CommittedRecord, FilterInfo, IntentRecord, SyncPhase, Synchronizer};
pub use crate::cache::manager::{DrawFilterOpts, DrawOutcome, FilterCacheManager, SyncOutcome};
pub use crate::cache::opts::FilterCacheOpts;
pub use crate::filter::params::{FilterParams, ParamFilter};
pub use crate::render::backend::{
    ApplyHints, DirtyOracle, FilterCanvas, FilterCategory, FilterProvider,
};
pub use crate::render::capture::{
    CapturedSnapshot, can_discard_canvas, capture_snapshot, clip_visible_rect,
    draw_cached_filtered_snapshot, draw_filter_without_snapshot, generate_filtered_snapshot,
    snapshot_bounds, validate_params,
};
pub use crate::render::damage::{DamageRegion, covered_area};
pub use crate::render::hardware::{HardwareFilter, HardwareOutcome, HardwarePath, HardwareSeed};
pub use crate::render::headless::{DrawRecord, HeadlessCanvas, HeadlessDevice, HeadlessImage};
pub use crate::trace::replay::{FrameReport, Trace, TraceFrame, replay};
