use crate::foundation::core::NodeId;
use crate::render::backend::FilterCategory;

/// Why the cache might be stale this frame, as declared by the producer walk.
///
/// Every field is reset at each commit except the filter description, which is reseeded from
/// the last [`FilterInfo`] recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntentRecord {
    /// Unconditional full invalidation requested.
    pub force_clear: bool,
    /// Underlying content is frozen: keep the cache untouched.
    pub force_use_cache: bool,
    /// The filter region moved or resized.
    pub region_changed: bool,
    /// The screen rotated.
    pub rotation_changed: bool,
    /// Filter parameters changed since the last recorded hash.
    pub hash_changed: bool,
    /// Content beneath the region intersects frame damage.
    pub interacts_with_dirty: bool,
    /// The region counts as a large-area blur.
    pub is_large_area: bool,
    /// The node is fully covered by opaque content.
    pub is_occluded: bool,
    /// AI-bar content overlaps hardware-composition damage.
    pub aibar_interacts_with_hwc: bool,
    /// The last frame before vsync stops; amortization must not outlive it.
    pub force_clear_from_last_frame: bool,
    /// The node is an effect node (background effect shared with children).
    pub is_effect_node: bool,
    /// Offscreen-canvas node this filter is drawn into, if any.
    pub in_foreground_filter: Option<NodeId>,
    /// Log a decision summary when the dirty interaction flips.
    pub debug_enabled: bool,
    /// Category of the filter.
    pub filter_category: FilterCategory,
    /// Whether this filter may amortize recomputation across frames.
    pub can_skip_frame: bool,
}

impl IntentRecord {
    /// Fresh record for a filter described by `info`.
    pub fn for_filter(info: FilterInfo) -> Self {
        Self {
            filter_category: info.category,
            can_skip_frame: info.can_skip_frame,
            ..Self::default()
        }
    }
}

/// Sticky description of the filter attached to a cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterInfo {
    /// Last recorded content hash; `0` before the first record.
    pub content_hash: u32,
    /// Filter category.
    pub category: FilterCategory,
    /// Skip-frame eligibility.
    pub can_skip_frame: bool,
}

/// Frame-durable, immutable copy of an [`IntentRecord`] produced by [`Synchronizer::commit`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommittedRecord {
    frame: u64,
    intent: IntentRecord,
}

impl CommittedRecord {
    /// Build a committed record directly. Mostly useful for driving the decision table in
    /// isolation.
    pub fn new(frame: u64, intent: IntentRecord) -> Self {
        Self { frame, intent }
    }

    /// Commit sequence number (1 for the first commit, 0 before any).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The committed intent.
    pub fn intent(&self) -> &IntentRecord {
        &self.intent
    }
}

impl std::ops::Deref for CommittedRecord {
    type Target = IntentRecord;

    fn deref(&self) -> &IntentRecord {
        &self.intent
    }
}

/// Which side of the handoff the synchronizer is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    /// The producer has written intent since the last commit.
    Staging,
    /// Nothing staged since the last commit.
    #[default]
    Committed,
}

/// Double-buffered handoff between the producer walk and the decision step.
///
/// The producer only writes through [`Synchronizer::staging_mut`]; the consumer only reads
/// [`Synchronizer::committed`]. `commit` moves the staged record across in one step and leaves a
/// fresh record behind, so a half-committed frame cannot be observed.
#[derive(Clone, Debug, Default)]
pub struct Synchronizer {
    staging: IntentRecord,
    committed: CommittedRecord,
    filter: FilterInfo,
    phase: SyncPhase,
    previous_interacts_with_dirty: bool,
}

impl Synchronizer {
    /// New synchronizer with nothing staged or committed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Read-only view of the staged intent.
    pub fn staging(&self) -> &IntentRecord {
        &self.staging
    }

    /// Mutable staged intent. Producer phase only.
    pub fn staging_mut(&mut self) -> &mut IntentRecord {
        self.phase = SyncPhase::Staging;
        &mut self.staging
    }

    /// Most recent committed record.
    pub fn committed(&self) -> &CommittedRecord {
        &self.committed
    }

    /// Sticky filter description.
    pub fn filter(&self) -> FilterInfo {
        self.filter
    }

    /// Record the filter attached to this cache.
    ///
    /// Sets `hash_changed` on the staged intent when the hash differs from the last one recorded.
    pub fn record_filter(&mut self, content_hash: u32, category: FilterCategory, can_skip: bool) {
        let hash_changed = self.filter.content_hash != content_hash;
        self.filter = FilterInfo {
            content_hash,
            category,
            can_skip_frame: can_skip,
        };
        let staging = self.staging_mut();
        staging.hash_changed = hash_changed;
        staging.filter_category = category;
        staging.can_skip_frame = can_skip;
    }

    /// Dirty-interaction flag of the commit before the current one.
    pub fn previous_interacts_with_dirty(&self) -> bool {
        self.previous_interacts_with_dirty
    }

    /// Move the staged intent into the committed slot and reset staging.
    pub fn commit(&mut self) -> &CommittedRecord {
        self.previous_interacts_with_dirty = self.committed.interacts_with_dirty;
        let staged = std::mem::replace(&mut self.staging, IntentRecord::for_filter(self.filter));
        self.committed = CommittedRecord::new(self.committed.frame + 1, staged);
        self.phase = SyncPhase::Committed;
        &self.committed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/intent.rs"]
mod tests;
