//! Per-frame cache decision table.
//!
//! Rules are evaluated in order and the first one whose predicate holds decides the frame. The
//! order encodes priority: occluded AI-bar content and an empty cache always rebuild, a frozen
//! cache is always kept, then the full-invalidation triggers, then the hash-only cases.

use crate::cache::artifact::FilterCacheType;
use crate::cache::intent::CommittedRecord;
use crate::cache::opts::FilterCacheOpts;
use crate::render::backend::FilterCategory;

/// What to discard before drawing, and whether the remaining cache can be served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Decision {
    /// Artifacts to release.
    pub clear_type: FilterCacheType,
    /// Whether what remains may be served this frame.
    pub cache_valid: bool,
}

impl Decision {
    const fn new(clear_type: FilterCacheType, cache_valid: bool) -> Self {
        Self {
            clear_type,
            cache_valid,
        }
    }
}

/// Skip-frame amortization state carried across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Hysteresis {
    /// Frames left during which dirty content may keep serving the cached result. Never negative.
    pub cache_update_interval: i32,
    /// A purge was deferred and is due once the content stops being dirty.
    pub pending_purge: bool,
}

impl Hysteresis {
    /// Return `true` when a deferred purge is due this frame.
    pub fn need_pending_purge(&self, interacts_with_dirty: bool) -> bool {
        self.pending_purge && !interacts_with_dirty
    }

    fn restart(&mut self, record: &CommittedRecord, opts: &FilterCacheOpts) {
        self.cache_update_interval = amortization_window(record, opts).max(0);
        self.pending_purge = false;
    }

    fn defer(&mut self, record: &CommittedRecord) {
        let amortizing = record.interacts_with_dirty
            || record.rotation_changed
            || (record.aibar_interacts_with_hwc && self.cache_update_interval > 0);
        if amortizing {
            self.cache_update_interval = (self.cache_update_interval - 1).max(0);
            self.pending_purge = true;
        }
    }
}

/// Window to amortize over after an invalidation.
pub fn amortization_window(record: &CommittedRecord, opts: &FilterCacheOpts) -> i32 {
    if record.rotation_changed {
        opts.rotation_update_interval
    } else if record.filter_category == FilterCategory::AiBar {
        opts.aibar_update_interval
    } else if record.is_large_area && record.can_skip_frame {
        opts.large_area_update_interval
    } else {
        0
    }
}

/// Identifies a rule of the decision table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Occluded AI-bar content never serves a stale result once visible again.
    AiBarOccluded,
    /// Nothing cached last frame.
    NoCache,
    /// Content is frozen by the caller.
    ForceUseCache,
    /// Force clear, region change, due purge, or dirty/rotated with no amortization left.
    FullInvalidate,
    /// Only the filtered result is stale.
    FilteredStale,
    /// Keep the cache, dropping the filtered result if the hash changed.
    Keep,
}

/// Everything a rule may look at.
#[derive(Clone, Copy, Debug)]
pub struct DecisionInput<'a> {
    /// The committed intent.
    pub record: &'a CommittedRecord,
    /// Cache type at the end of the previous frame.
    pub last_cache_type: FilterCacheType,
    /// Amortization state after the last-frame reset.
    pub hysteresis: Hysteresis,
}

/// One `(predicate, outcome)` row of the table.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Row identity.
    pub id: RuleId,
    /// Whether the row fires.
    pub applies: fn(&DecisionInput<'_>) -> bool,
    /// Outcome when it fires.
    pub decide: fn(&DecisionInput<'_>) -> Decision,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.id).finish()
    }
}

fn rebuild(_: &DecisionInput<'_>) -> Decision {
    Decision::new(FilterCacheType::Both, false)
}

/// The decision table, highest priority first. The last row always applies.
pub static RULES: [Rule; 6] = [
    Rule {
        id: RuleId::AiBarOccluded,
        applies: |i| i.record.filter_category == FilterCategory::AiBar && i.record.is_occluded,
        decide: rebuild,
    },
    Rule {
        id: RuleId::NoCache,
        applies: |i| i.last_cache_type == FilterCacheType::None,
        decide: rebuild,
    },
    Rule {
        id: RuleId::ForceUseCache,
        applies: |i| i.record.force_use_cache,
        decide: |_| Decision::new(FilterCacheType::None, true),
    },
    Rule {
        id: RuleId::FullInvalidate,
        applies: |i| {
            let r = i.record;
            r.force_clear
                || (r.region_changed && !r.rotation_changed)
                || i.hysteresis.need_pending_purge(r.interacts_with_dirty)
                || ((r.interacts_with_dirty || r.rotation_changed)
                    && i.hysteresis.cache_update_interval <= 0)
        },
        decide: rebuild,
    },
    Rule {
        id: RuleId::FilteredStale,
        applies: |i| {
            i.last_cache_type == FilterCacheType::FilteredSnapshot && i.record.hash_changed
        },
        decide: |_| Decision::new(FilterCacheType::FilteredSnapshot, false),
    },
    Rule {
        id: RuleId::Keep,
        applies: |_| true,
        decide: |i| {
            let clear = if i.record.hash_changed {
                FilterCacheType::FilteredSnapshot
            } else {
                FilterCacheType::None
            };
            Decision::new(clear, true)
        },
    },
];

/// First rule of [`RULES`] that applies to `input`.
pub fn select_rule(input: &DecisionInput<'_>) -> &'static Rule {
    RULES
        .iter()
        .find(|r| (r.applies)(input))
        .unwrap_or(&RULES[RULES.len() - 1])
}

/// Result of evaluating one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Verdict {
    /// Rule that decided the frame.
    pub rule: RuleId,
    /// The decision.
    pub decision: Decision,
    /// Large-area, skip-eligible content whose region did not move.
    pub is_skipping_frame: bool,
}

/// Evaluate the table for one committed frame and update `hysteresis`.
///
/// Invalid decisions restart the amortization window and clear any deferred purge. Valid
/// decisions on dirty or rotating content consume one frame of the window and defer the purge
/// instead of purging now.
pub fn evaluate(
    record: &CommittedRecord,
    last_cache_type: FilterCacheType,
    hysteresis: &mut Hysteresis,
    opts: &FilterCacheOpts,
) -> Verdict {
    if record.force_clear_from_last_frame {
        hysteresis.cache_update_interval = 0;
    }
    let is_skipping_frame = record.is_large_area && record.can_skip_frame && !record.region_changed;

    let input = DecisionInput {
        record,
        last_cache_type,
        hysteresis: *hysteresis,
    };
    let rule = select_rule(&input);
    let decision = (rule.decide)(&input);

    if decision.cache_valid {
        hysteresis.defer(record);
    } else {
        hysteresis.restart(record, opts);
    }

    tracing::debug!(
        frame = record.frame(),
        rule = ?rule.id,
        clear = ?decision.clear_type,
        valid = decision.cache_valid,
        ?last_cache_type,
        interval = hysteresis.cache_update_interval,
        pending_purge = hysteresis.pending_purge,
        "filter cache decision"
    );

    Verdict {
        rule: rule.id,
        decision,
        is_skipping_frame,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/decision.rs"]
mod tests;
