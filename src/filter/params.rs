use std::cell::Cell;

use crate::foundation::core::Rect;
use crate::foundation::error::{FxCacheError, FxCacheResult};
use crate::foundation::hash::StableHasher;
use crate::render::backend::{ApplyHints, FilterCanvas, FilterCategory, FilterProvider};

/// Serializable description of a filter.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterParams {
    /// Filter category.
    pub category: FilterCategory,
    /// Blur radius in pixels.
    pub radius: f32,
    /// Saturation multiplier.
    pub saturation: f32,
    /// Brightness multiplier.
    pub brightness: f32,
    /// Sampling offset for magnifier filters.
    pub magnifier_offset: (i32, i32),
    /// Whether recomputation may be amortized over several frames.
    pub can_skip_frame: bool,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            category: FilterCategory::Default,
            radius: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            magnifier_offset: (0, 0),
            can_skip_frame: false,
        }
    }
}

impl FilterParams {
    /// Stable hash of everything that changes the filtered output.
    ///
    /// Skip-frame eligibility is scheduling policy, not output, and is left out.
    pub fn content_hash(&self) -> u32 {
        let mut h = StableHasher::new();
        h.write_u8(category_tag(self.category));
        h.write_f32(self.radius);
        h.write_f32(self.saturation);
        h.write_f32(self.brightness);
        if self.category == FilterCategory::Magnifier {
            h.write_i32(self.magnifier_offset.0);
            h.write_i32(self.magnifier_offset.1);
        }
        h.finish_u32()
    }

    /// Reject parameters no filter could run with.
    pub fn validate(&self) -> FxCacheResult<()> {
        for (name, v) in [
            ("radius", self.radius),
            ("saturation", self.saturation),
            ("brightness", self.brightness),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(FxCacheError::config(format!(
                    "filter {name} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

fn category_tag(c: FilterCategory) -> u8 {
    match c {
        FilterCategory::Default => 0,
        FilterCategory::AiBar => 1,
        FilterCategory::Material => 2,
        FilterCategory::LinearGradientBlur => 3,
        FilterCategory::Magnifier => 4,
    }
}

/// Filter provider driven by [`FilterParams`].
///
/// It does no filter math: applying it draws the source image through unchanged, which is all
/// the cache can observe anyway.
#[derive(Debug)]
pub struct ParamFilter {
    params: FilterParams,
    hash: u32,
    applied: Cell<u32>,
}

impl ParamFilter {
    /// Provider for `params`.
    pub fn new(params: FilterParams) -> Self {
        let hash = params.content_hash();
        Self {
            params,
            hash,
            applied: Cell::new(0),
        }
    }

    /// The parameters.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Number of filter passes run so far.
    pub fn apply_count(&self) -> u32 {
        self.applied.get()
    }
}

impl<C: FilterCanvas> FilterProvider<C> for ParamFilter {
    fn content_hash(&self) -> u32 {
        self.hash
    }

    fn category(&self) -> FilterCategory {
        self.params.category
    }

    fn can_skip_frame(&self) -> bool {
        self.params.can_skip_frame
    }

    fn snapshot_offset(&self) -> (i32, i32) {
        if self.params.category == FilterCategory::Magnifier {
            self.params.magnifier_offset
        } else {
            (0, 0)
        }
    }

    fn apply(&self, canvas: &mut C, image: &C::Image, src: Rect, dst: Rect, hints: ApplyHints) {
        self.applied.set(self.applied.get().saturating_add(1));
        if hints.discard_canvas {
            canvas.discard();
        }
        canvas.draw_image_rect(image, src, dst);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/params.rs"]
mod tests;
