use crate::foundation::core::{Rect, RectI};

/// Category of a filter, as reported by its [`FilterProvider`].
///
/// The category selects branches of the cache decision table and of the post-draw retention
/// policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    /// Any filter without special handling.
    #[default]
    Default,
    /// AI-bar effect: distinct amortization window and occlusion rule.
    AiBar,
    /// Material blur: allows discarding the canvas before a full-canvas draw.
    Material,
    /// Linear-gradient blur.
    LinearGradientBlur,
    /// Magnifier distortion.
    Magnifier,
}

/// Hints passed along with [`FilterProvider::apply`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyHints {
    /// The draw covers the whole canvas with opaque output; prior content may be discarded.
    pub discard_canvas: bool,
    /// The target is an offscreen surface created for the filtered snapshot.
    pub offscreen: bool,
}

/// Canvas/surface abstraction the cache draws through.
///
/// One implementation backs both the on-screen canvas and the offscreen targets it creates, the
/// same way a GPU canvas can spawn compatible surfaces. Image handles are opaque to the cache.
pub trait FilterCanvas: Sized {
    /// GPU-resident image handle.
    type Image;

    /// Capture `region` (device coordinates) of the backing surface.
    ///
    /// Returns `None` when no surface is bound or the capture fails.
    fn try_snapshot(&mut self, region: RectI) -> Option<Self::Image>;

    /// Return `false` when `image` no longer belongs to this canvas' GPU context (device lost,
    /// resource recycled).
    fn is_image_handle_valid(&self, image: &Self::Image) -> bool;

    /// Create an offscreen target compatible with this canvas.
    fn make_offscreen_target(&mut self, width: i32, height: i32) -> Option<Self>;

    /// Full device bounds of the backing surface.
    fn device_bounds(&self) -> RectI;

    /// Current device-space clip bounds.
    fn device_clip_bounds(&self) -> RectI;

    /// Device clip bounds rounded inwards. Defaults to [`FilterCanvas::device_clip_bounds`].
    fn round_in_device_clip_bounds(&self) -> RectI {
        self.device_clip_bounds()
    }

    /// Visible rect in device coordinates, if the canvas tracks one.
    fn visible_rect(&self) -> Option<Rect> {
        None
    }

    /// Draw `src` of `image` into `dst` (device coordinates).
    fn draw_image_rect(&mut self, image: &Self::Image, src: Rect, dst: Rect);

    /// Push the current matrix/clip state.
    fn save(&mut self) {}

    /// Pop the state pushed by [`FilterCanvas::save`].
    fn restore(&mut self) {}

    /// Reset the transform to identity so draws happen in device coordinates.
    fn reset_matrix(&mut self) {}

    /// Intersect the clip with `rect`.
    fn clip_irect(&mut self, _rect: RectI) {}

    /// Return `true` when the clip is a plain rect.
    fn is_clip_rect(&self) -> bool {
        false
    }

    /// Global alpha applied to draws.
    fn alpha(&self) -> f32 {
        1.0
    }

    /// Return `true` when draws go through an offscreen layer.
    fn has_offscreen_layer(&self) -> bool {
        false
    }

    /// Drop the current content of the target.
    fn discard(&mut self) {}

    /// Regions drawn so far this frame, if tracked.
    fn drawn_region(&self) -> Option<Vec<RectI>> {
        None
    }
}

/// A filter the cache can run over a captured snapshot.
///
/// Providers never hand pixels to the cache directly: they draw into a [`FilterCanvas`] which the
/// cache then captures.
pub trait FilterProvider<C: FilterCanvas> {
    /// Hash of the filter parameters. Any parameter change must change the hash.
    fn content_hash(&self) -> u32;

    /// Filter category.
    fn category(&self) -> FilterCategory;

    /// Whether recomputation may be amortized over several frames.
    fn can_skip_frame(&self) -> bool;

    /// Offset applied to the capture rect (magnifier-style filters sample elsewhere).
    fn snapshot_offset(&self) -> (i32, i32) {
        (0, 0)
    }

    /// Hook run on a freshly captured snapshot.
    fn pre_process(&self, _image: &C::Image) {}

    /// Draw `src` of `image` filtered into `dst` on `canvas`.
    fn apply(&self, canvas: &mut C, image: &C::Image, src: Rect, dst: Rect, hints: ApplyHints);

    /// Hook run after [`FilterProvider::apply`] on the same canvas.
    fn post_process(&self, _canvas: &mut C) {}
}

/// Answers whether a region intersects this frame's damage.
pub trait DirtyOracle {
    /// Return `true` when `region` overlaps any damaged area.
    fn overlaps(&self, region: RectI) -> bool;
}
