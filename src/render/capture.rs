//! Capture and regenerate operations.
//!
//! Artifacts are only ever produced through the collaborators: the canvas captures pixels, the
//! filter provider draws. Failures of either are fail-soft and produce no artifact.

use crate::cache::artifact::CacheArtifact;
use crate::cache::opts::FilterCacheOpts;
use crate::foundation::core::{Rect, RectI};
use crate::foundation::error::{FxCacheError, FxCacheResult};
use crate::render::backend::{ApplyHints, FilterCanvas, FilterCategory, FilterProvider};

/// A freshly captured snapshot and the source rect it was requested for.
#[derive(Debug)]
pub struct CapturedSnapshot<I> {
    /// The snapshot, covering the offset and inset capture rect.
    pub artifact: CacheArtifact<I>,
    /// Requested source rect, before offset and inset.
    pub source_region: RectI,
}

/// Device rect actually captured for `src`: shifted by the provider's sampling offset, then
/// inset to avoid edge bleed unless that would leave nothing.
pub fn snapshot_bounds(src: RectI, offset: (i32, i32), inset_px: i32) -> RectI {
    let shifted = src.offset(offset.0, offset.1);
    let inset = shifted.inset(inset_px);
    if inset.is_empty() { shifted } else { inset }
}

/// Capture the pixels beneath `src`.
///
/// Returns `None`, leaving the caller's cache untouched, when the canvas cannot produce an image.
pub fn capture_snapshot<C, F>(
    canvas: &mut C,
    filter: &F,
    src: RectI,
    opts: &FilterCacheOpts,
) -> Option<CapturedSnapshot<C::Image>>
where
    C: FilterCanvas,
    F: FilterProvider<C> + ?Sized,
{
    let bounds = snapshot_bounds(src, filter.snapshot_offset(), opts.snapshot_inset_px);
    let Some(image) = canvas.try_snapshot(bounds) else {
        tracing::debug!(%bounds, "failed to make an image snapshot");
        return None;
    };
    filter.pre_process(&image);
    tracing::trace!(%src, %bounds, "took snapshot");
    Some(CapturedSnapshot {
        artifact: CacheArtifact::new(image, bounds, filter.content_hash()),
        source_region: src,
    })
}

/// Run `filter` over `snapshot` into an offscreen target sized to `dst` and capture the result.
///
/// Calling this without a snapshot is a logic error and returns [`FxCacheError::Precondition`].
/// A failed offscreen allocation or capture yields `Ok(None)`.
pub fn generate_filtered_snapshot<C, F>(
    canvas: &mut C,
    filter: &F,
    snapshot: Option<&CacheArtifact<C::Image>>,
    dst: RectI,
) -> FxCacheResult<Option<CacheArtifact<C::Image>>>
where
    C: FilterCanvas,
    F: FilterProvider<C> + ?Sized,
{
    let Some(snapshot) = snapshot else {
        return Err(FxCacheError::precondition(
            "filtered snapshot requested without a snapshot to filter",
        ));
    };
    let Some(mut offscreen) = canvas.make_offscreen_target(dst.width, dst.height) else {
        tracing::debug!(%dst, "offscreen target unavailable");
        return Ok(None);
    };

    let src = snapshot.region().at_origin().to_rect();
    let target = dst.at_origin();
    filter.apply(
        &mut offscreen,
        snapshot.image(),
        src,
        target.to_rect(),
        ApplyHints {
            discard_canvas: false,
            offscreen: true,
        },
    );
    filter.post_process(&mut offscreen);

    let Some(image) = offscreen.try_snapshot(target) else {
        tracing::debug!(%dst, "failed to capture filtered snapshot");
        return Ok(None);
    };
    tracing::trace!(%dst, "generated filtered snapshot");
    Ok(Some(CacheArtifact::new(image, dst, filter.content_hash())))
}

/// Draw the cached filtered result into `dst`, in device coordinates.
///
/// Hardware-produced results are scaled relative to the canvas, so the source rect is scaled by
/// the same factor.
pub fn draw_cached_filtered_snapshot<C: FilterCanvas>(
    canvas: &mut C,
    filtered: &CacheArtifact<C::Image>,
    from_hardware: bool,
    dst: RectI,
    category: FilterCategory,
    opts: &FilterCacheOpts,
) {
    canvas.save();
    canvas.reset_matrix();
    clip_visible_rect(canvas);

    let cached = filtered.region();
    let mut src = dst.offset(-cached.left, -cached.top);
    if from_hardware {
        src = scale_to_cache(src, cached, canvas.device_bounds());
    }
    tracing::trace!(%cached, %src, %dst, "draw cached filtered snapshot");

    if category == FilterCategory::Material && can_discard_canvas(canvas, dst, opts) {
        canvas.discard();
    }
    canvas.draw_image_rect(filtered.image(), src.to_rect(), dst.to_rect());
    canvas.restore();
}

fn scale_to_cache(src: RectI, cached: RectI, device: RectI) -> RectI {
    if device.is_empty() {
        return src;
    }
    let sx = |v: i32| (i64::from(v) * i64::from(cached.width) / i64::from(device.width)) as i32;
    let sy = |v: i32| (i64::from(v) * i64::from(cached.height) / i64::from(device.height)) as i32;
    RectI::new(sx(src.left), sy(src.top), sx(src.width), sy(src.height))
}

/// Apply `filter` straight from the snapshot into `dst`, without producing a filtered artifact.
pub fn draw_filter_without_snapshot<C, F>(
    canvas: &mut C,
    filter: &F,
    snapshot: &CacheArtifact<C::Image>,
    dst: RectI,
    opts: &FilterCacheOpts,
) where
    C: FilterCanvas,
    F: FilterProvider<C> + ?Sized,
{
    canvas.save();
    canvas.reset_matrix();
    clip_visible_rect(canvas);

    let src = snapshot.region().at_origin().to_rect();
    let dst_rect: Rect = dst.to_rect();
    tracing::trace!(?src, ?dst_rect, "draw filter without snapshot");
    let discard_canvas = can_discard_canvas(canvas, dst, opts);
    filter.apply(
        canvas,
        snapshot.image(),
        src,
        dst_rect,
        ApplyHints {
            discard_canvas,
            offscreen: false,
        },
    );
    filter.post_process(canvas);
    canvas.restore();
}

/// Return `true` when a draw into `dst` covers the whole canvas with nothing that would blend
/// with prior content.
pub fn can_discard_canvas<C: FilterCanvas>(canvas: &C, dst: RectI, opts: &FilterCacheOpts) -> bool {
    let device = canvas.device_bounds();
    opts.discard_canvas_before_filter
        && canvas.is_clip_rect()
        && canvas.device_clip_bounds() == dst
        && device.width == dst.width
        && device.height == dst.height
        && dst.left == 0
        && dst.top == 0
        && (canvas.alpha() - 1.0).abs() <= f32::EPSILON
        && !canvas.has_offscreen_layer()
}

/// Resolve optional source/destination rects against the canvas.
///
/// A missing source defaults to the rounded-in device clip; a missing destination to the source.
/// Given rects are intersected with the device bounds and become empty when outside them.
pub fn validate_params<C: FilterCanvas>(
    canvas: &C,
    src: Option<RectI>,
    dst: Option<RectI>,
) -> (RectI, RectI) {
    let device = canvas.device_bounds();
    let clamp = |r: RectI| r.intersection(device).unwrap_or_default();
    let src = src.map_or_else(|| canvas.round_in_device_clip_bounds(), clamp);
    let dst = dst.map_or(src, clamp);
    tracing::trace!(%src, %dst, "validated draw params");
    (src, dst)
}

/// Restrict drawing to the canvas' visible rect when it overlaps the current clip.
pub fn clip_visible_rect<C: FilterCanvas>(canvas: &mut C) {
    let Some(visible) = canvas.visible_rect() else {
        return;
    };
    let visible = RectI::from_rect_round(visible);
    if !visible.is_empty() && canvas.device_clip_bounds().intersects(visible) {
        canvas.clip_irect(visible);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/capture.rs"]
mod tests;
