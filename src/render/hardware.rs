use crate::cache::artifact::CacheArtifact;
use crate::foundation::core::{NodeId, RectI};
use crate::render::backend::FilterCanvas;

/// Artifacts the cache currently holds, lent to a hardware path so it can seed from them.
#[derive(Debug)]
pub struct HardwareSeed<'a, I> {
    /// Current snapshot.
    pub snapshot: Option<&'a CacheArtifact<I>>,
    /// Current filtered snapshot.
    pub filtered: Option<&'a CacheArtifact<I>>,
    /// Region the snapshot was captured from.
    pub region: RectI,
    /// Whether the caller will drop the filtered result after drawing.
    pub clear_filtered_after_drawing: bool,
}

/// Result of offering a draw to the hardware path.
#[derive(Debug)]
pub enum HardwareOutcome<I> {
    /// The hardware path drew the filter. Its artifacts replace the cache contents.
    Handled {
        /// Snapshot the hardware path ended up with.
        snapshot: Option<CacheArtifact<I>>,
        /// Filtered result, scaled relative to the canvas.
        filtered: Option<CacheArtifact<I>>,
        /// Source region of the snapshot.
        region: RectI,
        /// Whether the blurred content changed, forcing a fresh snapshot on the standard path.
        content_changed: bool,
    },
    /// The standard capture/regenerate path must run.
    NotHandled,
}

/// A hardware blur unit able to short-circuit the standard draw for selected nodes.
pub trait HardwareFilter<C: FilterCanvas> {
    /// Try to draw the filter for `node` on `canvas`.
    fn try_draw(
        &mut self,
        canvas: &mut C,
        node: NodeId,
        seed: HardwareSeed<'_, C::Image>,
    ) -> HardwareOutcome<C::Image>;
}

/// Optional hardware capability, so the draw path reads the same with or without it.
pub enum HardwarePath<'a, C: FilterCanvas> {
    /// No hardware unit on this device.
    Unavailable,
    /// A hardware unit is present.
    Available(&'a mut dyn HardwareFilter<C>),
}

impl<C: FilterCanvas> HardwarePath<'_, C> {
    /// Offer the draw for `node`. Nodes without an id are never offered.
    pub fn try_draw(
        &mut self,
        canvas: &mut C,
        node: NodeId,
        seed: HardwareSeed<'_, C::Image>,
    ) -> HardwareOutcome<C::Image> {
        match self {
            Self::Available(hw) if node.is_valid() => hw.try_draw(canvas, node, seed),
            _ => HardwareOutcome::NotHandled,
        }
    }
}

impl<C: FilterCanvas> std::fmt::Debug for HardwarePath<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => f.write_str("Unavailable"),
            Self::Available(_) => f.write_str("Available"),
        }
    }
}
