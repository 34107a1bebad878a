pub use kurbo::Rect;

/// Identifier of a scene-graph node. `0` means "no node".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The "no node" id.
    pub const INVALID: NodeId = NodeId(0);

    /// Return `true` for any id other than [`NodeId::INVALID`].
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Integer rectangle in device pixels, stored as origin plus size.
///
/// A rect with a non-positive width or height is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RectI {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl RectI {
    /// Create a rect from origin and size.
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rect from its four edges.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// Exclusive right edge.
    pub fn right(self) -> i32 {
        self.left.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i32 {
        self.top.saturating_add(self.height)
    }

    /// Return `true` when the rect covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of covered pixels (0 for empty rects).
    pub fn area(self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        u64::from(self.width.unsigned_abs()) * u64::from(self.height.unsigned_abs())
    }

    /// Overlapping part of both rects, `None` when they do not overlap.
    pub fn intersection(self, other: RectI) -> Option<RectI> {
        let l = self.left.max(other.left);
        let t = self.top.max(other.top);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        let out = RectI::from_ltrb(l, t, r, b);
        (!out.is_empty()).then_some(out)
    }

    /// Return `true` when both rects share at least one pixel.
    pub fn intersects(self, other: RectI) -> bool {
        self.intersection(other).is_some()
    }

    /// Return `true` when `other` lies fully inside `self`.
    pub fn contains(self, other: RectI) -> bool {
        !other.is_empty()
            && other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Shrink every edge by `px`. Negative values grow the rect.
    pub fn inset(self, px: i32) -> Self {
        Self::new(
            self.left.saturating_add(px),
            self.top.saturating_add(px),
            self.width.saturating_sub(px.saturating_mul(2)),
            self.height.saturating_sub(px.saturating_mul(2)),
        )
    }

    /// Same size, origin moved to `(0, 0)`.
    pub fn at_origin(self) -> Self {
        Self::new(0, 0, self.width, self.height)
    }

    /// Float rect with the same edges.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.left),
            f64::from(self.top),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Integer rect from a float rect, rounding each edge to the nearest pixel.
    pub fn from_rect_round(r: Rect) -> Self {
        let r = r.round();
        Self::from_ltrb(r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32)
    }
}

impl std::fmt::Display for RectI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
