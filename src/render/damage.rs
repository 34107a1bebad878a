use crate::foundation::core::RectI;
use crate::render::backend::DirtyOracle;

/// Frame damage as a list of rects: what changed this frame plus what earlier visited
/// subtrees reported.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DamageRegion {
    /// Damage accumulated for the current frame.
    pub current: Vec<RectI>,
    /// Damage of subtrees visited before this node.
    pub visited: Vec<RectI>,
}

impl DamageRegion {
    /// Empty damage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add current-frame damage. Empty rects are ignored.
    pub fn add(&mut self, rect: RectI) {
        if !rect.is_empty() {
            self.current.push(rect);
        }
    }

    /// Add damage reported by an already visited subtree. Empty rects are ignored.
    pub fn add_visited(&mut self, rect: RectI) {
        if !rect.is_empty() {
            self.visited.push(rect);
        }
    }

    /// Return `true` when no damage was recorded.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.visited.is_empty()
    }

    /// Forget everything, ready for the next frame.
    pub fn clear(&mut self) {
        self.current.clear();
        self.visited.clear();
    }
}

/// Pixels of `bound` covered by the union of `rects`.
///
/// Overlapping rects are counted once. Each vertical slab between rect edges sums its merged
/// row spans.
pub fn covered_area(bound: RectI, rects: &[RectI]) -> u64 {
    let clipped: Vec<RectI> = rects.iter().filter_map(|r| r.intersection(bound)).collect();
    if clipped.iter().any(|r| r.contains(bound)) {
        return bound.area();
    }
    let mut xs: Vec<i32> = clipped.iter().flat_map(|r| [r.left, r.right()]).collect();
    xs.sort_unstable();
    xs.dedup();

    let mut area = 0u64;
    for xw in xs.windows(2) {
        let mut spans: Vec<(i32, i32)> = clipped
            .iter()
            .filter(|r| r.left <= xw[0] && r.right() >= xw[1])
            .map(|r| (r.top, r.bottom()))
            .collect();
        spans.sort_unstable();

        let mut height = 0u64;
        let mut reach = i32::MIN;
        for (top, bottom) in spans {
            let start = top.max(reach);
            if bottom > start {
                height += u64::from(bottom.abs_diff(start));
                reach = bottom;
            }
        }
        area += height * u64::from(xw[1].abs_diff(xw[0]));
    }
    area
}

impl DirtyOracle for DamageRegion {
    fn overlaps(&self, region: RectI) -> bool {
        !region.is_empty()
            && self
                .current
                .iter()
                .chain(self.visited.iter())
                .any(|r| r.intersects(region))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/damage.rs"]
mod tests;
