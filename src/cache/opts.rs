use crate::foundation::error::{FxCacheError, FxCacheResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const MAX_SNAPSHOT_INSET_PX: i32 = 16;

/// Tunables of a filter cache.
///
/// Amortization windows are platform configuration, not contract: the decision table only relies
/// on them being non-negative.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterCacheOpts {
    /// Frames to keep serving a stale result for AI-bar filters.
    pub aibar_update_interval: i32,
    /// Frames to keep serving a stale result after a rotation-triggered invalidation.
    pub rotation_update_interval: i32,
    /// Frames to keep serving a stale result for large-area, skip-frame-eligible filters.
    pub large_area_update_interval: i32,
    /// Pixels trimmed from every edge of the capture rect to avoid edge bleed.
    pub snapshot_inset_px: i32,
    /// Draw straight from the snapshot when the filtered result would be dropped after drawing.
    pub draw_without_snapshot: bool,
    /// Allow discarding canvas content before full-canvas opaque draws.
    pub discard_canvas_before_filter: bool,
}

impl Default for FilterCacheOpts {
    fn default() -> Self {
        Self {
            aibar_update_interval: 5,
            rotation_update_interval: 1,
            large_area_update_interval: 1,
            snapshot_inset_px: 1,
            draw_without_snapshot: true,
            discard_canvas_before_filter: true,
        }
    }
}

impl FilterCacheOpts {
    /// Parse options from a JSON reader. Missing fields keep their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> FxCacheResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| FxCacheError::config(format!("parse filter cache opts JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(s: &str) -> FxCacheResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FxCacheResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FxCacheError::config(format!("open filter cache opts '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject values the cache cannot honor.
    pub fn validate(&self) -> FxCacheResult<()> {
        for (name, v) in [
            ("aibar_update_interval", self.aibar_update_interval),
            ("rotation_update_interval", self.rotation_update_interval),
            ("large_area_update_interval", self.large_area_update_interval),
        ] {
            if v < 0 {
                return Err(FxCacheError::config(format!(
                    "{name} must be >= 0, got {v}"
                )));
            }
        }
        if !(0..=MAX_SNAPSHOT_INSET_PX).contains(&self.snapshot_inset_px) {
            return Err(FxCacheError::config(format!(
                "snapshot_inset_px must be within 0..={MAX_SNAPSHOT_INSET_PX}, got {}",
                self.snapshot_inset_px
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/opts.rs"]
mod tests;
