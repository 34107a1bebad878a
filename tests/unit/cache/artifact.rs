use super::*;

fn art(id: u32) -> CacheArtifact<u32> {
    CacheArtifact::new(id, RectI::new(0, 0, 10, 10), 0)
}

fn store_with(snapshot: bool, filtered: bool) -> ArtifactStore<u32> {
    let mut s = ArtifactStore::new();
    if snapshot {
        s.store_snapshot(art(1), RectI::new(0, 0, 10, 10));
    }
    if filtered {
        s.store_filtered(art(2));
    }
    s
}

#[test]
fn cached_type_follows_presence() {
    assert_eq!(
        store_with(false, false).cached_type(),
        FilterCacheType::None
    );
    assert_eq!(
        store_with(true, false).cached_type(),
        FilterCacheType::Snapshot
    );
    assert_eq!(
        store_with(false, true).cached_type(),
        FilterCacheType::FilteredSnapshot
    );
    assert_eq!(store_with(true, true).cached_type(), FilterCacheType::Both);
}

#[test]
fn validity_needs_a_snapshot() {
    assert!(store_with(true, false).is_valid());
    assert!(store_with(true, true).is_valid());
    assert!(!store_with(false, true).is_valid());
    assert!(store_with(false, true).has_any());
    assert!(!store_with(false, false).has_any());
}

#[test]
fn invalidating_absent_artifacts_is_a_no_op() {
    for snapshot in [false, true] {
        for filtered in [false, true] {
            for which in [
                FilterCacheType::None,
                FilterCacheType::Snapshot,
                FilterCacheType::FilteredSnapshot,
                FilterCacheType::Both,
            ] {
                let mut s = store_with(snapshot, filtered);
                s.invalidate(which);
                let after_once = s.cached_type();
                s.invalidate(which);
                assert_eq!(s.cached_type(), after_once);
            }
        }
    }
}

#[test]
fn invalidate_selects_artifacts() {
    let mut s = store_with(true, true);
    s.invalidate(FilterCacheType::FilteredSnapshot);
    assert_eq!(s.cached_type(), FilterCacheType::Snapshot);
    s.invalidate(FilterCacheType::Snapshot);
    assert_eq!(s.cached_type(), FilterCacheType::None);
    assert_eq!(s.cached_image_region(), RectI::default());
}

#[test]
fn liveness_drops_only_dead_handles() {
    let mut s = store_with(true, true);
    let dropped = s.check_liveness(|img| *img != 2);
    assert_eq!(dropped, FilterCacheType::FilteredSnapshot);
    assert_eq!(s.cached_type(), FilterCacheType::Snapshot);

    let dropped = s.check_liveness(|_| true);
    assert_eq!(dropped, FilterCacheType::None);
    assert_eq!(s.cached_type(), FilterCacheType::Snapshot);
}

#[test]
fn hash_expiry_only_touches_mismatching_filtered() {
    let mut s = ArtifactStore::new();
    s.store_filtered(CacheArtifact::new(5u32, RectI::new(0, 0, 4, 4), 42));
    assert!(!s.expire_filtered_on_hash(42));
    assert!(s.expire_filtered_on_hash(43));
    assert_eq!(s.cached_type(), FilterCacheType::None);
}

#[test]
fn hardware_reset_marks_filtered_as_scaled() {
    let mut s = store_with(true, false);
    s.reset_from_hardware(None, Some(art(9)), RectI::new(1, 1, 5, 5));
    assert!(s.filtered_from_hardware());
    assert_eq!(s.cached_type(), FilterCacheType::FilteredSnapshot);
    assert_eq!(s.cached_image_region(), RectI::new(1, 1, 5, 5));

    s.store_filtered(art(10));
    assert!(!s.filtered_from_hardware());
}

#[test]
fn cache_state_describes_reuse() {
    assert!(store_with(true, true).cache_state().starts_with("filtered"));
    assert!(store_with(true, false).cache_state().starts_with("snapshot"));
    assert_eq!(
        store_with(false, false).cache_state(),
        "no valid cache found"
    );
}
