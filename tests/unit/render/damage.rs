use super::*;

#[test]
fn empty_damage_overlaps_nothing() {
    let d = DamageRegion::new();
    assert!(d.is_empty());
    assert!(!d.overlaps(RectI::new(0, 0, 100, 100)));
}

#[test]
fn current_and_visited_both_count() {
    let mut d = DamageRegion::new();
    d.add(RectI::new(0, 0, 10, 10));
    d.add_visited(RectI::new(100, 100, 10, 10));
    assert!(d.overlaps(RectI::new(5, 5, 10, 10)));
    assert!(d.overlaps(RectI::new(105, 95, 10, 10)));
    assert!(!d.overlaps(RectI::new(10, 10, 50, 50)));
}

#[test]
fn empty_rects_are_ignored() {
    let mut d = DamageRegion::new();
    d.add(RectI::new(0, 0, 0, 10));
    d.add_visited(RectI::new(0, 0, 10, -1));
    assert!(d.is_empty());
}

#[test]
fn empty_query_never_overlaps() {
    let mut d = DamageRegion::new();
    d.add(RectI::new(0, 0, 10, 10));
    assert!(!d.overlaps(RectI::default()));
}

#[test]
fn clear_resets_damage() {
    let mut d = DamageRegion::new();
    d.add(RectI::new(0, 0, 10, 10));
    d.clear();
    assert!(d.is_empty());
}

#[test]
fn covered_area_counts_overlaps_once() {
    let bound = RectI::new(0, 0, 10, 10);
    let rects = [RectI::new(0, 0, 6, 10), RectI::new(4, 0, 6, 10)];
    assert_eq!(covered_area(bound, &rects), 100);
}

#[test]
fn covered_area_is_clipped_to_bound() {
    let bound = RectI::new(10, 10, 10, 10);
    let rects = [RectI::new(0, 0, 15, 15), RectI::new(100, 100, 5, 5)];
    assert_eq!(covered_area(bound, &rects), 25);
    assert_eq!(covered_area(bound, &[]), 0);
}

#[test]
fn covered_area_of_overlapping_staircase() {
    let bound = RectI::new(0, 0, 100, 100);
    let rects: Vec<RectI> = (0..50).map(|i| RectI::new(i, i, 10, 10)).collect();
    // every step adds 19 pixels to the first 10x10 square
    assert_eq!(covered_area(bound, &rects), 100 + 49 * 19);
}

#[test]
fn covered_area_merges_many_tiles() {
    let bound = RectI::new(0, 0, 64, 64);
    let tiles: Vec<RectI> = (0..64)
        .flat_map(|y| (0..64).map(move |x| RectI::new(x, y, 1, 1)))
        .collect();
    assert_eq!(covered_area(bound, &tiles), 64 * 64);
    assert_eq!(covered_area(bound, &tiles[..64 * 63]), 64 * 63);
}

#[test]
fn rect_covering_bound_short_circuits() {
    let bound = RectI::new(10, 10, 20, 20);
    let rects = [RectI::new(12, 12, 2, 2), RectI::new(0, 0, 50, 50)];
    assert_eq!(covered_area(bound, &rects), 400);
}
