use super::*;

#[test]
fn commit_moves_staging_and_resets_it() {
    let mut sync = Synchronizer::new();
    {
        let s = sync.staging_mut();
        s.region_changed = true;
        s.interacts_with_dirty = true;
        s.force_clear = true;
    }
    assert_eq!(sync.phase(), SyncPhase::Staging);

    let committed = *sync.commit();
    assert_eq!(committed.frame(), 1);
    assert!(committed.region_changed);
    assert!(committed.interacts_with_dirty);
    assert!(committed.force_clear);

    assert_eq!(sync.phase(), SyncPhase::Committed);
    assert_eq!(*sync.staging(), IntentRecord::default());
}

#[test]
fn committed_record_only_reflects_latest_commit() {
    let mut sync = Synchronizer::new();
    sync.staging_mut().rotation_changed = true;
    sync.commit();
    sync.staging_mut().is_occluded = true;
    let c = *sync.commit();
    assert_eq!(c.frame(), 2);
    assert!(!c.rotation_changed);
    assert!(c.is_occluded);
    assert!(!sync.previous_interacts_with_dirty());
}

#[test]
fn writes_after_commit_do_not_leak_into_committed() {
    let mut sync = Synchronizer::new();
    sync.commit();
    sync.staging_mut().force_use_cache = true;
    assert!(!sync.committed().force_use_cache);
}

#[test]
fn filter_description_survives_reset() {
    let mut sync = Synchronizer::new();
    sync.record_filter(7, FilterCategory::AiBar, true);
    assert!(sync.staging().hash_changed);
    sync.commit();

    let fresh = sync.staging();
    assert_eq!(fresh.filter_category, FilterCategory::AiBar);
    assert!(fresh.can_skip_frame);
    assert!(!fresh.hash_changed);
}

#[test]
fn hash_change_is_relative_to_last_record() {
    let mut sync = Synchronizer::new();
    sync.record_filter(7, FilterCategory::Default, false);
    assert!(sync.staging().hash_changed);
    sync.commit();

    sync.record_filter(7, FilterCategory::Default, false);
    assert!(!sync.staging().hash_changed);
    sync.commit();

    sync.record_filter(8, FilterCategory::Default, false);
    assert!(sync.staging().hash_changed);
}

#[test]
fn first_record_with_zero_hash_is_not_a_change() {
    let mut sync = Synchronizer::new();
    sync.record_filter(0, FilterCategory::Default, false);
    assert!(!sync.staging().hash_changed);
}

#[test]
fn previous_dirty_flag_tracks_prior_commit() {
    let mut sync = Synchronizer::new();
    sync.staging_mut().interacts_with_dirty = true;
    sync.commit();
    assert!(!sync.previous_interacts_with_dirty());
    sync.commit();
    assert!(sync.previous_interacts_with_dirty());
}

#[test]
fn intent_parses_from_partial_json() {
    let json = r#"{ "region_changed": true, "filter_category": "ai_bar" }"#;
    let rec: IntentRecord = serde_json::from_str(json).unwrap();
    assert!(rec.region_changed);
    assert_eq!(rec.filter_category, FilterCategory::AiBar);
    assert!(!rec.force_clear);
}
