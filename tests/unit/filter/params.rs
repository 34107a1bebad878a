use super::*;
use crate::render::headless::HeadlessCanvas;

fn blur(radius: f32) -> FilterParams {
    FilterParams {
        radius,
        ..FilterParams::default()
    }
}

#[test]
fn hash_tracks_output_affecting_params() {
    assert_eq!(blur(10.0).content_hash(), blur(10.0).content_hash());
    assert_ne!(blur(10.0).content_hash(), blur(11.0).content_hash());

    let material = FilterParams {
        category: FilterCategory::Material,
        ..blur(10.0)
    };
    assert_ne!(material.content_hash(), blur(10.0).content_hash());
}

#[test]
fn skip_eligibility_does_not_change_hash() {
    let skippable = FilterParams {
        can_skip_frame: true,
        ..blur(4.0)
    };
    assert_eq!(skippable.content_hash(), blur(4.0).content_hash());
}

#[test]
fn hash_is_never_the_unrecorded_sentinel() {
    for r in 0..64 {
        assert_ne!(blur(r as f32).content_hash(), 0);
    }
}

#[test]
fn magnifier_offset_only_matters_for_magnifiers() {
    let shifted = FilterParams {
        magnifier_offset: (4, 2),
        ..blur(1.0)
    };
    assert_eq!(shifted.content_hash(), blur(1.0).content_hash());

    let mag = FilterParams {
        category: FilterCategory::Magnifier,
        ..shifted.clone()
    };
    let other = FilterParams {
        magnifier_offset: (0, 0),
        ..mag.clone()
    };
    assert_ne!(mag.content_hash(), other.content_hash());

    let f = ParamFilter::new(mag);
    assert_eq!(
        FilterProvider::<HeadlessCanvas>::snapshot_offset(&f),
        (4, 2)
    );
    let f = ParamFilter::new(shifted);
    assert_eq!(
        FilterProvider::<HeadlessCanvas>::snapshot_offset(&f),
        (0, 0)
    );
}

#[test]
fn invalid_params_are_rejected() {
    assert!(blur(-1.0).validate().is_err());
    assert!(blur(f32::NAN).validate().is_err());
    assert!(blur(3.0).validate().is_ok());
}

#[test]
fn params_parse_from_json() {
    let json = r#"{ "category": "material", "radius": 20.0, "can_skip_frame": true }"#;
    let p: FilterParams = serde_json::from_str(json).unwrap();
    assert_eq!(p.category, FilterCategory::Material);
    assert!(p.can_skip_frame);
    assert_eq!(p.saturation, 1.0);
}

#[test]
fn apply_draws_through_and_counts() {
    let mut canvas = HeadlessCanvas::new(20, 20);
    let img = canvas
        .try_snapshot(crate::foundation::core::RectI::new(0, 0, 10, 10))
        .unwrap();
    let f = ParamFilter::new(blur(2.0));
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    f.apply(
        &mut canvas,
        &img,
        r,
        r,
        ApplyHints {
            discard_canvas: true,
            offscreen: false,
        },
    );
    assert_eq!(f.apply_count(), 1);
    assert_eq!(canvas.draws().len(), 1);
    assert_eq!(canvas.discard_count(), 1);
}

#[test]
fn apply_count_saturates() {
    let mut canvas = HeadlessCanvas::new(20, 20);
    let img = canvas
        .try_snapshot(crate::foundation::core::RectI::new(0, 0, 10, 10))
        .unwrap();
    let f = ParamFilter::new(blur(2.0));
    f.applied.set(u32::MAX);
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    f.apply(&mut canvas, &img, r, r, ApplyHints::default());
    assert_eq!(f.apply_count(), u32::MAX);
    assert_eq!(canvas.draws().len(), 1);
}
