#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn rect_approx_eq(a: Rect, b: Rect) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.width, b.width) && approx_eq(a.height, b.height)
}

fn base() -> DisplayMetrics {
    DisplayMetrics::new(800.0, 500.0)
}

fn view(offset_x: f64, offset_y: f64, scale: f64) -> ViewState {
    ViewState::try_new(offset_x, offset_y, scale, base()).expect("valid transform")
}

fn indicator(v: &ViewState, display: DisplayMetrics) -> Rect {
    compute_indicator_rect(v, display, MinimapGeometry::new(200.0, 125.0), 50.0, 30.0)
}

fn assert_inside_minimap(r: Rect, minimap: MinimapGeometry) {
    assert!(r.x >= 0.0, "x below zero: {r:?}");
    assert!(r.y >= 0.0, "y below zero: {r:?}");
    assert!(r.right() <= minimap.width + EPSILON, "right edge outside: {r:?}");
    assert!(r.bottom() <= minimap.height + EPSILON, "bottom edge outside: {r:?}");
}

// --- Defaults ---

#[test]
fn display_metrics_default_is_base_size() {
    let d = DisplayMetrics::default();
    assert_eq!(d.width, 800.0);
    assert_eq!(d.height, 500.0);
}

#[test]
fn minimap_default_size() {
    let m = MinimapGeometry::default();
    assert_eq!(m.width, 200.0);
    assert_eq!(m.height, 125.0);
}

#[test]
fn view_state_default_is_identity() {
    let v = ViewState::default();
    assert_eq!(v.offset_x, 0.0);
    assert_eq!(v.offset_y, 0.0);
    assert_eq!(v.scale, 1.0);
    assert_eq!(v.view_width, 800.0);
    assert_eq!(v.view_height, 500.0);
}

#[test]
fn image_dimensions_from_u32_pair() {
    let dims = ImageDimensions::from((1024_u32, 768_u32));
    assert_eq!(dims, ImageDimensions::new(1024.0, 768.0));
}

// --- scale_factors ---

#[test]
fn scale_factors_ratio() {
    let s = scale_factors(ImageDimensions::new(1000.0, 500.0), DisplayMetrics::new(800.0, 400.0));
    assert!(approx_eq(s.x, 0.8));
    assert!(approx_eq(s.y, 0.8));
}

#[test]
fn scale_factors_independent_axes() {
    let s = scale_factors(ImageDimensions::new(400.0, 1000.0), DisplayMetrics::new(800.0, 500.0));
    assert!(approx_eq(s.x, 2.0));
    assert!(approx_eq(s.y, 0.5));
}

#[test]
fn scale_factors_zero_native_width_is_identity() {
    for height in [0.0, 1.0, 500.0, 1e9] {
        let s = scale_factors(ImageDimensions::new(0.0, height), DisplayMetrics::new(800.0, 400.0));
        assert_eq!(s, ScaleFactors::IDENTITY);
    }
}

#[test]
fn scale_factors_zero_native_height_is_identity() {
    for width in [0.0, 1.0, 1000.0] {
        let s = scale_factors(ImageDimensions::new(width, 0.0), DisplayMetrics::new(800.0, 400.0));
        assert_eq!(s, ScaleFactors::IDENTITY);
    }
}

#[test]
fn scale_factors_zero_display_is_identity() {
    let s = scale_factors(ImageDimensions::new(1000.0, 500.0), DisplayMetrics::new(0.0, 0.0));
    assert_eq!(s, ScaleFactors::IDENTITY);
}

#[test]
fn scale_factors_non_finite_input_is_identity() {
    let s = scale_factors(ImageDimensions::new(f64::NAN, 500.0), DisplayMetrics::new(800.0, 400.0));
    assert_eq!(s, ScaleFactors::IDENTITY);
    let s = scale_factors(ImageDimensions::new(1000.0, 500.0), DisplayMetrics::new(f64::INFINITY, 400.0));
    assert_eq!(s, ScaleFactors::IDENTITY);
}

#[test]
fn degenerate_checks() {
    assert!(ImageDimensions::new(0.0, 10.0).is_degenerate());
    assert!(ImageDimensions::new(-5.0, 10.0).is_degenerate());
    assert!(!ImageDimensions::new(5.0, 10.0).is_degenerate());
    assert!(DisplayMetrics::new(10.0, 0.0).is_degenerate());
    assert!(!DisplayMetrics::new(10.0, 1.0).is_degenerate());
}

// --- map_rect ---

#[test]
fn map_rect_scales_componentwise() {
    let mapped = map_rect(Bounds::new(10.0, 10.0, 110.0, 60.0), ScaleFactors { x: 0.8, y: 0.5 });
    assert!(approx_eq(mapped.min_x, 8.0));
    assert!(approx_eq(mapped.min_y, 5.0));
    assert!(approx_eq(mapped.max_x, 88.0));
    assert!(approx_eq(mapped.max_y, 30.0));
}

#[test]
fn map_rect_identity_at_unit_scale() {
    let b = Bounds::new(3.5, -2.0, 17.25, 40.0);
    assert_eq!(map_rect(b, ScaleFactors::IDENTITY), b);
    assert_eq!(map_rect(map_rect(b, ScaleFactors::IDENTITY), ScaleFactors::IDENTITY), b);
}

#[test]
fn map_rect_preserves_degenerate_boxes() {
    let inverted = map_rect(Bounds::new(50.0, 50.0, 10.0, 10.0), ScaleFactors { x: 2.0, y: 2.0 });
    assert_eq!(inverted, Bounds::new(100.0, 100.0, 20.0, 20.0));
    let flat = map_rect(Bounds::new(5.0, 5.0, 5.0, 5.0), ScaleFactors { x: 3.0, y: 3.0 });
    assert_eq!(flat.width(), 0.0);
}

// --- ViewState construction ---

#[test]
fn try_new_derives_view_size_from_base() {
    let v = view(-10.0, 20.0, 2.0);
    assert_eq!(v.view_width, 400.0);
    assert_eq!(v.view_height, 250.0);
}

#[test]
fn try_new_rejects_non_positive_scale() {
    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = ViewState::try_new(0.0, 0.0, scale, base()).expect_err("scale should be rejected");
        assert!(matches!(err, GeometryError::OutOfRangeTransform { .. }));
    }
}

#[test]
fn try_new_rejects_non_finite_offsets() {
    assert!(ViewState::try_new(f64::NAN, 0.0, 1.0, base()).is_err());
    assert!(ViewState::try_new(0.0, f64::NEG_INFINITY, 1.0, base()).is_err());
}

#[test]
fn clamped_forces_minimum_scale() {
    let v = ViewState::clamped(5.0, 6.0, -3.0, base());
    assert_eq!(v.scale, MIN_VIEW_SCALE);
    assert_eq!(v.offset_x, 5.0);
    assert_eq!(v.offset_y, 6.0);
    assert_eq!(ViewState::clamped(0.0, 0.0, f64::NAN, base()).scale, MIN_VIEW_SCALE);
}

#[test]
fn clamped_zeroes_non_finite_offsets() {
    let v = ViewState::clamped(f64::NAN, f64::INFINITY, 2.0, base());
    assert_eq!(v.offset_x, 0.0);
    assert_eq!(v.offset_y, 0.0);
    assert_eq!(v.scale, 2.0);
}

#[test]
fn clamped_keeps_valid_input() {
    assert_eq!(ViewState::clamped(-40.0, 12.0, 3.0, base()), view(-40.0, 12.0, 3.0));
}

// --- screen/displayed conversion ---

#[test]
fn screen_to_displayed_with_pan_and_zoom() {
    let v = view(20.0, 10.0, 2.0);
    let p = v.screen_to_displayed(Point::new(20.0, 10.0));
    assert!(approx_eq(p.x, 0.0));
    assert!(approx_eq(p.y, 0.0));
    let p = v.screen_to_displayed(Point::new(120.0, 50.0));
    assert!(approx_eq(p.x, 50.0));
    assert!(approx_eq(p.y, 20.0));
}

#[test]
fn displayed_to_screen_with_pan_and_zoom() {
    let v = view(20.0, 10.0, 3.0);
    let p = v.displayed_to_screen(Point::new(5.0, 5.0));
    assert!(approx_eq(p.x, 35.0));
    assert!(approx_eq(p.y, 25.0));
}

#[test]
fn screen_displayed_round_trip() {
    let v = view(13.7, -42.3, 0.75);
    let original = Point::new(333.3, -99.9);
    let back = v.screen_to_displayed(v.displayed_to_screen(original));
    assert!(approx_eq(original.x, back.x));
    assert!(approx_eq(original.y, back.y));
}

// --- compute_indicator_rect ---

#[test]
fn indicator_covers_minimap_at_identity() {
    let r = indicator(&ViewState::identity(base()), base());
    assert!(rect_approx_eq(r, Rect::new(0.0, 0.0, 200.0, 125.0)));
}

#[test]
fn indicator_halves_at_double_zoom() {
    let r = indicator(&view(-400.0, -250.0, 2.0), base());
    assert!(rect_approx_eq(r, Rect::new(50.0, 31.25, 100.0, 62.5)), "{r:?}");
}

#[test]
fn indicator_tracks_pan_at_fixed_zoom() {
    let left = indicator(&view(0.0, 0.0, 2.0), base());
    let right = indicator(&view(-800.0, 0.0, 2.0), base());
    assert!(approx_eq(left.x, 0.0));
    assert!(approx_eq(right.x, 100.0));
    assert!(approx_eq(left.width, right.width));
}

#[test]
fn indicator_size_floor_applies_at_high_zoom() {
    let r = indicator(&view(-7200.0, -4500.0, 10.0), base());
    assert!(approx_eq(r.width, 50.0));
    assert!(approx_eq(r.height, 30.0));
    // raw position would be (180, 112.5); clamped so the floor-sized box stays inside.
    assert!(approx_eq(r.x, 150.0));
    assert!(approx_eq(r.y, 95.0));
}

#[test]
fn indicator_size_capped_when_zoomed_out() {
    let r = indicator(&view(150.0, -80.0, 0.5), base());
    assert!(rect_approx_eq(r, Rect::new(0.0, 0.0, 200.0, 125.0)));
}

#[test]
fn indicator_floor_larger_than_minimap_is_capped() {
    let minimap = MinimapGeometry::new(40.0, 20.0);
    let r = compute_indicator_rect(&view(0.0, 0.0, 8.0), base(), minimap, 50.0, 30.0);
    assert!(approx_eq(r.width, 40.0));
    assert!(approx_eq(r.height, 20.0));
    assert_inside_minimap(r, minimap);
}

#[test]
fn indicator_positive_offset_clamps_to_origin() {
    let r = indicator(&view(300.0, 200.0, 2.0), base());
    assert!(approx_eq(r.x, 0.0));
    assert!(approx_eq(r.y, 0.0));
}

#[test]
fn indicator_uses_live_display_size() {
    // Container shrank to half the base size; the same pan covers twice the fraction.
    let r = indicator(&view(-200.0, -125.0, 2.0), DisplayMetrics::new(400.0, 250.0));
    assert!(approx_eq(r.width, 100.0));
    assert!(approx_eq(r.x, 50.0));
    assert!(approx_eq(r.y, 31.25));
}

#[test]
fn indicator_zero_display_has_no_position_drift() {
    let r = indicator(&view(-500.0, -500.0, 2.0), DisplayMetrics::new(0.0, 0.0));
    assert!(approx_eq(r.x, 0.0));
    assert!(approx_eq(r.y, 0.0));
    assert!(approx_eq(r.width, 100.0));
    assert!(approx_eq(r.height, 62.5));
    assert!(r.width.is_finite() && r.height.is_finite());
}

#[test]
fn indicator_guards_invalid_scale_in_public_fields() {
    let broken = ViewState { offset_x: -10.0, offset_y: -10.0, scale: 0.0, view_width: 0.0, view_height: 0.0 };
    let r = indicator(&broken, base());
    assert!(r.x.is_finite() && r.y.is_finite() && r.width.is_finite() && r.height.is_finite());
    assert_inside_minimap(r, MinimapGeometry::new(200.0, 125.0));
}

#[test]
fn indicator_always_inside_minimap() {
    let minimap = MinimapGeometry::new(200.0, 125.0);
    let scales = [0.01, 0.1, 0.5, 1.0, 1.3, 2.0, 3.7, 10.0, 100.0];
    let offsets = [-1e6, -5000.0, -799.0, -123.4, 0.0, 42.0, 9999.0];
    let displays = [base(), DisplayMetrics::new(0.0, 0.0), DisplayMetrics::new(333.0, 77.0), DisplayMetrics::new(1e4, 1.0)];
    for &scale in &scales {
        for &ox in &offsets {
            for &oy in &offsets {
                for &display in &displays {
                    let r = indicator(&view(ox, oy, scale), display);
                    assert_inside_minimap(r, minimap);
                    assert!(r.width >= 50.0 - EPSILON && r.height >= 30.0 - EPSILON, "{r:?}");
                }
            }
        }
    }
}

// --- Rect helpers ---

#[test]
fn rect_edges() {
    let r = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert_eq!(r.right(), 40.0);
    assert_eq!(r.bottom(), 60.0);
}
