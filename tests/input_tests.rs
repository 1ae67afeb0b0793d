// Host-side tests for pure input functions.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod input {
    include!("../src/input.rs");
}

use input::*;

#[test]
fn drag_reports_deltas_only_while_active() {
    let mut drag = DragTracker::default();
    assert_eq!(drag.move_to(50.0), None);

    drag.begin(100.0);
    assert_eq!(drag.move_to(110.0), Some(10.0));
    assert_eq!(drag.move_to(95.0), Some(-15.0));

    drag.end();
    assert_eq!(drag.move_to(200.0), None);
}

#[test]
fn slider_values_parse_or_are_ignored() {
    assert_eq!(parse_slider(" 4.5 "), Some(4.5));
    assert_eq!(parse_slider("10"), Some(10.0));
    assert_eq!(parse_slider(""), None);
    assert_eq!(parse_slider("far"), None);
    assert_eq!(parse_slider("NaN"), None);
    assert_eq!(parse_slider("inf"), None);
}

#[test]
fn landmark_index_attribute() {
    assert_eq!(parse_index(Some("3".into())), Some(3));
    assert_eq!(parse_index(Some("-1".into())), None);
    assert_eq!(parse_index(None), None);
}

#[test]
fn capture_downscales_keeping_aspect() {
    assert_eq!(capture_size(1920, 1080, 640), (640, 360));
    assert_eq!(capture_size(480, 640, 640), (480, 640));
    assert_eq!(capture_size(0, 720, 640), (0, 0));
    // Extreme panorama keeps at least one row.
    assert_eq!(capture_size(100_000, 10, 640), (640, 1));
}
