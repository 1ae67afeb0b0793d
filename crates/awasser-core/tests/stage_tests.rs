// Host-side integration tests for the spatial audio stage and its visualizer loop.

mod common;

use awasser_core::*;
use common::{Call, FakeBackend, Recorder};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn ineligible_start_builds_nothing() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    assert_eq!(stage.start(&backend, false).unwrap(), StageStart::Ineligible);
    assert!(!stage.is_active());
    assert_eq!(rec.builds.get(), 0);
    assert!(rec.calls().is_empty());
}

#[test]
fn double_start_yields_one_node_set() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    assert_eq!(stage.start(&backend, true).unwrap(), StageStart::Started);
    assert_eq!(stage.start(&backend, true).unwrap(), StageStart::AlreadyActive);
    assert_eq!(rec.builds.get(), 1);
    let starts = rec.calls().iter().filter(|c| matches!(c, Call::Start(_))).count();
    assert_eq!(starts, 1);
}

#[test]
fn start_fades_in_from_silence() {
    let rec = Recorder::new();
    rec.now.set(1.25);
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    stage.start(&backend, true).unwrap();
    assert_eq!(rec.resumes.get(), 1);
    assert_eq!(
        rec.calls(),
        vec![
            Call::SetGain(0.0, 1.25),
            Call::Ramp {
                value: FADE_IN_TARGET_GAIN,
                from: 1.25,
                until: 1.25 + FADE_IN_SEC
            },
            Call::Start(1.25),
        ]
    );
}

#[test]
fn stop_ramps_to_zero_before_halting_generators() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    stage.start(&backend, true).unwrap();
    rec.calls.borrow_mut().clear();

    rec.now.set(3.0);
    assert_eq!(stage.stop(&backend), StageStop::Stopping);
    assert!(!stage.is_active());
    let calls = rec.calls();
    assert_eq!(calls.len(), 3);
    let ramp_end = match calls[0] {
        Call::Ramp { value, from, until } => {
            assert_eq!(value, 0.0);
            assert_eq!(from, 3.0);
            until
        }
        ref other => panic!("expected a ramp first, got {:?}", other),
    };
    let halt = match calls[1] {
        Call::Stop(at) => at,
        ref other => panic!("expected generator stop, got {:?}", other),
    };
    assert!((ramp_end - 3.5).abs() < 1e-9);
    assert!((halt - 3.6).abs() < 1e-9);
    assert!(halt > ramp_end, "generators must halt after the fade reaches zero");
    assert_eq!(calls[2], Call::Release);
}

#[test]
fn stop_while_inactive_is_a_noop() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage: SpatialAudioStage<common::FakeGraph> = SpatialAudioStage::new();
    assert_eq!(stage.stop(&backend), StageStop::NotActive);
    stage.start(&backend, true).unwrap();
    stage.stop(&backend);
    let before = rec.calls().len();
    assert_eq!(stage.stop(&backend), StageStop::NotActive);
    assert_eq!(rec.calls().len(), before);
}

#[test]
fn restart_after_stop_builds_fresh_graph() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    stage.start(&backend, true).unwrap();
    stage.stop(&backend);
    assert_eq!(stage.start(&backend, true).unwrap(), StageStart::Started);
    assert_eq!(rec.builds.get(), 2);
}

#[test]
fn failed_build_leaves_stage_inactive() {
    let rec = Recorder::new();
    rec.fail_build.set(true);
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    assert!(stage.start(&backend, true).is_err());
    assert!(!stage.is_active());

    rec.fail_build.set(false);
    assert_eq!(stage.start(&backend, true).unwrap(), StageStart::Started);
}

#[test]
fn distance_mapping_is_monotone_with_floors() {
    let mut prev_cutoff = f32::INFINITY;
    let mut prev_gain = f32::INFINITY;
    for step in 0..=400 {
        let d = step as f32 * 0.05;
        let cutoff = cutoff_for_distance(d);
        let gain = gain_for_distance(d);
        assert!(cutoff <= prev_cutoff, "cutoff rose at D={d}");
        assert!(gain <= prev_gain, "gain rose at D={d}");
        assert!(cutoff >= CUTOFF_FLOOR_HZ);
        assert!(gain >= GAIN_FLOOR);
        prev_cutoff = cutoff;
        prev_gain = gain;
    }
    assert!(approx(gain_for_distance(1.0), 0.46));
    assert!(approx(cutoff_for_distance(1.0), 1820.0));
    assert_eq!(gain_for_distance(20.0), 0.0);
    assert_eq!(cutoff_for_distance(20.0), 100.0);
}

#[test]
fn distance_sweep_applies_smoothed_monotone_updates() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    stage.start(&backend, true).unwrap();
    for d in 1..=10 {
        rec.now.set(d as f64);
        stage.set_distance(&backend, d as f32);
    }
    let targets = rec.targets();
    assert_eq!(targets.len(), 10);
    assert!(targets.iter().all(|(_, tau)| *tau == PARAM_SMOOTHING_TAU_SEC));
    for pair in targets.windows(2) {
        assert!(pair[1].0.gain <= pair[0].0.gain);
        assert!(pair[1].0.cutoff_hz <= pair[0].0.cutoff_hz);
    }
    let (first, last) = (targets[0].0, targets[9].0);
    assert!(approx(first.gain, 0.46));
    assert!(approx(first.cutoff_hz, 1820.0));
    // D is clamped to 10, which lands above both floors.
    assert!(approx(last.gain, 0.1));
    assert!(approx(last.cutoff_hz, 200.0));
}

#[test]
fn distance_is_clamped_to_stage_range() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage = SpatialAudioStage::new();
    stage.start(&backend, true).unwrap();
    stage.set_distance(&backend, 0.0);
    assert_eq!(stage.distance(), DISTANCE_MIN);
    stage.set_distance(&backend, 99.0);
    assert_eq!(stage.distance(), DISTANCE_MAX);
    stage.set_distance(&backend, f32::NAN);
    assert_eq!(stage.distance(), DISTANCE_DEFAULT);
}

#[test]
fn updates_while_inactive_only_record_controls() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage: SpatialAudioStage<common::FakeGraph> = SpatialAudioStage::new();
    stage.set_rotation(&backend, 370.0);
    stage.set_distance(&backend, 2.0);
    assert!(approx(stage.rotation_deg(), 10.0));
    assert_eq!(stage.distance(), 2.0);
    assert!(rec.calls().is_empty());
}

#[test]
fn rotation_places_source_on_circle() {
    let p = panner_position(90.0, 2.0);
    assert!(approx(p.x, 2.0));
    assert!(approx(p.y, 0.0));
    assert!(p.z.abs() < 1e-4);

    let p = panner_position(180.0, 3.0);
    assert!(p.x.abs() < 1e-4);
    assert!(approx(p.z, -3.0));

    assert!(approx(wrap_degrees(-90.0), 270.0));
    assert_eq!(wrap_degrees(f32::INFINITY), 0.0);
}

#[test]
fn drag_turns_half_a_degree_per_pixel() {
    assert!(approx(drag_rotation(0.0, 20.0), 10.0));
    assert!(approx(drag_rotation(350.0, 40.0), 10.0));
    assert!(approx(drag_rotation(5.0, -20.0), 355.0));
}

#[test]
fn spectrum_is_only_sampled_while_active() {
    let rec = Recorder::new();
    let backend = FakeBackend::new(&rec);
    let mut stage: SpatialAudioStage<common::FakeGraph> = SpatialAudioStage::new();
    let mut bins = vec![7u8];
    assert!(!stage.sample_spectrum(&mut bins));
    stage.start(&backend, true).unwrap();
    assert!(stage.sample_spectrum(&mut bins));
    assert_eq!(bins, vec![0, 64, 128, 255]);
    stage.stop(&backend);
    bins = vec![7];
    assert!(!stage.sample_spectrum(&mut bins));
    assert_eq!(bins, vec![7]);
}

#[test]
fn frame_loop_terminates_once_stage_stops() {
    let mut frames = FrameLoop::new();
    assert!(frames.begin());
    assert!(!frames.begin(), "a second loop must not be scheduled");
    assert_eq!(frames.on_frame(true), FrameAction::Continue);
    assert_eq!(frames.on_frame(true), FrameAction::Continue);
    assert_eq!(frames.frames(), 2);

    assert_eq!(frames.on_frame(false), FrameAction::Terminate);
    assert!(!frames.is_running());
    // Even if the stage came back, a terminated loop stays terminated.
    assert_eq!(frames.on_frame(true), FrameAction::Terminate);
    assert_eq!(frames.frames(), 2);

    assert!(frames.begin());
    assert_eq!(frames.frames(), 0);
}

#[test]
fn bars_follow_bin_levels_with_gap() {
    let bars = bar_layout(&[255, 0, 51, 102], 100.0, 50.0);
    // bar width = 100 / 4 * 2.5 = 62.5; the second bar starts at 63.5 and the
    // third would start past the right edge.
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].x, 0.0);
    assert_eq!(bars[0].width, 62.5);
    assert_eq!(bars[0].height, 50.0);
    assert_eq!(bars[0].alpha, 1.0);
    assert_eq!(bars[1].x, 63.5);
    assert_eq!(bars[1].height, 0.0);
    assert_eq!(bars[1].y, 50.0);

    assert!(bar_layout(&[], 100.0, 50.0).is_empty());
    assert!(bar_layout(&[10], 0.0, 50.0).is_empty());
}
