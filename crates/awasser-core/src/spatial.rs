//! Spatial audio stage.
//!
//! A two-oscillator drone routed through a low-pass filter, a gain stage, a
//! positional panner and an analyser. Rotation moves the source around the
//! listener; distance darkens and quiets it. The stage has a strict
//! start/stop lifecycle: at most one node set exists, fades are ramped, and
//! the generators only halt after the fade-out has reached silence.

use crate::constants::*;
use crate::error::Result;
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorSpec {
    pub waveform: Waveform,
    pub frequency_hz: f32,
}

/// Shape of the node graph built on stage start.
#[derive(Clone, Debug, PartialEq)]
pub struct StageSpec {
    pub oscillators: Vec<OscillatorSpec>,
    pub filter_cutoff_hz: f32,
    pub analyser_fft_size: u32,
}

impl Default for StageSpec {
    fn default() -> Self {
        Self {
            oscillators: vec![
                OscillatorSpec {
                    waveform: Waveform::Saw,
                    frequency_hz: DRONE_LOW_HZ,
                },
                OscillatorSpec {
                    waveform: Waveform::Sine,
                    frequency_hz: DRONE_HIGH_HZ,
                },
            ],
            filter_cutoff_hz: FILTER_INITIAL_HZ,
            analyser_fft_size: ANALYSER_FFT_SIZE,
        }
    }
}

/// Parameter targets derived from rotation and distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageTargets {
    pub position: Vec3,
    pub cutoff_hz: f32,
    pub gain: f32,
}

/// The audio context seen by the stage.
pub trait AudioBackend {
    type Graph: StageGraph;

    /// Audio clock in seconds.
    fn current_time(&self) -> f64;

    fn resume_if_suspended(&self);

    /// Build and connect oscillators -> filter -> gain -> panner -> analyser -> output.
    /// Generators are created but not started.
    fn build_stage_graph(&self, spec: &StageSpec) -> Result<Self::Graph>;

    /// Close the context once the audio clock reaches `at`.
    fn close_after(&self, at: f64);
}

/// Live node set owned by an active stage.
pub trait StageGraph {
    fn set_gain_at(&self, value: f32, at: f64);

    /// Linear ramp from the gain's value at `from` to `value` at `until`.
    fn ramp_gain(&self, value: f32, from: f64, until: f64);

    /// `setTargetAtTime` on panner position, filter cutoff and gain.
    fn set_targets(&self, targets: &StageTargets, at: f64, time_constant: f64);

    fn start_generators(&self, at: f64);

    fn stop_generators(&self, at: f64);

    /// Give the nodes up. Implementations disconnect once the generators have
    /// ended; nothing may be driven through the graph afterwards.
    fn release(self);

    /// Byte frequency data from the analyser. Resizes `out` to the bin count.
    fn frequency_data(&self, out: &mut Vec<u8>);
}

#[derive(Debug, PartialEq, Eq)]
pub enum StageStart {
    Started,
    AlreadyActive,
    Ineligible,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StageStop {
    Stopping,
    NotActive,
}

pub struct SpatialAudioStage<G: StageGraph> {
    active: bool,
    graph: Option<G>,
    rotation_deg: f32,
    distance: f32,
}

impl<G: StageGraph> Default for SpatialAudioStage<G> {
    fn default() -> Self {
        Self {
            active: false,
            graph: None,
            rotation_deg: 0.0,
            distance: DISTANCE_DEFAULT,
        }
    }
}

impl<G: StageGraph> SpatialAudioStage<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn start<B>(&mut self, backend: &B, eligible: bool) -> Result<StageStart>
    where
        B: AudioBackend<Graph = G>,
    {
        if !eligible {
            return Ok(StageStart::Ineligible);
        }
        if self.active {
            return Ok(StageStart::AlreadyActive);
        }
        // Claim the stage before building; graph construction may re-enter.
        self.active = true;
        backend.resume_if_suspended();
        let graph = match backend.build_stage_graph(&StageSpec::default()) {
            Ok(g) => g,
            Err(e) => {
                self.active = false;
                log::error!("[stage] graph build failed: {}", e);
                return Err(e);
            }
        };
        let now = backend.current_time();
        graph.set_gain_at(0.0, now);
        graph.ramp_gain(FADE_IN_TARGET_GAIN, now, now + FADE_IN_SEC);
        graph.start_generators(now);
        // Stale graph from an overlapping start cannot exist: `active` gates entry.
        self.graph = Some(graph);
        log::info!("[stage] started at t={:.3}", now);
        Ok(StageStart::Started)
    }

    pub fn stop<B>(&mut self, backend: &B) -> StageStop
    where
        B: AudioBackend<Graph = G>,
    {
        if !self.active {
            return StageStop::NotActive;
        }
        self.active = false;
        if let Some(graph) = self.graph.take() {
            let now = backend.current_time();
            graph.ramp_gain(0.0, now, now + FADE_OUT_SEC);
            graph.stop_generators(now + GENERATOR_HALT_SEC);
            graph.release();
            log::info!("[stage] stopping; generators halt at t={:.3}", now + GENERATOR_HALT_SEC);
        }
        StageStop::Stopping
    }

    pub fn set_rotation<B>(&mut self, backend: &B, degrees: f32)
    where
        B: AudioBackend<Graph = G>,
    {
        self.record_rotation(degrees);
        self.apply(backend);
    }

    pub fn set_distance<B>(&mut self, backend: &B, distance: f32)
    where
        B: AudioBackend<Graph = G>,
    {
        self.record_distance(distance);
        self.apply(backend);
    }

    /// Update the rotation without touching the graph.
    pub fn record_rotation(&mut self, degrees: f32) {
        self.rotation_deg = wrap_degrees(degrees);
    }

    pub fn record_distance(&mut self, distance: f32) {
        self.distance = clamp_distance(distance);
    }

    pub fn targets(&self) -> StageTargets {
        stage_targets(self.rotation_deg, self.distance)
    }

    /// Sample the analyser. Returns `false` (and leaves `out` untouched) when
    /// the stage is not active.
    pub fn sample_spectrum(&self, out: &mut Vec<u8>) -> bool {
        match (&self.graph, self.active) {
            (Some(g), true) => {
                g.frequency_data(out);
                true
            }
            _ => false,
        }
    }

    /// Push the current targets to the graph with smoothing. No-op while inactive.
    pub fn apply<B>(&self, backend: &B)
    where
        B: AudioBackend<Graph = G>,
    {
        if !self.active {
            return;
        }
        if let Some(g) = &self.graph {
            let targets = self.targets();
            g.set_targets(&targets, backend.current_time(), PARAM_SMOOTHING_TAU_SEC);
        }
    }
}

pub fn wrap_degrees(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    degrees.rem_euclid(360.0)
}

pub fn clamp_distance(distance: f32) -> f32 {
    if distance.is_nan() {
        return DISTANCE_DEFAULT;
    }
    distance.clamp(DISTANCE_MIN, DISTANCE_MAX)
}

/// Planar source position on a circle of radius `distance` around the listener.
pub fn panner_position(rotation_deg: f32, distance: f32) -> Vec3 {
    let rad = rotation_deg.to_radians();
    Vec3::new(rad.sin() * distance, 0.0, rad.cos() * distance)
}

pub fn cutoff_for_distance(distance: f32) -> f32 {
    (CUTOFF_BASE_HZ - CUTOFF_PER_UNIT_HZ * distance).max(CUTOFF_FLOOR_HZ)
}

pub fn gain_for_distance(distance: f32) -> f32 {
    (GAIN_BASE - GAIN_PER_UNIT * distance).max(GAIN_FLOOR)
}

pub fn stage_targets(rotation_deg: f32, distance: f32) -> StageTargets {
    StageTargets {
        position: panner_position(rotation_deg, distance),
        cutoff_hz: cutoff_for_distance(distance),
        gain: gain_for_distance(distance),
    }
}

/// Rotation after a horizontal drag of `delta_px`.
pub fn drag_rotation(current_deg: f32, delta_px: f32) -> f32 {
    wrap_degrees(current_deg + delta_px * DRAG_DEG_PER_PX)
}
