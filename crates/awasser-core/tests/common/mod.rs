// Recording fakes for the platform traits, shared by the integration tests.

#![allow(dead_code)]

use awasser_core::live::{FrameTimer, LiveClientMessage, LiveSession};
use awasser_core::{AudioBackend, CameraStream, Error, Playback, StageGraph, StageSpec, StageTargets};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    SetGain(f32, f64),
    Ramp { value: f32, from: f64, until: f64 },
    Targets { targets: StageTargets, at: f64, tau: f64 },
    Start(f64),
    Stop(f64),
    Release,
    Close(f64),
}

#[derive(Default)]
pub struct Recorder {
    pub calls: RefCell<Vec<Call>>,
    pub builds: Cell<u32>,
    pub resumes: Cell<u32>,
    pub now: Cell<f64>,
    pub fail_build: Cell<bool>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn targets(&self) -> Vec<(StageTargets, f64)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Targets { targets, tau, .. } => Some((*targets, *tau)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

pub struct FakeBackend {
    pub rec: Rc<Recorder>,
}

impl FakeBackend {
    pub fn new(rec: &Rc<Recorder>) -> Self {
        Self { rec: rec.clone() }
    }
}

pub struct FakeGraph {
    rec: Rc<Recorder>,
}

impl AudioBackend for FakeBackend {
    type Graph = FakeGraph;

    fn current_time(&self) -> f64 {
        self.rec.now.get()
    }

    fn resume_if_suspended(&self) {
        self.rec.resumes.set(self.rec.resumes.get() + 1);
    }

    fn build_stage_graph(&self, spec: &StageSpec) -> awasser_core::Result<FakeGraph> {
        if self.rec.fail_build.get() {
            return Err(Error::Audio("oscillator refused".into()));
        }
        assert_eq!(spec.oscillators.len(), 2);
        self.rec.builds.set(self.rec.builds.get() + 1);
        Ok(FakeGraph {
            rec: self.rec.clone(),
        })
    }

    fn close_after(&self, at: f64) {
        self.rec.push(Call::Close(at));
    }
}

impl StageGraph for FakeGraph {
    fn set_gain_at(&self, value: f32, at: f64) {
        self.rec.push(Call::SetGain(value, at));
    }

    fn ramp_gain(&self, value: f32, from: f64, until: f64) {
        self.rec.push(Call::Ramp { value, from, until });
    }

    fn set_targets(&self, targets: &StageTargets, at: f64, time_constant: f64) {
        self.rec.push(Call::Targets {
            targets: *targets,
            at,
            tau: time_constant,
        });
    }

    fn start_generators(&self, at: f64) {
        self.rec.push(Call::Start(at));
    }

    fn stop_generators(&self, at: f64) {
        self.rec.push(Call::Stop(at));
    }

    fn release(self) {
        self.rec.push(Call::Release);
    }

    fn frequency_data(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(&[0, 64, 128, 255]);
    }
}

pub struct FakeCamera {
    pub live: Rc<Cell<usize>>,
}

impl FakeCamera {
    pub fn with_tracks(n: usize) -> (Self, Rc<Cell<usize>>) {
        let live = Rc::new(Cell::new(n));
        (Self { live: live.clone() }, live)
    }
}

impl CameraStream for FakeCamera {
    fn live_tracks(&self) -> usize {
        self.live.get()
    }

    fn stop_tracks(&mut self) {
        self.live.set(0);
    }
}

pub struct FakePlayback {
    pub stopped: Rc<Cell<bool>>,
}

impl FakePlayback {
    pub fn new() -> (Box<Self>, Rc<Cell<bool>>) {
        let stopped = Rc::new(Cell::new(false));
        (
            Box::new(Self {
                stopped: stopped.clone(),
            }),
            stopped,
        )
    }
}

impl Playback for FakePlayback {
    fn stop(&mut self) {
        self.stopped.set(true);
    }
}

#[derive(Default)]
pub struct LiveSpy {
    pub closed: Cell<bool>,
    pub sent: RefCell<Vec<LiveClientMessage>>,
    pub timer_cleared: Cell<bool>,
}

pub struct FakeLive {
    pub spy: Rc<LiveSpy>,
}

impl LiveSession for FakeLive {
    fn send(&mut self, message: &LiveClientMessage) -> awasser_core::Result<()> {
        if self.spy.closed.get() {
            return Err(Error::SessionClosed);
        }
        self.spy.sent.borrow_mut().push(message.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.spy.closed.set(true);
    }

    fn is_open(&self) -> bool {
        !self.spy.closed.get()
    }
}

pub struct FakeTimer {
    pub spy: Rc<LiveSpy>,
}

impl FrameTimer for FakeTimer {
    fn clear(&mut self) {
        self.spy.timer_cleared.set(true);
    }
}

pub fn fake_live() -> (Box<FakeLive>, Box<FakeTimer>, Rc<LiveSpy>) {
    let spy = Rc::new(LiveSpy::default());
    (
        Box::new(FakeLive {
            spy: spy.clone(),
        }),
        Box::new(FakeTimer {
            spy: spy.clone(),
        }),
        spy,
    )
}
