//! Resources owned by one AR-viewer lifetime.
//!
//! The shared audio context is created on first use and outlives the
//! consumers that borrow it (narration, spatial stage). Camera stream and
//! live-voice session are exclusive to the viewer. [`ViewerSession::teardown`]
//! is the single release point and also runs on drop.

use crate::constants::GENERATOR_HALT_SEC;
use crate::error::{Error, Result};
use crate::live::{FrameTimer, LiveSession};
use crate::spatial::{AudioBackend, SpatialAudioStage, StageStart, StageStop};

/// A live camera capture.
pub trait CameraStream {
    fn live_tracks(&self) -> usize;
    fn stop_tracks(&mut self);
}

/// One narration clip playing through the shared context.
pub trait Playback {
    fn stop(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Studio,
    Ar,
}

struct LiveHandle {
    session: Box<dyn LiveSession>,
    frame_timer: Option<Box<dyn FrameTimer>>,
}

impl LiveHandle {
    fn shut(mut self) {
        if let Some(mut t) = self.frame_timer.take() {
            t.clear();
        }
        self.session.close();
    }
}

pub struct ViewerSession<B: AudioBackend> {
    audio: Option<B>,
    stage: SpatialAudioStage<B::Graph>,
    narration: Option<Box<dyn Playback>>,
    camera: Option<Box<dyn CameraStream>>,
    live: Option<LiveHandle>,
    mode: ViewMode,
    /// Audio-clock time the last stopped stage falls silent.
    halt_at: f64,
    torn_down: bool,
}

impl<B: AudioBackend> Default for ViewerSession<B> {
    fn default() -> Self {
        Self {
            audio: None,
            stage: SpatialAudioStage::new(),
            narration: None,
            camera: None,
            live: None,
            mode: ViewMode::Studio,
            halt_at: 0.0,
            torn_down: false,
        }
    }
}

impl<B: AudioBackend> ViewerSession<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn audio(&self) -> Option<&B> {
        self.audio.as_ref()
    }

    /// Shared context, created on first call.
    pub fn audio_or_init(&mut self, init: impl FnOnce() -> Result<B>) -> Result<&B> {
        if self.torn_down {
            return Err(Error::Audio("viewer already closed".into()));
        }
        if self.audio.is_none() {
            let ctx = init()?;
            log::info!("[audio] shared context created");
            self.audio = Some(ctx);
        }
        self.audio
            .as_ref()
            .ok_or_else(|| Error::Audio("context unavailable".into()))
    }

    // ---------------- Spatial stage ----------------

    pub fn stage(&self) -> &SpatialAudioStage<B::Graph> {
        &self.stage
    }

    pub fn start_stage(
        &mut self,
        eligible: bool,
        init: impl FnOnce() -> Result<B>,
    ) -> Result<StageStart> {
        if !eligible {
            return Ok(StageStart::Ineligible);
        }
        if self.stage.is_active() {
            return Ok(StageStart::AlreadyActive);
        }
        self.audio_or_init(init)?;
        let Some(audio) = self.audio.as_ref() else {
            return Err(Error::Audio("context unavailable".into()));
        };
        self.stage.start(audio, eligible)
    }

    pub fn stop_stage(&mut self) -> StageStop {
        let Some(audio) = self.audio.as_ref() else {
            return StageStop::NotActive;
        };
        let stop = self.stage.stop(audio);
        if stop == StageStop::Stopping {
            self.halt_at = self.halt_at.max(audio.current_time() + GENERATOR_HALT_SEC);
        }
        stop
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.stage.record_rotation(degrees);
        if let Some(audio) = self.audio.as_ref() {
            self.stage.apply(audio);
        }
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.stage.record_distance(distance);
        if let Some(audio) = self.audio.as_ref() {
            self.stage.apply(audio);
        }
    }

    pub fn sample_spectrum(&self, out: &mut Vec<u8>) -> bool {
        self.stage.sample_spectrum(out)
    }

    // ---------------- Narration ----------------

    pub fn is_narrating(&self) -> bool {
        self.narration.is_some()
    }

    pub fn begin_narration(&mut self, mut playback: Box<dyn Playback>) {
        if self.torn_down {
            playback.stop();
            return;
        }
        self.stop_narration();
        self.narration = Some(playback);
    }

    /// Stops the clip only; the shared context stays open.
    pub fn stop_narration(&mut self) -> bool {
        match self.narration.take() {
            Some(mut p) => {
                p.stop();
                true
            }
            None => false,
        }
    }

    /// The clip reached its end by itself.
    pub fn narration_ended(&mut self) {
        self.narration = None;
    }

    // ---------------- Camera ----------------

    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        if mode == ViewMode::Studio {
            self.release_camera();
        }
    }

    /// Camera acquisition failed or was refused: fall back to studio viewing.
    pub fn camera_denied(&mut self) {
        log::info!("[camera] unavailable; studio view only");
        self.mode = ViewMode::Studio;
        self.release_camera();
    }

    /// Attach a freshly acquired stream. A stream that arrives after the
    /// viewer switched back to studio or closed is stopped immediately.
    pub fn attach_camera(&mut self, mut stream: Box<dyn CameraStream>) -> bool {
        if self.torn_down || self.mode != ViewMode::Ar {
            stream.stop_tracks();
            return false;
        }
        self.release_camera();
        self.camera = Some(stream);
        true
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn release_camera(&mut self) {
        if let Some(mut cam) = self.camera.take() {
            cam.stop_tracks();
            log::info!("[camera] released");
        }
    }

    // ---------------- Live voice ----------------

    pub fn attach_live(
        &mut self,
        mut session: Box<dyn LiveSession>,
        frame_timer: Option<Box<dyn FrameTimer>>,
    ) -> bool {
        if self.torn_down {
            if let Some(mut t) = frame_timer {
                t.clear();
            }
            session.close();
            return false;
        }
        self.end_live();
        self.live = Some(LiveHandle {
            session,
            frame_timer,
        });
        true
    }

    pub fn has_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn live_mut(&mut self) -> Option<&mut (dyn LiveSession + 'static)> {
        self.live.as_mut().map(|h| h.session.as_mut())
    }

    pub fn end_live(&mut self) {
        if let Some(handle) = self.live.take() {
            handle.shut();
            log::info!("[live] session closed");
        }
    }

    /// Drop a live session the peer has already closed, clearing its frame
    /// timer. An open session (e.g. a replacement) is kept.
    pub fn reap_live(&mut self) -> bool {
        match &self.live {
            Some(handle) if !handle.session.is_open() => {
                self.end_live();
                true
            }
            _ => false,
        }
    }

    // ---------------- Teardown ----------------

    /// Release everything this viewer owns. Safe to call more than once.
    /// The shared context closes last, after any stage fade has played out.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.release_camera();
        self.stop_narration();
        self.stop_stage();
        self.end_live();
        if let Some(audio) = self.audio.take() {
            let at = self.halt_at.max(audio.current_time());
            audio.close_after(at);
            log::info!("[audio] shared context closes at t={:.3}", at);
        }
        log::info!("[viewer] torn down");
    }
}

impl<B: AudioBackend> Drop for ViewerSession<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
