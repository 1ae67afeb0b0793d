//! Bar-spectrum visualizer bookkeeping.
//!
//! The front-end drives this from `requestAnimationFrame`. Each frame asks
//! [`FrameLoop::on_frame`] first; once it answers `Terminate` the callback
//! must return without sampling and without requesting another frame.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameAction {
    /// Sample, draw, and request the next frame.
    Continue,
    /// Stop here; no further frame may be requested.
    Terminate,
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames sampled since the loop was last started.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mark the loop as started. Returns `false` when a loop is already
    /// scheduled, in which case the caller must not schedule another.
    pub fn begin(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.frames = 0;
        true
    }

    pub fn on_frame(&mut self, stage_active: bool) -> FrameAction {
        if !self.running {
            return FrameAction::Terminate;
        }
        if !stage_active {
            self.running = false;
            return FrameAction::Terminate;
        }
        self.frames += 1;
        FrameAction::Continue
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub alpha: f64,
}

/// Lay out one bar per frequency bin, left to right with a 1px gap.
/// Bars past the right edge are dropped.
pub fn bar_layout(bins: &[u8], width: f64, height: f64) -> Vec<Bar> {
    if bins.is_empty() || width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }
    let bar_width = (width / bins.len() as f64) * 2.5;
    let mut bars = Vec::with_capacity(bins.len());
    let mut x = 0.0;
    for &v in bins {
        if x >= width {
            break;
        }
        let level = v as f64 / 255.0;
        let bar_height = level * height;
        bars.push(Bar {
            x,
            y: height - bar_height,
            width: bar_width,
            height: bar_height,
            alpha: level,
        });
        x += bar_width + 1.0;
    }
    bars
}
