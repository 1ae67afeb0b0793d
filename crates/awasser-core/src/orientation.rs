//! Orientation sampling.
//!
//! Two continuous inputs feed one 2-axis signal: the pointer position over a
//! reference container, and the device's tilt angles. Pointer input is used
//! until device-orientation access has been granted; from then on tilt input
//! supersedes it for the lifetime of the sampler.

use crate::constants::{POINTER_RANGE, TILT_BETA_DAMPING, TILT_GAMMA_DAMPING};
use glam::Vec2;

/// Normalized directional signal. `x` is the horizontal axis, `y` the vertical.
///
/// Pointer-derived values lie in `[-1, 1]`; tilt-derived values are damped
/// degrees and are not bounded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationSignal {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplerMode {
    #[default]
    Pointer,
    DeviceTilt,
}

/// Axis-aligned box of the reference container in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Outcome of asking the platform for device-orientation access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    Unsupported,
}

#[derive(Debug, Default)]
pub struct OrientationSampler {
    signal: OrientationSignal,
    mode: SamplerMode,
}

impl OrientationSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> OrientationSignal {
        self.signal
    }

    pub fn mode(&self) -> SamplerMode {
        self.mode
    }

    /// Apply a permission result. Anything but `Granted` leaves the sampler in
    /// pointer mode; there is no way back from tilt mode once entered.
    pub fn apply_permission(&mut self, outcome: PermissionOutcome) -> SamplerMode {
        match outcome {
            PermissionOutcome::Granted => {
                if self.mode != SamplerMode::DeviceTilt {
                    log::info!("[orientation] tilt input granted; pointer input retired");
                }
                self.mode = SamplerMode::DeviceTilt;
            }
            PermissionOutcome::Denied | PermissionOutcome::Unsupported => {
                log::info!("[orientation] tilt input {:?}; staying on pointer", outcome);
            }
        }
        self.mode
    }

    /// Feed a pointer position. Returns `true` when the signal changed.
    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32, rect: ContainerRect) -> bool {
        if self.mode != SamplerMode::Pointer {
            return false;
        }
        let Some(next) = pointer_signal(client_x, client_y, rect) else {
            return false;
        };
        let changed = next != self.signal;
        self.signal = next;
        changed
    }

    /// Feed a device-orientation event (`beta`, `gamma` in degrees; either may
    /// be absent on some hardware). Ignored until permission was granted.
    pub fn tilt_changed(&mut self, beta: Option<f64>, gamma: Option<f64>) -> bool {
        if self.mode != SamplerMode::DeviceTilt {
            return false;
        }
        let next = tilt_signal(beta, gamma);
        let changed = next != self.signal;
        self.signal = next;
        changed
    }
}

/// Map a pointer position to `[-1, 1]` on both axes, centre at zero.
///
/// Positions outside the container are clamped to its edges. A degenerate
/// container yields `None`.
pub fn pointer_signal(client_x: f32, client_y: f32, rect: ContainerRect) -> Option<OrientationSignal> {
    let size = Vec2::new(rect.width, rect.height);
    if !(size.x > 0.0 && size.y > 0.0) {
        return None;
    }
    let frac = (Vec2::new(client_x, client_y) - Vec2::new(rect.left, rect.top)) / size;
    if !frac.is_finite() {
        return None;
    }
    let v = (frac.clamp(Vec2::ZERO, Vec2::ONE) - Vec2::splat(0.5)) * 2.0 * POINTER_RANGE;
    Some(OrientationSignal { x: v.x, y: v.y })
}

pub fn tilt_signal(beta: Option<f64>, gamma: Option<f64>) -> OrientationSignal {
    OrientationSignal {
        x: gamma.unwrap_or(0.0) as f32 * TILT_GAMMA_DAMPING,
        y: beta.unwrap_or(0.0) as f32 * TILT_BETA_DAMPING,
    }
}
