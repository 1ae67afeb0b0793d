//! Perspective projection of the map scene.
//!
//! The scene container is tilted into an oblique "map" view that sways with
//! the orientation signal. Focusing a landmark swaps to a steeper, zoomed-in
//! framing translated so the focused point sits in the centre.

use crate::constants::*;
use crate::orientation::{OrientationSignal, SamplerMode};

/// Which landmark, if any, holds focus. Only one at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusState {
    #[default]
    Unfocused,
    Focused(usize),
}

impl FocusState {
    pub fn focused_index(self) -> Option<usize> {
        match self {
            FocusState::Focused(i) => Some(i),
            FocusState::Unfocused => None,
        }
    }

    pub fn is_focused(self, index: usize) -> bool {
        self.focused_index() == Some(index)
    }
}

/// Result of selecting a landmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Focus moved to the landmark.
    Focused(usize),
    /// The landmark already had focus: open its detail view.
    HandOff(usize),
    /// Index outside the landmark list.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    Ambient,
    Focused,
}

/// A CSS 3D transform for the scene container.
///
/// Applied as `translateZ(pre) rotateX rotateY rotateZ translate3d` for the
/// focused regime and `rotateX rotateY rotateZ translateZ` for the ambient one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedTransform {
    pub regime: Regime,
    pub pre_translate_z: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub rotate_z: f32,
    pub translate: [f32; 3],
    pub transition: &'static str,
}

impl ProjectedTransform {
    pub fn css(&self) -> String {
        match self.regime {
            Regime::Focused => format!(
                "translateZ({}px) rotateX({}deg) rotateZ({}deg) translate3d({}px, {}px, {}px)",
                self.pre_translate_z,
                self.rotate_x,
                self.rotate_z,
                self.translate[0],
                self.translate[1],
                self.translate[2]
            ),
            Regime::Ambient => format!(
                "rotateX({}deg) rotateY({}deg) rotateZ({}deg) translateZ({}px)",
                self.rotate_x, self.rotate_y, self.rotate_z, self.translate[2]
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct PerspectiveProjector {
    focus: FocusState,
    point_count: usize,
}

impl PerspectiveProjector {
    pub fn new(point_count: usize) -> Self {
        Self {
            focus: FocusState::Unfocused,
            point_count,
        }
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Replace the landmark list length. A focus that no longer fits is dropped.
    pub fn set_point_count(&mut self, point_count: usize) {
        self.point_count = point_count;
        if let FocusState::Focused(i) = self.focus {
            if i >= point_count {
                self.focus = FocusState::Unfocused;
            }
        }
    }

    pub fn select(&mut self, index: usize) -> Selection {
        if index >= self.point_count {
            return Selection::Ignored;
        }
        if self.focus.is_focused(index) {
            log::info!("[focus] hand-off to detail for point {}", index);
            return Selection::HandOff(index);
        }
        self.focus = FocusState::Focused(index);
        log::info!("[focus] point {}", index);
        Selection::Focused(index)
    }

    /// Click on empty space, or the explicit reset control.
    pub fn clear(&mut self) {
        if self.focus != FocusState::Unfocused {
            log::info!("[focus] cleared");
        }
        self.focus = FocusState::Unfocused;
    }

    pub fn project(&self, signal: OrientationSignal, mode: SamplerMode) -> ProjectedTransform {
        project(signal, mode, self.focus)
    }
}

/// Horizontal translation that centres the focused point: `-index * spacing`.
pub fn focus_offset(index: usize) -> f32 {
    -(index as f32) * POINT_SPACING_PX
}

/// Position of landmark `index` of `count` in scene pixels, centred on zero.
pub fn point_layout(index: usize, count: usize) -> (f32, f32) {
    let centre = (count.saturating_sub(1)) as f32 / 2.0;
    let step = index as f32 - centre;
    (step * POINT_SPACING_PX, step * POINT_ROW_DRIFT_PX)
}

pub fn project(signal: OrientationSignal, mode: SamplerMode, focus: FocusState) -> ProjectedTransform {
    match focus {
        FocusState::Focused(index) => ProjectedTransform {
            regime: Regime::Focused,
            pre_translate_z: FOCUS_DEPTH_PX,
            rotate_x: FOCUS_PITCH_DEG,
            rotate_y: 0.0,
            rotate_z: FOCUS_ROLL_DEG,
            translate: [focus_offset(index), FOCUS_LIFT_PX, 0.0],
            transition: FOCUS_TRANSITION,
        },
        FocusState::Unfocused => {
            // Tilt input already arrives as damped degrees.
            let (rotate_x, rotate_y) = match mode {
                SamplerMode::Pointer => (
                    signal.y * AMBIENT_PITCH_GAIN_DEG,
                    signal.x * AMBIENT_YAW_GAIN_DEG,
                ),
                SamplerMode::DeviceTilt => (signal.y, signal.x),
            };
            ProjectedTransform {
                regime: Regime::Ambient,
                pre_translate_z: 0.0,
                rotate_x,
                rotate_y,
                rotate_z: AMBIENT_ROLL_DEG,
                translate: [0.0, 0.0, AMBIENT_DEPTH_PX],
                transition: AMBIENT_TRANSITION,
            }
        }
    }
}
