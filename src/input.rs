// Pure pointer/slider helpers shared by the event wiring.

/// Horizontal drag tracked between pointer events.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct DragTracker {
    pub active: bool,
    pub last_x: f32,
}

impl DragTracker {
    #[inline]
    pub fn begin(&mut self, x: f32) {
        self.active = true;
        self.last_x = x;
    }

    /// Pixels moved since the previous sample, or `None` when not dragging.
    #[inline]
    pub fn move_to(&mut self, x: f32) -> Option<f32> {
        if !self.active {
            return None;
        }
        let delta = x - self.last_x;
        self.last_x = x;
        Some(delta)
    }

    #[inline]
    pub fn end(&mut self) {
        self.active = false;
    }
}

/// Parse a range input's value; non-numeric input is ignored.
#[inline]
pub fn parse_slider(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Index stored on a landmark element, if any.
#[inline]
pub fn parse_index(attr: Option<String>) -> Option<usize> {
    attr.and_then(|s| s.trim().parse::<usize>().ok())
}

/// Width and height for a frame downscaled to at most `max_width`, keeping aspect.
#[inline]
pub fn capture_size(src_w: u32, src_h: u32, max_width: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    if src_w <= max_width {
        return (src_w, src_h);
    }
    let h = (src_h as f64 * max_width as f64 / src_w as f64).round() as u32;
    (max_width, h.max(1))
}
