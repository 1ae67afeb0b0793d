use crate::audio::WebAudio;
use crate::constants::SPECTRUM_RGB;
use crate::dom;
use awasser_core::{bar_layout, FrameAction, FrameLoop, ViewerSession};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

type Tick = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Spectrum drawing for the spatial stage. One loop at a time; it ends on
/// the first frame after the stage went inactive.
pub struct SpectrumView {
    canvas: web::HtmlCanvasElement,
    ctx2d: web::CanvasRenderingContext2d,
    frame_loop: Rc<RefCell<FrameLoop>>,
}

impl SpectrumView {
    pub fn new(canvas: web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let ctx2d = canvas
            .get_context("2d")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .ok_or_else(|| anyhow::anyhow!("no 2d context"))?
            .dyn_into::<web::CanvasRenderingContext2d>()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self {
            canvas,
            ctx2d,
            frame_loop: Rc::new(RefCell::new(FrameLoop::new())),
        })
    }

    pub fn start(&self, session: Weak<RefCell<ViewerSession<WebAudio>>>) {
        if !self.frame_loop.borrow_mut().begin() {
            return;
        }
        dom::sync_canvas_backing_size(&self.canvas);
        let tick: Tick = Rc::new(RefCell::new(None));
        let tick_clone = tick.clone();
        let canvas = self.canvas.clone();
        let ctx2d = self.ctx2d.clone();
        let frame_loop = self.frame_loop.clone();
        let mut bins: Vec<u8> = Vec::new();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            let Some(session) = session.upgrade() else {
                let _ = tick_clone.borrow_mut().take();
                return;
            };
            let active = session
                .try_borrow()
                .map(|s| s.stage().is_active())
                .unwrap_or(true);
            if frame_loop.borrow_mut().on_frame(active) == FrameAction::Terminate {
                clear(&canvas, &ctx2d);
                // Drop our own closure: nothing is scheduled any more.
                let _ = tick_clone.borrow_mut().take();
                return;
            }
            let sampled = session
                .try_borrow()
                .map(|s| s.sample_spectrum(&mut bins))
                .unwrap_or(false);
            if sampled {
                draw(&canvas, &ctx2d, &bins);
            }
            request_frame(&tick_clone);
        }) as Box<dyn FnMut()>));
        request_frame(&tick);
    }
}

fn request_frame(tick: &Tick) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn clear(canvas: &web::HtmlCanvasElement, ctx2d: &web::CanvasRenderingContext2d) {
    ctx2d.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
}

fn draw(canvas: &web::HtmlCanvasElement, ctx2d: &web::CanvasRenderingContext2d, bins: &[u8]) {
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    ctx2d.clear_rect(0.0, 0.0, w, h);
    let (r, g, b) = SPECTRUM_RGB;
    for bar in bar_layout(bins, w, h) {
        ctx2d.set_fill_style_str(&format!("rgba({}, {}, {}, {:.3})", r, g, b, bar.alpha));
        ctx2d.fill_rect(bar.x, bar.y, bar.width, bar.height);
    }
}
