use awasser_core::{OrientationSampler, PerspectiveProjector};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Per-frame state for the map projection loop.
pub struct ProjectionFrame {
    pub scene: web::HtmlElement,
    pub sampler: Rc<RefCell<OrientationSampler>>,
    pub projector: Rc<RefCell<PerspectiveProjector>>,
    last_css: String,
    last_transition: &'static str,
}

impl ProjectionFrame {
    pub fn new(
        scene: web::HtmlElement,
        sampler: Rc<RefCell<OrientationSampler>>,
        projector: Rc<RefCell<PerspectiveProjector>>,
    ) -> Self {
        Self {
            scene,
            sampler,
            projector,
            last_css: String::new(),
            last_transition: "",
        }
    }

    /// Re-project and write the style only when the transform changed.
    pub fn frame(&mut self) {
        let (signal, mode) = {
            let s = self.sampler.borrow();
            (s.signal(), s.mode())
        };
        let t = self.projector.borrow().project(signal, mode);
        let css = t.css();
        if css == self.last_css && t.transition == self.last_transition {
            return;
        }
        let style = self.scene.style();
        if t.transition != self.last_transition {
            _ = style.set_property("transition", t.transition);
            self.last_transition = t.transition;
        }
        _ = style.set_property("transform", &css);
        self.last_css = css;
    }
}

/// Run `frame` on every animation frame until `running` is cleared.
pub fn start_loop(frame_ctx: Rc<RefCell<ProjectionFrame>>, running: Rc<Cell<bool>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !running.get() {
            let _ = tick_clone.borrow_mut().take();
            return;
        }
        frame_ctx.borrow_mut().frame();
        if let (Some(w), Some(cb)) = (web::window(), tick_clone.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut()>));
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
