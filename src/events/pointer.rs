use crate::dom::{self, Listener};
use crate::input::DragTracker;
use awasser_core::OrientationSampler;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Window-level pointer tracking for the map sampler. Positions are taken
/// relative to `container`, whose box is re-read on every event.
pub fn wire_sampler_pointer(
    container: web::Element,
    sampler: Rc<RefCell<OrientationSampler>>,
) -> Option<Listener> {
    let window = web::window()?;
    Listener::new(&window, "pointermove", move |ev: web::Event| {
        let Ok(ev) = ev.dyn_into::<web::PointerEvent>() else {
            return;
        };
        let rect = dom::container_rect(&container);
        sampler
            .borrow_mut()
            .pointer_moved(ev.client_x() as f32, ev.client_y() as f32, rect);
    })
}

/// Horizontal drag on `surface`; `on_drag` receives the pixel delta of each move.
pub fn wire_drag(surface: &web::Element, mut on_drag: impl FnMut(f32) + 'static) -> Vec<Listener> {
    let tracker = Rc::new(RefCell::new(DragTracker::default()));
    let mut listeners = Vec::new();

    let t = tracker.clone();
    let target = surface.clone();
    listeners.extend(Listener::new(surface, "pointerdown", move |ev: web::Event| {
        let Ok(ev) = ev.dyn_into::<web::PointerEvent>() else {
            return;
        };
        _ = target.set_pointer_capture(ev.pointer_id());
        t.borrow_mut().begin(ev.client_x() as f32);
    }));

    let t = tracker.clone();
    listeners.extend(Listener::new(surface, "pointermove", move |ev: web::Event| {
        let Ok(ev) = ev.dyn_into::<web::PointerEvent>() else {
            return;
        };
        let delta = t.borrow_mut().move_to(ev.client_x() as f32);
        if let Some(dx) = delta {
            on_drag(dx);
        }
    }));

    for event in ["pointerup", "pointercancel", "pointerleave"] {
        let t = tracker.clone();
        listeners.extend(Listener::new(surface, event, move |_| t.borrow_mut().end()));
    }
    listeners
}
