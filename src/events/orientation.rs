use crate::dom::{self, Listener};
use awasser_core::{OrientationSampler, PermissionOutcome};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// Ask for device-orientation access. Browsers that gate it expose
/// `DeviceOrientationEvent.requestPermission`; elsewhere access is implicit.
pub async fn request_permission() -> PermissionOutcome {
    let global = js_sys::global();
    let Ok(ctor) = js_sys::Reflect::get(&global, &JsValue::from_str("DeviceOrientationEvent")) else {
        return PermissionOutcome::Unsupported;
    };
    if ctor.is_undefined() || ctor.is_null() {
        return PermissionOutcome::Unsupported;
    }
    let request = js_sys::Reflect::get(&ctor, &JsValue::from_str("requestPermission"))
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
    let Some(request) = request else {
        return PermissionOutcome::Granted;
    };
    let promise = match request.call0(&ctor) {
        Ok(p) => p,
        Err(e) => {
            log::info!("[orientation] requestPermission threw: {:?}", e);
            return PermissionOutcome::Denied;
        }
    };
    let Ok(promise) = promise.dyn_into::<js_sys::Promise>() else {
        return PermissionOutcome::Denied;
    };
    match dom::await_promise(promise).await {
        Ok(v) if v.as_string().as_deref() == Some("granted") => PermissionOutcome::Granted,
        Ok(_) => PermissionOutcome::Denied,
        Err(e) => {
            log::info!("[orientation] permission request rejected: {}", e);
            PermissionOutcome::Denied
        }
    }
}

/// Passive `deviceorientation` subscription feeding the sampler.
pub fn wire_device_orientation(sampler: Rc<RefCell<OrientationSampler>>) -> Option<Listener> {
    let window = web::window()?;
    Listener::passive(&window, "deviceorientation", move |ev: web::Event| {
        let Ok(ev) = ev.dyn_into::<web::DeviceOrientationEvent>() else {
            return;
        };
        sampler.borrow_mut().tilt_changed(ev.beta(), ev.gamma());
    })
}
