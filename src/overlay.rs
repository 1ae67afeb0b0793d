use crate::constants::{RETRY_CLASS, STATUS_FAILED_CLASS, STATUS_PENDING_CLASS};
use crate::dom;
use awasser_core::view::LoadState;
use web_sys as web;

// Status regions: `<div id="..-status"><span class="message"></span><button class="retry"></button></div>`

#[inline]
pub fn show_pending(document: &web::Document, region_id: &str, message: &str) {
    if let Some(el) = document.get_element_by_id(region_id) {
        let cl = el.class_list();
        _ = cl.add_1(STATUS_PENDING_CLASS);
        _ = cl.remove_1(STATUS_FAILED_CLASS);
        dom::set_element_hidden(&el, false);
        set_message(&el, message);
        set_retry_visible(&el, false);
    }
}

#[inline]
pub fn show_failed(document: &web::Document, region_id: &str, message: &str) {
    if let Some(el) = document.get_element_by_id(region_id) {
        let cl = el.class_list();
        _ = cl.remove_1(STATUS_PENDING_CLASS);
        _ = cl.add_1(STATUS_FAILED_CLASS);
        dom::set_element_hidden(&el, false);
        set_message(&el, message);
        set_retry_visible(&el, true);
    }
}

#[inline]
pub fn hide(document: &web::Document, region_id: &str) {
    if let Some(el) = document.get_element_by_id(region_id) {
        let cl = el.class_list();
        _ = cl.remove_1(STATUS_PENDING_CLASS);
        _ = cl.remove_1(STATUS_FAILED_CLASS);
        dom::set_element_hidden(&el, true);
    }
}

/// Reflect a load state in its status region. `Ready` and `Idle` hide it.
pub fn render<T>(document: &web::Document, region_id: &str, state: &LoadState<T>, pending: &str) {
    match state {
        LoadState::Pending => show_pending(document, region_id, pending),
        LoadState::Failed(msg) => show_failed(document, region_id, msg),
        LoadState::Idle | LoadState::Ready(_) => hide(document, region_id),
    }
}

/// The `.retry` button inside a status region.
pub fn retry_button(document: &web::Document, region_id: &str) -> Option<web::Element> {
    document
        .get_element_by_id(region_id)?
        .query_selector(&format!(".{}", RETRY_CLASS))
        .ok()
        .flatten()
}

fn set_message(region: &web::Element, message: &str) {
    match region.query_selector(".message").ok().flatten() {
        Some(m) => m.set_text_content(Some(message)),
        None => region.set_text_content(Some(message)),
    }
}

fn set_retry_visible(region: &web::Element, visible: bool) {
    if let Ok(Some(btn)) = region.query_selector(&format!(".{}", RETRY_CLASS)) {
        dom::set_element_hidden(&btn, !visible);
    }
}
