//! Map explorer: landmarks laid out on a tilted plane that sways with the
//! pointer or device tilt and zooms onto a focused landmark.

use crate::constants::*;
use crate::dom::{self, Listener};
use crate::events;
use crate::frame::{self, ProjectionFrame};
use crate::input::parse_index;
use awasser_core::content::Artwork;
use awasser_core::{point_layout, OrientationSampler, PerspectiveProjector, SamplerMode, Selection};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Live explorer state. Dropping it stops the frame loop and removes every
/// listener it installed.
pub struct Explorer {
    running: Rc<Cell<bool>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl Explorer {
    /// `on_open` receives the index of a landmark selected a second time.
    pub fn mount(
        document: &web::Document,
        artworks: &[Artwork],
        on_open: impl Fn(usize) + 'static,
    ) -> anyhow::Result<Self> {
        let container = document
            .get_element_by_id(MAP_CONTAINER_ID)
            .ok_or_else(|| anyhow::anyhow!("missing #{}", MAP_CONTAINER_ID))?;
        let scene = dom::html_element(document, MAP_SCENE_ID)
            .ok_or_else(|| anyhow::anyhow!("missing #{}", MAP_SCENE_ID))?;

        render_landmarks(document, &scene, artworks)?;

        let sampler = Rc::new(RefCell::new(OrientationSampler::new()));
        let projector = Rc::new(RefCell::new(PerspectiveProjector::new(artworks.len())));
        let running = Rc::new(Cell::new(true));
        let listeners = Rc::new(RefCell::new(Vec::new()));

        {
            let mut l = listeners.borrow_mut();
            l.extend(events::wire_sampler_pointer(container.clone(), sampler.clone()));

            let p = projector.clone();
            let doc = document.clone();
            let on_open = Rc::new(on_open);
            l.extend(Listener::new(&scene, "click", move |ev: web::Event| {
                let index = ev
                    .target()
                    .and_then(|t| t.dyn_into::<web::Element>().ok())
                    .and_then(|el| el.closest(&format!(".{}", LANDMARK_CLASS)).ok().flatten())
                    .and_then(|el| parse_index(el.get_attribute(LANDMARK_INDEX_ATTR)));
                let selection = match index {
                    Some(i) => p.borrow_mut().select(i),
                    None => {
                        p.borrow_mut().clear();
                        Selection::Ignored
                    }
                };
                mark_focus(&doc, p.borrow().focus().focused_index());
                if let Selection::HandOff(i) = selection {
                    on_open(i);
                }
            }));

            let p = projector.clone();
            let doc = document.clone();
            l.extend(Listener::on_click(document, MAP_RESET_ID, move || {
                p.borrow_mut().clear();
                mark_focus(&doc, None);
            }));

            let s = sampler.clone();
            let weak_listeners = Rc::downgrade(&listeners);
            let doc = document.clone();
            l.extend(Listener::on_click(document, MOTION_BUTTON_ID, move || {
                let s = s.clone();
                let weak_listeners = weak_listeners.clone();
                let doc = doc.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let outcome = events::request_permission().await;
                    // The explorer may have been left while the prompt was open.
                    let Some(listeners) = weak_listeners.upgrade() else {
                        return;
                    };
                    let was_tilt = s.borrow().mode() == SamplerMode::DeviceTilt;
                    if s.borrow_mut().apply_permission(outcome) == SamplerMode::DeviceTilt && !was_tilt {
                        listeners
                            .borrow_mut()
                            .extend(events::wire_device_orientation(s.clone()));
                        dom::set_hidden(&doc, MOTION_BUTTON_ID, true);
                    }
                });
            }));
        }

        let frame_ctx = Rc::new(RefCell::new(ProjectionFrame::new(scene, sampler, projector)));
        frame::start_loop(frame_ctx, running.clone());
        log::info!("[explorer] mounted {} landmarks", artworks.len());

        Ok(Self { running, listeners })
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.running.set(false);
        self.listeners.borrow_mut().clear();
        log::info!("[explorer] unmounted");
    }
}

fn render_landmarks(
    document: &web::Document,
    scene: &web::HtmlElement,
    artworks: &[Artwork],
) -> anyhow::Result<()> {
    let js = |e: wasm_bindgen::JsValue| anyhow::anyhow!("{:?}", e);
    if let Ok(old) = scene.query_selector_all(&format!(".{}", LANDMARK_CLASS)) {
        for i in 0..old.length() {
            if let Some(node) = old.item(i).and_then(|n| n.dyn_into::<web::Element>().ok()) {
                node.remove();
            }
        }
    }
    for (i, art) in artworks.iter().enumerate() {
        let (x, y) = point_layout(i, artworks.len());
        let el = document.create_element("div").map_err(js)?;
        el.set_class_name(LANDMARK_CLASS);
        el.set_attribute(LANDMARK_INDEX_ATTR, &i.to_string()).map_err(js)?;
        el.set_attribute(
            "style",
            &format!("transform: translate({}px, {}px) translateZ(0); z-index: {}", x, y, i + 1),
        )
        .map_err(js)?;

        let title = document.create_element("h4").map_err(js)?;
        title.set_text_content(Some(&art.title));
        let artist = document.create_element("p").map_err(js)?;
        artist.set_text_content(Some(&format!("@{}", art.artist)));
        let place = document.create_element("span").map_err(js)?;
        place.set_text_content(Some(&art.location.name));
        for child in [&title, &artist, &place] {
            el.append_child(child).map_err(js)?;
        }
        scene.append_child(&el).map_err(js)?;
    }
    Ok(())
}

fn mark_focus(document: &web::Document, focused: Option<usize>) {
    let Ok(nodes) = document.query_selector_all(&format!(".{}", LANDMARK_CLASS)) else {
        return;
    };
    for i in 0..nodes.length() {
        let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<web::Element>().ok()) else {
            continue;
        };
        let index = parse_index(el.get_attribute(LANDMARK_INDEX_ATTR));
        let cl = el.class_list();
        if index.is_some() && index == focused {
            _ = cl.add_1(FOCUSED_CLASS);
        } else {
            _ = cl.remove_1(FOCUSED_CLASS);
        }
    }
    dom::set_pressed(document, MAP_RESET_ID, focused.is_some());
}
