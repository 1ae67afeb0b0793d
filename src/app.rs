//! Application shell: view routing, service clients and the list views.
//!
//! Views live in `<section id="view-<id>">` blocks and only one is visible.
//! Leaving the map drops the [`Explorer`]; leaving the AR view drops the
//! [`Viewer`], which tears down every resource it opened.

use crate::config::AppConfig;
use crate::constants::*;
use crate::dom::{self, Listener};
use crate::explorer::Explorer;
use crate::overlay;
use crate::services::{GeminiClient, RestStore};
use crate::storage;
use crate::viewer::{Viewer, ViewerDeps};
use awasser_core::content::{self, Artwork, Exhibition, MediaAsset, MediaKind, NewMediaAsset};
use awasser_core::recent::RecentlyViewed;
use awasser_core::view::{LoadState, Loader, PortalMode, Router, ViewState};
use awasser_core::Error;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

const ALL_VIEWS: [ViewState; 8] = [
    ViewState::Landing,
    ViewState::Explore,
    ViewState::ArView,
    ViewState::Gallery,
    ViewState::Dashboard,
    ViewState::Play,
    ViewState::JourneyLanding,
    ViewState::Exhibitions,
];

pub type SharedApp = Rc<RefCell<App>>;

pub struct App {
    document: web::Document,
    router: Router,
    config: Rc<AppConfig>,
    store: Option<Rc<RestStore>>,
    generation: Option<Rc<GeminiClient>>,
    artworks: Loader<Vec<Artwork>>,
    exhibitions: Loader<Vec<Exhibition>>,
    assets: Loader<Vec<MediaAsset>>,
    ingest: Loader<MediaAsset>,
    /// Exhibition shown on the journey landing.
    journey: Option<Exhibition>,
    recent: RecentlyViewed,
    explorer: Option<Explorer>,
    viewer: Option<Viewer>,
    listeners: Vec<Listener>,
}

/// Resources released when a view is left. Dropped outside the app borrow.
struct Departed {
    _explorer: Option<Explorer>,
    _viewer: Option<Viewer>,
}

fn no_store() -> Error {
    Error::store("*", "no content store configured")
}

/// Read the embedded `<script id="awasser-config">` block.
pub fn read_config(document: &web::Document) -> AppConfig {
    let raw = document
        .get_element_by_id(CONFIG_SCRIPT_ID)
        .and_then(|el| el.text_content())
        .unwrap_or_default();
    match AppConfig::from_json(&raw) {
        Ok(config) => config,
        Err(e) => {
            log::error!("[config] unreadable, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

impl App {
    pub fn boot(document: web::Document, config: AppConfig) -> SharedApp {
        let store = config.store().map(|(url, key)| Rc::new(RestStore::new(url, key)));
        let generation = config
            .generation_key()
            .map(|key| Rc::new(GeminiClient::new(key, &config)));
        if store.is_none() {
            log::info!("[config] no content store; lists will show as unavailable");
        }
        if generation.is_none() {
            log::info!("[config] no generation key; guide features disabled");
        }
        let app = Rc::new(RefCell::new(App {
            document: document.clone(),
            router: Router::new(),
            config: Rc::new(config),
            store,
            generation,
            artworks: Loader::new(),
            exhibitions: Loader::new(),
            assets: Loader::new(),
            ingest: Loader::new(),
            journey: None,
            recent: storage::load_recent(),
            explorer: None,
            viewer: None,
            listeners: Vec::new(),
        }));
        // Shell listeners hold the app for the lifetime of the page.
        let listeners = wire_shell(&app, &document);
        app.borrow_mut().listeners = listeners;
        let view = app.borrow().router.view();
        show_view(&document, view);
        enter(&app, view);
        app
    }
}

/// Navigate on the next turn of the event loop. Listeners owned by the view
/// being left may be the caller, so the view is never dropped synchronously.
pub fn navigate(app: &SharedApp, to: ViewState) {
    let app = app.clone();
    spawn_local(async move {
        apply(&app, |router| router.navigate(to));
    });
}

fn set_portal(app: &SharedApp, mode: PortalMode) {
    let app = app.clone();
    spawn_local(async move {
        apply(&app, |router| router.set_portal(mode));
    });
}

fn apply(app: &SharedApp, change: impl FnOnce(&mut Router) -> Option<ViewState>) {
    let (left, view, departed) = {
        let mut a = app.borrow_mut();
        let Some(left) = change(&mut a.router) else {
            return;
        };
        let departed = Departed {
            _explorer: if left == ViewState::Explore { a.explorer.take() } else { None },
            _viewer: if left == ViewState::ArView { a.viewer.take() } else { None },
        };
        (left, a.router.view(), departed)
    };
    drop(departed);
    log::info!("[router] {} -> {}", left.id(), view.id());
    let document = app.borrow().document.clone();
    show_view(&document, view);
    enter(app, view);
}

fn show_view(document: &web::Document, view: ViewState) {
    for v in ALL_VIEWS {
        dom::set_hidden(document, &format!("{}{}", VIEW_PREFIX, v.id()), v != view);
    }
    dom::set_hidden(document, CHROME_ID, !view.shows_chrome());
}

fn enter(app: &SharedApp, view: ViewState) {
    match view {
        ViewState::Landing | ViewState::Explore | ViewState::Gallery => {
            let ready = app.borrow().artworks.state().ready().is_some();
            if ready {
                artworks_settled(app);
            } else if !app.borrow().artworks.state().is_pending() {
                load_artworks(app);
            }
        }
        ViewState::Exhibitions => load_exhibitions(app),
        ViewState::Dashboard => load_assets(app),
        ViewState::JourneyLanding => render_journey(app),
        // The viewer mounts itself; the play view is static markup.
        ViewState::ArView | ViewState::Play => {}
    }
}

// ---------------- Shell wiring ----------------

fn wire_shell(app: &SharedApp, document: &web::Document) -> Vec<Listener> {
    let mut listeners = Vec::new();

    // Delegated navigation: any element carrying data-nav / data-portal.
    let a = app.clone();
    listeners.extend(Listener::new(document, "click", move |ev: web::Event| {
        let Some(el) = ev.target().and_then(|t| t.dyn_into::<web::Element>().ok()) else {
            return;
        };
        if let Some(target) = el.closest(&format!("[{}]", NAV_ATTR)).ok().flatten() {
            if let Some(view) = target.get_attribute(NAV_ATTR).as_deref().and_then(ViewState::from_id) {
                navigate(&a, view);
            }
            return;
        }
        if let Some(target) = el.closest(&format!("[{}]", PORTAL_ATTR)).ok().flatten() {
            let mode = match target.get_attribute(PORTAL_ATTR).as_deref() {
                Some("visitor") => PortalMode::Visitor,
                Some("creator") => PortalMode::Creator,
                Some("curator") => PortalMode::Curator,
                _ => return,
            };
            set_portal(&a, mode);
        }
    }));

    for list_id in [GALLERY_LIST_ID, RECENT_LIST_ID] {
        let Some(list) = document.get_element_by_id(list_id) else {
            continue;
        };
        let a = app.clone();
        listeners.extend(Listener::new(&list, "click", move |ev: web::Event| {
            let id = ev
                .target()
                .and_then(|t| t.dyn_into::<web::Element>().ok())
                .and_then(|el| el.closest(&format!("[{}]", ARTWORK_ID_ATTR)).ok().flatten())
                .and_then(|el| el.get_attribute(ARTWORK_ID_ATTR));
            if let Some(id) = id {
                open_artwork(&a, id);
            }
        }));
    }

    if let Some(list) = document.get_element_by_id(EXHIBITIONS_LIST_ID) {
        let a = app.clone();
        listeners.extend(Listener::new(&list, "click", move |ev: web::Event| {
            let id = ev
                .target()
                .and_then(|t| t.dyn_into::<web::Element>().ok())
                .and_then(|el| el.closest(&format!("[{}]", EXHIBITION_ID_ATTR)).ok().flatten())
                .and_then(|el| el.get_attribute(EXHIBITION_ID_ATTR));
            if let Some(id) = id {
                select_journey(&a, &id);
            }
        }));
    }

    let a = app.clone();
    listeners.extend(Listener::on_click(document, ASSET_ADD_ID, move || ingest_asset(&a)));

    if let Some(list) = document.get_element_by_id(DASHBOARD_LIST_ID) {
        let a = app.clone();
        listeners.extend(Listener::new(&list, "click", move |ev: web::Event| {
            let id = ev
                .target()
                .and_then(|t| t.dyn_into::<web::Element>().ok())
                .and_then(|el| el.closest(&format!("[{}]", ASSET_ID_ATTR)).ok().flatten())
                .and_then(|el| el.get_attribute(ASSET_ID_ATTR));
            if let Some(id) = id {
                delete_asset(&a, id);
            }
        }));
    }

    let retries: [(&str, fn(&SharedApp)); 5] = [
        (MAP_STATUS_ID, load_artworks),
        (GALLERY_STATUS_ID, load_artworks),
        (EXHIBITIONS_STATUS_ID, load_exhibitions),
        (DASHBOARD_STATUS_ID, load_assets),
        (ASSET_INGEST_STATUS_ID, ingest_asset),
    ];
    for (region_id, reload) in retries {
        let Some(button) = overlay::retry_button(document, region_id) else {
            continue;
        };
        let a = app.clone();
        listeners.extend(Listener::new(&button, "click", move |_| reload(&a)));
    }
    listeners
}

// ---------------- Artworks: map, gallery, viewer ----------------

fn load_artworks(app: &SharedApp) {
    let (ticket, store, document) = {
        let mut a = app.borrow_mut();
        let ticket = a.artworks.begin();
        (ticket, a.store.clone(), a.document.clone())
    };
    render_artwork_status(&document, app.borrow().artworks.state());
    let app = app.clone();
    spawn_local(async move {
        let result = match store {
            Some(store) => content::list_artworks(store.as_ref()).await,
            None => Err(no_store()),
        };
        let result = result.map_err(|e| {
            log::error!("[store] artworks: {}", e);
            e.user_message()
        });
        if !app.borrow_mut().artworks.complete(ticket, result) {
            return;
        }
        render_artwork_status(&document, app.borrow().artworks.state());
        artworks_settled(&app);
    });
}

fn render_artwork_status(document: &web::Document, state: &LoadState<Vec<Artwork>>) {
    overlay::render(document, MAP_STATUS_ID, state, "Loading the map…");
    overlay::render(document, GALLERY_STATUS_ID, state, "Loading the collection…");
}

/// Build whatever the current view shows from the loaded artworks.
fn artworks_settled(app: &SharedApp) {
    let view = app.borrow().router.view();
    match view {
        ViewState::Explore => mount_explorer(app),
        ViewState::Gallery => render_gallery(&app.borrow()),
        ViewState::Landing => render_recent(&app.borrow()),
        _ => {}
    }
}

fn mount_explorer(app: &SharedApp) {
    let (document, artworks) = {
        let a = app.borrow();
        let Some(list) = a.artworks.state().ready() else {
            return;
        };
        (a.document.clone(), list.clone())
    };
    // Unmount the previous explorer before its replacement installs listeners.
    drop(app.borrow_mut().explorer.take());
    let weak = Rc::downgrade(app);
    let ids: Vec<String> = artworks.iter().map(|a| a.id.clone()).collect();
    let mounted = Explorer::mount(&document, &artworks, move |index| {
        if let (Some(app), Some(id)) = (weak.upgrade(), ids.get(index)) {
            open_artwork(&app, id.clone());
        }
    });
    match mounted {
        Ok(explorer) => app.borrow_mut().explorer = Some(explorer),
        Err(e) => log::error!("[explorer] mount failed: {}", e),
    }
}

/// Open the AR viewer for `id`. Deferred: the caller is usually a listener
/// owned by the explorer, which navigation drops.
pub fn open_artwork(app: &SharedApp, id: String) {
    let app = app.clone();
    spawn_local(async move {
        let found = app
            .borrow()
            .artworks
            .state()
            .ready()
            .and_then(|list| list.iter().find(|a| a.id == id).cloned());
        let Some(artwork) = found else {
            log::info!("[viewer] unknown artwork {}", id);
            return;
        };
        {
            let mut a = app.borrow_mut();
            a.recent.push(&artwork.id);
            storage::save_recent(&a.recent);
        }
        apply(&app, |router| router.navigate(ViewState::ArView));
        let (document, deps) = {
            let a = app.borrow();
            (
                a.document.clone(),
                ViewerDeps {
                    config: a.config.clone(),
                    generation: a.generation.clone(),
                },
            )
        };
        // A viewer left open on another artwork is replaced, not stacked.
        drop(app.borrow_mut().viewer.take());
        let weak = Rc::downgrade(&app);
        let viewer = Viewer::open(&document, artwork, deps, move || {
            if let Some(app) = weak.upgrade() {
                navigate(&app, ViewState::Explore);
            }
        });
        app.borrow_mut().viewer = Some(viewer);
    });
}

// ---------------- Lists ----------------

struct Card<'a> {
    key_attr: &'static str,
    key: &'a str,
    title: &'a str,
    detail: String,
    action: Option<&'static str>,
}

fn render_cards<'a>(
    document: &web::Document,
    list_id: &str,
    cards: impl IntoIterator<Item = Card<'a>>,
) -> anyhow::Result<()> {
    let js = |e: wasm_bindgen::JsValue| anyhow::anyhow!("{:?}", e);
    let Some(list) = document.get_element_by_id(list_id) else {
        return Ok(());
    };
    list.set_inner_html("");
    for card in cards {
        let item = document.create_element("li").map_err(js)?;
        item.set_class_name(CARD_CLASS);
        let title = document.create_element("h4").map_err(js)?;
        title.set_text_content(Some(card.title));
        let detail = document.create_element("p").map_err(js)?;
        detail.set_text_content(Some(&card.detail));
        item.append_child(&title).map_err(js)?;
        item.append_child(&detail).map_err(js)?;
        match card.action {
            // The key sits on the action button so only it triggers.
            Some(label) => {
                let btn = document.create_element("button").map_err(js)?;
                btn.set_text_content(Some(label));
                btn.set_attribute(card.key_attr, card.key).map_err(js)?;
                item.append_child(&btn).map_err(js)?;
            }
            None => item.set_attribute(card.key_attr, card.key).map_err(js)?,
        }
        list.append_child(&item).map_err(js)?;
    }
    Ok(())
}

fn artwork_card(art: &Artwork) -> Card<'_> {
    Card {
        key_attr: ARTWORK_ID_ATTR,
        key: &art.id,
        title: &art.title,
        detail: format!("@{} · {}", art.artist, art.location.name),
        action: None,
    }
}

fn render_gallery(app: &App) {
    let Some(list) = app.artworks.state().ready() else {
        return;
    };
    if let Err(e) = render_cards(&app.document, GALLERY_LIST_ID, list.iter().map(artwork_card)) {
        log::error!("[gallery] render failed: {}", e);
    }
}

fn render_recent(app: &App) {
    let list = app.artworks.state().ready().map(Vec::as_slice).unwrap_or(&[]);
    let cards = app
        .recent
        .ids()
        .iter()
        .filter_map(|id| list.iter().find(|a| &a.id == id))
        .map(artwork_card);
    if let Err(e) = render_cards(&app.document, RECENT_LIST_ID, cards) {
        log::error!("[recent] render failed: {}", e);
    }
}

fn load_exhibitions(app: &SharedApp) {
    let (ticket, store, document) = {
        let mut a = app.borrow_mut();
        (a.exhibitions.begin(), a.store.clone(), a.document.clone())
    };
    overlay::render(
        &document,
        EXHIBITIONS_STATUS_ID,
        app.borrow().exhibitions.state(),
        "Loading journeys…",
    );
    let app = app.clone();
    spawn_local(async move {
        let result = match store {
            Some(store) => content::list_exhibitions(store.as_ref()).await,
            None => Err(no_store()),
        };
        let result = result.map_err(|e| {
            log::error!("[store] exhibitions: {}", e);
            e.user_message()
        });
        let mut a = app.borrow_mut();
        if !a.exhibitions.complete(ticket, result) {
            return;
        }
        overlay::render(&document, EXHIBITIONS_STATUS_ID, a.exhibitions.state(), "");
        if let Some(list) = a.exhibitions.state().ready() {
            let cards = list.iter().map(|ex| Card {
                key_attr: EXHIBITION_ID_ATTR,
                key: &ex.id,
                title: &ex.theme,
                detail: format!(
                    "{} · {} · {} stops",
                    ex.city,
                    ex.organization,
                    ex.points.len()
                ),
                action: None,
            });
            if let Err(e) = render_cards(&document, EXHIBITIONS_LIST_ID, cards) {
                log::error!("[exhibitions] render failed: {}", e);
            }
        }
    });
}

fn select_journey(app: &SharedApp, id: &str) {
    let found = app
        .borrow()
        .exhibitions
        .state()
        .ready()
        .and_then(|list| list.iter().find(|ex| ex.id == id).cloned());
    let Some(journey) = found else {
        log::info!("[journey] unknown exhibition {}", id);
        return;
    };
    log::info!("[journey] opening {}", journey.id);
    app.borrow_mut().journey = Some(journey);
    navigate(app, ViewState::JourneyLanding);
}

fn render_journey(app: &SharedApp) {
    let journey = app.borrow().journey.clone();
    let Some(journey) = journey else {
        navigate(app, ViewState::Exhibitions);
        return;
    };
    let document = app.borrow().document.clone();
    let doc = &document;
    dom::set_text(doc, JOURNEY_TITLE_ID, &journey.theme);
    dom::set_text(doc, JOURNEY_META_ID, &journey.summary());
    if let Some(qr) = doc.get_element_by_id(JOURNEY_QR_ID) {
        _ = qr.set_attribute("src", &journey.qr_code_url);
        dom::set_element_hidden(&qr, journey.qr_code_url.is_empty());
    }
    let cards = journey.points.iter().map(|poi| Card {
        key_attr: POI_ID_ATTR,
        key: &poi.id,
        title: &poi.title,
        detail: format!("{} · {}", poi.location.name, poi.teaser()),
        action: None,
    });
    if let Err(e) = render_cards(doc, JOURNEY_POINTS_ID, cards) {
        log::error!("[journey] render failed: {}", e);
    }
}

fn load_assets(app: &SharedApp) {
    let (ticket, store, document) = {
        let mut a = app.borrow_mut();
        (a.assets.begin(), a.store.clone(), a.document.clone())
    };
    overlay::render(&document, DASHBOARD_STATUS_ID, app.borrow().assets.state(), "Loading the archive…");
    let app = app.clone();
    spawn_local(async move {
        let result = match store {
            Some(store) => content::list_media_assets(store.as_ref()).await,
            None => Err(no_store()),
        };
        let result = result.map_err(|e| {
            log::error!("[store] media assets: {}", e);
            e.user_message()
        });
        let mut a = app.borrow_mut();
        if a.assets.complete(ticket, result) {
            render_assets(&a);
        }
    });
}

fn render_assets(app: &App) {
    overlay::render(&app.document, DASHBOARD_STATUS_ID, app.assets.state(), "");
    let Some(list) = app.assets.state().ready() else {
        return;
    };
    let cards = list.iter().map(|asset| Card {
        key_attr: ASSET_ID_ATTR,
        key: &asset.id,
        title: &asset.title,
        detail: format!("{:?} · {:.1} MB · {:?}", asset.kind, asset.size_in_mb, asset.status),
        action: Some("Delete"),
    });
    if let Err(e) = render_cards(&app.document, DASHBOARD_LIST_ID, cards) {
        log::error!("[dashboard] render failed: {}", e);
    }
}

fn delete_asset(app: &SharedApp, id: String) {
    let Some(store) = app.borrow().store.clone() else {
        return;
    };
    let app = app.clone();
    spawn_local(async move {
        match content::delete_media_asset(store.as_ref(), &id).await {
            Ok(()) => {
                log::info!("[store] deleted media asset {}", id);
                load_assets(&app);
            }
            Err(e) => {
                log::error!("[store] delete {}: {}", id, e);
                let document = app.borrow().document.clone();
                overlay::show_failed(&document, DASHBOARD_STATUS_ID, &e.user_message());
            }
        }
    });
}

/// Add the asset described by the dashboard's ingest form.
fn ingest_asset(app: &SharedApp) {
    let document = app.borrow().document.clone();
    let title = dom::input_value(&document, ASSET_TITLE_INPUT_ID).unwrap_or_default();
    let kind = dom::select_value(&document, ASSET_KIND_INPUT_ID)
        .as_deref()
        .and_then(MediaKind::parse)
        .unwrap_or(MediaKind::Photo);
    let url = dom::input_value(&document, ASSET_URL_INPUT_ID).unwrap_or_default();
    let Some(asset) = NewMediaAsset::ingest(&title, kind, &url) else {
        overlay::show_failed(&document, ASSET_INGEST_STATUS_ID, "Give the asset a title first.");
        return;
    };
    let (ticket, store) = {
        let mut a = app.borrow_mut();
        (a.ingest.begin(), a.store.clone())
    };
    overlay::render(&document, ASSET_INGEST_STATUS_ID, app.borrow().ingest.state(), "Adding to the archive…");
    let app = app.clone();
    spawn_local(async move {
        let result = match store {
            Some(store) => content::add_media_asset(store.as_ref(), &asset).await,
            None => Err(no_store()),
        };
        let result = result.map_err(|e| {
            log::error!("[store] add media asset: {}", e);
            e.user_message()
        });
        let added = {
            let mut a = app.borrow_mut();
            if !a.ingest.complete(ticket, result) {
                return;
            }
            overlay::render(&document, ASSET_INGEST_STATUS_ID, a.ingest.state(), "");
            a.ingest.state().ready().map(|asset| asset.id.clone())
        };
        if let Some(id) = added {
            log::info!("[store] added media asset {}", id);
            dom::clear_input(&document, ASSET_TITLE_INPUT_ID);
            dom::clear_input(&document, ASSET_URL_INPUT_ID);
            load_assets(&app);
        }
    });
}
