// Host-side integration tests for content records, the store contract and
// view routing.

use async_trait::async_trait;
use awasser_core::content::*;
use awasser_core::view::*;
use awasser_core::{Error, Result};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory table store that assigns sequential ids.
#[derive(Default)]
struct MemoryStore {
    tables: RefCell<HashMap<&'static str, Vec<Value>>>,
    next_id: Cell<u32>,
    offline: Cell<bool>,
}

impl MemoryStore {
    fn seeded(table: Table, rows: Vec<Value>) -> Self {
        let store = Self::default();
        store.tables.borrow_mut().insert(table.name(), rows);
        store
    }
}

#[async_trait(?Send)]
impl ContentStore for MemoryStore {
    async fn list(&self, table: Table) -> Result<Vec<Value>> {
        if self.offline.get() {
            return Err(Error::store(table.name(), "network down"));
        }
        Ok(self
            .tables
            .borrow()
            .get(table.name())
            .cloned()
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, mut record: Value) -> Result<Value> {
        if self.offline.get() {
            return Err(Error::store(table.name(), "network down"));
        }
        self.next_id.set(self.next_id.get() + 1);
        record["id"] = json!(format!("{}-{}", table.name(), self.next_id.get()));
        record["created_at"] = json!("2026-01-01T00:00:00Z");
        self.tables
            .borrow_mut()
            .entry(table.name())
            .or_default()
            .insert(0, record.clone());
        Ok(record)
    }

    async fn delete(&self, table: Table, id: &str) -> Result<()> {
        if let Some(rows) = self.tables.borrow_mut().get_mut(table.name()) {
            rows.retain(|r| r["id"] != id);
        }
        Ok(())
    }
}

fn artwork_row(id: &str, category: &str) -> Value {
    json!({
        "id": id,
        "title": "Echoes of the Souk",
        "artist": "Layla",
        "description": "A sound walk",
        "location": { "lat": 33.5, "lng": -7.6, "name": "Old Medina" },
        "imageUrl": "https://img/1.jpg",
        "category": category
    })
}

#[test]
fn artwork_rows_decode_either_image_key() {
    let store = MemoryStore::seeded(
        Table::Artworks,
        vec![
            artwork_row("a1", "Soundscape"),
            json!({
                "id": "a2",
                "title": "Facade",
                "artist": "Omar",
                "location": { "lat": 0.0, "lng": 0.0, "name": "Port" },
                "image_url": "https://img/2.jpg",
                "category": "Heritage",
                "is_timed_event": true
            }),
        ],
    );
    let artworks = pollster::block_on(list_artworks(&store)).unwrap();
    assert_eq!(artworks.len(), 2);
    assert_eq!(artworks[0].image_url, "https://img/1.jpg");
    assert_eq!(artworks[1].image_url, "https://img/2.jpg");
    assert!(artworks[1].is_timed_event);
    assert!(artworks[0].supports_spatial_audio());
    assert!(!artworks[1].supports_spatial_audio());
}

#[test]
fn malformed_rows_fail_with_table_name() {
    let store = MemoryStore::seeded(Table::Artworks, vec![json!({ "id": "x" })]);
    match pollster::block_on(list_artworks(&store)) {
        Err(Error::Store { table, .. }) => assert_eq!(table, "artworks"),
        other => panic!("expected a store error, got {:?}", other),
    }
}

#[test]
fn store_outage_surfaces_as_error() {
    let store = MemoryStore::default();
    store.offline.set(true);
    let err = pollster::block_on(list_exhibitions(&store)).unwrap_err();
    assert_eq!(err.user_message(), "Could not reach the museum archive.");
}

#[test]
fn exhibition_rows_decode_journey_points() {
    let store = MemoryStore::seeded(
        Table::Exhibitions,
        vec![json!({
            "id": "e1",
            "theme": "Walls",
            "city": "Rabat",
            "creator": "curator@museum",
            "qr_code_url": "https://qr",
            "is_event": true,
            "start_date": "2026-05-01",
            "points": [
                {
                    "id": "p1",
                    "title": "Gate",
                    "location": { "lat": 1.0, "lng": 2.0, "name": "Gate", "city": "Rabat" },
                    "narrativeInsight": "Built by the Almohads",
                    "anchoredAssetId": "m1",
                    "displayMode": "hybrid"
                },
                { "id": "p2", "title": "Tower", "location": { "lat": 0, "lng": 0 }, "displayMode": "text" }
            ]
        })],
    );
    let exhibitions = pollster::block_on(list_exhibitions(&store)).unwrap();
    let ex = &exhibitions[0];
    assert_eq!(ex.points.len(), 2);
    assert!(ex.is_event);
    assert_eq!(ex.start_date.as_deref(), Some("2026-05-01"));
    assert_eq!(ex.end_date, None);
    let gate = &ex.points[0];
    assert_eq!(gate.display_mode, DisplayMode::Hybrid);
    assert_eq!(gate.anchored_asset_id.as_deref(), Some("m1"));
    assert_eq!(gate.narrative_insight, "Built by the Almohads");
    assert_eq!(gate.location.city.as_deref(), Some("Rabat"));
    assert_eq!(ex.points[1].narrative_insight, "");

    assert_eq!(gate.teaser(), "Built by the Almohads");
    assert_eq!(ex.points[1].teaser(), "");
    assert_eq!(ex.summary(), "curator@museum · Rabat · 2 stops · 2026-05-01 – TBD");
}

#[test]
fn permanent_journey_summary_omits_dates_and_blanks() {
    let ex: Exhibition = serde_json::from_value(json!({
        "id": "e2",
        "theme": "Harbour",
        "points": [
            { "id": "p1", "title": "Quay", "description": "Where the ships moored", "location": { "lat": 0, "lng": 0 }, "displayMode": "ar" }
        ]
    }))
    .unwrap();
    assert_eq!(ex.summary(), "1 stop");
    assert_eq!(ex.points[0].teaser(), "Where the ships moored");
}

#[test]
fn media_assets_add_list_delete() {
    let store = MemoryStore::default();
    let asset = NewMediaAsset {
        title: "Archive scan".into(),
        kind: MediaKind::Archive,
        url: "https://files/scan.pdf".into(),
        status: AssetStatus::Syncing,
        size_in_mb: 4.5,
    };
    let added = pollster::block_on(add_media_asset(&store, &asset)).unwrap();
    assert_eq!(added.kind, MediaKind::Archive);
    assert_eq!(store.tables.borrow()["media_assets"][0]["type"], "archive");

    let listed = pollster::block_on(list_media_assets(&store)).unwrap();
    assert_eq!(listed.len(), 1);

    pollster::block_on(delete_media_asset(&store, &added.id)).unwrap();
    assert!(pollster::block_on(list_media_assets(&store)).unwrap().is_empty());
}

#[test]
fn ingest_form_builds_an_optimizing_asset() {
    let asset = NewMediaAsset::ingest("  Fort aerial  ", MediaKind::Video, " ").unwrap();
    assert_eq!(asset.title, "Fort aerial");
    assert_eq!(asset.url, "#");
    assert_eq!(asset.status, AssetStatus::Optimizing);

    assert!(NewMediaAsset::ingest("   ", MediaKind::Photo, "https://x").is_none());

    let store = MemoryStore::default();
    let added = pollster::block_on(add_media_asset(&store, &asset)).unwrap();
    assert_eq!(added.id, "media_assets-1");
    assert_eq!(added.status, AssetStatus::Optimizing);
    let raw = store.tables.borrow()["media_assets"][0].clone();
    assert_eq!(raw["type"], "video");
    assert_eq!(raw["status"], "optimizing");
}

#[test]
fn media_kind_parses_form_values() {
    assert_eq!(MediaKind::parse("photo"), Some(MediaKind::Photo));
    assert_eq!(MediaKind::parse(" Model "), Some(MediaKind::Model));
    assert_eq!(MediaKind::parse("hologram"), None);
}

#[test]
fn failed_insert_leaves_the_table_untouched() {
    let store = MemoryStore::default();
    store.offline.set(true);
    let asset = NewMediaAsset::ingest("Scan", MediaKind::Archive, "").unwrap();
    let err = pollster::block_on(add_media_asset(&store, &asset)).unwrap_err();
    assert!(matches!(err, Error::Store { ref table, .. } if table == "media_assets"));
    assert!(store.tables.borrow().get("media_assets").is_none());
}

#[test]
fn tables_order_newest_first_where_timestamped() {
    assert_eq!(Table::Exhibitions.order_by(), Some("created_at"));
    assert_eq!(Table::MediaAssets.order_by(), Some("created_at"));
    assert_eq!(Table::Artworks.order_by(), None);
    assert_eq!(Table::MediaAssets.name(), "media_assets");
}

#[test]
fn portal_choice_routes_and_forces_visitor_elsewhere() {
    let mut router = Router::new();
    assert_eq!(router.view(), ViewState::Landing);

    assert_eq!(router.set_portal(PortalMode::Curator), Some(ViewState::Landing));
    assert_eq!(router.view(), ViewState::Dashboard);
    assert_eq!(router.portal(), PortalMode::Curator);

    router.navigate(ViewState::Explore);
    assert_eq!(router.portal(), PortalMode::Visitor);

    router.navigate(ViewState::Dashboard);
    assert_eq!(router.portal(), PortalMode::Creator);

    router.navigate(ViewState::ArView);
    assert_eq!(router.portal(), PortalMode::Creator);

    router.set_portal(PortalMode::Visitor);
    assert_eq!(router.view(), ViewState::Landing);
}

#[test]
fn navigating_to_current_view_reports_no_change() {
    let mut router = Router::new();
    assert_eq!(router.navigate(ViewState::Landing), None);
    assert_eq!(router.navigate(ViewState::Gallery), Some(ViewState::Landing));
}

#[test]
fn chrome_hidden_on_immersive_views() {
    assert!(!ViewState::ArView.shows_chrome());
    assert!(!ViewState::Dashboard.shows_chrome());
    assert!(!ViewState::JourneyLanding.shows_chrome());
    assert!(ViewState::Explore.shows_chrome());
    for view in [ViewState::Landing, ViewState::Play, ViewState::Exhibitions] {
        assert_eq!(ViewState::from_id(view.id()), Some(view));
    }
    assert_eq!(ViewState::from_id("nowhere"), None);
}

#[test]
fn loader_retry_and_stale_completion() {
    let mut loader: Loader<Vec<u32>> = Loader::new();
    let first = loader.begin();
    assert!(loader.complete(first, Err::<Vec<u32>, _>("timeout")));
    assert_eq!(loader.state(), &LoadState::Failed("timeout".into()));

    // Retry returns to pending; the old request is now stale.
    let retry = loader.begin();
    assert!(loader.state().is_pending());
    assert!(!loader.complete(first, Ok::<_, String>(vec![1])));
    assert!(loader.state().is_pending());

    assert!(loader.complete(retry, Ok::<_, String>(vec![2])));
    assert_eq!(loader.state().ready(), Some(&vec![2]));
}

#[test]
fn toggle_cancels_a_pending_request() {
    let mut loader: Loader<String> = Loader::new();
    assert_eq!(loader.toggle(false), ToggleAction::Start);
    let first = loader.begin();

    // Pressed again before the reply arrived.
    assert_eq!(loader.toggle(false), ToggleAction::Cancel);
    assert_eq!(loader.state(), &LoadState::Idle);
    assert!(!loader.complete(first, Ok::<_, String>("clip".into())));
    assert_eq!(loader.state(), &LoadState::Idle);

    assert_eq!(loader.toggle(false), ToggleAction::Start);
    let second = loader.begin();
    assert!(loader.complete(second, Ok::<_, String>("clip".into())));
    assert_eq!(loader.toggle(true), ToggleAction::Stop);
    // Finished playing by itself: the next press starts over.
    assert_eq!(loader.toggle(false), ToggleAction::Start);
}

#[test]
fn stop_supersedes_an_overlapping_request() {
    let mut loader: Loader<String> = Loader::new();
    let first = loader.begin();
    assert!(loader.complete(first, Ok::<_, String>("a".into())));
    let second = loader.begin();
    assert_eq!(loader.toggle(true), ToggleAction::Stop);
    assert!(!loader.complete(second, Ok::<_, String>("b".into())));
}

#[test]
fn cancelled_loader_ignores_late_result() {
    let mut loader: Loader<String> = Loader::new();
    let ticket = loader.begin();
    loader.cancel();
    assert_eq!(loader.state(), &LoadState::Idle);
    assert!(!loader.complete(ticket, Ok::<_, String>("late".into())));
    assert_eq!(loader.state(), &LoadState::Idle);
}
