use awasser_core::constants::RECENTLY_VIEWED_KEY;
use awasser_core::recent::RecentlyViewed;
use web_sys as web;

fn local_storage() -> Option<web::Storage> {
    web::window()?.local_storage().ok().flatten()
}

pub fn load_recent() -> RecentlyViewed {
    let raw = local_storage().and_then(|s| s.get_item(RECENTLY_VIEWED_KEY).ok().flatten());
    RecentlyViewed::from_json(raw.as_deref())
}

/// Best effort: private browsing may refuse writes.
pub fn save_recent(recent: &RecentlyViewed) {
    if let Some(s) = local_storage() {
        if let Err(e) = s.set_item(RECENTLY_VIEWED_KEY, &recent.to_json()) {
            log::info!("[storage] recently viewed not saved: {:?}", e);
        }
    }
}
