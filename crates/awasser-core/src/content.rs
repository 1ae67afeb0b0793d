//! Records kept in the hosted content store, and the store contract.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Exhibitions,
    Artworks,
    MediaAssets,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Exhibitions => "exhibitions",
            Table::Artworks => "artworks",
            Table::MediaAssets => "media_assets",
        }
    }

    /// Column used for newest-first listing, if the table is ordered.
    pub fn order_by(self) -> Option<&'static str> {
        match self {
            Table::Exhibitions | Table::MediaAssets => Some("created_at"),
            Table::Artworks => None,
        }
    }
}

/// Table-oriented persistence: each call is independently fallible.
#[async_trait(?Send)]
pub trait ContentStore {
    async fn list(&self, table: Table) -> Result<Vec<Value>>;

    /// Insert one record; the returned row carries the generated `id`.
    async fn insert(&self, table: Table, record: Value) -> Result<Value>;

    async fn delete(&self, table: Table, id: &str) -> Result<()>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtworkCategory {
    Modern,
    Heritage,
    Abstract,
    Interactive,
    Soundscape,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub description: String,
    pub location: GeoPoint,
    #[serde(alias = "imageUrl", default)]
    pub image_url: String,
    #[serde(alias = "modelUrl", default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
    #[serde(alias = "audioUrl", default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(alias = "videoUrl", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub category: ArtworkCategory,
    #[serde(alias = "isTimedEvent", default)]
    pub is_timed_event: bool,
}

impl Artwork {
    /// Only soundscape installations carry a spatial drone.
    pub fn supports_spatial_audio(&self) -> bool {
        self.category == ArtworkCategory::Soundscape
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Ar,
    Studio,
    Hybrid,
    Text,
}

/// A stop on an experience journey. Stored as JSON inside the exhibition row,
/// so it keeps the client's camelCase keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub narrative_insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchored_asset_id: Option<String>,
    pub display_mode: DisplayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl Poi {
    /// Short line for a journey stop: the narrative insight when there is one.
    pub fn teaser(&self) -> &str {
        if self.narrative_insight.is_empty() {
            &self.description
        } else {
            &self.narrative_insight
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exhibition {
    pub id: String,
    pub theme: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub points: Vec<Poi>,
    #[serde(default)]
    pub qr_code_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_event: bool,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

impl Exhibition {
    /// Byline for the journey landing: creator, city, stop count and, for a
    /// temporary exhibition, its run.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = [&self.creator, &self.city]
            .into_iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        parts.push(match self.points.len() {
            1 => "1 stop".to_string(),
            n => format!("{} stops", n),
        });
        if self.is_event {
            parts.push(format!(
                "{} – {}",
                self.start_date.as_deref().unwrap_or("Now"),
                self.end_date.as_deref().unwrap_or("TBD")
            ));
        }
        parts.join(" · ")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Archive,
    Audio,
    Model,
}

impl MediaKind {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim().to_ascii_lowercase().as_str() {
            "photo" => MediaKind::Photo,
            "video" => MediaKind::Video,
            "archive" => MediaKind::Archive,
            "audio" => MediaKind::Audio,
            "model" => MediaKind::Model,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Syncing,
    Live,
    Error,
    Optimizing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: AssetStatus,
    #[serde(default)]
    pub size_in_mb: f64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewMediaAsset {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub status: AssetStatus,
    pub size_in_mb: f64,
}

impl NewMediaAsset {
    /// Record for the dashboard's ingest form. A blank title is rejected; a
    /// blank url is stored as `#`. New assets start out optimizing.
    pub fn ingest(title: &str, kind: MediaKind, url: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let url = match url.trim() {
            "" => "#",
            u => u,
        };
        Some(Self {
            title: title.to_string(),
            kind,
            url: url.to_string(),
            status: AssetStatus::Optimizing,
            size_in_mb: 0.0,
        })
    }
}

fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| Error::store(table.name(), e)))
        .collect()
}

fn decode_row<T: DeserializeOwned>(table: Table, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| Error::store(table.name(), e))
}

pub async fn list_exhibitions<S: ContentStore + ?Sized>(store: &S) -> Result<Vec<Exhibition>> {
    decode_rows(Table::Exhibitions, store.list(Table::Exhibitions).await?)
}

pub async fn list_artworks<S: ContentStore + ?Sized>(store: &S) -> Result<Vec<Artwork>> {
    decode_rows(Table::Artworks, store.list(Table::Artworks).await?)
}

pub async fn list_media_assets<S: ContentStore + ?Sized>(store: &S) -> Result<Vec<MediaAsset>> {
    decode_rows(Table::MediaAssets, store.list(Table::MediaAssets).await?)
}

pub async fn add_media_asset<S: ContentStore + ?Sized>(
    store: &S,
    asset: &NewMediaAsset,
) -> Result<MediaAsset> {
    let record = serde_json::to_value(asset)?;
    decode_row(Table::MediaAssets, store.insert(Table::MediaAssets, record).await?)
}

pub async fn delete_media_asset<S: ContentStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    store.delete(Table::MediaAssets, id).await
}
