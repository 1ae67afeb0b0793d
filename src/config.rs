use serde::Deserialize;

pub const DEFAULT_GENERATION_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LIVE_URL: &str =
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Runtime service configuration, embedded in the page as
/// `<script id="awasser-config" type="application/json">`.
///
/// Store and generation credentials are optional; a missing service shows up
/// as a failed load in the views that need it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub generation_key: Option<String>,
    pub generation_base: String,
    pub live_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub image_model: String,
    pub video_model: String,
    pub live_model: String,
    pub voice: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            store_key: None,
            generation_key: None,
            generation_base: DEFAULT_GENERATION_BASE.to_string(),
            live_url: DEFAULT_LIVE_URL.to_string(),
            text_model: "gemini-3-flash-preview".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
            live_model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Kore".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    /// `(url, key)` for the content store when both are present and non-empty.
    pub fn store(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.store_url), non_empty(&self.store_key)) {
            (Some(url), Some(key)) => Some((url.trim_end_matches('/'), key)),
            _ => None,
        }
    }

    pub fn generation_key(&self) -> Option<&str> {
        non_empty(&self.generation_key)
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
