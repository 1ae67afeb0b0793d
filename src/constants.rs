//! Element ids and front-end tuning shared by the view modules.
//!
//! Views are `<section id="view-<id>">` blocks; navigation buttons carry
//! `data-nav="<id>"` and portal buttons `data-portal="visitor|creator|curator"`.
pub const CONFIG_SCRIPT_ID: &str = "awasser-config";
pub const VIEW_PREFIX: &str = "view-";
pub const NAV_ATTR: &str = "data-nav";
pub const PORTAL_ATTR: &str = "data-portal";
pub const CHROME_ID: &str = "app-chrome";
pub const HIDDEN_CLASS: &str = "hidden";

// Map explorer
pub const MAP_CONTAINER_ID: &str = "map-container";
pub const MAP_SCENE_ID: &str = "map-scene";
pub const MAP_STATUS_ID: &str = "map-status";
pub const MAP_RESET_ID: &str = "map-reset";
pub const MOTION_BUTTON_ID: &str = "motion-enable";
pub const LANDMARK_CLASS: &str = "landmark";
pub const FOCUSED_CLASS: &str = "focused";
pub const LANDMARK_INDEX_ATTR: &str = "data-index";

// AR viewer
pub const VIEWER_TITLE_ID: &str = "viewer-title";
pub const VIEWER_ARTIST_ID: &str = "viewer-artist";
pub const VIEWER_DESCRIPTION_ID: &str = "viewer-description";
pub const VIEWER_IMAGE_ID: &str = "viewer-image";
pub const VIEWER_CLOSE_ID: &str = "viewer-close";
pub const VIEWER_STAGE_SURFACE_ID: &str = "viewer-surface";
pub const CAMERA_VIDEO_ID: &str = "camera-feed";
pub const CAPTURE_CANVAS_ID: &str = "capture-canvas";
pub const MODE_TOGGLE_ID: &str = "mode-toggle";
pub const INSIGHT_ID: &str = "viewer-insight";
pub const INSIGHT_STATUS_ID: &str = "insight-status";
pub const NARRATION_TOGGLE_ID: &str = "narration-toggle";
pub const NARRATION_STATUS_ID: &str = "narration-status";
pub const STAGE_TOGGLE_ID: &str = "stage-toggle";
pub const STAGE_PANEL_ID: &str = "stage-panel";
pub const DISTANCE_SLIDER_ID: &str = "distance-slider";
pub const ROTATION_READOUT_ID: &str = "rotation-readout";
pub const SPECTRUM_CANVAS_ID: &str = "spectrum-canvas";
pub const SCAN_BUTTON_ID: &str = "scan-button";
pub const SCAN_STATUS_ID: &str = "scan-status";
pub const SCAN_RESULT_ID: &str = "scan-result";
pub const REIMAGINE_BUTTON_ID: &str = "reimagine-button";
pub const REIMAGINE_STATUS_ID: &str = "reimagine-status";
pub const REIMAGINE_VIDEO_ID: &str = "reimagine-video";
pub const VARIANT_BUTTON_ID: &str = "variant-button";
pub const VARIANT_STATUS_ID: &str = "variant-status";
pub const VARIANT_IMAGE_ID: &str = "variant-image";
pub const GUIDE_INPUT_ID: &str = "guide-input";
pub const GUIDE_ASK_ID: &str = "guide-ask";
pub const GUIDE_ANSWER_ID: &str = "guide-answer";
pub const GUIDE_STATUS_ID: &str = "guide-status";
pub const LIVE_TOGGLE_ID: &str = "live-toggle";
pub const LIVE_TRANSCRIPT_ID: &str = "live-transcript";
pub const QUIZ_BUTTON_ID: &str = "quiz-button";
pub const QUIZ_PANEL_ID: &str = "quiz-panel";
pub const QUIZ_STATUS_ID: &str = "quiz-status";
pub const QUIZ_OPTION_ATTR: &str = "data-option";
pub const QUIZ_NEXT_ATTR: &str = "data-quiz-next";

// Gallery, exhibitions, landing
pub const GALLERY_LIST_ID: &str = "gallery-list";
pub const GALLERY_STATUS_ID: &str = "gallery-status";
pub const EXHIBITIONS_LIST_ID: &str = "exhibitions-list";
pub const EXHIBITIONS_STATUS_ID: &str = "exhibitions-status";
pub const EXHIBITION_ID_ATTR: &str = "data-exhibition";
pub const JOURNEY_TITLE_ID: &str = "journey-title";
pub const JOURNEY_META_ID: &str = "journey-meta";
pub const JOURNEY_QR_ID: &str = "journey-qr";
pub const JOURNEY_POINTS_ID: &str = "journey-points";
pub const POI_ID_ATTR: &str = "data-poi";
pub const RECENT_LIST_ID: &str = "recent-list";
pub const DASHBOARD_LIST_ID: &str = "asset-list";
pub const DASHBOARD_STATUS_ID: &str = "asset-status";
pub const ASSET_TITLE_INPUT_ID: &str = "asset-title";
pub const ASSET_KIND_INPUT_ID: &str = "asset-kind";
pub const ASSET_URL_INPUT_ID: &str = "asset-url";
pub const ASSET_ADD_ID: &str = "asset-add";
pub const ASSET_INGEST_STATUS_ID: &str = "asset-ingest-status";
pub const CARD_CLASS: &str = "card";
pub const ARTWORK_ID_ATTR: &str = "data-artwork";
pub const ASSET_ID_ATTR: &str = "data-asset"; // delete buttons in the dashboard list

// Status regions hold a message and a `.retry` button.
pub const STATUS_PENDING_CLASS: &str = "pending";
pub const STATUS_FAILED_CLASS: &str = "failed";
pub const RETRY_CLASS: &str = "retry";

// Spectrum bar colour (rgb; alpha follows the bin level)
pub const SPECTRUM_RGB: (u8, u8, u8) = (99, 102, 241);

// Camera frames for landmark scans and live sessions
pub const CAPTURE_JPEG_QUALITY: f64 = 0.8;
pub const LIVE_CAPTURE_WIDTH: u32 = 640; // downscaled before upload
pub const MIC_BUFFER_SIZE: u32 = 4096;
