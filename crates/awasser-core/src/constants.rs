// Shared tuning constants for the presentation engine and the audio stage.

// Orientation sampling
pub const POINTER_RANGE: f32 = 1.0; // pointer axes map into [-POINTER_RANGE, POINTER_RANGE]
pub const TILT_BETA_DAMPING: f32 = 0.4; // forward/back tilt -> vertical axis
pub const TILT_GAMMA_DAMPING: f32 = 0.6; // left/right tilt -> horizontal axis

// Ambient (unfocused) projection
pub const AMBIENT_PITCH_GAIN_DEG: f32 = 10.0; // vertical axis -> rotateX
pub const AMBIENT_YAW_GAIN_DEG: f32 = -18.0; // horizontal axis -> rotateY, opposite sign for parallax
pub const AMBIENT_ROLL_DEG: f32 = -6.0;
pub const AMBIENT_DEPTH_PX: f32 = 20.0;
pub const AMBIENT_TRANSITION: &str = "transform 0.4s ease-out";

// Focused projection
pub const POINT_SPACING_PX: f32 = 380.0;
pub const POINT_ROW_DRIFT_PX: f32 = 140.0; // vertical stagger between neighbouring landmarks
pub const FOCUS_PITCH_DEG: f32 = 62.0;
pub const FOCUS_ROLL_DEG: f32 = 2.0;
pub const FOCUS_DEPTH_PX: f32 = 420.0;
pub const FOCUS_LIFT_PX: f32 = 180.0;
pub const FOCUS_TRANSITION: &str = "transform 1.3s cubic-bezier(0.23, 1, 0.32, 1)";

// Spatial audio stage
pub const DRONE_LOW_HZ: f32 = 55.0; // sawtooth
pub const DRONE_HIGH_HZ: f32 = 110.0; // sine, one octave above
pub const FILTER_INITIAL_HZ: f32 = 400.0;
pub const ANALYSER_FFT_SIZE: u32 = 256;
pub const FADE_IN_TARGET_GAIN: f32 = 0.3;
pub const FADE_IN_SEC: f64 = 2.0;
pub const FADE_OUT_SEC: f64 = 0.5;
pub const GENERATOR_HALT_SEC: f64 = 0.6; // must stay after FADE_OUT_SEC
pub const PARAM_SMOOTHING_TAU_SEC: f64 = 0.1;

// Distance mapping
pub const DISTANCE_MIN: f32 = 1.0;
pub const DISTANCE_MAX: f32 = 10.0;
pub const DISTANCE_DEFAULT: f32 = 5.0;
pub const CUTOFF_BASE_HZ: f32 = 2000.0;
pub const CUTOFF_PER_UNIT_HZ: f32 = 180.0;
pub const CUTOFF_FLOOR_HZ: f32 = 100.0;
pub const GAIN_BASE: f32 = 0.5;
pub const GAIN_PER_UNIT: f32 = 0.04;
pub const GAIN_FLOOR: f32 = 0.0;

// Rotation drag in the AR viewer
pub const DRAG_DEG_PER_PX: f32 = 0.5;

// Narration / live voice PCM
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;
pub const MIC_SAMPLE_RATE: u32 = 16_000;
pub const LIVE_FRAME_INTERVAL_MS: i32 = 1000;
pub const LIVE_TRANSCRIPT_TURNS: usize = 20; // oldest turns are dropped beyond this

// Recently viewed
pub const RECENTLY_VIEWED_KEY: &str = "awasser_recently_viewed";
pub const RECENTLY_VIEWED_MAX: usize = 3;

// Video synthesis polling
pub const VIDEO_POLL_INITIAL_SEC: f64 = 2.0;
pub const VIDEO_POLL_MAX_SEC: f64 = 30.0;
pub const VIDEO_POLL_MAX_ATTEMPTS: u32 = 12;
