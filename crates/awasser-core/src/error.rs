use thiserror::Error;

/// Platform capabilities that the user or browser may withhold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Camera,
    DeviceOrientation,
    Microphone,
    AudioOutput,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Camera => "camera",
            Capability::DeviceOrientation => "device orientation",
            Capability::Microphone => "microphone",
            Capability::AudioOutput => "audio output",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("content store request on `{table}` failed: {message}")]
    Store { table: String, message: String },

    #[error("generation request failed: {0}")]
    Generation(String),

    #[error("reply did not match the requested schema: {0}")]
    Schema(String),

    #[error("audio graph error: {0}")]
    Audio(String),

    #[error("{0} is unavailable or was denied")]
    Capability(Capability),

    #[error("video synthesis still pending after {attempts} polls")]
    VideoTimedOut { attempts: u32 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("live session is closed")]
    SessionClosed,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    pub fn store(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Store {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Short text suitable for a "failed, tap to retry" affordance.
    pub fn user_message(&self) -> String {
        match self {
            Error::Store { .. } => "Could not reach the museum archive.".to_string(),
            Error::Generation(_) | Error::Schema(_) => {
                "The guide is having trouble connecting right now.".to_string()
            }
            Error::VideoTimedOut { .. } => "The reconstruction is taking too long.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
