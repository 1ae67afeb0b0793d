//! Bidirectional live-voice session with the guide.
//!
//! The browser streams microphone PCM and periodic camera frames up; the
//! service answers with PCM audio chunks and partial transcripts until the
//! session is closed.

use crate::constants::LIVE_TRANSCRIPT_TURNS;
use crate::error::Result;
use crate::pcm::pcm_mime_type;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport for an open session.
pub trait LiveSession {
    fn send(&mut self, message: &LiveClientMessage) -> Result<()>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Repeating timer that captures and uploads camera frames.
pub trait FrameTimer {
    fn clear(&mut self);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LiveClientMessage {
    Setup(SetupPayload),
    RealtimeInput(RealtimeInput),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPayload {
    pub model: String,
    pub generation_config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Value>,
    pub input_audio_transcription: Value,
    pub output_audio_transcription: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<MediaChunk>,
}

impl LiveClientMessage {
    pub fn setup(model: &str, voice: &str, instruction: Option<&str>) -> Self {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        LiveClientMessage::Setup(SetupPayload {
            model,
            generation_config: serde_json::json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                }
            }),
            system_instruction: instruction
                .map(|text| serde_json::json!({ "parts": [{ "text": text }] })),
            input_audio_transcription: serde_json::json!({}),
            output_audio_transcription: serde_json::json!({}),
        })
    }

    pub fn audio(pcm_base64: String, sample_rate: u32) -> Self {
        LiveClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: pcm_mime_type(sample_rate),
                data: pcm_base64,
            }],
        })
    }

    pub fn image(jpeg_base64: String) -> Self {
        LiveClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: "image/jpeg".to_string(),
                data: jpeg_base64,
            }],
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiveEvent {
    SetupComplete,
    /// Base64 PCM16 audio from the guide.
    Audio(String),
    OutputTranscript(String),
    InputTranscript(String),
    Interrupted,
    TurnComplete,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    setup_complete: Option<Value>,
    server_content: Option<ServerContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    output_transcription: Option<Transcription>,
    input_transcription: Option<Transcription>,
    #[serde(default)]
    interrupted: bool,
    #[serde(default)]
    turn_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ModelTurn {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct Transcription {
    #[serde(default)]
    text: String,
}

/// Decode one server frame into the events it carries, in delivery order.
pub fn parse_server_message(raw: &str) -> Result<Vec<LiveEvent>> {
    let msg: ServerMessage = serde_json::from_str(raw)?;
    let mut events = Vec::new();
    if msg.setup_complete.is_some() {
        events.push(LiveEvent::SetupComplete);
    }
    if let Some(content) = msg.server_content {
        if content.interrupted {
            events.push(LiveEvent::Interrupted);
        }
        if let Some(t) = content.input_transcription {
            events.push(LiveEvent::InputTranscript(t.text));
        }
        if let Some(turn) = content.model_turn {
            for part in turn.parts {
                if let Some(d) = part.inline_data {
                    events.push(LiveEvent::Audio(d.data));
                }
            }
        }
        if let Some(t) = content.output_transcription {
            events.push(LiveEvent::OutputTranscript(t.text));
        }
        if content.turn_complete {
            events.push(LiveEvent::TurnComplete);
        }
    }
    Ok(events)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub visitor: String,
    pub guide: String,
}

/// Partial transcripts accumulated into finished turns. Only the most
/// recent turns are kept.
#[derive(Debug, Default)]
pub struct Transcript {
    visitor: String,
    guide: String,
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the rendered text changed.
    pub fn apply(&mut self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::InputTranscript(t) => {
                self.visitor.push_str(t);
                !t.is_empty()
            }
            LiveEvent::OutputTranscript(t) => {
                self.guide.push_str(t);
                !t.is_empty()
            }
            LiveEvent::TurnComplete => self.finish_turn(),
            _ => false,
        }
    }

    /// Returns whether old turns were dropped.
    fn finish_turn(&mut self) -> bool {
        if self.visitor.is_empty() && self.guide.is_empty() {
            return false;
        }
        self.turns.push(Turn {
            visitor: std::mem::take(&mut self.visitor),
            guide: std::mem::take(&mut self.guide),
        });
        let excess = self.turns.len().saturating_sub(LIVE_TRANSCRIPT_TURNS);
        self.turns.drain(..excess);
        excess > 0
    }

    pub fn pending_visitor(&self) -> &str {
        &self.visitor
    }

    pub fn pending_guide(&self) -> &str {
        &self.guide
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// `You:` / `Guide:` lines, oldest first, pending text last.
    pub fn render(&self) -> String {
        let mut text = String::new();
        let lines = self
            .turns
            .iter()
            .flat_map(|t| [("You", t.visitor.as_str()), ("Guide", t.guide.as_str())])
            .chain([("You", self.visitor.as_str()), ("Guide", self.guide.as_str())]);
        for (speaker, line) in lines.filter(|(_, l)| !l.is_empty()) {
            text.push_str(speaker);
            text.push_str(": ");
            text.push_str(line);
            text.push('\n');
        }
        text.truncate(text.trim_end().len());
        text
    }
}

/// Gapless scheduling of incoming audio chunks on the audio clock.
#[derive(Debug, Default)]
pub struct PlaybackCursor {
    next_start: f64,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start time for a chunk of `duration` seconds arriving at `now`.
    pub fn schedule(&mut self, now: f64, duration: f64) -> f64 {
        let start = self.next_start.max(now);
        self.next_start = start + duration.max(0.0);
        start
    }

    /// Barge-in: the queued audio was cut, restart from the clock.
    pub fn reset(&mut self) {
        self.next_start = 0.0;
    }
}
