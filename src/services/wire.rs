// Request/response shapes for the hosted services. Kept free of browser
// types so the host test suite can include it directly.

use awasser_core::content::Table;
use awasser_core::generation::InlineImage;
use awasser_core::video::OperationStatus;
use awasser_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ---------------- Content store (PostgREST) ----------------

pub fn table_url(base: &str, table: Table) -> String {
    let mut url = format!("{}/rest/v1/{}?select=*", base, table.name());
    if let Some(col) = table.order_by() {
        url.push_str(&format!("&order={}.desc", col));
    }
    url
}

pub fn insert_url(base: &str, table: Table) -> String {
    format!("{}/rest/v1/{}", base, table.name())
}

pub fn row_url(base: &str, table: Table, id: &str) -> String {
    format!("{}/rest/v1/{}?id=eq.{}", base, table.name(), encode_component(id))
}

fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// `return=representation` answers inserts with an array of rows.
pub fn first_row(table: Table, body: Value) -> Result<Value> {
    match body {
        Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
        Value::Object(_) => Ok(body),
        _ => Err(Error::store(table.name(), "insert returned no row")),
    }
}

// ---------------- Generation (Gemini REST) ----------------

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineBlob {
    pub mime_type: String,
    pub data: String,
}

impl From<&InlineImage> for InlineBlob {
    fn from(img: &InlineImage) -> Self {
        Self {
            mime_type: img.mime_type.clone(),
            data: img.data.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text { text: String },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineBlob,
    },
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Value>,
}

impl GenerateRequest {
    pub fn text(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart::Text {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: None,
        }
    }

    pub fn structured(prompt: &str, schema: &Value, image: Option<&InlineImage>) -> Self {
        let mut parts = Vec::new();
        if let Some(img) = image {
            parts.push(RequestPart::Inline {
                inline_data: img.into(),
            });
        }
        parts.push(RequestPart::Text {
            text: prompt.to_string(),
        });
        Self {
            contents: vec![Content { parts }],
            generation_config: Some(json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            })),
        }
    }

    pub fn image_edit(source: &InlineImage, instruction: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Inline {
                        inline_data: source.into(),
                    },
                    RequestPart::Text {
                        text: instruction.to_string(),
                    },
                ],
            }],
            generation_config: None,
        }
    }

    pub fn speech(text: &str, voice: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart::Text {
                    text: text.to_string(),
                }],
            }],
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                }
            })),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineBlob>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter())
            .into_iter()
            .flatten()
    }

    /// All text parts of the first candidate, concatenated.
    pub fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }

    pub fn inline_data(&self) -> Option<&InlineBlob> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}

/// Parse a JSON-mode reply. Tolerates a fenced ```json block.
pub fn parse_structured(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).map_err(|e| Error::Schema(e.to_string()))
}

pub fn video_request(source: &InlineImage, prompt: &str) -> Value {
    json!({
        "instances": [{
            "prompt": prompt,
            "image": { "bytesBase64Encoded": source.data, "mimeType": source.mime_type }
        }],
        "parameters": { "aspectRatio": "9:16", "resolution": "720p", "sampleCount": 1 }
    })
}

#[derive(Debug, Deserialize)]
pub struct OperationHandle {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OperationReply {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<RemoteError>,
    #[serde(default)]
    pub response: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: String,
}

impl OperationReply {
    pub fn status(&self) -> OperationStatus {
        if let Some(err) = &self.error {
            return OperationStatus::Error(err.message.clone());
        }
        if !self.done {
            return OperationStatus::Pending;
        }
        let uri = self
            .response
            .as_ref()
            .and_then(|r| r.pointer("/generateVideoResponse/generatedSamples/0/video/uri"))
            .and_then(Value::as_str)
            .map(str::to_string);
        OperationStatus::Done { uri }
    }
}

/// Error body of a failed call, `{"error": {"message": ..}}`, or the raw text.
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: RemoteError,
    }
    serde_json::from_str::<Envelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}
