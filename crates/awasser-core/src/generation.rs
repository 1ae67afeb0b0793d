//! Generative-AI collaborator: contract, request shaping and reply decoding.

use crate::error::{Error, Result};
use crate::video::{OperationStatus, PollPolicy, VideoFailure, VideoJob, VideoJobState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

/// Base64 image payload sent inline with a prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn jpeg(data: impl Into<String>) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            data: data.into(),
        }
    }

    /// Accepts either bare base64 or a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Some(Self {
            mime_type: mime.to_string(),
            data: payload.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Every call is fallible, latent, and not assumed idempotent.
#[async_trait(?Send)]
pub trait GenerationService {
    async fn complete_text(&self, prompt: &str) -> Result<String>;

    /// Completion constrained to `schema`; fails when the reply is not JSON.
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &Value,
        image: Option<&InlineImage>,
    ) -> Result<Value>;

    /// Returns the edited image as a data URL.
    async fn edit_image(&self, source: &InlineImage, instruction: &str) -> Result<String>;

    /// Returns base64 PCM16 mono audio.
    async fn synthesize_speech(&self, text: &str) -> Result<String>;

    /// Returns the name of the long-running operation.
    async fn submit_video(&self, source: &InlineImage, prompt: &str) -> Result<String>;

    async fn poll_video(&self, operation: &str) -> Result<OperationStatus>;
}

/// Submit a video job and poll it with backoff until it settles. A failed
/// poll is retried on the same schedule; a failed submit is not.
pub async fn synthesize_video<G, S, F>(
    service: &G,
    source: &InlineImage,
    prompt: &str,
    policy: PollPolicy,
    mut sleep: S,
) -> Result<String>
where
    G: GenerationService + ?Sized,
    S: FnMut(Duration) -> F,
    F: Future<Output = ()>,
{
    let operation = service.submit_video(source, prompt).await?;
    log::info!("[video] submitted {}", operation);
    let mut job = VideoJob::submitted(operation, policy);
    while let Some(delay) = job.next_delay() {
        sleep(delay).await;
        let Some(op) = job.operation().map(str::to_string) else {
            break;
        };
        match service.poll_video(&op).await {
            Ok(status) => job.record(status),
            Err(e) => job.record_poll_error(e.to_string()),
        };
    }
    match job.state() {
        VideoJobState::Ready { uri } => Ok(uri.clone()),
        VideoJobState::Failed { reason } => Err(match reason {
            VideoFailure::TimedOut { attempts } => Error::VideoTimedOut {
                attempts: *attempts,
            },
            VideoFailure::Remote(msg) => Error::Generation(msg.clone()),
            VideoFailure::NoVideo => Error::Generation("operation finished without a video".into()),
        }),
        other => Err(Error::Generation(format!("video job stopped in {:?}", other))),
    }
}

pub fn insight_prompt(site_name: &str, artwork_title: &str) -> String {
    format!(
        "Provide a deep cultural and historical insight connecting the site \"{}\" with the digital artwork titled \"{}\". \
         Discuss how the digital layer enhances the physical history. One short, poetic paragraph.",
        site_name, artwork_title
    )
}

pub fn guide_prompt(question: &str, context: &str) -> String {
    format!("Context: {}\n\nVisitor Question: {}", context, question)
}

pub fn narration_text(description: &str) -> String {
    format!("Narrate: {}", description)
}

pub fn reimagining_prompt(landmark: &str) -> String {
    format!(
        "A cinematic historical reconstruction of {} in its original glorious era, showing bustling life and ancient architecture.",
        landmark
    )
}

pub fn variant_instruction(theme: &str) -> String {
    format!(
        "Reimagine this scene as a high-fidelity digital art installation with the theme: \"{}\". Abstract, futuristic, and museum-quality.",
        theme
    )
}

/// Reply to a camera-frame landmark scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkReport {
    pub recognized: bool,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub suggested_theme: String,
}

pub const LANDMARK_PROMPT: &str = "Identify this landmark. If it is a known urban or historical site, provide its name, \
     a brief history, and a suggested digital art theme for a museum installation. Return as JSON.";

pub fn landmark_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recognized": { "type": "BOOLEAN" },
            "landmark": { "type": "STRING" },
            "history": { "type": "STRING" },
            "suggestedTheme": { "type": "STRING" }
        },
        "required": ["recognized", "landmark", "history", "suggestedTheme"]
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

pub fn quiz_prompt(site_name: &str, artwork_title: &str, description: &str) -> String {
    format!(
        "Create a 3-question cultural quiz about \"{}\" and the artwork \"{}\" ({}). \
         Ensure questions reflect historical and artistic context. Return as a JSON array of objects.",
        site_name, artwork_title, description
    )
}

pub fn quiz_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswer": { "type": "INTEGER" },
                "explanation": { "type": "STRING" }
            },
            "required": ["question", "options", "correctAnswer", "explanation"]
        }
    })
}

/// Decode a structured reply, rejecting questions whose answer index is out of range.
pub fn decode_quiz(value: Value) -> Result<Vec<QuizQuestion>> {
    let questions: Vec<QuizQuestion> =
        serde_json::from_value(value).map_err(|e| Error::Schema(e.to_string()))?;
    if let Some(bad) = questions
        .iter()
        .find(|q| q.correct_answer >= q.options.len())
    {
        return Err(Error::Schema(format!(
            "answer {} out of range for \"{}\"",
            bad.correct_answer, bad.question
        )));
    }
    Ok(questions)
}

pub fn decode_landmark(value: Value) -> Result<LandmarkReport> {
    serde_json::from_value(value).map_err(|e| Error::Schema(e.to_string()))
}

pub async fn cultural_insight<G: GenerationService + ?Sized>(
    service: &G,
    site_name: &str,
    artwork_title: &str,
) -> Result<String> {
    service
        .complete_text(&insight_prompt(site_name, artwork_title))
        .await
}

pub async fn ask_guide<G: GenerationService + ?Sized>(
    service: &G,
    question: &str,
    context: &str,
) -> Result<String> {
    let q = question.trim();
    if q.is_empty() {
        return Err(Error::Generation("empty question".into()));
    }
    service.complete_text(&guide_prompt(q, context)).await
}

pub async fn identify_landmark<G: GenerationService + ?Sized>(
    service: &G,
    frame: &InlineImage,
) -> Result<LandmarkReport> {
    let value = service
        .complete_structured(LANDMARK_PROMPT, &landmark_schema(), Some(frame))
        .await?;
    decode_landmark(value)
}

pub async fn site_quiz<G: GenerationService + ?Sized>(
    service: &G,
    site_name: &str,
    artwork_title: &str,
    description: &str,
) -> Result<Vec<QuizQuestion>> {
    let value = service
        .complete_structured(
            &quiz_prompt(site_name, artwork_title, description),
            &quiz_schema(),
            None,
        )
        .await?;
    decode_quiz(value)
}
