use super::wire::{self, GenerateRequest, GenerateResponse, OperationHandle, OperationReply};
use crate::config::AppConfig;
use async_trait::async_trait;
use awasser_core::generation::{GenerationService, InlineImage};
use awasser_core::video::OperationStatus;
use awasser_core::{Error, Result};
use reqwest::Client;
use serde::Serialize;

/// Gemini REST client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    config: AppConfig,
}

impl GeminiClient {
    pub fn new(api_key: &str, config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.generation_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            config: config.clone(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}?key={}", self.base_url, model, method, self.api_key)
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<String> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        read_body(resp).await
    }

    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        log::debug!("[gemini] generateContent on {}", model);
        let text = self.post(&self.model_url(model, "generateContent"), request).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

async fn read_body(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| Error::Generation(e.to_string()))?;
    if !status.is_success() {
        log::error!("[gemini] HTTP {}: {}", status, text);
        return Err(Error::Generation(format!(
            "HTTP {}: {}",
            status.as_u16(),
            wire::error_message(&text)
        )));
    }
    Ok(text)
}

#[async_trait(?Send)]
impl GenerationService for GeminiClient {
    async fn complete_text(&self, prompt: &str) -> Result<String> {
        self.generate(&self.config.text_model, &GenerateRequest::text(prompt))
            .await?
            .text()
            .ok_or_else(|| Error::Generation("empty reply".into()))
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        image: Option<&InlineImage>,
    ) -> Result<serde_json::Value> {
        let reply = self
            .generate(&self.config.text_model, &GenerateRequest::structured(prompt, schema, image))
            .await?;
        let text = reply
            .text()
            .ok_or_else(|| Error::Schema("reply carried no text".into()))?;
        wire::parse_structured(&text)
    }

    async fn edit_image(&self, source: &InlineImage, instruction: &str) -> Result<String> {
        let reply = self
            .generate(&self.config.image_model, &GenerateRequest::image_edit(source, instruction))
            .await?;
        let blob = reply
            .inline_data()
            .ok_or_else(|| Error::Generation("no image in reply".into()))?;
        Ok(InlineImage {
            mime_type: blob.mime_type.clone(),
            data: blob.data.clone(),
        }
        .to_data_url())
    }

    async fn synthesize_speech(&self, text: &str) -> Result<String> {
        let reply = self
            .generate(&self.config.speech_model, &GenerateRequest::speech(text, &self.config.voice))
            .await?;
        reply
            .inline_data()
            .map(|b| b.data.clone())
            .ok_or_else(|| Error::Generation("no audio in reply".into()))
    }

    async fn submit_video(&self, source: &InlineImage, prompt: &str) -> Result<String> {
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        let text = self.post(&url, &wire::video_request(source, prompt)).await?;
        let handle: OperationHandle = serde_json::from_str(&text)?;
        Ok(handle.name)
    }

    async fn poll_video(&self, operation: &str) -> Result<OperationStatus> {
        let url = format!("{}/{}?key={}", self.base_url, operation, self.api_key);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        let text = read_body(resp).await?;
        let reply: OperationReply = serde_json::from_str(&text)?;
        Ok(reply.status())
    }
}
