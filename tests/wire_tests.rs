// Host-side tests for hosted-service request and reply shapes.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod wire {
    include!("../src/services/wire.rs");
}

use awasser_core::content::Table;
use awasser_core::generation::InlineImage;
use awasser_core::video::OperationStatus;
use serde_json::json;
use wire::*;

#[test]
fn ordered_tables_list_newest_first() {
    assert_eq!(
        table_url("https://db", Table::Exhibitions),
        "https://db/rest/v1/exhibitions?select=*&order=created_at.desc"
    );
    assert_eq!(
        table_url("https://db", Table::Artworks),
        "https://db/rest/v1/artworks?select=*"
    );
    assert_eq!(insert_url("https://db", Table::MediaAssets), "https://db/rest/v1/media_assets");
}

#[test]
fn row_ids_are_percent_encoded() {
    assert_eq!(
        row_url("https://db", Table::MediaAssets, "a b&c"),
        "https://db/rest/v1/media_assets?id=eq.a%20b%26c"
    );
}

#[test]
fn insert_reply_yields_first_row() {
    let row = first_row(Table::Artworks, json!([{ "id": "1" }, { "id": "2" }])).unwrap();
    assert_eq!(row["id"], "1");
    let row = first_row(Table::Artworks, json!({ "id": "9" })).unwrap();
    assert_eq!(row["id"], "9");
    assert!(first_row(Table::Artworks, json!([])).is_err());
}

#[test]
fn structured_request_puts_image_before_prompt() {
    let image = InlineImage::jpeg("Zm9v");
    let req = GenerateRequest::structured("Identify", &json!({ "type": "OBJECT" }), Some(&image));
    let body = serde_json::to_value(&req).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(body["contents"][0]["parts"][1]["text"], "Identify");
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
}

#[test]
fn plain_text_request_has_no_config() {
    let body = serde_json::to_value(GenerateRequest::text("hello")).unwrap();
    assert!(body.get("generationConfig").is_none());
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
}

#[test]
fn speech_request_names_voice() {
    let body = serde_json::to_value(GenerateRequest::speech("Narrate: x", "Kore")).unwrap();
    assert_eq!(
        body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
        "Kore"
    );
    assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
}

#[test]
fn reply_text_and_inline_data() {
    let reply: GenerateResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": { "parts": [
                { "text": "Hello " },
                { "inlineData": { "mimeType": "audio/pcm", "data": "AAA=" } },
                { "text": "visitor" }
            ]}
        }]
    }))
    .unwrap();
    assert_eq!(reply.text().as_deref(), Some("Hello visitor"));
    assert_eq!(reply.inline_data().map(|b| b.data.as_str()), Some("AAA="));

    let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
    assert_eq!(empty.text(), None);
    assert!(empty.inline_data().is_none());
}

#[test]
fn structured_reply_tolerates_code_fence() {
    let value = parse_structured("```json\n{\"recognized\": false}\n```").unwrap();
    assert_eq!(value["recognized"], false);
    assert!(parse_structured("I think it is a tower").is_err());
}

#[test]
fn video_request_is_portrait_single_sample() {
    let body = video_request(&InlineImage::jpeg("Zm9v"), "reconstruct");
    assert_eq!(body["instances"][0]["image"]["bytesBase64Encoded"], "Zm9v");
    assert_eq!(body["parameters"]["aspectRatio"], "9:16");
    assert_eq!(body["parameters"]["sampleCount"], 1);
}

#[test]
fn operation_replies_map_to_status() {
    let pending: OperationReply = serde_json::from_value(json!({ "name": "op" })).unwrap();
    assert_eq!(pending.status(), OperationStatus::Pending);

    let done: OperationReply = serde_json::from_value(json!({
        "done": true,
        "response": { "generateVideoResponse": { "generatedSamples": [
            { "video": { "uri": "https://v/1" } }
        ]}}
    }))
    .unwrap();
    assert_eq!(
        done.status(),
        OperationStatus::Done {
            uri: Some("https://v/1".into())
        }
    );

    let failed: OperationReply =
        serde_json::from_value(json!({ "done": true, "error": { "message": "blocked" } })).unwrap();
    assert_eq!(failed.status(), OperationStatus::Error("blocked".into()));
}

#[test]
fn error_bodies_prefer_the_message() {
    assert_eq!(
        error_message(r#"{"error": {"code": 403, "message": "API key invalid"}}"#),
        "API key invalid"
    );
    assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
}
