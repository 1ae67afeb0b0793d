// Host-side tests for the embedded page configuration.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod config {
    include!("../src/config.rs");
}

use config::*;

#[test]
fn empty_config_uses_defaults() {
    let config = AppConfig::from_json("  ").unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.store(), None);
    assert_eq!(config.generation_key(), None);
    assert_eq!(config.generation_base, DEFAULT_GENERATION_BASE);
}

#[test]
fn partial_config_fills_remaining_fields() {
    let config = AppConfig::from_json(
        r#"{ "store_url": "https://db.example/", "store_key": "anon", "voice": "Puck" }"#,
    )
    .unwrap();
    assert_eq!(config.store(), Some(("https://db.example", "anon")));
    assert_eq!(config.voice, "Puck");
    assert_eq!(config.live_url, DEFAULT_LIVE_URL);
}

#[test]
fn blank_credentials_count_as_missing() {
    let config = AppConfig::from_json(
        r#"{ "store_url": "https://db.example", "store_key": "  ", "generation_key": "" }"#,
    )
    .unwrap();
    assert_eq!(config.store(), None);
    assert_eq!(config.generation_key(), None);

    let config = AppConfig::from_json(r#"{ "generation_key": " k-123 " }"#).unwrap();
    assert_eq!(config.generation_key(), Some("k-123"));
}

#[test]
fn malformed_config_is_an_error() {
    assert!(AppConfig::from_json("{ store_url: ").is_err());
}
