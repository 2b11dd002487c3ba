//! Text-to-speech engines
//!
//! The bridge only needs WAV bytes back; the engine behind it is swappable.

use super::error::LipsyncError;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "GOOGLE_CLOUD_API_KEY";

/// Trait for speech synthesis engines
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into a complete WAV file
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, LipsyncError>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Cloud TTS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// API root, without the `/v1/...` path
    pub endpoint: String,

    /// API key; falls back to `GOOGLE_CLOUD_API_KEY`
    pub api_key: Option<String>,

    /// BCP-47 language code (e.g., "ko-KR")
    pub language_code: String,

    /// "FEMALE", "MALE" or "NEUTRAL"
    pub ssml_gender: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://texttospeech.googleapis.com".to_string(),
            api_key: None,
            language_code: "ko-KR".to_string(),
            ssml_gender: "FEMALE".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Google Cloud Text-to-Speech over REST, LINEAR16 output
pub struct GoogleTtsEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    language_code: String,
    ssml_gender: String,
}

impl GoogleTtsEngine {
    pub fn new(config: &TtsConfig) -> Result<Self, LipsyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LipsyncError::Synthesis(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language_code: config.language_code.clone(),
            ssml_gender: config.ssml_gender.clone(),
        })
    }

    fn api_key(&self) -> Result<String, LipsyncError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(API_KEY_ENV)
            .map_err(|_| LipsyncError::Synthesis("Google Cloud API key not provided".to_string()))
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "input": {
                "text": text
            },
            "voice": {
                "languageCode": self.language_code,
                "ssmlGender": self.ssml_gender,
            },
            "audioConfig": {
                "audioEncoding": "LINEAR16"
            }
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsEngine {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, LipsyncError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/text:synthesize", self.endpoint);

        debug!("Requesting speech for {} characters", text.chars().count());

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| LipsyncError::Synthesis(format!("Google Cloud API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LipsyncError::Synthesis(format!(
                "Google Cloud API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LipsyncError::Synthesis(format!("Failed to parse Google Cloud response: {}", e)))?;

        let audio_content = response_json
            .get("audioContent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| LipsyncError::Synthesis("Missing audioContent in Google Cloud response".to_string()))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(audio_content)
            .map_err(|e| LipsyncError::Synthesis(format!("Failed to decode base64 audio: {}", e)))?;

        info!("Synthesized {} bytes of audio", audio.len());

        Ok(audio)
    }

    fn name(&self) -> &str {
        "google-cloud-tts"
    }
}
