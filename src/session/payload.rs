use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter payload sent to rendering clients
///
/// Only the parameters known for this update are included; clients apply
/// them on top of whatever they already have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPayload {
    /// Identity of the avatar this update targets
    pub user_id: String,

    /// Parameter name → value
    pub parameters: BTreeMap<String, f64>,

    /// Model asset locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrm_path: Option<String>,

    /// Caption text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Synthesized speech audio URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Lipsync envelope URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_url: Option<String>,
}

impl ParameterPayload {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            parameters: BTreeMap::new(),
            vrm_path: None,
            text: None,
            audio_url: None,
            json_url: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_vrm_path(mut self, path: impl Into<String>) -> Self {
        self.vrm_path = Some(path.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_audio(mut self, audio_url: impl Into<String>, json_url: impl Into<String>) -> Self {
        self.audio_url = Some(audio_url.into());
        self.json_url = Some(json_url.into());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = ParameterPayload::new("vrm_user_a")
            .with_parameter("mouthOpen", 0.25)
            .to_json()
            .unwrap();

        assert_eq!(json, r#"{"userId":"vrm_user_a","parameters":{"mouthOpen":0.25}}"#);
    }

    #[test]
    fn test_camel_case_audio_fields() {
        let json = ParameterPayload::new("user_b")
            .with_parameter("mouthOpen", 0.5)
            .with_audio("http://localhost:3000/audio/a.wav", "http://localhost:3000/audio/a.json")
            .to_json()
            .unwrap();

        assert!(json.contains("\"audioUrl\":\"http://localhost:3000/audio/a.wav\""));
        assert!(json.contains("\"jsonUrl\":\"http://localhost:3000/audio/a.json\""));
        assert!(!json.contains("vrmPath"));
        assert!(!json.contains("\"text\""));
    }
}
