use serde::Deserialize;
use serde_json::Value;

/// Control message from a rendering client
///
/// Unrecognized fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    /// Readiness signal; truthy values trigger speech synthesis
    #[serde(default)]
    pub ready: Option<Value>,

    /// Routing override for the synthesized payload
    #[serde(default)]
    pub user_id: Option<Value>,

    /// Prompt override for speech synthesis
    #[serde(default)]
    pub text: Option<Value>,
}

/// A resolved request to speak
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakRequest {
    /// Identity the result is routed to
    pub identity: String,
    /// Text to synthesize
    pub prompt: String,
}

impl ClientMessage {
    /// Parse a client frame. Valid JSON that is not an object (arrays,
    /// scalars) carries no fields and parses to an inert message.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            _ => Ok(Self::default()),
        }
    }

    /// `ready` compared loosely against `true`: `true`, `1` and numeric
    /// strings equal to one count; everything else does not.
    pub fn is_ready(&self) -> bool {
        match &self.ready {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok() == Some(1.0),
            _ => false,
        }
    }

    /// Explicit `userId` if it is a non-empty string
    pub fn user_id(&self) -> Option<&str> {
        non_empty_str(self.user_id.as_ref())
    }

    pub fn prompt(&self) -> Option<&str> {
        non_empty_str(self.text.as_ref())
    }

    /// Resolve the speak request this message carries, if any
    pub fn speak_request(&self, connection_identity: &str, default_prompt: &str) -> Option<SpeakRequest> {
        if !self.is_ready() {
            return None;
        }

        Some(SpeakRequest {
            identity: self.user_id().unwrap_or(connection_identity).to_string(),
            prompt: self.prompt().unwrap_or(default_prompt).to_string(),
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
