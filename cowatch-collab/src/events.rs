use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A real-time message relayed verbatim within a room's member set.
///
/// Everything besides the `type` tag is carried as an opaque payload, so
/// clients can attach whatever fields they want to a playback or chat event
/// without the relay caring about them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// The known envelope types, plus a fallthrough for types the relay does
/// not recognize. Unknown types are forwarded, not rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Playback,
    Chat,
    #[serde(untagged)]
    Other(String),
}

impl Envelope {
    /// Parses a raw text frame. Returns `None` for anything that is not a
    /// JSON object with a string `type` field.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("envelope serializes")
    }
}
