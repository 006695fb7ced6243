//! Persona domain types.
//!
//! A `CloneProfile` describes the person being simulated; a
//! `SynthesisRequest` pairs it with a query, and a `SynthesisResult` is what
//! comes back. Nothing here is persisted; every value lives for a single
//! request/response cycle.
//!
//! Field names on the wire follow the camelCase JSON the clients send
//! (`toneSettings`, `cloneData`); the result uses `clone_reply`.

use serde::{Deserialize, Serialize};

/// The person whose communication style is being reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProfile {
    /// Display name of the persona
    pub name: String,

    /// Free-text description of traits and values
    #[serde(default)]
    pub personality: String,

    /// Example writing, in the order the user supplied it
    #[serde(default)]
    pub samples: Vec<String>,

    /// Contextual facts the persona knows
    #[serde(default)]
    pub memories: Vec<String>,

    /// Style dials
    #[serde(default)]
    pub tone_settings: ToneSettings,
}

/// The three tone dimensions plus the requested reply length.
///
/// Dimensions are nominally 0–100 but are not clamped: fractional and
/// out-of-range values are classified by the same threshold rule as in-range
/// integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSettings {
    #[serde(default = "default_dimension")]
    pub formality: f64,

    #[serde(default = "default_dimension")]
    pub empathy: f64,

    #[serde(default = "default_dimension")]
    pub directness: f64,

    #[serde(default)]
    pub length: LengthPreference,
}

fn default_dimension() -> f64 {
    50.0
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            formality: default_dimension(),
            empathy: default_dimension(),
            directness: default_dimension(),
            length: LengthPreference::default(),
        }
    }
}

/// Requested reply length category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPreference {
    Short,
    #[default]
    Medium,
    Detailed,
}

impl LengthPreference {
    /// The literal wire value, which doubles as the length tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthPreference::Short => "short",
            LengthPreference::Medium => "medium",
            LengthPreference::Detailed => "detailed",
        }
    }
}

impl std::fmt::Display for LengthPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query addressed to a persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub query: String,

    #[serde(rename = "cloneData")]
    pub profile: CloneProfile,
}

impl SynthesisRequest {
    pub fn new(query: impl Into<String>, profile: CloneProfile) -> Self {
        Self {
            query: query.into(),
            profile,
        }
    }
}

/// The synthesized reply, why it fits the persona, and descriptive tags.
///
/// Tags keep insertion order: tone, empathy, directness, length, then at
/// most one intent tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    #[serde(rename = "clone_reply")]
    pub reply: String,

    pub explanation: String,

    pub tags: Vec<String>,
}
