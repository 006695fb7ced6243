//! Tone classification: numeric 0–100 dials to categorical tags.
//!
//! All three dimensions share one rule. Values strictly below `low` take the
//! dimension's low label, values strictly above `high` take its high label,
//! and everything else (including both boundaries) is balanced. Inputs are
//! never clamped.

use doppel_core::ToneSettings;

/// Classification cutoffs shared by every dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 33.0,
            high: 66.0,
        }
    }
}

/// Where a value sits relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    Balanced,
    High,
}

impl Thresholds {
    pub fn level(&self, value: f64) -> Level {
        if value < self.low {
            Level::Low
        } else if value > self.high {
            Level::High
        } else {
            Level::Balanced
        }
    }
}

/// A tone dimension, which decides the label vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Formality,
    Empathy,
    Directness,
}

impl Dimension {
    /// Tag for `level` on this dimension.
    pub fn label(&self, level: Level) -> &'static str {
        match (self, level) {
            (Dimension::Formality, Level::Low) => "casual",
            (Dimension::Formality, Level::High) => "formal",
            (Dimension::Formality, Level::Balanced) => "balanced-tone",
            (Dimension::Empathy, Level::Low) => "direct",
            (Dimension::Empathy, Level::High) => "empathetic",
            (Dimension::Empathy, Level::Balanced) => "balanced-empathy",
            (Dimension::Directness, Level::Low) => "subtle",
            (Dimension::Directness, Level::High) => "straightforward",
            (Dimension::Directness, Level::Balanced) => "balanced-directness",
        }
    }
}

/// Classify `value` on `dimension` with the default thresholds.
pub fn classify(value: f64, dimension: Dimension) -> &'static str {
    classify_with(value, dimension, Thresholds::default())
}

pub fn classify_with(value: f64, dimension: Dimension, thresholds: Thresholds) -> &'static str {
    dimension.label(thresholds.level(value))
}

/// The three tone tags for a profile, in tag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneProfile {
    pub formality: &'static str,
    pub empathy: &'static str,
    pub directness: &'static str,
}

impl ToneProfile {
    pub fn from_settings(settings: &ToneSettings) -> Self {
        Self {
            formality: classify(settings.formality, Dimension::Formality),
            empathy: classify(settings.empathy, Dimension::Empathy),
            directness: classify(settings.directness, Dimension::Directness),
        }
    }
}
