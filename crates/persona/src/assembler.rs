//! Tag derivation and final result assembly.

use crate::intent::QueryIntent;
use crate::tone::ToneProfile;
use doppel_core::{CloneProfile, SynthesisResult};

/// Tags for a profile and query intent.
///
/// Always the tone, empathy, directness and length tags in that order,
/// followed by at most one intent tag.
pub fn tags_for(profile: &CloneProfile, intent: &QueryIntent) -> Vec<String> {
    let settings = &profile.tone_settings;
    let tone = ToneProfile::from_settings(settings);

    let mut tags = vec![
        tone.formality.to_string(),
        tone.empathy.to_string(),
        tone.directness.to_string(),
        settings.length.as_str().to_string(),
    ];
    if let Some(tag) = intent.tag() {
        tags.push(tag.to_string());
    }
    tags
}

pub fn assemble(reply: String, explanation: String, tags: Vec<String>) -> SynthesisResult {
    SynthesisResult {
        reply,
        explanation,
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::classify_intent;
    use doppel_core::{LengthPreference, ToneSettings};

    fn profile(formality: f64, empathy: f64, directness: f64, length: LengthPreference) -> CloneProfile {
        CloneProfile {
            name: "Sam".into(),
            personality: String::new(),
            samples: vec![],
            memories: vec![],
            tone_settings: ToneSettings {
                formality,
                empathy,
                directness,
                length,
            },
        }
    }

    #[test]
    fn question_tags() {
        let tags = tags_for(
            &profile(20.0, 80.0, 50.0, LengthPreference::Short),
            &classify_intent("What should I do about my career?"),
        );
        assert_eq!(
            tags,
            ["casual", "empathetic", "balanced-directness", "short", "decision-support"]
        );
    }

    #[test]
    fn message_request_tags() {
        let tags = tags_for(
            &profile(80.0, 20.0, 80.0, LengthPreference::Detailed),
            &classify_intent("Please reply to this email"),
        );
        assert_eq!(tags, ["formal", "direct", "straightforward", "detailed", "auto-reply"]);
    }

    #[test]
    fn statement_tags_have_no_intent() {
        let tags = tags_for(
            &profile(50.0, 50.0, 50.0, LengthPreference::Medium),
            &classify_intent("Nice weather today"),
        );
        assert_eq!(tags, ["balanced-tone", "balanced-empathy", "balanced-directness", "medium"]);
    }

    #[test]
    fn tags_never_hold_both_intents() {
        for query in ["reply?", "message me?", "respond", "hello", "why?"] {
            let tags = tags_for(&profile(0.0, 100.0, 33.0, LengthPreference::Short), &classify_intent(query));
            assert!(tags.len() == 4 || tags.len() == 5);
            let both = tags.iter().any(|t| t == "decision-support") && tags.iter().any(|t| t == "auto-reply");
            assert!(!both, "{query}");
        }
    }

    #[test]
    fn assemble_keeps_fields() {
        let result = assemble("hi".into(), "because".into(), vec!["casual".into()]);
        assert_eq!(result.reply, "hi");
        assert_eq!(result.explanation, "because");
        assert_eq!(result.tags, vec!["casual"]);
    }
}
