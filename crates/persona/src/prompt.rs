//! Prompt composition for the reply and explanation calls.
//!
//! Everything the generator needs to stay in character goes into a single
//! document: who the persona is, how they write, what they remember, and how
//! the tone dials are set. No multi-turn state is kept between calls.

use crate::tone::ToneProfile;
use doppel_core::{CloneProfile, LengthPreference};

/// Builds the reply prompt for `query` addressed to `profile`.
pub fn reply_prompt(profile: &CloneProfile, query: &str) -> String {
    let name = &profile.name;
    let tone = ToneProfile::from_settings(&profile.tone_settings);
    let settings = &profile.tone_settings;
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are {name}. You are not an AI assistant; you are {name}, replying in your own voice.\n\n"
    ));

    prompt.push_str("PERSONALITY:\n");
    prompt.push_str(profile.personality.trim());
    prompt.push_str("\n\n");

    prompt.push_str("WRITING SAMPLES (mirror this style):\n");
    if profile.samples.is_empty() {
        prompt.push_str("No writing samples provided.\n");
    } else {
        for (i, sample) in profile.samples.iter().enumerate() {
            prompt.push_str(&format!("{}. \"{}\"\n", i + 1, sample.trim()));
        }
    }
    prompt.push('\n');

    prompt.push_str("MEMORIES AND CONTEXT:\n");
    prompt.push_str(&numbered_memories(profile));
    prompt.push('\n');

    prompt.push_str("TONE SETTINGS:\n");
    prompt.push_str(&format!(
        "- Formality: {}/100 ({})\n",
        settings.formality, tone.formality
    ));
    prompt.push_str(&format!(
        "- Empathy: {}/100 ({})\n",
        settings.empathy, tone.empathy
    ));
    prompt.push_str(&format!(
        "- Directness: {}/100 ({})\n",
        settings.directness, tone.directness
    ));
    prompt.push_str(&format!("- Response length: {}\n\n", settings.length));

    prompt.push_str("INSTRUCTIONS:\n");
    prompt.push_str(&format!(
        "1. Respond exactly as {name} would. Never respond as an assistant.\n"
    ));
    prompt.push_str(
        "2. Mirror the writing style of the samples: vocabulary, sentence length, punctuation, quirks.\n",
    );
    prompt.push_str(&format!(
        "3. Let {name}'s personality and values shape what you say.\n"
    ));
    prompt.push_str("4. Draw on the memories above wherever they are relevant to the query.\n");
    prompt.push_str("5. Honor the tone settings for formality, empathy, and directness.\n");
    prompt.push_str(&format!("6. Length: {}.\n", length_guidance(settings.length)));
    prompt.push_str("7. Never reveal or hint that this reply is simulated or generated.\n");
    prompt.push_str("8. Do not hedge, add disclaimers, or apologize.\n\n");

    prompt.push_str("USER QUERY:\n");
    prompt.push_str(&format!("\"{query}\"\n\n"));
    prompt.push_str(&format!("Reply as {name}:"));

    prompt
}

/// Builds the prompt asking why `profile` would have answered `query` with `reply`.
pub fn explanation_prompt(profile: &CloneProfile, query: &str, reply: &str) -> String {
    let name = &profile.name;
    let tone = ToneProfile::from_settings(&profile.tone_settings);
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Explain why {name} would reply the way they did.\n\n"
    ));
    prompt.push_str(&format!("PERSONALITY: {}\n", profile.personality.trim()));
    prompt.push_str(&format!(
        "TONE: formality {} ({}), empathy {} ({}), directness {} ({}), length {}\n",
        profile.tone_settings.formality,
        tone.formality,
        profile.tone_settings.empathy,
        tone.empathy,
        profile.tone_settings.directness,
        tone.directness,
        profile.tone_settings.length
    ));
    if !profile.samples.is_empty() {
        prompt.push_str(&format!("WRITING SAMPLES: {}\n", profile.samples.join(" | ")));
    }
    if !profile.memories.is_empty() {
        prompt.push_str(&format!("MEMORIES: {}\n", profile.memories.join(" | ")));
    }
    prompt.push_str(&format!("QUERY: \"{query}\"\n"));
    prompt.push_str(&format!("REPLY: \"{reply}\"\n\n"));
    prompt.push_str(&format!(
        "In 2-3 sentences of plain prose, written in the third person, explain why this reply fits {name}. \
         Refer to their personality, their tone settings, and any writing samples or memories that shaped it. \
         Do not use bullet points."
    ));

    prompt
}

fn numbered_memories(profile: &CloneProfile) -> String {
    if profile.memories.is_empty() {
        return "No specific memories provided.\n".into();
    }
    profile
        .memories
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}. {}\n", i + 1, m.trim()))
        .collect()
}

fn length_guidance(length: LengthPreference) -> &'static str {
    match length {
        LengthPreference::Short => "keep it brief, one or two sentences",
        LengthPreference::Medium => "a moderate reply of a short paragraph",
        LengthPreference::Detailed => "be thorough, several paragraphs if the query warrants it",
    }
}
