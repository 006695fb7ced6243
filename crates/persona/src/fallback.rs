//! Offline fallback synthesizer.
//!
//! Produces a reply, explanation, and tags from canned phrase pools and the
//! tone dials alone. It never calls out and never fails, which makes it the
//! terminus for every non-credential generation failure.
//!
//! The structure of the output is fixed by the inputs; only the fragment
//! choice is random, and that choice goes through an injectable
//! [`PhraseSource`] so tests can pin it.

use crate::assembler::{assemble, tags_for};
use crate::intent::classify_intent;
use doppel_core::{CloneProfile, LengthPreference, SynthesisRequest, SynthesisResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

const THOUGHTFUL_ANSWERS: [&str; 6] = [
    "I'd start by getting clear on what you actually want out of this. Once that's settled, the next step usually shows itself.",
    "I think it comes down to which trade-offs you can live with. Write the options down and be honest about what each one costs you.",
    "I'd trust your instincts here, but check them against the facts. A conversation with someone you respect can help too.",
    "I'd focus on the part you can control right now. The rest tends to sort itself out once you take the first step.",
    "I believe the right move is the one you'll still be comfortable with a year from now. Give yourself a little time before deciding.",
    "I'd break it into smaller decisions instead of one big one. Each choice gets easier and you keep your options open.",
];

const MESSAGE_REPLIES: [&str; 6] = [
    "I've gone through everything you sent and I'm happy to help. Let me know when suits you to follow up.",
    "I'll take a proper look and get back to you shortly with my thoughts. Thanks for your patience in the meantime.",
    "That all makes sense to me and I'm on board. Send over anything else you need me to see.",
    "I hear you, and I think we can sort this out together. Let's find a time to talk it through.",
    "Good to hear from you and thanks for the update. I'll keep you posted on my side as things move.",
    "I appreciate you laying it out so clearly. I'll reply properly once I've had a moment to think it over.",
];

const CASUAL_QUESTION_OPENER: &str = "Honestly, here's my take:";
const FORMAL_QUESTION_OPENER: &str = "That is a question worth considering carefully, and my view is this:";

const EMPATHETIC_MESSAGE_OPENER: &str =
    "Thank you so much for reaching out, I really appreciate you thinking of me.";
const DIRECT_MESSAGE_OPENER: &str = "Thanks for the message, here is where I stand.";
const NEUTRAL_MESSAGE_OPENER: &str = "Thanks for getting in touch.";

const STATEMENT_CLOSING: &str = "That's how I see it, anyway.";

/// Source of fragment choices.
pub trait PhraseSource: Send + Sync {
    /// Index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform choice from rand's thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl PhraseSource for ThreadRngSource {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Reproducible choice from a seeded `StdRng`.
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PhraseSource for SeededSource {
    fn pick(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(0..len)
    }
}

/// Replays a fixed index sequence, cycling when exhausted.
///
/// Also counts draws, so tests can assert whether the fallback ran at all.
#[derive(Debug, Default)]
pub struct SequenceSource {
    picks: Vec<usize>,
    cursor: AtomicUsize,
}

impl SequenceSource {
    pub fn new(picks: Vec<usize>) -> Self {
        Self {
            picks,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of choices made so far.
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl PhraseSource for SequenceSource {
    fn pick(&self, len: usize) -> usize {
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        if self.picks.is_empty() {
            return 0;
        }
        self.picks[i % self.picks.len()] % len
    }
}

/// Template-based reply generator.
#[derive(Clone)]
pub struct FallbackSynthesizer {
    source: Arc<dyn PhraseSource>,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngSource))
    }
}

impl FallbackSynthesizer {
    pub fn new(source: Arc<dyn PhraseSource>) -> Self {
        Self { source }
    }

    pub fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        let profile = &request.profile;
        let tone = &profile.tone_settings;
        let intent = classify_intent(&request.query);

        let (reply, explanation) = if intent.is_question {
            let opener = if tone.formality < 50.0 {
                CASUAL_QUESTION_OPENER
            } else {
                FORMAL_QUESTION_OPENER
            };
            (
                format!("{opener} {}", self.choose(&THOUGHTFUL_ANSWERS)),
                question_explanation(profile),
            )
        } else if intent.is_message_request {
            let opener = if tone.empathy > 60.0 {
                EMPATHETIC_MESSAGE_OPENER
            } else if tone.directness > 60.0 {
                DIRECT_MESSAGE_OPENER
            } else {
                NEUTRAL_MESSAGE_OPENER
            };
            (
                format!("{opener} {}", self.choose(&MESSAGE_REPLIES)),
                message_explanation(profile),
            )
        } else {
            (
                format!("{} {STATEMENT_CLOSING}", self.choose(&THOUGHTFUL_ANSWERS)),
                statement_explanation(profile),
            )
        };

        let reply = if tone.length == LengthPreference::Short {
            first_sentence(&reply)
        } else {
            reply
        };

        debug!(
            question = intent.is_question,
            message_request = intent.is_message_request,
            length = %tone.length,
            "Fallback reply composed"
        );

        assemble(reply, explanation, tags_for(profile, &intent))
    }

    fn choose(&self, pool: &[&'static str]) -> &'static str {
        pool[self.source.pick(pool.len()) % pool.len()]
    }
}

/// Keep the text before the first period and end it with a single period.
///
/// Abbreviations such as "e.g." cut the sentence short; that is accepted.
pub fn first_sentence(text: &str) -> String {
    format!("{}.", text.split('.').next().unwrap_or_default())
}

fn personality_clause(profile: &CloneProfile) -> String {
    profile
        .personality
        .trim()
        .trim_end_matches('.')
        .to_string()
}

fn question_explanation(profile: &CloneProfile) -> String {
    let personality = personality_clause(profile);
    if personality.is_empty() {
        format!(
            "{} would answer this way because it reflects how they usually weigh decisions.",
            profile.name
        )
    } else {
        format!(
            "{} would answer this way because it reflects their personality ({personality}) and how they usually weigh decisions.",
            profile.name
        )
    }
}

fn message_explanation(profile: &CloneProfile) -> String {
    format!(
        "This reply mirrors how {} usually handles messages, with the tone set by their empathy and directness preferences.",
        profile.name
    )
}

fn statement_explanation(profile: &CloneProfile) -> String {
    let personality = personality_clause(profile);
    if personality.is_empty() {
        format!(
            "{} responded this way because it reflects their core values and thinking pattern.",
            profile.name
        )
    } else {
        format!(
            "{} responded this way because it reflects their core values and thinking pattern: {personality}.",
            profile.name
        )
    }
}
