//! # Doppel Persona
//!
//! The reply synthesis pipeline: given a query and a clone profile, produce a
//! reply in the persona's voice, an explanation of why it fits, and tags.
//!
//! ## Stages
//!
//! - [`tone`] maps the numeric tone dials to categorical tags
//! - [`intent`] spots questions and message requests
//! - [`prompt`] composes the reply and explanation prompts
//! - [`invoker`] calls the generation provider
//! - [`fallback`] answers offline when generation fails
//! - [`assembler`] builds tags and the final result
//! - [`synthesizer`] wires the stages together
//!
//! ```rust,ignore
//! let synth = CloneSynthesizer::from_config(&config)?;
//! let out = synth.synthesize(&request).await?;
//! println!("{}", out.result.reply);
//! ```

pub mod assembler;
pub mod fallback;
pub mod intent;
pub mod invoker;
pub mod prompt;
pub mod synthesizer;
pub mod tone;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use fallback::{FallbackSynthesizer, PhraseSource, SeededSource, SequenceSource, ThreadRngSource};
pub use intent::{QueryIntent, classify_intent};
pub use synthesizer::{CloneSynthesizer, GenerationSource, Synthesis};
pub use tone::{Dimension, ToneProfile};
