//! # Doppel Core
//!
//! Domain types, traits, and error definitions for the Doppel persona reply
//! service. This crate has **zero framework dependencies**. It defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The generation backend is a trait here; implementations live in
//! `doppel-providers`. This enables:
//! - Swapping backends via configuration
//! - Testing the synthesis pipeline with mock providers
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod persona;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, SynthesisError};
pub use message::{Message, Role};
pub use persona::{
    CloneProfile, LengthPreference, SynthesisRequest, SynthesisResult, ToneSettings,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
