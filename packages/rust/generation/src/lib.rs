//! Prompt building and text generation for ContractForge.
//!
//! Converts a [`contractforge_shared::StateConfig`] into per-section prompts
//! and sends them to the external text-generation collaborator over HTTP.

mod client;
mod prompts;

pub use client::{
    GeneratorClient, GeneratorSettings, TextGenerator, placeholder_text, postprocess,
};
pub use prompts::{PromptKind, build_prompt};
