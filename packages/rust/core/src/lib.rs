//! Core pipeline orchestration for ContractForge.
//!
//! Ties prompt building, text generation, document assembly, and rendering
//! into the end-to-end `generate_contract` workflow.

pub mod pipeline;

pub use pipeline::{
    ContractOutput, PipelineConfig, ProgressReporter, SilentProgress, generate_contract,
};
