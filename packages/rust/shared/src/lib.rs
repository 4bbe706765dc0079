//! Shared types, error model, and configuration for ContractForge.
//!
//! This crate is the foundation depended on by all other ContractForge crates.
//! It provides:
//! - [`ContractForgeError`] — the unified error type
//! - Domain types ([`StateConfig`], [`RateSchedule`], [`Document`], [`SectionKind`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GenerationConfig, PdfConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{ContractForgeError, Result};
pub use types::{
    ContractSection, Document, ProviderDetails, RateEntry, RateSchedule, SectionBody, SectionKind,
    ServiceArea, StateConfig,
};
