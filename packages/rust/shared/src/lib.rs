//! Shared types, error model, and configuration for CopyCraft.
//!
//! This crate is the foundation depended on by all other CopyCraft crates.
//! It provides:
//! - [`CopyCraftError`]: the unified error type
//! - Domain types ([`DraftState`], [`Angle`], [`Source`], [`StyleTag`], [`Stage`])
//! - Configuration ([`AppConfig`], [`GeminiSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeminiConfig, GeminiSettings, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{CopyCraftError, Result};
pub use types::{
    Angle, AngleId, DraftState, GroundingChunk, GroundingMetadata, Source, Stage, StyleTag,
    WebChunk,
};
