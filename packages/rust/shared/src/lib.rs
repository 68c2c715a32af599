//! Shared types, error model, and configuration for contactpipe.
//!
//! This crate is the foundation depended on by all other contactpipe crates.
//! It provides:
//! - [`ContactPipeError`] — the unified error type
//! - Domain types ([`CanonicalContact`], [`ContactProperties`], [`RunId`])
//! - The raw row model ([`RowTable`], [`RawRow`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod table;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrmConfig, PipelineConfig, SourceConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, require_env, validate_api_key, validate_source_token,
};
pub use error::{ContactPipeError, Result};
pub use table::{RawRow, RowTable};
pub use types::{
    CONTACT_ORIGIN, CanonicalContact, ContactProperties, ID_PROPERTY_EMAIL, LEAD_STATUS_NEW, RunId,
};
