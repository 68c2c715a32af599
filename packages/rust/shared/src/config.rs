//! Application configuration for contactpipe.
//!
//! User config lives at `~/.contactpipe/contactpipe.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContactPipeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contactpipe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contactpipe";

// ---------------------------------------------------------------------------
// Config structs (matching contactpipe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Spreadsheet source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// CRM upsert settings.
    #[serde(default)]
    pub crm: CrmConfig,

    /// Pipeline defaults.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[source]` section: where rows come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the spreadsheet values API.
    #[serde(default = "default_source_base_url")]
    pub base_url: String,

    /// Spreadsheet identifier.
    #[serde(default)]
    pub sheet_id: String,

    /// Upper bound on rows considered (the fetched range is `A1:O{row_cap}`).
    #[serde(default = "default_row_cap")]
    pub row_cap: u32,

    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_source_token_env")]
    pub token_env: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_source_base_url(),
            sheet_id: String::new(),
            row_cap: default_row_cap(),
            token_env: default_source_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    /// The rectangular cell range to fetch, capped at `row_cap` rows.
    pub fn range(&self) -> String {
        format!("A1:O{}", self.row_cap)
    }
}

fn default_source_base_url() -> String {
    "https://sheets.googleapis.com".into()
}
fn default_row_cap() -> u32 {
    10_000
}
fn default_source_token_env() -> String {
    "SHEETS_API_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[crm]` section: where validated contacts go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// Base URL of the CRM API.
    #[serde(default = "default_crm_base_url")]
    pub base_url: String,

    /// Path of the batch upsert endpoint.
    #[serde(default = "default_upsert_path")]
    pub upsert_path: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_crm_api_key_env")]
    pub api_key_env: String,

    /// Maximum number of contacts per upsert batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            base_url: default_crm_base_url(),
            upsert_path: default_upsert_path(),
            api_key_env: default_crm_api_key_env(),
            max_batch_size: default_max_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_crm_base_url() -> String {
    "https://api.hubapi.com".into()
}
fn default_upsert_path() -> String {
    "/crm/v3/objects/contacts/batch/upsert".into()
}
fn default_crm_api_key_env() -> String {
    "HUBSPOT_API_KEY".into()
}
fn default_max_batch_size() -> usize {
    100
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Path of the intermediate JSON store.
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "data/contacts.json".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contactpipe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContactPipeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contactpipe/contactpipe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContactPipeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContactPipeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContactPipeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContactPipeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContactPipeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a required secret from the env var named by `var_name`.
pub fn require_env(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ContactPipeError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that the CRM API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    require_env(&config.crm.api_key_env, "CRM API key").map(|_| ())
}

/// Check that the spreadsheet bearer token env var is set and non-empty.
pub fn validate_source_token(config: &AppConfig) -> Result<()> {
    require_env(&config.source.token_env, "spreadsheet API token").map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("sheets.googleapis.com"));
        assert!(toml_str.contains("HUBSPOT_API_KEY"));
        assert!(toml_str.contains("batch/upsert"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.source.row_cap, 10_000);
        assert_eq!(parsed.crm.max_batch_size, 100);
        assert_eq!(parsed.pipeline.store_path, "data/contacts.json");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[source]
sheet_id = "1AbC"
row_cap = 500

[crm]
max_batch_size = 25
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.sheet_id, "1AbC");
        assert_eq!(config.source.range(), "A1:O500");
        assert_eq!(config.crm.max_batch_size, 25);
        assert_eq!(config.crm.base_url, "https://api.hubapi.com");
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.crm.api_key_env = "CP_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
