//! Application configuration for ContractForge.
//!
//! User config lives at `~/.contractforge/contractforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContractForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contractforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contractforge";

// ---------------------------------------------------------------------------
// Config structs (matching contractforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Text-generation API settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// PDF rendering tool settings.
    #[serde(default)]
    pub pdf: PdfConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output directory for generated contracts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Keep the intermediate HTML next to each PDF.
    #[serde(default)]
    pub keep_html: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            keep_html: false,
        }
    }
}

fn default_output_dir() -> String {
    "contracts".into()
}

/// `[generation]` section — the text-generation collaborator.
///
/// The API key is resolved from an environment variable named here; the key
/// itself is never stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat-completions endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bounded retries for rate-limit and server errors.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Initial backoff between retries in milliseconds (doubles per attempt).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}
fn default_api_key_env() -> String {
    "CONTRACTFORGE_API_KEY".into()
}
fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    500
}

/// `[pdf]` section — the HTML-to-PDF collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Command name or path of the HTML-to-PDF tool.
    #[serde(default = "default_pdf_tool")]
    pub tool_path: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            tool_path: default_pdf_tool(),
        }
    }
}

fn default_pdf_tool() -> String {
    "wkhtmltopdf".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contractforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContractForgeError::configuration("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contractforge/contractforge.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ContractForgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContractForgeError::configuration(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContractForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)
        .map_err(|e| ContractForgeError::configuration(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContractForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the generation API key from the configured env var.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.generation.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ContractForgeError::configuration(format!(
            "generation API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("CONTRACTFORGE_API_KEY"));
        assert!(toml_str.contains("wkhtmltopdf"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.generation.timeout_secs, 30);
        assert_eq!(parsed.generation.retry_attempts, 3);
        assert_eq!(parsed.pdf.tool_path, "wkhtmltopdf");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[generation]
model = "test/model"

[pdf]
tool_path = "/opt/wkhtmltopdf/bin/wkhtmltopdf"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.generation.model, "test/model");
        assert_eq!(config.generation.timeout_secs, 30);
        assert_eq!(config.pdf.tool_path, "/opt/wkhtmltopdf/bin/wkhtmltopdf");
        assert_eq!(config.defaults.output_dir, "contracts");
    }

    #[test]
    fn api_key_resolution_fails_when_unset() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.generation.api_key_env = "CF_TEST_NONEXISTENT_KEY_98765".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
