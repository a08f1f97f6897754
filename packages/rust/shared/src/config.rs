//! Application configuration for CopyCraft.
//!
//! User config lives at `~/.copycraft/copycraft.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CopyCraftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "copycraft.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".copycraft";

// ---------------------------------------------------------------------------
// Config structs (matching copycraft.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation service settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory finished articles are saved to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "~/copycraft-articles".into()
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for every stage.
    #[serde(default = "default_model")]
    pub model: String,

    /// Service root; the `v1beta/models/...` path is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. Grounded article generation is slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_timeout_secs() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Generation settings (runtime, merged from config + environment)
// ---------------------------------------------------------------------------

/// Runtime generation client settings, resolved from config and environment.
#[derive(Clone)]
pub struct GeminiSettings {
    /// `None` when the configured env var is unset or empty; every call then
    /// fails without touching the network.
    pub api_key: Option<String>,
    /// Name of the variable the key was read from, for error messages.
    pub api_key_env: String,
    pub model: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiSettings {
    /// Resolve settings from the loaded config, reading the API key from the
    /// environment.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let gemini = &config.gemini;
        let base_url = Url::parse(&gemini.base_url).map_err(|e| {
            CopyCraftError::config(format!("invalid gemini.base_url '{}': {e}", gemini.base_url))
        })?;

        Ok(Self {
            api_key: read_api_key(&gemini.api_key_env),
            api_key_env: gemini.api_key_env.clone(),
            model: gemini.model.clone(),
            base_url,
            timeout: Duration::from_secs(gemini.timeout_secs),
        })
    }
}

fn read_api_key(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.copycraft/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CopyCraftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.copycraft/copycraft.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| CopyCraftError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CopyCraftError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CopyCraftError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CopyCraftError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CopyCraftError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.gemini.api_key_env;
    match read_api_key(var_name) {
        Some(_) => Ok(()),
        None => Err(CopyCraftError::config(format!(
            "Gemini API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://aistudio.google.com/apikey"
        ))),
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
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
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(toml_str.contains("gemini-2.5-flash"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.gemini.timeout_secs, 120);
        assert_eq!(parsed.gemini.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[gemini]
model = "gemini-2.5-pro"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.defaults.output_dir, "~/copycraft-articles");
    }

    #[test]
    fn settings_from_app_config() {
        let mut app = AppConfig::default();
        app.gemini.api_key_env = "CC_TEST_NONEXISTENT_KEY_12345".into();
        let settings = GeminiSettings::from_config(&app).expect("settings");
        assert!(settings.api_key.is_none());
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.base_url.host_str(), Some("generativelanguage.googleapis.com"));
    }

    #[test]
    fn settings_reject_bad_base_url() {
        let mut app = AppConfig::default();
        app.gemini.base_url = "not a url".into();
        let err = GeminiSettings::from_config(&app).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn settings_debug_hides_key() {
        let app = AppConfig::default();
        let mut settings = GeminiSettings::from_config(&app).expect("settings");
        settings.api_key = Some("super-secret".into());
        let debug = format!("{settings:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.gemini.api_key_env = "CC_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/tmp/out"), PathBuf::from("/tmp/out"));
        assert_eq!(expand_home("relative"), PathBuf::from("relative"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/articles"), home.join("articles"));
        }
    }
}
