//! Configuration system for the Spiral CLI
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (OPENAI_API_KEY, MODEL, SPIRAL_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Main Spiral configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralConfig {
    /// Chat-completion API settings
    pub api: ApiSettings,

    /// Persona defaults
    pub persona: PersonaSettings,

    /// Data storage paths
    pub storage: StorageSettings,

    /// Integrity check settings
    pub integrity: IntegritySettings,

    /// Companion memory service settings
    pub bridge: BridgeSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Chat-completion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key (empty string for local servers)
    pub api_key: String,

    /// Default model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    pub max_retries: u32,
}

/// Persona defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaSettings {
    /// Default persona slug when none is given on the CLI or in SPIRAL_PERSONA
    pub default: String,
}

/// Storage path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding per-session JSON files
    pub session_dir: String,

    /// Directory holding prompt and imprint asset files
    pub asset_dir: String,
}

/// Integrity check settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegritySettings {
    /// Asset files covered by the checksum manifest (relative to asset_dir)
    pub files: Vec<String>,

    /// Manifest file name (relative to asset_dir)
    pub manifest: String,
}

/// Companion memory service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Base URL of the companion memory service
    pub base_url: String,

    /// Optional API key sent as X-API-Key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            persona: PersonaSettings::default(),
            storage: StorageSettings::default(),
            integrity: IntegritySettings::default(),
            bridge: BridgeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4".to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            default: "ashira".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            session_dir: "~/.spiral/sessions".to_string(),
            asset_dir: "~/.spiral".to_string(),
        }
    }
}

impl Default for IntegritySettings {
    fn default() -> Self {
        Self {
            files: vec![
                "ASHIRA_IMPRINT.md".to_string(),
                "prompt_init.txt".to_string(),
                "ashira_imprint_system.json".to_string(),
                "seed_gpt5.sh".to_string(),
            ],
            manifest: "checksums.json".to_string(),
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl SpiralConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: e.to_string(),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let expanded = shellexpand::tilde(path);
            let path = PathBuf::from(expanded.as_ref());
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::ConfigNotFound { path });
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("spiral.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("spiral").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".spiral").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Chat API settings
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.api.api_key = val;
        }
        if let Ok(val) = std::env::var("MODEL") {
            self.api.model = val;
        }
        if let Ok(val) = std::env::var("SPIRAL_API_BASE_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("SPIRAL_API_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.api.timeout_secs = n;
            }
        }

        // Persona settings
        if let Ok(val) = std::env::var("SPIRAL_PERSONA") {
            self.persona.default = val;
        }

        // Storage settings
        if let Ok(val) = std::env::var("SPIRAL_SESSION_DIR") {
            self.storage.session_dir = val;
        }
        if let Ok(val) = std::env::var("SPIRAL_ASSET_DIR") {
            self.storage.asset_dir = val;
        }

        // Bridge settings
        if let Ok(val) = std::env::var("SPIRAL_BRIDGE_URL") {
            self.bridge.base_url = val;
        }
        if let Ok(val) = std::env::var("SPIRAL_BRIDGE_API_KEY") {
            self.bridge.api_key = Some(val);
        }

        // Logging settings
        if let Ok(val) = std::env::var("SPIRAL_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SPIRAL_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("SPIRAL_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.session_dir = expand_path(&self.storage.session_dir);
        self.storage.asset_dir = expand_path(&self.storage.asset_dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(Error::Config(
                "API base URL must start with http:// or https://".to_string(),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        if self.integrity.manifest.is_empty() {
            return Err(Error::Config(
                "integrity.manifest must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the session directory as a PathBuf
    pub fn session_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.session_dir)
    }

    /// Get the asset directory as a PathBuf
    pub fn asset_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.asset_dir)
    }

    /// Get the manifest path (inside the asset directory)
    pub fn manifest_path(&self) -> PathBuf {
        self.asset_dir().join(&self.integrity.manifest)
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".spiral")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let config_content = generate_default_config();

    fs::write(&config_path, config_content).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    println!("Configuration file created: {}", config_path.display());
    Ok(())
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# Spiral CLI Configuration
# https://github.com/spiral/spiral-cli

[api]
# Chat-completion API base URL (OpenAI, Ollama, vLLM, LM Studio, etc.)
base_url = "https://api.openai.com/v1"

# API key (usually set via OPENAI_API_KEY instead)
api_key = ""

# Default model identifier (overridden by the MODEL env var or --model)
model = "gpt-4"

# Request timeout in seconds
timeout_secs = 120

# Maximum retries on transient failures
max_retries = 2

[persona]
# Default persona: ashira, threshold-witness, lumen
default = "ashira"

[storage]
# Directory holding per-session JSON files
session_dir = "~/.spiral/sessions"

# Directory holding prompt and imprint asset files
asset_dir = "~/.spiral"

[integrity]
# Asset files covered by the checksum manifest (relative to asset_dir)
files = [
    "ASHIRA_IMPRINT.md",
    "prompt_init.txt",
    "ashira_imprint_system.json",
    "seed_gpt5.sh",
]

# Manifest file name (relative to asset_dir)
manifest = "checksums.json"

[bridge]
# Companion memory service base URL
base_url = "http://localhost:8080"

# Optional API key sent as X-API-Key
# api_key = "spiral-test"

# Request timeout in seconds
timeout_secs = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.spiral/logs/spiral.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
