//! Configuration management for JobPilot.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// Loaded from `~/.config/jobpilot/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search and delivery settings
    pub search: SearchConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Greeting-generation LLM settings
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBPILOT_HEADLESS`: Override browser headless mode (true/false)
    /// - `JOBPILOT_DEBUG`: Override search.debug (true/false)
    /// - `JOBPILOT_ENABLE_AI`: Override search.enable_ai (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("JOBPILOT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("JOBPILOT_DEBUG") {
            if let Ok(value) = val.parse() {
                config.search.debug = value;
                tracing::debug!("Override search.debug from env: {}", value);
            }
        }

        if let Ok(val) = std::env::var("JOBPILOT_ENABLE_AI") {
            if let Ok(enabled) = val.parse() {
                config.search.enable_ai = enabled;
                tracing::debug!("Override search.enable_ai from env: {}", enabled);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        tracing::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Path to the config file.
    fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "jobpilot", "jobpilot")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Validate cross-field constraints before a run starts.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for an inverted expected-salary
    /// range or for AI greeting enabled without LLM credentials.
    pub fn validate(&self) -> ConfigResult<()> {
        if let [min, max] = self.search.expected_salary[..] {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    field: "search.expected_salary".to_string(),
                    reason: format!("min {min} exceeds max {max}"),
                });
            }
        }

        if self.search.enable_ai && (self.llm.base_url.is_empty() || self.llm.api_key.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "llm".to_string(),
                reason: "AI greeting enabled but base_url/api_key missing".to_string(),
            });
        }

        Ok(())
    }
}

/// Search criteria and delivery behavior for one run.
///
/// All multi-valued dimensions hold platform option codes; code `"0"` means
/// "unlimited" and suppresses the corresponding query parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SearchConfig {
    /// Search keywords, processed in order.
    pub keywords: Vec<String>,
    /// City codes, processed in order.
    pub cities: Vec<String>,
    /// Experience requirement codes.
    pub experience: Vec<String>,
    /// Degree requirement codes.
    pub degree: Vec<String>,
    /// Salary band codes.
    pub salary: Vec<String>,
    /// Company scale codes.
    pub scale: Vec<String>,
    /// Funding stage codes.
    pub stage: Vec<String>,
    /// Industry codes.
    pub industry: Vec<String>,
    /// Job type code (single value).
    pub job_type: String,
    /// Expected monthly salary range `[min, max]` in K-units.
    /// Empty disables the salary filter.
    pub expected_salary: Vec<u32>,
    /// Default greeting template sent when AI is disabled or fails.
    pub greet_template: String,
    /// Generate the greeting with the configured LLM.
    pub enable_ai: bool,
    /// Attach an image resume after the greeting.
    pub send_image_resume: bool,
    /// Skip listings whose recruiter looks long-inactive.
    pub filter_inactive_recruiter: bool,
    /// Substrings of the activity descriptor that mark a recruiter as
    /// long-inactive. Product-specific heuristic, kept configurable.
    pub inactive_markers: Vec<String>,
    /// Ordered candidate locations for the image resume file.
    pub resume_image_paths: Vec<PathBuf>,
    /// Discover and store listings but never deliver.
    pub debug: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            cities: Vec::new(),
            experience: Vec::new(),
            degree: Vec::new(),
            salary: Vec::new(),
            scale: Vec::new(),
            stage: Vec::new(),
            industry: Vec::new(),
            job_type: String::new(),
            expected_salary: Vec::new(),
            greet_template: "您好，我对这个职位很感兴趣，期待与您沟通。".to_string(),
            enable_ai: false,
            send_image_resume: false,
            filter_inactive_recruiter: false,
            inactive_markers: vec!["年".to_string()],
            resume_image_paths: vec![
                PathBuf::from("./resume.jpg"),
                PathBuf::from("./resources/resume.jpg"),
                PathBuf::from("./static/resume.jpg"),
                PathBuf::from("./images/resume.jpg"),
            ],
            debug: false,
        }
    }
}

impl SearchConfig {
    /// Configured expected-salary range, if any.
    #[must_use]
    pub fn expected_range(&self) -> Option<(u32, u32)> {
        match self.expected_salary[..] {
            [min, max] => Some((min, max)),
            _ => None,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Default per-operation timeout in milliseconds.
    pub default_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            default_timeout_ms: 30_000,
        }
    }
}

/// Settings for the greeting-generation LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Self-introduction woven into the greeting prompt.
    pub introduction: String,
}
