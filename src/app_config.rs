use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Whether the translation add-on is switched on
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// DeepL backend settings
    #[serde(default)]
    pub deepl: DeepLConfig,

    /// MJML compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Document translation settings
    #[serde(default)]
    pub translation: TranslationSettings,

    /// Persistence settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Base URL used to build navigation links in job reports
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Which DeepL plan (and therefore which host) to talk to first
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanSelection {
    /// Guess from the credential shape
    #[default]
    Auto,
    /// Always start with the Free host
    Free,
    /// Always start with the Pro host
    Pro,
}

impl std::fmt::Display for PlanSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for PlanSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            _ => Err(anyhow!("Invalid DeepL plan: {}", s)),
        }
    }
}

/// DeepL service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeepLConfig {
    /// API key; a key ending in `:fx` belongs to the Free plan
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Plan pinning, `auto` guesses from the key
    #[serde(default)]
    pub plan: PlanSelection,

    /// Free plan endpoint
    #[serde(default = "default_free_endpoint")]
    pub free_endpoint: String,

    /// Pro plan endpoint
    #[serde(default = "default_pro_endpoint")]
    pub pro_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional formality hint passed through to the API (`more`, `less`, ...)
    #[serde(default)]
    pub formality: Option<String>,
}

impl Default for DeepLConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            plan: PlanSelection::default(),
            free_endpoint: default_free_endpoint(),
            pro_endpoint: default_pro_endpoint(),
            timeout_secs: default_request_timeout_secs(),
            formality: None,
        }
    }
}

/// MJML compiler configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompilerConfig {
    /// Explicit path to the mjml executable, checked before the candidates
    #[serde(default)]
    pub binary: Option<String>,

    /// Well-known locations; bare names are resolved through PATH
    #[serde(default = "default_compiler_candidates")]
    pub candidates: Vec<String>,

    /// Wall-clock limit for one CLI run
    #[serde(default = "default_compiler_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip the CLI entirely and always use the fallback renderer
    #[serde(default)]
    pub fallback_only: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binary: None,
            candidates: default_compiler_candidates(),
            timeout_secs: default_compiler_timeout_secs(),
            fallback_only: false,
        }
    }
}

/// Settings for the document translation itself
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationSettings {
    /// Use the backend's HTML mode for element bodies when it offers one
    #[serde(default = "default_true")]
    pub prefer_markup_mode: bool,

    /// Maximum number of change samples surfaced in a job report
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Character budget of one side of a change sample
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Text sent to the backend to check it before cloning
    #[serde(default = "default_probe_text")]
    pub probe_text: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            prefer_markup_mode: true,
            sample_limit: default_sample_limit(),
            preview_chars: default_preview_chars(),
            probe_text: default_probe_text(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// SQLite database file; the user data directory is used when unset
    #[serde(default)]
    pub database_path: Option<String>,
}

impl StoreConfig {
    /// Resolve the configured database path, if any
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

fn default_free_endpoint() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_pro_endpoint() -> String {
    "https://api.deepl.com/v2/translate".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_compiler_candidates() -> Vec<String> {
    vec![
        "mjml".to_string(),
        "/usr/bin/mjml".to_string(),
        "/usr/local/bin/mjml".to_string(),
        "/bin/mjml".to_string(),
    ]
}

fn default_compiler_timeout_secs() -> u64 {
    30
}

fn default_sample_limit() -> usize {
    4
}

fn default_preview_chars() -> usize {
    80
}

fn default_probe_text() -> String {
    "Hello from the translation probe".to_string()
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("free_endpoint", &self.deepl.free_endpoint),
            ("pro_endpoint", &self.deepl.pro_endpoint),
        ] {
            let url = Url::parse(endpoint)
                .with_context(|| format!("Invalid DeepL {}: {}", name, endpoint))?;
            if url.scheme() != "https" && url.scheme() != "http" {
                return Err(anyhow!("DeepL {} must be an http(s) URL", name));
            }
        }

        if self.deepl.timeout_secs == 0 {
            return Err(anyhow!("DeepL timeout_secs must be greater than zero"));
        }

        if self.compiler.timeout_secs == 0 {
            return Err(anyhow!("Compiler timeout_secs must be greater than zero"));
        }

        if self.translation.preview_chars == 0 {
            return Err(anyhow!("preview_chars must be greater than zero"));
        }

        Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;

        Ok(())
    }

    /// Whether a DeepL credential is present
    pub fn has_api_key(&self) -> bool {
        !self.deepl.api_key.trim().is_empty()
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            enabled: true,
            deepl: DeepLConfig::default(),
            compiler: CompilerConfig::default(),
            translation: TranslationSettings::default(),
            store: StoreConfig::default(),
            base_url: default_base_url(),
            log_level: LogLevel::default(),
        }
    }
}
