use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::file_utils::FileManager;
use crate::translation::{EndpointParams, RetryPolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Character codex JSON, read at start and overwritten by checkpoints
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// System prompt text resource
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: PathBuf,

    /// User prompt template with `{{field}}` placeholders
    #[serde(default = "default_input_prompt_path")]
    pub input_prompt_path: PathBuf,

    /// Last prompt and reply, overwritten on every call; `null` disables it
    #[serde(default = "default_debug_output_path")]
    pub debug_output_path: Option<PathBuf>,

    /// Environment variable holding the optional HTTP(S) proxy URL
    #[serde(default = "default_proxy_env")]
    pub proxy_env: String,

    /// Provider connections
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Endpoint pool, in rotation order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,

    /// Retry settings for field translation
    #[serde(default)]
    pub retry: RetryConfig,

    /// Checkpoint throttle settings
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Connection settings for one OpenAI-compatible provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider name, referenced by endpoints
    pub name: String,

    // @field: Base URL of the chat API
    pub endpoint: String,

    // @field: Inline API key; takes precedence over `api_key_env`
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Environment variable holding the API key
    #[serde(default = "String::new")]
    pub api_key_env: String,

    // @field: Route requests through the configured proxy
    #[serde(default)]
    pub use_proxy: bool,

    // @field: Request timeout seconds; none by default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    // @param name: Provider name
    // @returns: Provider config reading its key from `api_key_env`
    pub fn new(name: &str, endpoint: &str, api_key_env: &str, use_proxy: bool) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            api_key: String::new(),
            api_key_env: api_key_env.to_string(),
            use_proxy,
            timeout_secs: None,
        }
    }

    /// API key from config or environment. A missing key is not an error
    /// here; it shows up as an authentication failure on first use.
    pub fn resolve_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        if self.api_key_env.is_empty() {
            return String::new();
        }
        std::env::var(&self.api_key_env).unwrap_or_default()
    }
}

/// One entry of the endpoint pool
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    // @field: Name of the provider serving this endpoint
    pub provider: String,

    // @field: Model and sampling parameters
    #[serde(flatten)]
    pub params: EndpointParams,
}

impl EndpointConfig {
    pub fn new(provider: &str, params: EndpointParams) -> Self {
        Self {
            provider: provider.to_string(),
            params,
        }
    }
}

/// Retry settings for one field
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts per field, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait after a failed attempt, in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

/// Checkpoint throttle and pacing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CheckpointConfig {
    /// Minimum interval between dataset writes, in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Upper bound of the random pause after a changed record, in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl CheckpointConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
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

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/character_codex.json")
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("data/sys.prompt.txt")
}

fn default_input_prompt_path() -> PathBuf {
    PathBuf::from("data/input.prompt.txt")
}

fn default_debug_output_path() -> Option<PathBuf> {
    Some(PathBuf::from("output.txt"))
}

fn default_proxy_env() -> String {
    "HTTPS_PROXY".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_throttle_ms() -> u64 {
    5000
}

fn default_jitter_ms() -> u64 {
    300
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("groq", "https://api.groq.com/openai/v1", "GROQ_API_KEY", true),
        ProviderConfig::new("deepinfra", "https://api.deepinfra.com/v1/openai", "DEEP_INFRA_API_KEY", true),
        ProviderConfig::new("deepseek", "https://api.deepseek.com", "DEEPSEEK_API_KEY", false),
    ]
}

fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig::new(
            "deepseek",
            EndpointParams::new("deepseek-chat").top_p(0.9).temperature(0.5).max_tokens(512),
        ),
        EndpointConfig::new(
            "groq",
            EndpointParams::new("llama3-70b-8192").top_p(0.9).temperature(0.5).max_tokens(512),
        ),
    ]
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Load configuration, writing the defaults first when the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        if FileManager::file_exists(&path) {
            return Ok((Self::from_file(path)?, false));
        }
        let config = Config::default();
        config.save(&path)?;
        Ok((config, true))
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        FileManager::write_to_file(path, &config_json)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(anyhow!("At least one endpoint must be configured"));
        }

        for provider in &self.providers {
            if provider.endpoint.trim().is_empty() {
                return Err(anyhow!("Provider '{}' has no endpoint URL", provider.name));
            }
            url::Url::parse(&provider.endpoint)
                .with_context(|| format!("Provider '{}' has an invalid endpoint URL", provider.name))?;
        }

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            if self.get_provider(&endpoint.provider).is_none() {
                return Err(anyhow!(
                    "Endpoint #{} references unknown provider '{}'",
                    index, endpoint.provider
                ));
            }
            let params = &endpoint.params;
            if params.model.trim().is_empty() {
                return Err(anyhow!("Endpoint #{} has no model", index));
            }
            if let Some(t) = params.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(anyhow!("Endpoint #{} temperature {} is outside 0.0..=2.0", index, t));
                }
            }
            if let Some(p) = params.top_p {
                if !(0.0..=1.0).contains(&p) {
                    return Err(anyhow!("Endpoint #{} top_p {} is outside 0.0..=1.0", index, p));
                }
            }
            if params.max_tokens == Some(0) {
                return Err(anyhow!("Endpoint #{} max_tokens must be positive", index));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }

        Ok(())
    }

    /// Get a provider configuration by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Proxy URL from the environment, if set and non-empty
    pub fn resolve_proxy(&self) -> Option<String> {
        std::env::var(&self.proxy_env).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            dataset_path: default_dataset_path(),
            system_prompt_path: default_system_prompt_path(),
            input_prompt_path: default_input_prompt_path(),
            debug_output_path: default_debug_output_path(),
            proxy_env: default_proxy_env(),
            providers: default_providers(),
            endpoints: default_endpoints(),
            retry: RetryConfig::default(),
            checkpoint: CheckpointConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
