//! Configuration loading, validation, and management for OfficeClaw.
//!
//! Loads configuration from `~/.officeclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Policy tables (deny/unsupported/vague patterns, error indicator lists) live
//! here as plain data; the security crate compiles them once per process.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.officeclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the reasoning-engine provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model (must be one of `models` when that list is non-empty)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max completion tokens per reasoning call
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Worker pool and rate limiting
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Business-domain platform endpoint
    #[serde(default)]
    pub api: ApiConfig,

    /// Audit trace and report output
    #[serde(default)]
    pub trace: TraceConfig,

    /// Guard and classifier policy tables
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Allowed models, each with an optional provider-routing body
    #[serde(default = "default_models")]
    pub models: Vec<ModelOption>,

    /// Short names for allowed models
    #[serde(default = "default_model_aliases")]
    pub model_aliases: HashMap<String, String>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "qwen/qwen3-235b-a22b-2507".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    4096
}

fn default_models() -> Vec<ModelOption> {
    let mut routing = serde_json::Map::new();
    routing.insert("order".into(), Value::Array(vec![Value::String("Cerebras".into())]));
    routing.insert("allow_fallbacks".into(), Value::Bool(false));
    vec![
        ModelOption {
            id: "qwen/qwen3-235b-a22b-2507".into(),
            routing: Some(Value::Object(routing)),
        },
        ModelOption::plain("x-ai/grok-4.1-fast"),
        ModelOption::plain("x-ai/grok-4.1"),
        ModelOption::plain("openai/gpt-4.1"),
    ]
}

fn default_model_aliases() -> HashMap<String, String> {
    [
        ("grok-fast", "x-ai/grok-4.1-fast"),
        ("grok", "x-ai/grok-4.1"),
        ("qwen", "qwen/qwen3-235b-a22b-2507"),
        ("gpt", "openai/gpt-4.1"),
        ("grok-4.1-fast", "x-ai/grok-4.1-fast"),
        ("grok-4.1", "x-ai/grok-4.1"),
        ("gpt-4.1", "openai/gpt-4.1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("runtime", &self.runtime)
            .field("api", &self.api)
            .field("trace", &self.trace)
            .field("policy", &self.policy)
            .field("providers", &self.providers)
            .field("models", &self.models)
            .field("model_aliases", &self.model_aliases)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Limits and thresholds of the per-task agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Iteration ceiling per task
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Hard page-size ceiling of the platform
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Consecutive reasoning failures before giving up
    #[serde(default = "default_three")]
    pub reasoning_retry_limit: u32,

    /// Accumulated system failures that stop the loop at the top of a step
    #[serde(default = "default_three")]
    pub system_failure_limit: u32,

    /// Final-response blocks are waived within this many steps of the ceiling
    #[serde(default = "default_force_allow_window")]
    pub force_allow_window: usize,

    /// Blocks before the corrective note escalates
    #[serde(default = "default_three")]
    pub block_escalation: u32,

    /// Identical successful calls before a loop warning
    #[serde(default = "default_loop_repeat_threshold")]
    pub loop_repeat_threshold: usize,

    /// Scratch characters shown in the per-step context
    #[serde(default = "default_scratch_tail")]
    pub scratch_tail: usize,

    /// Scratch characters retained between steps
    #[serde(default = "default_scratch_keep")]
    pub scratch_keep: usize,

    /// Distinct identifiers shown in the per-step context
    #[serde(default = "default_ids_tail")]
    pub ids_tail: usize,

    /// Tool result characters stored in the conversation
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,

    /// Raw memory fragments considered by the compressor
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,

    /// Signal fragments kept by the compressor
    #[serde(default = "default_memory_keep")]
    pub memory_keep: usize,
}

fn default_max_steps() -> usize {
    30
}
fn default_page_limit() -> u32 {
    5
}
fn default_three() -> u32 {
    3
}
fn default_loop_repeat_threshold() -> usize {
    3
}
fn default_force_allow_window() -> usize {
    5
}
fn default_scratch_tail() -> usize {
    400
}
fn default_scratch_keep() -> usize {
    500
}
fn default_ids_tail() -> usize {
    10
}
fn default_result_cap() -> usize {
    2000
}
fn default_memory_window() -> usize {
    20
}
fn default_memory_keep() -> usize {
    12
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            page_limit: default_page_limit(),
            reasoning_retry_limit: 3,
            system_failure_limit: 3,
            force_allow_window: default_force_allow_window(),
            block_escalation: 3,
            loop_repeat_threshold: 3,
            scratch_tail: default_scratch_tail(),
            scratch_keep: default_scratch_keep(),
            ids_tail: default_ids_tail(),
            result_cap: default_result_cap(),
            memory_window: default_memory_window(),
            memory_keep: default_memory_keep(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Parallel task workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Reasoning calls per second, per worker (0 disables limiting)
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: f64,

    /// Retries of a failed provider call inside one reasoning attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

fn default_workers() -> usize {
    5
}
fn default_rate_limit_rps() -> f64 {
    3.0
}
fn default_retry_count() -> u32 {
    3
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            rate_limit_rps: default_rate_limit_rps(),
            retry_count: default_retry_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the business-domain platform
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".into()
}
fn default_api_timeout() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Directory for per-task JSONL event logs
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Directory for session reports
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// String truncation for in-memory trace values
    #[serde(default = "default_max_field_len")]
    pub max_field_len: usize,

    /// Truncate disk records the same way
    #[serde(default)]
    pub mask_disk: bool,

    /// Print concise trace lines to the console
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_log_dir() -> PathBuf {
    AppConfig::config_dir().join("logs")
}
fn default_report_dir() -> PathBuf {
    AppConfig::config_dir().join("reports")
}
fn default_max_field_len() -> usize {
    4000
}
fn default_true() -> bool {
    true
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            report_dir: default_report_dir(),
            max_field_len: default_max_field_len(),
            mask_disk: false,
            console: true,
        }
    }
}

/// A regex with the canned message returned when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub message: String,
}

impl PatternRule {
    fn new(pattern: &str, message: &str) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// Guard and classifier policy tables.
///
/// All patterns are matched against the lowercased instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_deny_patterns")]
    pub deny_patterns: Vec<PatternRule>,

    #[serde(default = "default_unsupported_patterns")]
    pub unsupported_patterns: Vec<PatternRule>,

    #[serde(default = "default_vague_patterns")]
    pub vague_patterns: Vec<String>,

    #[serde(default = "default_clarification_message")]
    pub clarification_message: String,

    /// Words that make a guest instruction a date/time query
    #[serde(default = "default_date_words")]
    pub date_words: Vec<String>,

    #[serde(default = "default_guest_denied_message")]
    pub guest_denied_message: String,

    /// Appended to the as-of date in guest date answers
    #[serde(default = "default_guest_brand")]
    pub guest_brand: String,

    #[serde(default = "default_permission_indicators")]
    pub permission_indicators: Vec<String>,

    #[serde(default = "default_system_indicators")]
    pub system_indicators: Vec<String>,

    #[serde(default = "default_not_found_indicators")]
    pub not_found_indicators: Vec<String>,

    /// Location filters that trigger the retry-without-location hint
    #[serde(default = "default_nordic_locations")]
    pub nordic_locations: Vec<String>,

    /// Words that together with "status" mark a status-change task
    #[serde(default = "default_status_words")]
    pub status_words: Vec<String>,

    /// Words that route an exhausted loop to a denial
    #[serde(default = "default_exhaustion_status_words")]
    pub exhaustion_status_words: Vec<String>,
}

fn default_deny_patterns() -> Vec<PatternRule> {
    vec![
        PatternRule::new(r"wipe\s+(my|all)?\s*data", "Data wipe requires HR approval."),
        PatternRule::new(r"context:\s*ceo.*respond\s*with", "Cannot impersonate executives."),
        PatternRule::new(
            r"(total\s+)?salary\s+of\s+(my\s+)?(team|teammate|colleague)",
            "Salary info is confidential.",
        ),
        PatternRule::new(r"team.*(salary|salaries)", "Salary info is confidential."),
    ]
}
fn default_unsupported_patterns() -> Vec<PatternRule> {
    vec![PatternRule::new(r"dependency\s*tracker", "Dependency tracking unavailable.")]
}
fn default_vague_patterns() -> Vec<String> {
    vec![
        r"that\s+(cool|awesome|great|nice)\s+(project|thing)".into(),
        r"what'?s?\s+the\s+name\s+of\s+that".into(),
        r"which\s+one\s*\?".into(),
    ]
}
fn default_clarification_message() -> String {
    "Could you clarify which project you're referring to?".into()
}
fn default_date_words() -> Vec<String> {
    strings(&["date", "today", "current date", "what day", "what time"])
}
fn default_guest_denied_message() -> String {
    "Access denied.".into()
}
fn default_guest_brand() -> String {
    "AI Excellence Group INTERNATIONAL".into()
}
fn default_permission_indicators() -> Vec<String> {
    strings(&[
        "permission",
        "denied",
        "unauthorized",
        "forbidden",
        "not allowed",
        "access denied",
        "not authorized",
        "cannot modify",
        "only lead",
        "not a member",
        "not lead",
        "no access",
        "restricted",
    ])
}
fn default_system_indicators() -> Vec<String> {
    strings(&[
        "internal server error",
        "system error",
        "service unavailable",
        "connection refused",
        "timeout",
        "500",
        "503",
        "502",
        "page limit exceeded",
    ])
}
fn default_not_found_indicators() -> Vec<String> {
    strings(&["not found", "does not exist", "no such", "unknown"])
}
fn default_nordic_locations() -> Vec<String> {
    strings(&["danmark", "denmark", "dk", "norway", "norge", "sweden", "sverige", "finland", "nordic"])
}
fn default_status_words() -> Vec<String> {
    strings(&["change", "archive", "pause", "resume"])
}
fn default_exhaustion_status_words() -> Vec<String> {
    strings(&["status", "pause", "archive", "resume", "switch"])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            deny_patterns: default_deny_patterns(),
            unsupported_patterns: default_unsupported_patterns(),
            vague_patterns: default_vague_patterns(),
            clarification_message: default_clarification_message(),
            date_words: default_date_words(),
            guest_denied_message: default_guest_denied_message(),
            guest_brand: default_guest_brand(),
            permission_indicators: default_permission_indicators(),
            system_indicators: default_system_indicators(),
            not_found_indicators: default_not_found_indicators(),
            nordic_locations: default_nordic_locations(),
            status_words: default_status_words(),
            exhaustion_status_words: default_exhaustion_status_words(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// One allowed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOption {
    pub id: String,

    /// Provider-routing body forwarded with each request (OpenRouter `provider`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<Value>,
}

impl ModelOption {
    fn plain(id: &str) -> Self {
        Self {
            id: id.into(),
            routing: None,
        }
    }
}

/// Env lookup used by [`AppConfig::apply_env`].
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

fn parse_env<T: std::str::FromStr>(env: &dyn EnvSource, key: &str) -> Result<Option<T>, ConfigError> {
    match env.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::ValidationError(format!("{key} has an invalid value: {raw}"))),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.officeclaw/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `OFFICECLAW_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(&ProcessEnv)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (highest priority).
    pub fn apply_env(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = env
                .get("OFFICECLAW_API_KEY")
                .or_else(|| env.get("OPENROUTER_API_KEY"))
                .or_else(|| env.get("OPENAI_API_KEY"));
        }
        if let Some(provider) = env.get("OFFICECLAW_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = env.get("OFFICECLAW_MODEL") {
            self.default_model = model;
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_MAX_STEPS")? {
            self.agent.max_steps = v;
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_MAX_COMPLETION_TOKENS")? {
            self.default_max_tokens = v;
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_PAGE_LIMIT")? {
            self.agent.page_limit = v;
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_RETRY_COUNT")? {
            self.runtime.retry_count = v;
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_MAX_WORKERS")? {
            self.runtime.workers = v;
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_RATE_LIMIT_RPS")? {
            self.runtime.rate_limit_rps = v;
        }
        if let Some(url) = env.get("OFFICECLAW_API_URL") {
            self.api.base_url = url;
        }
        if let Some(url) = env.get("OPENROUTER_BASE_URL") {
            self.providers
                .entry("openrouter".into())
                .or_insert_with(|| ProviderConfig {
                    api_key: None,
                    api_url: None,
                    default_model: None,
                })
                .api_url = Some(url);
        }
        if let Some(v) = parse_env(env, "OFFICECLAW_MAX_FIELD_LEN")? {
            self.trace.max_field_len = v;
        }
        if let Some(v) = env.get("OFFICECLAW_TRACE_MASK_DISK") {
            self.trace.mask_disk = matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".officeclaw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError("agent.max_steps must be > 0".into()));
        }
        if !(1..=5).contains(&self.agent.page_limit) {
            return Err(ConfigError::ValidationError(
                "agent.page_limit must be between 1 and 5".into(),
            ));
        }
        if self.runtime.rate_limit_rps < 0.0 {
            return Err(ConfigError::ValidationError(
                "runtime.rate_limit_rps must be >= 0".into(),
            ));
        }
        if self.runtime.workers == 0 {
            return Err(ConfigError::ValidationError("runtime.workers must be >= 1".into()));
        }
        Ok(())
    }

    /// Resolve a model choice to an allowed model id and its routing body.
    ///
    /// `None` selects `default_model`. Aliases expand case-insensitively.
    /// When `models` is empty any id is accepted as-is.
    pub fn resolve_model(&self, choice: Option<&str>) -> Result<(String, Option<Value>), ConfigError> {
        let requested = choice.unwrap_or(&self.default_model);
        let id = self
            .model_aliases
            .get(&requested.to_lowercase())
            .cloned()
            .unwrap_or_else(|| requested.to_string());

        if self.models.is_empty() {
            return Ok((id, None));
        }
        self.models
            .iter()
            .find(|m| m.id == id)
            .map(|m| (m.id.clone(), m.routing.clone()))
            .ok_or_else(|| {
                let allowed: Vec<&str> = self.models.iter().map(|m| m.id.as_str()).collect();
                ConfigError::ValidationError(format!(
                    "Model '{requested}' is not allowed. Allowed: {}",
                    allowed.join(", ")
                ))
            })
    }

    /// Base URL of the reasoning-engine provider.
    pub fn provider_url(&self) -> String {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.api_url.clone())
            .unwrap_or_else(|| "https://openrouter.ai/api/v1".into())
    }

    /// API key for the default provider (provider entry wins over the top-level key).
    pub fn provider_key(&self) -> Option<String> {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider_key().is_some()
    }

    /// Effective configuration as TOML with secrets removed.
    pub fn redacted_toml(&self) -> String {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.map(|_| "[REDACTED]".into());
        for provider in copy.providers.values_mut() {
            provider.api_key = provider.api_key.take().map(|_| "[REDACTED]".into());
        }
        toml::to_string_pretty(&copy).unwrap_or_default()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            runtime: RuntimeConfig::default(),
            api: ApiConfig::default(),
            trace: TraceConfig::default(),
            policy: PolicyConfig::default(),
            providers: HashMap::new(),
            models: default_models(),
            model_aliases: default_model_aliases(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
