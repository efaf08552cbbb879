//! Configuration management for cotrag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.cotrag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Configuration is resolved once at startup and handed to the pipeline
//! explicitly; nothing downstream reads the environment at call time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the model factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Model used for a provider that has no `providers.<name>` block.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        _ => "llama3",
    }
}

/// Canonical spelling of a provider name.
pub fn normalize_provider(provider: &str) -> String {
    provider.trim().to_lowercase()
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains docs/, results/ and .cotrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("ollama" or "openai")
    pub provider: String,

    /// Model identifier for the active provider
    pub model: String,

    /// Endpoint override for the active provider
    pub endpoint: Option<String>,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Retrieval settings
    pub retrieval: RetrievalSettings,

    /// Chain-of-thought sampling settings
    pub sampling: SamplingSettings,

    /// Directory holding the per-run JSONL logs (relative to the workspace)
    pub run_log_dir: PathBuf,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint configured for this provider, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Request timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Document directory (relative to the workspace unless absolute)
    #[serde(rename = "docsDir")]
    pub docs_dir: PathBuf,

    /// Number of passages handed to the sampler
    #[serde(rename = "topK")]
    pub top_k: usize,

    /// Maximum snippet length in characters
    #[serde(rename = "snippetChars")]
    pub snippet_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            top_k: 6,
            snippet_chars: 800,
        }
    }
}

/// Chain-of-thought sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Number of independent samples per query
    pub samples: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,

    /// Maximum number of sample calls in flight at once
    pub concurrency: usize,

    /// Overall deadline for one query, in seconds
    #[serde(rename = "queryTimeoutSecs")]
    pub query_timeout_secs: Option<u64>,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            samples: 5,
            temperature: 0.7,
            max_tokens: 700,
            concurrency: 4,
            query_timeout_secs: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    retrieval: Option<PartialRetrieval>,
    sampling: Option<PartialSampling>,
    #[serde(rename = "runLog")]
    run_log: Option<RunLogConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PartialRetrieval {
    #[serde(rename = "docsDir")]
    docs_dir: Option<PathBuf>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "snippetChars")]
    snippet_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PartialSampling {
    samples: Option<usize>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
    concurrency: Option<usize>,
    #[serde(rename = "queryTimeoutSecs")]
    query_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunLogConfig {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3".to_string(),
            endpoint: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalSettings::default(),
            sampling: SamplingSettings::default(),
            run_log_dir: PathBuf::from("results"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `COTRAG_WORKSPACE`: Override workspace path
    /// - `COTRAG_CONFIG`: Path to config file
    /// - `COTRAG_PROVIDER`: LLM provider
    /// - `COTRAG_MODEL`: Model identifier
    /// - `COTRAG_ENDPOINT`: Provider endpoint
    /// - `COTRAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use cotrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration, with an explicit workspace and config file taking
    /// precedence over `COTRAG_WORKSPACE` and `COTRAG_CONFIG`.
    ///
    /// The YAML file is looked up under the final workspace, so a workspace
    /// given on the command line brings its own `.cotrag/config.yaml`.
    pub fn load_from(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        let env_path = |var: &str| std::env::var(var).ok().map(PathBuf::from);

        if let Some(workspace) = workspace.or_else(|| env_path("COTRAG_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("COTRAG_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.cotrag_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        config.apply_env(|var| std::env::var(var).ok());

        Ok(config)
    }

    /// Apply `COTRAG_*`, `RUST_LOG` and `NO_COLOR` values from `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("COTRAG_PROVIDER") {
            self.switch_provider(&provider);
        }

        if let Some(model) = lookup("COTRAG_MODEL") {
            self.model = model;
        }

        if let Some(endpoint) = lookup("COTRAG_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }

        self.api_key = lookup("COTRAG_API_KEY");

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Make `provider` active, taking its model and endpoint from its
    /// `providers.<name>` block or the provider defaults.
    fn select_provider(&mut self, provider: &str) {
        let provider = normalize_provider(provider);
        match self.get_provider_config(&provider) {
            Some(pc) => {
                self.model = pc.model().to_string();
                self.endpoint = pc.endpoint().map(str::to_string);
            }
            None => {
                self.model = default_model(&provider).to_string();
                self.endpoint = None;
            }
        }
        self.provider = provider;
    }

    /// Select `provider` unless it is already active.
    ///
    /// Re-selecting the active provider keeps a model or endpoint set by an
    /// earlier source.
    fn switch_provider(&mut self, provider: &str) {
        if normalize_provider(provider) != self.provider {
            self.select_provider(provider);
        }
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(dir) = retrieval.docs_dir {
                result.retrieval.docs_dir = dir;
            }
            if let Some(top_k) = retrieval.top_k {
                result.retrieval.top_k = top_k;
            }
            if let Some(chars) = retrieval.snippet_chars {
                result.retrieval.snippet_chars = chars;
            }
        }

        if let Some(sampling) = config_file.sampling {
            if let Some(samples) = sampling.samples {
                result.sampling.samples = samples;
            }
            if let Some(temperature) = sampling.temperature {
                result.sampling.temperature = temperature;
            }
            if let Some(max_tokens) = sampling.max_tokens {
                result.sampling.max_tokens = max_tokens;
            }
            if let Some(concurrency) = sampling.concurrency {
                result.sampling.concurrency = concurrency;
            }
            if sampling.query_timeout_secs.is_some() {
                result.sampling.query_timeout_secs = sampling.query_timeout_secs;
            }
        }

        if let Some(run_log) = config_file.run_log {
            if let Some(dir) = run_log.dir {
                result.run_log_dir = dir;
            }
        }

        if let Some(llm) = config_file.llm {
            let active = llm.active_provider.clone();
            result.llm = Some(llm);
            result.select_provider(&active);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            // A different provider invalidates the model and endpoint of the old one
            self.switch_provider(&provider);
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .cotrag directory.
    pub fn cotrag_dir(&self) -> PathBuf {
        self.workspace.join(".cotrag")
    }

    /// Resolve the document directory against the workspace.
    pub fn docs_dir(&self) -> PathBuf {
        resolve(&self.workspace, &self.retrieval.docs_dir)
    }

    /// Resolve the run log directory against the workspace.
    pub fn results_dir(&self) -> PathBuf {
        resolve(&self.workspace, &self.run_log_dir)
    }

    /// Get the configuration block for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Request timeout for the active provider, in seconds.
    pub fn request_timeout_secs(&self) -> u64 {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.timeout())
            .unwrap_or(120)
    }

    /// Resolve API key from environment variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        // Check explicit COTRAG_API_KEY first
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env,
            Some(ProviderConfig::Ollama { .. }) => return None,
            None if provider == "openai" => "OPENAI_API_KEY".to_string(),
            None => return None,
        };

        std::env::var(&env_var).ok()
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(provider).is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env,
                _ => "OPENAI_API_KEY".to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier cannot be empty".to_string()));
        }

        if self.sampling.concurrency == 0 {
            return Err(AppError::Config(
                "sampling.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.sampling.samples, 5);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_workspace_relative_dirs() {
        let config = AppConfig {
            workspace: PathBuf::from("/tmp/ws"),
            ..Default::default()
        };
        assert_eq!(config.docs_dir(), PathBuf::from("/tmp/ws/docs"));
        assert_eq!(config.results_dir(), PathBuf::from("/tmp/ws/results"));
        assert!(config.cotrag_dir().ends_with(".cotrag"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4o".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: "http://gpu-box:11434"
      model: mistral
      timeout: 30
    openai:
      apiKeyEnv: MY_OPENAI_KEY
      model: gpt-4o-mini
retrieval:
  topK: 3
sampling:
  samples: 7
  temperature: 0.2
runLog:
  dir: logs
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.request_timeout_secs(), 30);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.snippet_chars, 800);
        assert_eq!(config.sampling.samples, 7);
        assert_eq!(config.run_log_dir, PathBuf::from("logs"));
        assert!(matches!(
            config.get_provider_config("openai"),
            Some(ProviderConfig::OpenAI { .. })
        ));
    }

    #[test]
    fn test_load_from_reads_workspace_yaml() {
        let temp = tempfile::TempDir::new().unwrap();
        let cotrag_dir = temp.path().join(".cotrag");
        std::fs::create_dir_all(&cotrag_dir).unwrap();
        std::fs::write(
            cotrag_dir.join("config.yaml"),
            "retrieval:\n  topK: 2\nsampling:\n  concurrency: 2\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.sampling.concurrency, 2);
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let result = AppConfig::load_from(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_yaml_provider_without_block_uses_its_default_model() {
        let config = AppConfig::default()
            .merge_yaml_str("llm:\n  activeProvider: openai\n")
            .unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_env_provider_switches_default_model() {
        let env: HashMap<&str, &str> = [("COTRAG_PROVIDER", "openai")].into_iter().collect();
        let mut config = AppConfig::default();
        config.apply_env(|var| env.get(var).map(|v| v.to_string()));
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");

        // clap hands the same env value back as the --provider override
        let config = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            None,
            None,
            false,
            false,
        );
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_env_model_wins_over_provider_default() {
        let env: HashMap<&str, &str> = [("COTRAG_PROVIDER", "openai"), ("COTRAG_MODEL", "gpt-4o")]
            .into_iter()
            .collect();
        let mut config = AppConfig::default();
        config.apply_env(|var| env.get(var).map(|v| v.to_string()));
        assert_eq!(config.model, "gpt-4o");

        let config = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            None,
            None,
            false,
            false,
        );
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn test_provider_names_are_normalized() {
        let config = AppConfig::default().with_overrides(
            None,
            None,
            Some("OpenAI".to_string()),
            None,
            None,
            false,
            false,
        );
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");

        let with_key = AppConfig {
            api_key: Some("sk-test".to_string()),
            ..config
        };
        assert!(with_key.validate().is_ok());

        let yaml = AppConfig::default()
            .merge_yaml_str("llm:\n  activeProvider: Ollama\n")
            .unwrap();
        assert_eq!(yaml.provider, "ollama");
    }

    #[test]
    fn test_workspace_key_is_not_part_of_the_schema() {
        let config = AppConfig {
            workspace: PathBuf::from("/tmp/ws"),
            ..Default::default()
        };
        // Unknown keys are ignored; the workspace stays where it was loaded from
        let merged = config.merge_yaml_str("workspace:\n  path: /elsewhere\n").unwrap();
        assert_eq!(merged.workspace, PathBuf::from("/tmp/ws"));
    }

    #[test]
    fn test_merge_invalid_yaml() {
        assert!(AppConfig::default().merge_yaml_str("llm: [").is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_openai_requires_key() {
        let yaml = r#"
llm:
  activeProvider: openai
  providers:
    openai:
      apiKeyEnv: COTRAG_TEST_KEY_THAT_IS_NEVER_SET
      model: gpt-4o-mini
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();
        match config.validate() {
            Err(AppError::Config(msg)) => {
                assert!(msg.contains("COTRAG_TEST_KEY_THAT_IS_NEVER_SET"))
            }
            other => panic!("expected config error, got {:?}", other),
        }

        let with_key = AppConfig {
            api_key: Some("sk-test".to_string()),
            ..config
        };
        assert!(with_key.validate().is_ok());
    }
}
