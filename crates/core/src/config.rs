//! Configuration management for MingYu.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The workspace config file (`.mingyu/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! All persistent state (index bases, prompts, config) lives under `.mingyu/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers this build knows how to talk to.
pub const KNOWN_PROVIDERS: [&str; 2] = ["dashscope", "ollama"];

/// Environment variable consulted for the DashScope key when the config names none.
pub const DEFAULT_DASHSCOPE_KEY_ENV: &str = "DASHSCOPE_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .mingyu/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("dashscope" or "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key override for the generation provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Generation provider configurations
    pub llm: Option<LlmConfig>,

    /// Retrieval and interpolation defaults
    pub retrieval: RetrievalConfig,

    /// External biography lookup settings
    pub biography: BiographyConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    DashScope {
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
            Self::DashScope { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::DashScope { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Request timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::DashScope { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Retrieval defaults used by `search` and `explore`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Knowledge base name under `.mingyu/bases/`
    #[serde(default = "default_base")]
    pub base: String,

    /// Interpolation coefficient (0 = fact, 1 = query)
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Neighbors requested around the interpolated vector
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,

    /// Neighbor texts handed to the generator as context
    #[serde(default = "default_context_neighbors")]
    pub context_neighbors: usize,
}

fn default_base() -> String {
    "ming".to_string()
}

fn default_alpha() -> f32 {
    0.3
}

fn default_neighbor_count() -> usize {
    10
}

fn default_context_neighbors() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            alpha: default_alpha(),
            neighbor_count: default_neighbor_count(),
            context_neighbors: default_context_neighbors(),
        }
    }
}

/// Biography lookup (CBDB) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BiographyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_biography_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_biography_timeout")]
    pub timeout: u64,
}

fn default_true() -> bool {
    true
}

fn default_biography_endpoint() -> String {
    "https://cbdb.fas.harvard.edu/cbdbapi/person.php".to_string()
}

fn default_biography_timeout() -> u64 {
    3
}

impl Default for BiographyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_biography_endpoint(),
            timeout: default_biography_timeout(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    retrieval: Option<RetrievalConfig>,
    biography: Option<BiographyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
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
            provider: "dashscope".to_string(),
            model: "qwen-plus".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalConfig::default(),
            biography: BiographyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the workspace config file and
    /// environment variables.
    ///
    /// Environment variables:
    /// - `MINGYU_WORKSPACE`: Override workspace path
    /// - `MINGYU_CONFIG`: Path to config file
    /// - `MINGYU_PROVIDER`: Generation provider
    /// - `MINGYU_MODEL`: Generation model
    /// - `MINGYU_API_KEY`: API key for the generation provider
    /// - `RUST_LOG`: Log filter
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("MINGYU_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("MINGYU_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.mingyu_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(provider) = std::env::var("MINGYU_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("MINGYU_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("MINGYU_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(biography) = config_file.biography {
            result.biography = biography;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }
            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Re-read the config file for the current workspace.
    ///
    /// Used when `--workspace` or `--config` point somewhere other than what
    /// [`AppConfig::load`] saw.
    pub fn reload_file(self) -> AppResult<Self> {
        let path = self
            .config_file
            .clone()
            .unwrap_or_else(|| self.mingyu_dir().join("config.yaml"));

        if path.exists() {
            self.merge_yaml(&path)
        } else {
            Ok(self)
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the
    /// config file.
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
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .mingyu directory.
    pub fn mingyu_dir(&self) -> PathBuf {
        self.workspace.join(".mingyu")
    }

    /// Ensure the .mingyu directory exists.
    pub fn ensure_mingyu_dir(&self) -> AppResult<()> {
        let dir = self.mingyu_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .mingyu directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get the configuration block for a provider, if the config file has one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<&str> {
        self.get_provider_config(&self.provider)
            .and_then(ProviderConfig::endpoint)
    }

    /// Request timeout for the active provider.
    pub fn provider_timeout(&self) -> Option<u64> {
        self.get_provider_config(&self.provider)
            .and_then(ProviderConfig::timeout)
    }

    /// Resolve the API key for a provider.
    ///
    /// `MINGYU_API_KEY` wins; otherwise the environment variable named by the
    /// provider config; DashScope falls back to `DASHSCOPE_API_KEY`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::DashScope { api_key_env, .. }) => Some(api_key_env.as_str()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "dashscope" => Some(DEFAULT_DASHSCOPE_KEY_ENV),
            None => None,
        };

        env_var
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration.
    ///
    /// A missing API key is not an error: generation degrades to an
    /// "unavailable" result instead.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let alpha = self.retrieval.alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AppError::Config(format!(
                "retrieval.alpha must be within [0, 1], got {}",
                alpha
            )));
        }

        if self.retrieval.neighbor_count == 0 {
            return Err(AppError::Config(
                "retrieval.neighborCount must be positive".to_string(),
            ));
        }

        if self.retrieval.base.trim().is_empty() {
            return Err(AppError::Config(
                "retrieval.base cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "dashscope");
        assert_eq!(config.model, "qwen-plus");
        assert_eq!(config.retrieval.base, "ming");
        assert_eq!(config.retrieval.neighbor_count, 10);
        assert!((config.retrieval.alpha - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.biography.timeout, 3);
        assert!(!config.verbose);
    }

    #[test]
    fn test_mingyu_dir() {
        let config = AppConfig::default();
        assert!(config.mingyu_dir().ends_with(".mingyu"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("qwen2.5:7b".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "qwen2.5:7b");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: qwen2.5:7b
      timeout: 60
    dashscope:
      apiKeyEnv: MY_QWEN_KEY
      model: qwen-max
retrieval:
  base: ming-events
  alpha: 0.6
logging:
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "qwen2.5:7b");
        assert_eq!(merged.provider_endpoint(), Some("http://localhost:11434"));
        assert_eq!(merged.provider_timeout(), Some(60));
        assert_eq!(merged.retrieval.base, "ming-events");
        assert!((merged.retrieval.alpha - 0.6).abs() < f32::EPSILON);
        assert_eq!(merged.retrieval.neighbor_count, 10);
        assert!(merged.no_color);

        match merged.get_provider_config("dashscope") {
            Some(ProviderConfig::DashScope { api_key_env, .. }) => {
                assert_eq!(api_key_env, "MY_QWEN_KEY")
            }
            other => panic!("unexpected provider config: {:?}", other),
        }
    }

    #[test]
    fn test_reload_file_follows_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".mingyu")).unwrap();
        std::fs::write(
            temp.path().join(".mingyu/config.yaml"),
            "retrieval:\n  base: ming-persons\n",
        )
        .unwrap();

        let config = AppConfig::default()
            .with_overrides(Some(temp.path().to_path_buf()), None, None, None, None, false, false)
            .reload_file()
            .unwrap();
        assert_eq!(config.retrieval.base, "ming-persons");

        let empty = TempDir::new().unwrap();
        let untouched = AppConfig::default()
            .with_overrides(Some(empty.path().to_path_buf()), None, None, None, None, false, false)
            .reload_file()
            .unwrap();
        assert_eq!(untouched.retrieval.base, "ming");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.resolve_api_key("dashscope"), Some("sk-test".to_string()));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = AppConfig::default();
        assert_eq!(config.resolve_api_key("ollama"), None);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_alpha_range() {
        let mut config = AppConfig::default();
        config.retrieval.alpha = 1.5;
        assert!(config.validate().is_err());

        config.retrieval.alpha = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_neighbor_count() {
        let mut config = AppConfig::default();
        config.retrieval.neighbor_count = 0;
        assert!(config.validate().is_err());
    }
}
