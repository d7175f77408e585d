//! Configuration management for chainrunner
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.chainrunner/config.toml

use crate::chain::ChainConfig;
use crate::cli::args::Verbosity;
use crate::errors::{ChainError, Result};
use crate::planning::DependencyGraph;
use crate::tools::{ToolCatalog, ToolName};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for chainrunner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub executor: ChainConfig,
    pub logging: LoggingConfig,
    pub catalog: ToolCatalog,
}

/// Log and console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default_verbosity: String,
    pub color_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executor: ChainConfig::default(),
            logging: LoggingConfig::default(),
            catalog: ToolCatalog::smart_city(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChainError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ChainError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chainrunner").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.executor.tool_timeout_ms == 0 {
            return Err(ChainError::ConfigError(
                "tool_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.executor.history_capacity == 0 {
            return Err(ChainError::ConfigError(
                "history_capacity must be greater than 0".to_string(),
            ));
        }

        if self.catalog.data_sample_size == 0 {
            return Err(ChainError::ConfigError(
                "data_sample_size must be greater than 0".to_string(),
            ));
        }

        let mut declared: Vec<ToolName> = self.catalog.dependencies.keys().cloned().collect();
        declared.sort();
        let graph = DependencyGraph::build(&declared, &self.catalog.dependencies);
        if let Some(involved) = graph.detect_cycle() {
            return Err(ChainError::ConfigError(format!(
                "circular tool dependency: {}",
                involved.join(" -> ")
            )));
        }

        if Verbosity::from_name(&self.logging.default_verbosity).is_none() {
            return Err(ChainError::ConfigError(format!(
                "Invalid verbosity level: {}",
                self.logging.default_verbosity
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ChainError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChainError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ChainError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Verbosity from the config file, used when no flag is given
    pub fn default_verbosity(&self) -> Verbosity {
        Verbosity::from_name(&self.logging.default_verbosity).unwrap_or(Verbosity::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::ResolutionPolicy;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.executor.tool_timeout_ms, 30_000);
        assert_eq!(config.executor.history_capacity, 1000);
        assert_eq!(config.executor.resolution_policy, ResolutionPolicy::BestEffort);
        assert_eq!(config.catalog.role_for("store_document"), "librarian");
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.executor.tool_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_capacity() {
        let mut config = Config::default();
        config.executor.history_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_self_dependency() {
        let mut config = Config::default();
        config
            .catalog
            .dependencies
            .insert("a".to_string(), vec!["a".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_two_tool_cycle() {
        let mut config = Config::default();
        config.catalog = config
            .catalog
            .with_dependency("a", &["b"])
            .with_dependency("b", &["a"]);

        match config.validate() {
            Err(ChainError::ConfigError(msg)) => assert_eq!(msg, "circular tool dependency: a -> b -> a"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_config_validation_acyclic_chain_of_dependencies() {
        let mut config = Config::default();
        config.catalog = config
            .catalog
            .with_dependency("send_message", &["create_workflow"])
            .with_dependency("create_workflow", &["authenticate_user"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_verbosity() {
        let mut config = Config::default();
        config.logging.default_verbosity = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[executor]
tool_timeout_ms = 500
resolution_policy = "strict"

[catalog.dependencies]
send_message = ["create_workflow"]
"#,
        )
        .unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.executor.tool_timeout_ms, 500);
        assert_eq!(config.executor.history_capacity, 1000);
        assert_eq!(config.executor.resolution_policy, ResolutionPolicy::Strict);
        assert_eq!(
            config.catalog.dependencies["send_message"],
            vec!["create_workflow".to_string()]
        );
        assert_eq!(config.logging.default_verbosity, "normal");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.executor.tool_timeout_ms = 1234;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.executor, config.executor);
        assert!(loaded.catalog.is_critical("authenticate_user"));
    }

    #[test]
    fn test_unparseable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "executor = [").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ChainError::ConfigError(_)));
    }
}
