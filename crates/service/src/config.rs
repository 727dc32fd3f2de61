//! Configuration management for claim trees.
//!
//! This module handles loading configuration from:
//! - TOML files
//! - Environment variables referenced as `${VAR_NAME}`
//! - Default values (fallbacks)

use anyhow::{Context, Result};
use claimtree_core::constants::{DEFAULT_NAMESPACE, DEFAULT_TREE_LEVELS, MAX_TREE_LEVELS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity tree configuration
    #[serde(default)]
    pub tree: TreeConfig,

    /// Relay tree configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Number of tree levels
    #[serde(default = "default_levels")]
    pub levels: usize,

    /// Namespace for generic claims
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            namespace: default_namespace(),
        }
    }
}

/// Relay (SetRoot) tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Number of tree levels
    #[serde(default = "default_levels")]
    pub levels: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
        }
    }
}

/// Storage configuration.
///
/// Trees live in memory; a configured path persists them as a JSON snapshot
/// between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file of the identity tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    /// Snapshot file of the relay tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_snapshot_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_levels() -> usize {
    DEFAULT_TREE_LEVELS
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables can be referenced using `${VAR_NAME}` syntax.
    /// For example: `snapshot_path = "${CLAIMTREE_DATA}/identity.json"`
    ///
    /// # Example
    /// ```no_run
    /// # use claimtree_service::config::Config;
    /// let config = Config::from_file("claimtree.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = Self::expand_env_vars(&contents)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(toml)?;
        let config: Config =
            toml::from_str(&expanded).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_levels("Tree", self.tree.levels)?;
        validate_levels("Relay", self.relay.levels)?;

        if self.tree.namespace.trim().is_empty() {
            anyhow::bail!("Tree namespace cannot be empty");
        }

        for (name, path) in [
            ("snapshot_path", &self.storage.snapshot_path),
            ("relay_snapshot_path", &self.storage.relay_snapshot_path),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                anyhow::bail!("Storage {} cannot be empty when provided", name);
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Logging level must be one of: {} (got '{}')",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Logging format must be one of: {} (got '{}')",
                valid_formats.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }

    /// Expand environment variables in the format `${VAR_NAME}`.
    ///
    /// Placeholders inside TOML comments are left alone; placeholders inside
    /// strings are expanded.
    ///
    /// # Errors
    /// Returns an error if a placeholder is unclosed, empty, or names an
    /// environment variable that is not set.
    fn expand_env_vars(input: &str) -> Result<String> {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_double_quote = false;
        let mut in_single_quote = false;
        let mut in_comment = false;
        let mut escape_next = false;
        let mut line = 1;

        while let Some(ch) = chars.next() {
            if escape_next {
                escape_next = false;
                result.push(ch);
                continue;
            }

            match ch {
                '\\' if in_double_quote => {
                    escape_next = true;
                    result.push(ch);
                }
                '"' if !in_single_quote && !in_comment => {
                    in_double_quote = !in_double_quote;
                    result.push(ch);
                }
                '\'' if !in_double_quote && !in_comment => {
                    in_single_quote = !in_single_quote;
                    result.push(ch);
                }
                '#' if !in_double_quote && !in_single_quote => {
                    in_comment = true;
                    result.push(ch);
                }
                '\n' => {
                    // Newlines end comments; multi-line strings keep their state
                    in_comment = false;
                    line += 1;
                    result.push(ch);
                }
                '$' if !in_comment && chars.peek() == Some(&'{') => {
                    chars.next();

                    let mut var_name = String::new();
                    let mut found_close = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            found_close = true;
                            break;
                        }
                        var_name.push(c);
                    }

                    if !found_close {
                        anyhow::bail!(
                            "Unclosed environment variable placeholder on line {}",
                            line
                        );
                    }
                    if var_name.is_empty() {
                        anyhow::bail!("Empty environment variable name on line {}", line);
                    }

                    match std::env::var(&var_name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => anyhow::bail!(
                            "Environment variable '{}' is not set (referenced on line {})",
                            var_name,
                            line
                        ),
                    }
                }
                _ => result.push(ch),
            }
        }

        Ok(result)
    }
}

fn validate_levels(section: &str, levels: usize) -> Result<()> {
    if !(2..=MAX_TREE_LEVELS).contains(&levels) {
        anyhow::bail!(
            "{} levels must be between 2 and {} (got {})",
            section,
            MAX_TREE_LEVELS,
            levels
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_example_config() {
        let toml = r#"
[tree]
levels = 140
namespace = "iden3.io"

[relay]
levels = 64

[storage]
snapshot_path = "identity.json"
relay_snapshot_path = "relay.json"

[logging]
level = "debug"
format = "json"
        "#;

        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.tree.levels, 140);
        assert_eq!(config.relay.levels, 64);
        assert_eq!(
            config.storage.snapshot_path.as_deref(),
            Some(Path::new("identity.json"))
        );
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.tree.levels, DEFAULT_TREE_LEVELS);
        assert_eq!(config.relay.levels, DEFAULT_TREE_LEVELS);
        assert_eq!(config.tree.namespace, "iden3.io");
        assert!(config.storage.snapshot_path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_validation_levels() {
        let result = Config::from_toml_str("[tree]\nlevels = 1\n");
        assert!(result.unwrap_err().to_string().contains("Tree levels"));

        let result = Config::from_toml_str("[relay]\nlevels = 300\n");
        assert!(result.unwrap_err().to_string().contains("Relay levels"));

        assert!(Config::from_toml_str("[tree]\nlevels = 257\n").is_ok());
    }

    #[test]
    fn test_validation_empty_namespace() {
        let result = Config::from_toml_str("[tree]\nnamespace = \"  \"\n");
        assert!(result.unwrap_err().to_string().contains("namespace"));
    }

    #[test]
    fn test_validation_logging() {
        let result = Config::from_toml_str("[logging]\nlevel = \"loud\"\n");
        assert!(result.unwrap_err().to_string().contains("Logging level"));

        let result = Config::from_toml_str("[logging]\nformat = \"xml\"\n");
        assert!(result.unwrap_err().to_string().contains("Logging format"));
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("CLAIMTREE_TEST_DATA_DIR", "/var/lib/claimtree");
        let toml = r#"
[storage]
snapshot_path = "${CLAIMTREE_TEST_DATA_DIR}/identity.json"
        "#;

        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(
            config.storage.snapshot_path.as_deref(),
            Some(Path::new("/var/lib/claimtree/identity.json"))
        );
    }

    #[test]
    fn test_env_var_in_comment_not_expanded() {
        let toml = "# uses ${CLAIMTREE_TEST_UNSET_VAR}\n[tree]\nlevels = 40\n";
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.tree.levels, 40);
    }

    #[test]
    fn test_env_var_errors() {
        let result = Config::expand_env_vars("path = \"${CLAIMTREE_TEST_UNSET_VAR}\"");
        assert!(result.unwrap_err().to_string().contains("is not set"));

        let result = Config::expand_env_vars("path = \"${UNCLOSED\"");
        assert!(result.unwrap_err().to_string().contains("Unclosed"));

        let result = Config::expand_env_vars("path = \"${}\"");
        assert!(result.unwrap_err().to_string().contains("Empty"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claimtree.toml");
        std::fs::write(&path, "[tree]\nlevels = 32\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.tree.levels, 32);

        let missing = Config::from_file(dir.path().join("missing.toml"));
        assert!(missing.unwrap_err().to_string().contains("Failed to read"));
    }
}
