//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue {
            field: "env".to_string(),
            message: e.to_string(),
        })?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.autoforms`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.orchestrator.max_pages, 15);
        assert_eq!(config.store.lookup_limit, 10);
    }

    #[test]
    fn test_load_partial_config() {
        let content = r#"
            [executor]
            settle_delay_ms = 0

            [orchestrator]
            max_pages = 4
            max_cost = 2.5
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.executor.settle_delay_ms, 0);
        assert_eq!(config.executor.default_wait_ms, 1000);
        assert_eq!(config.orchestrator.max_pages, 4);
        assert!((config.orchestrator.max_cost - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.orchestrator.max_attempts_per_layer, 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[locator]").unwrap();
        writeln!(file, "timeout_ms = 750").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.locator.timeout_ms, 750);
        assert_eq!(config.locator.stale_retry_delay_ms, 100);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/autoforms.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/autoforms.toml")).unwrap();
        assert_eq!(config.storage.backend, "sqlite");
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("AUTOFORMS_TEST_DB", "/tmp/manuals.db");
        }
        let content = "[storage]\npath = \"${AUTOFORMS_TEST_DB}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(
            config.storage.path.as_deref(),
            Some(std::path::Path::new("/tmp/manuals.db"))
        );
        unsafe {
            std::env::remove_var("AUTOFORMS_TEST_DB");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_AUTOFORMS_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/manuals.db");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/manuals.db"));
    }
}
