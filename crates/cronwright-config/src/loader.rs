//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

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

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    fn expand_paths(config: &mut Config) {
        config.data_dir = Self::expand_path_buf(&config.data_dir);
        if let Some(location) = config.snapshot.location.as_mut() {
            *location = Self::expand_path_buf(location);
        }
        if let Some(path) = config.registry.path.as_mut() {
            *path = Self::expand_path_buf(path);
        }
    }

    fn expand_path_buf(path: &Path) -> PathBuf {
        PathBuf::from(Self::expand_path(&path.to_string_lossy()))
    }

    /// Expand shell-style paths (e.g., `~/.cronwright`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RegistryBackendKind, SnapshotBackendKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.scheduler.reconcile_interval_seconds, 30);
        assert_eq!(config.snapshot.schema_version, 3);
        assert_eq!(config.registry.backend, RegistryBackendKind::Sqlite);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            data_dir = "/var/lib/cronwright"

            [scheduler]
            reconcile_interval_seconds = 10
            registry_error_backoff_seconds = 120
            jitter_seconds = 0
            epoch_start_time = "2024-01-01T00:00:00Z"

            [snapshot]
            backend = "sqlite"
            schema_version = 1
            checkpoint_interval_seconds = 5

            [registry]
            backend = "memory"

            [trigger]
            endpoint = "http://flyteadmin:8088"
            timeout_seconds = 5

            [trigger.headers]
            authorization = "Bearer abc"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/cronwright"));
        assert_eq!(config.scheduler.reconcile_interval_seconds, 10);
        assert_eq!(config.scheduler.jitter_seconds, 0);
        assert!(config.scheduler.epoch_start_time().unwrap().is_some());
        assert_eq!(config.snapshot.backend, SnapshotBackendKind::Sqlite);
        assert_eq!(config.snapshot.schema_version, 1);
        assert_eq!(config.registry.backend, RegistryBackendKind::Memory);
        assert_eq!(config.trigger.endpoint, "http://flyteadmin:8088");
        assert_eq!(config.trigger.headers["authorization"], "Bearer abc");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]").unwrap();
        writeln!(file, "jitter_seconds = 15").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.scheduler.jitter_seconds, 15);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/cronwright.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/c.toml")).unwrap();
        assert_eq!(config.scheduler.jitter_seconds, 60);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_unknown_backend() {
        let result = ConfigLoader::load_str("[snapshot]\nbackend = \"redis\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable name, not read anywhere else
        unsafe {
            std::env::set_var("CRONWRIGHT_TEST_ENDPOINT", "http://admin:9000");
        }
        let config =
            ConfigLoader::load_str("[trigger]\nendpoint = \"${CRONWRIGHT_TEST_ENDPOINT}\"").unwrap();
        assert_eq!(config.trigger.endpoint, "http://admin:9000");
        unsafe {
            std::env::remove_var("CRONWRIGHT_TEST_ENDPOINT");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${CRONWRIGHT_NONEXISTENT_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }

    #[test]
    fn test_paths_are_tilde_expanded_on_load() {
        let content = r#"
            data_dir = "~/.cw"

            [snapshot]
            location = "~/.cw/snap.json"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert!(!config.data_dir.to_string_lossy().starts_with('~'));
        assert!(
            !config
                .snapshot_location()
                .to_string_lossy()
                .starts_with('~')
        );
    }
}
