//! Configuration loading: file, then environment, then validation.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::env::{get_env_as, get_env_as_bool, get_env_opt, EnvError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env(EnvError),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env(e) => write!(f, "Environment error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Env(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

impl From<EnvError> for ConfigError {
    fn from(e: EnvError) -> Self {
        ConfigError::Env(e)
    }
}

/// Parse configuration from a TOML file.
pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Override fields from environment variables named `{prefix}{NAME}`.
///
/// | variable                 | field                              |
/// |--------------------------|------------------------------------|
/// | `PORT`                   | `server.port`                      |
/// | `HOST`                   | `server.host`                      |
/// | `TLS_ENABLED`            | `server.tls_enabled`               |
/// | `TLS_CERT_PATH`          | `server.tls_cert_path`             |
/// | `TLS_KEY_PATH`           | `server.tls_key_path`              |
/// | `SHUTDOWN_TIMEOUT_SECS`  | `shutdown.grace_period_secs`       |
/// | `SIGNAL_FORCE_EXIT_SECS` | `shutdown.signal_force_exit_secs`  |
/// | `LOG_LEVEL`              | `observability.log_level`          |
pub fn apply_env_overrides(config: &mut AppConfig, prefix: &str) -> Result<(), EnvError> {
    let var = |name: &str| format!("{prefix}{name}");

    let server = &mut config.server;
    server.port = get_env_as::<u16>(&var("PORT"), Some(server.port))?;
    server.host = get_env_as::<IpAddr>(&var("HOST"), Some(server.host))?;
    server.tls_enabled = get_env_as_bool(&var("TLS_ENABLED"), Some(server.tls_enabled))?;
    if let Some(path) = get_env_opt(&var("TLS_CERT_PATH"))? {
        server.tls_cert_path = Some(PathBuf::from(path));
    }
    if let Some(path) = get_env_opt(&var("TLS_KEY_PATH"))? {
        server.tls_key_path = Some(PathBuf::from(path));
    }

    let shutdown = &mut config.shutdown;
    shutdown.grace_period_secs =
        get_env_as::<u64>(&var("SHUTDOWN_TIMEOUT_SECS"), Some(shutdown.grace_period_secs))?;
    let force_exit = var("SIGNAL_FORCE_EXIT_SECS");
    if get_env_opt(&force_exit)?.is_some() {
        shutdown.signal_force_exit_secs = Some(get_env_as::<u64>(&force_exit, None)?);
    }

    if let Some(level) = get_env_opt(&var("LOG_LEVEL"))? {
        config.observability.log_level = level;
    }

    Ok(())
}

/// Load, override from the environment, and validate.
///
/// Without a file the defaults are the starting point.
pub fn load_config(path: Option<&Path>, env_prefix: &str) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, env_prefix)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Each test uses its own prefix: the environment is process-global.

    #[test]
    fn file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[shutdown]\ngrace_period_secs = 5\n"
        )
        .unwrap();

        std::env::set_var("GS_LOADER_A_PORT", "9100");
        std::env::set_var("GS_LOADER_A_LOG_LEVEL", "debug");

        let config = load_config(Some(file.path()), "GS_LOADER_A_").unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.shutdown.grace_period_secs, 5);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn tls_from_env() {
        std::env::set_var("GS_LOADER_B_TLS_ENABLED", "true");
        std::env::set_var("GS_LOADER_B_TLS_CERT_PATH", "/tmp/cert.pem");
        std::env::set_var("GS_LOADER_B_TLS_KEY_PATH", "/tmp/key.pem");
        std::env::set_var("GS_LOADER_B_SIGNAL_FORCE_EXIT_SECS", "60");

        let config = load_config(None, "GS_LOADER_B_").unwrap();
        assert!(config.server.tls_enabled);
        assert_eq!(config.server.tls_cert_path, Some(PathBuf::from("/tmp/cert.pem")));
        assert_eq!(config.server.tls_key_path, Some(PathBuf::from("/tmp/key.pem")));
        assert_eq!(config.shutdown.signal_force_exit_secs, Some(60));
    }

    #[test]
    fn bad_env_value_is_an_error() {
        std::env::set_var("GS_LOADER_C_PORT", "eighty");
        let err = load_config(None, "GS_LOADER_C_").unwrap_err();
        assert!(matches!(err, ConfigError::Env(EnvError::Parse { .. })));
        assert!(err.to_string().contains("GS_LOADER_C_PORT"));
    }

    #[test]
    fn validation_runs_after_overrides() {
        std::env::set_var("GS_LOADER_D_TLS_ENABLED", "1");
        let err = load_config(None, "GS_LOADER_D_").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/graceful.toml")), "GS_LOADER_E_").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = load_config(Some(file.path()), "GS_LOADER_F_").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
