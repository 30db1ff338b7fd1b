//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - TLS paths present when TLS is enabled
//! - Shutdown timings that can actually complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - File existence is not checked here; TLS loading reports it at startup

use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    TlsCertPathMissing,
    TlsKeyPathMissing,
    ZeroGracePeriod,
    ForceExitBeforeGrace { force_exit_secs: u64, grace_period_secs: u64 },
    EmptyLogLevel,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TlsCertPathMissing => {
                write!(f, "server.tls_cert_path is required when TLS is enabled")
            }
            ValidationError::TlsKeyPathMissing => {
                write!(f, "server.tls_key_path is required when TLS is enabled")
            }
            ValidationError::ZeroGracePeriod => {
                write!(f, "shutdown.grace_period_secs must be greater than 0")
            }
            ValidationError::ForceExitBeforeGrace {
                force_exit_secs,
                grace_period_secs,
            } => write!(
                f,
                "shutdown.signal_force_exit_secs ({}) must not be shorter than shutdown.grace_period_secs ({})",
                force_exit_secs, grace_period_secs
            ),
            ValidationError::EmptyLogLevel => write!(f, "observability.log_level must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.tls_enabled {
        if config.server.tls_cert_path.is_none() {
            errors.push(ValidationError::TlsCertPathMissing);
        }
        if config.server.tls_key_path.is_none() {
            errors.push(ValidationError::TlsKeyPathMissing);
        }
    }

    let grace_period_secs = config.shutdown.grace_period_secs;
    if grace_period_secs == 0 {
        errors.push(ValidationError::ZeroGracePeriod);
    }
    if let Some(force_exit_secs) = config.shutdown.signal_force_exit_secs {
        if force_exit_secs < grace_period_secs {
            errors.push(ValidationError::ForceExitBeforeGrace {
                force_exit_secs,
                grace_period_secs,
            });
        }
    }

    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::EmptyLogLevel);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.tls_enabled = true;
        config.shutdown.grace_period_secs = 0;
        config.observability.log_level = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::TlsCertPathMissing,
                ValidationError::TlsKeyPathMissing,
                ValidationError::ZeroGracePeriod,
                ValidationError::EmptyLogLevel,
            ]
        );
    }

    #[test]
    fn force_exit_must_cover_grace_period() {
        let mut config = AppConfig::default();
        config.shutdown.grace_period_secs = 30;
        config.shutdown.signal_force_exit_secs = Some(10);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ForceExitBeforeGrace {
                force_exit_secs: 10,
                grace_period_secs: 30
            }]
        );
    }
}
