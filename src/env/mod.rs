//! Typed environment-variable accessors.
//!
//! Every accessor follows the same rules:
//! - variable set → the value, parsed into the requested type
//! - variable unset, default given → the default
//! - variable unset, no default → [`EnvError::NotSet`]
//!
//! A variable that is set but cannot be parsed is always an error, even when a
//! default was supplied. The error keeps the variable name, the raw value and
//! the underlying parse error.

use std::error::Error as StdError;
use std::ffi::OsString;
use std::str::FromStr;

use thiserror::Error;

/// Errors returned by the environment accessors.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The variable is not set and no default was supplied.
    #[error("{0} is not set")]
    NotSet(String),

    /// The variable is set but is not valid unicode.
    #[error("{name} is not valid unicode: {value:?}")]
    NotUnicode { name: String, value: OsString },

    /// The variable is set but could not be parsed into the requested type.
    #[error("{name} can't be parsed as {expected} (value: {value:?})")]
    Parse {
        name: String,
        value: String,
        expected: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl EnvError {
    /// Name of the variable this error refers to.
    pub fn var_name(&self) -> &str {
        match self {
            EnvError::NotSet(name) => name,
            EnvError::NotUnicode { name, .. } => name,
            EnvError::Parse { name, .. } => name,
        }
    }
}

/// Error for boolean spellings outside the accepted set.
#[derive(Debug, Error)]
#[error("invalid boolean literal {0:?}")]
pub struct ParseBoolError(String);

/// Read a variable, returning `Ok(None)` when it is unset.
pub fn get_env_opt(name: &str) -> Result<Option<String>, EnvError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(value)) => Err(EnvError::NotUnicode {
            name: name.to_string(),
            value,
        }),
    }
}

/// Read a string variable, falling back to `default` when unset.
pub fn get_env(name: &str, default: Option<&str>) -> Result<String, EnvError> {
    match get_env_opt(name)? {
        Some(value) => Ok(value),
        None => default
            .map(str::to_string)
            .ok_or_else(|| EnvError::NotSet(name.to_string())),
    }
}

/// Read a variable and parse it with [`FromStr`].
pub fn get_env_as<T>(name: &str, default: Option<T>) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    parse_with(name, default, std::any::type_name::<T>(), |raw| {
        raw.parse::<T>().map_err(|e| Box::new(e) as _)
    })
}

/// Read an integer variable.
pub fn get_env_as_int(name: &str, default: Option<i64>) -> Result<i64, EnvError> {
    parse_with(name, default, "an integer", |raw| {
        raw.parse::<i64>().map_err(|e| Box::new(e) as _)
    })
}

/// Read a boolean variable.
///
/// Accepted spellings: `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn get_env_as_bool(name: &str, default: Option<bool>) -> Result<bool, EnvError> {
    parse_with(name, default, "a boolean", |raw| {
        parse_bool(raw).map_err(|e| Box::new(e) as _)
    })
}

/// Parse a boolean using the accepted spellings.
pub fn parse_bool(raw: &str) -> Result<bool, ParseBoolError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(ParseBoolError(other.to_string())),
    }
}

fn parse_with<T, F>(
    name: &str,
    default: Option<T>,
    expected: &'static str,
    parse: F,
) -> Result<T, EnvError>
where
    F: FnOnce(&str) -> Result<T, Box<dyn StdError + Send + Sync>>,
{
    let Some(raw) = get_env_opt(name)? else {
        return default.ok_or_else(|| EnvError::NotSet(name.to_string()));
    };

    parse(&raw).map_err(|source| EnvError::Parse {
        name: name.to_string(),
        value: raw,
        expected,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names: tests run in parallel and the
    // environment is process-global.

    #[test]
    fn string_present_absent_default() {
        std::env::set_var("GS_TEST_STR_SET", "hello");
        assert_eq!(get_env("GS_TEST_STR_SET", None).unwrap(), "hello");
        assert_eq!(get_env("GS_TEST_STR_SET", Some("other")).unwrap(), "hello");

        assert_eq!(get_env("GS_TEST_STR_UNSET", Some("fallback")).unwrap(), "fallback");

        let err = get_env("GS_TEST_STR_UNSET", None).unwrap_err();
        assert!(matches!(err, EnvError::NotSet(ref n) if n == "GS_TEST_STR_UNSET"));
        assert_eq!(err.to_string(), "GS_TEST_STR_UNSET is not set");
    }

    #[test]
    fn empty_string_counts_as_set() {
        std::env::set_var("GS_TEST_STR_EMPTY", "");
        assert_eq!(get_env("GS_TEST_STR_EMPTY", Some("x")).unwrap(), "");
    }

    #[test]
    fn int_parsing() {
        std::env::set_var("GS_TEST_INT_OK", "-42");
        assert_eq!(get_env_as_int("GS_TEST_INT_OK", None).unwrap(), -42);
        assert_eq!(get_env_as_int("GS_TEST_INT_UNSET", Some(7)).unwrap(), 7);
        assert!(matches!(
            get_env_as_int("GS_TEST_INT_UNSET", None),
            Err(EnvError::NotSet(_))
        ));
    }

    #[test]
    fn int_parse_error_ignores_default_and_keeps_context() {
        std::env::set_var("GS_TEST_INT_BAD", "12abc");
        let err = get_env_as_int("GS_TEST_INT_BAD", Some(1)).unwrap_err();
        match &err {
            EnvError::Parse { name, value, .. } => {
                assert_eq!(name, "GS_TEST_INT_BAD");
                assert_eq!(value, "12abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("can't be parsed as an integer"));
        assert!(err.source().is_some());
    }

    #[test]
    fn bool_spellings() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(parse_bool(raw).unwrap(), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!parse_bool(raw).unwrap(), "{raw}");
        }
        for raw in ["yes", "no", "tRUE", "", " true"] {
            assert!(parse_bool(raw).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn bool_accessor() {
        std::env::set_var("GS_TEST_BOOL_T", "True");
        assert!(get_env_as_bool("GS_TEST_BOOL_T", Some(false)).unwrap());
        assert!(get_env_as_bool("GS_TEST_BOOL_UNSET", Some(true)).unwrap());

        std::env::set_var("GS_TEST_BOOL_BAD", "maybe");
        let err = get_env_as_bool("GS_TEST_BOOL_BAD", None).unwrap_err();
        assert_eq!(err.var_name(), "GS_TEST_BOOL_BAD");
        assert!(err.to_string().contains("a boolean"));
    }

    #[test]
    fn generic_accessor() {
        std::env::set_var("GS_TEST_GENERIC_U16", "8443");
        assert_eq!(get_env_as::<u16>("GS_TEST_GENERIC_U16", None).unwrap(), 8443);

        std::env::set_var("GS_TEST_GENERIC_U16_BAD", "70000");
        assert!(matches!(
            get_env_as::<u16>("GS_TEST_GENERIC_U16_BAD", Some(80)),
            Err(EnvError::Parse { .. })
        ));

        assert_eq!(get_env_as::<f64>("GS_TEST_GENERIC_UNSET", Some(0.5)).unwrap(), 0.5);
    }

    #[test]
    fn optional_accessor() {
        assert_eq!(get_env_opt("GS_TEST_OPT_UNSET").unwrap(), None);
        std::env::set_var("GS_TEST_OPT_SET", "v");
        assert_eq!(get_env_opt("GS_TEST_OPT_SET").unwrap().as_deref(), Some("v"));
    }
}
