pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment, selects the log format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env_or_default("APP_ENV", "development");

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read an environment variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable or fail with [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read an optional environment variable; empty values count as unset
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable into `T`, using `default` when unset.
///
/// A value that is present but does not parse is an error rather than a
/// silent fallback, so a typo in `MILVUS_PORT` fails loudly.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}': {}", raw, e),
        }),
        Err(_) => Ok(default),
    }
}

/// Read a boolean flag. Only a case-insensitive `true` enables it.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => raw.trim().eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("DOCS_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("DOCS_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("DOCS_TEST_VAR", || {
            assert_eq!(env_or_default("DOCS_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("DOCS_MISSING_REQUIRED", || {
            let err = env_required("DOCS_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("DOCS_MISSING_REQUIRED"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("DOCS_OPTIONAL", Some("  "), || {
            assert_eq!(env_optional("DOCS_OPTIONAL"), None);
        });
        temp_env::with_var("DOCS_OPTIONAL", Some("token"), || {
            assert_eq!(env_optional("DOCS_OPTIONAL").as_deref(), Some("token"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("DOCS_PORT", || {
            assert_eq!(env_parse("DOCS_PORT", 19530u16).unwrap(), 19530);
        });
        temp_env::with_var("DOCS_PORT", Some(" 19531 "), || {
            assert_eq!(env_parse("DOCS_PORT", 19530u16).unwrap(), 19531);
        });
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        temp_env::with_var("DOCS_PORT", Some("not-a-port"), || {
            let err = env_parse("DOCS_PORT", 19530u16).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "DOCS_PORT"));
        });
    }

    #[test]
    fn test_env_flag() {
        temp_env::with_var("DOCS_FLAG", Some("TRUE"), || {
            assert!(env_flag("DOCS_FLAG", false));
        });
        temp_env::with_var("DOCS_FLAG", Some("yes"), || {
            assert!(!env_flag("DOCS_FLAG", true));
        });
        temp_env::with_var_unset("DOCS_FLAG", || {
            assert!(env_flag("DOCS_FLAG", true));
        });
    }
}
