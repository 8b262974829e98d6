//! Process configuration
//!
//! Everything is resolved from environment variables exactly once, at
//! startup, via [`AppConfig::from_env`]. The resulting value is immutable
//! and injected into the services that need it; no component re-reads the
//! environment afterwards. In particular the token signing secret and
//! algorithm are fixed for the process lifetime, so tokens issued at any
//! point verify against the same key until the process exits.

use jsonwebtoken::Algorithm;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AUTH_SECRET is not set; refusing to start without a signing secret")]
    MissingSecret,

    #[error("unsupported signing algorithm '{0}' (expected HS256, HS384 or HS512)")]
    InvalidAlgorithm(String),

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Server bind configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token signing configuration: secret, algorithm and expiry.
///
/// Held by a single `TokenService` instance for the process lifetime.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub token_expiry_minutes: i64,
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// A missing `AUTH_SECRET` is a hard failure: falling back to a baked-in
    /// default would silently issue tokens with a publicly known key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_trimmed("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match env_trimmed("APP_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "APP_PORT",
                value: raw,
            })?,
            None => 8000,
        };

        let database_url = env_trimmed("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://./catalog.db?mode=rwc".to_string());

        let secret = env_trimmed("AUTH_SECRET").ok_or(ConfigError::MissingSecret)?;
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        let algorithm = match env_trimmed("AUTH_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let token_expiry_minutes = match env_trimmed("TOKEN_EXPIRY_MINUTES") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "TOKEN_EXPIRY_MINUTES",
                value: raw,
            })?,
            None => 60,
        };

        Ok(Self {
            server: ServerConfig { host, port },
            database_url,
            auth: AuthConfig {
                secret,
                algorithm,
                token_expiry_minutes,
            },
        })
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::InvalidAlgorithm(other.to_string())),
    }
}

/// Read an env var, trimming whitespace and one pair of surrounding quotes.
///
/// Deployment dashboards routinely end up with `SECRET="abc"` pasted
/// verbatim; the quotes would otherwise become part of the signing key.
fn env_trimmed(var: &str) -> Option<String> {
    let value = std::env::var(var).ok()?;
    Some(trim_quotes(&value))
}

fn trim_quotes(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace_and_quotes() {
        assert_eq!(trim_quotes("  secret  "), "secret");
        assert_eq!(trim_quotes("\"secret\""), "secret");
        assert_eq!(trim_quotes("'secret'"), "secret");
        assert_eq!(trim_quotes("plain"), "plain");
    }

    #[test]
    fn parses_supported_algorithms() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("hs512").unwrap(), Algorithm::HS512);
        assert!(matches!(
            parse_algorithm("RS256"),
            Err(ConfigError::InvalidAlgorithm(_))
        ));
    }

    // Env-var mutation lives in a single test so parallel test threads
    // never observe each other's changes.
    #[test]
    fn from_env_requires_a_secret() {
        std::env::remove_var("AUTH_SECRET");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::MissingSecret)
        ));

        std::env::set_var("AUTH_SECRET", "\"quoted-secret\"");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.auth.secret, "quoted-secret");
        assert_eq!(cfg.auth.algorithm, Algorithm::HS256);
        assert_eq!(cfg.auth.token_expiry_minutes, 60);
        std::env::remove_var("AUTH_SECRET");
    }
}
