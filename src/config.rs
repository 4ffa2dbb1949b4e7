//! Server configuration module
//! Handles configuration parameters for the Course Hub API server

use crate::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
    DEFAULT_TOKEN_TTL_MINUTES, DEFAULT_UPLOAD_DIR,
};
use crate::error::{CourseHubError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Token signing configuration, built once at startup and shared read-only
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric secret used to sign and verify tokens
    pub jwt_secret: String,
    /// Lifetime of issued access tokens
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl,
        }
    }

    /// Auth config with the default token lifetime
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self::new(
            jwt_secret,
            Duration::from_secs(DEFAULT_TOKEN_TTL_MINUTES * 60),
        )
    }
}

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Token signing configuration
    pub auth: AuthConfig,
    /// SQLite database path (":memory:" for an ephemeral database)
    pub database_path: String,
    /// Directory where uploaded course files are written
    pub upload_dir: PathBuf,
    /// Maximum accepted multipart upload size in bytes
    pub max_upload_bytes: u64,
    /// Mark the auth cookie as Secure (HTTPS deployments)
    pub secure_cookies: bool,
    /// TLS configuration
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    /// Enable TLS
    pub enable_tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        panic!("ServerConfig::default() is not allowed for security reasons. Use ServerConfig::from_env() instead.");
    }
}

impl ServerConfig {
    /// Build a configuration around an explicit auth config, everything else at defaults.
    ///
    /// The secret is taken as-is; `from_env` is the path that enforces secret strength.
    pub fn with_auth(auth: AuthConfig) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auth,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            secure_cookies: false,
            tls_cert_path: None,
            tls_key_path: None,
            enable_tls: false,
        }
    }

    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        let mut config = Self::with_auth(AuthConfig::with_secret(
            "test-jwt-secret-only-for-unit-tests-never-use-in-production",
        ));
        config.database_path = ":memory:".to_string();
        config
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str, secret_type: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(CourseHubError::ConfigError(format!(
                "{} secret must be at least 32 characters long",
                secret_type
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your_secret_key",
            "your-secret-key",
            "change-this",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(CourseHubError::ConfigError(format!(
                    "{} secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    secret_type, pattern
                )));
            }
        }

        // Ensure some complexity
        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CourseHubError::ConfigError(format!(
                "{} secret should contain mixed characters (letters, numbers, symbols) for security",
                secret_type
            )));
        }

        Ok(())
    }

    fn env_flag(name: &str) -> bool {
        env::var(name)
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false)
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("COURSEHUB_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("COURSEHUB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let jwt_secret = env::var("COURSEHUB_JWT_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .map_err(|_| {
                CourseHubError::ConfigError(
                    "JWT_SECRET environment variable is required for security. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;
        Self::validate_secret(&jwt_secret, "JWT")?;

        let ttl_minutes = match env::var("COURSEHUB_JWT_EXPIRE_MINUTES")
            .or_else(|_| env::var("JWT_EXPIRE_MINUTES"))
        {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                CourseHubError::ConfigError(format!(
                    "JWT_EXPIRE_MINUTES must be a whole number of minutes, got '{}'",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };
        if ttl_minutes == 0 {
            return Err(CourseHubError::ConfigError(
                "JWT_EXPIRE_MINUTES must be greater than zero".to_string(),
            ));
        }

        let database_path = env::var("COURSEHUB_DATABASE_PATH")
            .or_else(|_| env::var("DATABASE_PATH"))
            .unwrap_or(DEFAULT_DATABASE_PATH.to_string());

        let upload_dir = env::var("COURSEHUB_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let max_upload_bytes = env::var("COURSEHUB_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|b| b.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let secure_cookies = Self::env_flag("COURSEHUB_SECURE_COOKIES");

        // TLS configuration
        let enable_tls = Self::env_flag("COURSEHUB_ENABLE_TLS");
        let tls_cert_path = env::var("COURSEHUB_TLS_CERT_PATH").ok();
        let tls_key_path = env::var("COURSEHUB_TLS_KEY_PATH").ok();

        if enable_tls {
            match (&tls_cert_path, &tls_key_path) {
                (Some(cert_path), Some(key_path)) => {
                    if !std::path::Path::new(cert_path).exists() {
                        return Err(CourseHubError::ConfigError(format!(
                            "TLS certificate file does not exist: {}",
                            cert_path
                        )));
                    }
                    if !std::path::Path::new(key_path).exists() {
                        return Err(CourseHubError::ConfigError(format!(
                            "TLS private key file does not exist: {}",
                            key_path
                        )));
                    }
                }
                _ => {
                    return Err(CourseHubError::ConfigError(
                        "TLS is enabled but COURSEHUB_TLS_CERT_PATH or COURSEHUB_TLS_KEY_PATH is not set".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            host,
            port,
            auth: AuthConfig::new(jwt_secret, Duration::from_secs(ttl_minutes * 60)),
            database_path,
            upload_dir,
            max_upload_bytes,
            secure_cookies: secure_cookies || enable_tls,
            tls_cert_path,
            tls_key_path,
            enable_tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "ServerConfig::default() is not allowed for security reasons")]
    fn test_default_panics() {
        let _ = ServerConfig::default();
    }

    #[test]
    fn test_for_testing_works_in_tests() {
        let config = ServerConfig::for_testing();
        assert!(config.auth.jwt_secret.contains("test"));
        assert_eq!(config.auth.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.database_path, ":memory:");
    }

    #[test]
    fn test_secret_validation() {
        assert!(ServerConfig::validate_secret("short", "JWT").is_err());
        assert!(ServerConfig::validate_secret("your_secret_key_padded_out_to_32_chars", "JWT").is_err());
        assert!(ServerConfig::validate_secret("abcdefghijklmnopqrstuvwxyzabcdefgh", "JWT").is_err());
        assert!(ServerConfig::validate_secret("Zq8v3Lr0Xk5Tn2Wb7Yc1Md4Pf6Hg9Js0Aa", "JWT").is_ok());
    }

    #[test]
    fn test_from_env_requires_secret() {
        // Clear any existing env vars
        env::remove_var("COURSEHUB_JWT_SECRET");
        env::remove_var("JWT_SECRET");

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("JWT_SECRET"));
    }
}
