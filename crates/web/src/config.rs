//! Web application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SKILLSWAP_BASE_URL` - Public URL of the site (used for OAuth redirects and cookies)
//!
//! ## Optional
//! - `SKILLSWAP_HOST` - Bind address (default: 127.0.0.1)
//! - `SKILLSWAP_PORT` - Listen port (default: 3000)
//! - `SKILLSWAP_STATIC_DIR` - Static asset directory (default: crates/web/static)
//! - `IDENTITY_BACKEND` - `memory` (default) or `firebase`
//! - `MEMORY_TOKEN_TTL_SECS` - ID token lifetime for the memory backend (default: 3600)
//! - `FIREBASE_API_KEY` - Web API key (required for the firebase backend)
//! - `FIREBASE_AUTH_EMULATOR_HOST` - `host:port` of a local Auth emulator (optional)
//! - `GOOGLE_OAUTH_CLIENT_ID` / `GOOGLE_OAUTH_CLIENT_SECRET` - Enables "Continue with Google"
//! - `PASSWORD_RESET_PORTAL_URL` - Where to send users after a reset email (default: <https://mail.google.com>)
//! - `PASSWORD_RESET_REDIRECT_DELAY_SECS` - Delay before that redirect (default: 1)
//! - `AUTH_RATE_LIMIT` - `on` (default) or `off`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default destination after requesting a password reset email.
pub const DEFAULT_RESET_PORTAL_URL: &str = "https://mail.google.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Identity provider backend
    pub identity: IdentityConfig,
    /// Google OpenID Connect client, when federated login is enabled
    pub google: Option<GoogleOAuthConfig>,
    /// Post-reset redirect behavior
    pub password_reset: PasswordResetConfig,
    /// Whether auth form submissions are rate limited per client IP
    pub auth_rate_limit: bool,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// Identity provider backend selection.
#[derive(Debug, Clone)]
pub enum IdentityConfig {
    /// In-process provider.
    Memory {
        /// Lifetime of issued ID tokens.
        token_ttl: Duration,
    },
    /// Firebase Authentication REST API.
    Firebase(FirebaseConfig),
}

/// Firebase project settings.
///
/// The web API key identifies the project; it is not a secret.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Web API key
    pub api_key: String,
    /// `host:port` of the Firebase Auth emulator, instead of Google's endpoints
    pub emulator_host: Option<String>,
}

/// Google OAuth client credentials.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Where and when to send users after a password reset request.
#[derive(Debug, Clone)]
pub struct PasswordResetConfig {
    /// External mail portal URL
    pub portal_url: String,
    /// Delay before the redirect
    pub redirect_delay: Duration,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            portal_url: DEFAULT_RESET_PORTAL_URL.to_string(),
            redirect_delay: Duration::from_secs(1),
        }
    }
}

/// Sentry settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// DSN; Sentry is disabled when absent
    pub dsn: Option<String>,
    /// Environment tag (e.g. "production")
    pub environment: Option<String>,
    /// Error event sample rate
    pub sample_rate: f32,
    /// Transaction sample rate
    pub traces_sample_rate: f32,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the Google client secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("SKILLSWAP_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("SKILLSWAP_PORT", "3000")?;
        let base_url = validate_base_url(&get_required_env("SKILLSWAP_BASE_URL")?)?;
        let static_dir = PathBuf::from(get_env_or_default(
            "SKILLSWAP_STATIC_DIR",
            "crates/web/static",
        ));

        let identity = IdentityConfig::from_env()?;
        let google = GoogleOAuthConfig::from_env()?;
        let password_reset = PasswordResetConfig {
            portal_url: get_env_or_default("PASSWORD_RESET_PORTAL_URL", DEFAULT_RESET_PORTAL_URL),
            redirect_delay: Duration::from_secs(parse_env_or_default(
                "PASSWORD_RESET_REDIRECT_DELAY_SECS",
                "1",
            )?),
        };
        let auth_rate_limit = parse_switch("AUTH_RATE_LIMIT", true)?;

        let sentry = SentryConfig {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            identity,
            google,
            password_reset,
            auth_rate_limit,
            sentry,
        })
    }

    /// Local defaults: memory identity backend, no federated login, no rate limiting.
    ///
    /// Used by the integration tests and for running the demo without any
    /// external accounts.
    #[must_use]
    pub fn development(base_url: impl Into<String>) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            identity: IdentityConfig::Memory {
                token_ttl: Duration::from_secs(3600),
            },
            google: None,
            password_reset: PasswordResetConfig::default(),
            auth_rate_limit: false,
            sentry: SentryConfig::default(),
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("IDENTITY_BACKEND", "memory").as_str() {
            "memory" => Ok(Self::Memory {
                token_ttl: Duration::from_secs(parse_env_or_default(
                    "MEMORY_TOKEN_TTL_SECS",
                    "3600",
                )?),
            }),
            "firebase" => Ok(Self::Firebase(FirebaseConfig {
                api_key: get_required_env("FIREBASE_API_KEY")?,
                emulator_host: get_optional_env("FIREBASE_AUTH_EMULATOR_HOST"),
            })),
            other => Err(ConfigError::InvalidEnvVar(
                "IDENTITY_BACKEND".to_string(),
                format!("expected 'memory' or 'firebase', got '{other}'"),
            )),
        }
    }
}

impl GoogleOAuthConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(client_id) = get_optional_env("GOOGLE_OAUTH_CLIENT_ID") else {
            return Ok(None);
        };
        Ok(Some(Self {
            client_id,
            client_secret: get_validated_secret("GOOGLE_OAUTH_CLIENT_SECRET")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an on/off switch.
fn parse_switch(key: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(key).as_deref().map(str::to_ascii_lowercase) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "on" | "true" | "1" => Ok(true),
            "off" | "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected on/off, got '{v}'"),
            )),
        },
    }
}

/// Check the base URL is an absolute http(s) URL and strip any trailing slash.
fn validate_base_url(value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidEnvVar("SKILLSWAP_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "SKILLSWAP_BASE_URL".to_string(),
            "must be an http(s) URL with a host".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-client-secret", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("GOCSPX-aB3xY9mK2nL5pQ7rT0uW4zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url("http://localhost:3000/").unwrap(),
            "http://localhost:3000"
        );
        assert!(validate_base_url("localhost:3000").is_err());
        assert!(validate_base_url("ftp://example.org").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_development_defaults() {
        let config = WebConfig::development("http://127.0.0.1:4000/");
        assert_eq!(config.base_url, "http://127.0.0.1:4000");
        assert!(!config.is_https());
        assert!(!config.auth_rate_limit);
        assert!(config.google.is_none());
        assert!(matches!(config.identity, IdentityConfig::Memory { .. }));
        assert_eq!(config.password_reset.portal_url, "https://mail.google.com");
        assert_eq!(config.password_reset.redirect_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_socket_addr() {
        let mut config = WebConfig::development("http://localhost:3000");
        config.port = 8080;
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_google_config_debug_redacts_secret() {
        let config = GoogleOAuthConfig {
            client_id: "client-id-value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("client-id-value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
    }
}
