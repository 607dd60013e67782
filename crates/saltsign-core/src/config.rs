//! Configuration management for SaltSign services.
//!
//! All configuration is driven by environment variables. Every field has a
//! default suitable for local development; [`SaltSignConfig::validate`]
//! rejects combinations that would make the protocol unsafe or unusable.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::SaltSignError;

/// Lowest PBKDF2 iteration count accepted from configuration.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Global configuration for SaltSign.
///
/// # Examples
///
/// ```
/// use saltsign_core::SaltSignConfig;
///
/// let config = SaltSignConfig::default();
/// assert_eq!(config.salt_ttl_seconds, 60);
/// assert_eq!(config.session_ttl_seconds, 3600);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SaltSignConfig {
    /// Bind address for the HTTP server.
    #[builder(default = String::from("0.0.0.0:5000"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Application-wide salt mixed into every password-derived key.
    #[builder(default = String::from("app-default-salt"))]
    pub app_salt: String,

    /// PBKDF2 iteration count used when provisioning keys from passwords.
    #[builder(default = MIN_KDF_ITERATIONS)]
    pub kdf_iterations: u32,

    /// Lifetime of an issued, unconsumed salt.
    #[builder(default = 60)]
    pub salt_ttl_seconds: u64,

    /// Lifetime of an authenticated session.
    #[builder(default = 3600)]
    pub session_ttl_seconds: u64,

    /// Largest accepted difference between the client timestamp and server time.
    #[builder(default = 60)]
    pub max_skew_seconds: u64,

    /// Redis connection URL. When unset an in-process store is used.
    #[builder(default)]
    pub store_url: Option<String>,

    /// Upper bound on any single store round trip, in milliseconds.
    #[builder(default = 500)]
    pub store_timeout_ms: u64,

    /// Whether nonces are recorded and rejected on reuse.
    #[builder(default = false)]
    pub nonce_replay_protection: bool,

    /// Username of the demo account provisioned at startup.
    #[builder(default = String::from("admin"))]
    pub demo_user: String,

    /// Password of the demo account provisioned at startup.
    #[builder(default = String::from("password"))]
    pub demo_password: String,

    /// Whether the session cookie carries the `Secure` attribute.
    #[builder(default = false)]
    pub cookie_secure: bool,

    /// Origins allowed to make credentialed cross-origin requests.
    #[builder(default = default_allowed_origins())]
    pub allowed_origins: Vec<String>,
}

impl Default for SaltSignConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:5000"),
            log_level: String::from("info"),
            app_salt: String::from("app-default-salt"),
            kdf_iterations: MIN_KDF_ITERATIONS,
            salt_ttl_seconds: 60,
            session_ttl_seconds: 3600,
            max_skew_seconds: 60,
            store_url: None,
            store_timeout_ms: 500,
            nonce_replay_protection: false,
            demo_user: String::from("admin"),
            demo_password: String::from("password"),
            cookie_secure: false,
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl SaltSignConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:5000` |
    /// | `LOG_LEVEL` | `info` |
    /// | `APP_SALT` | `app-default-salt` |
    /// | `KDF_ITERATIONS` | `100000` (never lower) |
    /// | `SALT_TTL` | `60` |
    /// | `SESSION_TTL` | `3600` |
    /// | `MAX_SKEW` | `60` |
    /// | `REDIS_URL` | *(unset = in-memory store)* |
    /// | `STORE_TIMEOUT_MS` | `500` |
    /// | `NONCE_REPLAY_PROTECTION` | `false` |
    /// | `DEMO_USER` | `admin` |
    /// | `DEMO_PASS` | `password` |
    /// | `COOKIE_SECURE` | `false` |
    /// | `CORS_ALLOWED_ORIGINS` | `http://127.0.0.1:5000,http://localhost:5000` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source, applying the same
    /// parsing and clamping as [`SaltSignConfig::from_env`].
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("APP_SALT") {
            config.app_salt = v;
        }
        if let Some(v) = lookup("KDF_ITERATIONS") {
            if let Ok(n) = v.parse::<u32>() {
                config.kdf_iterations = n.max(MIN_KDF_ITERATIONS);
            }
        }
        if let Some(v) = lookup("SALT_TTL") {
            if let Ok(n) = v.parse::<u64>() {
                config.salt_ttl_seconds = n;
            }
        }
        if let Some(v) = lookup("SESSION_TTL") {
            if let Ok(n) = v.parse::<u64>() {
                config.session_ttl_seconds = n;
            }
        }
        if let Some(v) = lookup("MAX_SKEW") {
            if let Ok(n) = v.parse::<u64>() {
                config.max_skew_seconds = n;
            }
        }
        if let Some(v) = lookup("REDIS_URL") {
            if !v.trim().is_empty() {
                config.store_url = Some(v);
            }
        }
        if let Some(v) = lookup("STORE_TIMEOUT_MS") {
            if let Ok(n) = v.parse::<u64>() {
                config.store_timeout_ms = n;
            }
        }
        if let Some(v) = lookup("NONCE_REPLAY_PROTECTION") {
            config.nonce_replay_protection = parse_bool(&v);
        }
        if let Some(v) = lookup("DEMO_USER") {
            config.demo_user = v;
        }
        if let Some(v) = lookup("DEMO_PASS") {
            config.demo_password = v;
        }
        if let Some(v) = lookup("COOKIE_SECURE") {
            config.cookie_secure = parse_bool(&v);
        }
        if let Some(v) = lookup("CORS_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_list(&v);
        }

        config
    }

    /// Check that the configuration can run the protocol safely.
    ///
    /// # Errors
    /// Returns [`SaltSignError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), SaltSignError> {
        if self.app_salt.is_empty() {
            return Err(SaltSignError::Config("APP_SALT must not be empty".to_owned()));
        }
        if self.salt_ttl_seconds == 0 {
            return Err(SaltSignError::Config("SALT_TTL must be positive".to_owned()));
        }
        if self.session_ttl_seconds == 0 {
            return Err(SaltSignError::Config(
                "SESSION_TTL must be positive".to_owned(),
            ));
        }
        if self.max_skew_seconds == 0 {
            return Err(SaltSignError::Config("MAX_SKEW must be positive".to_owned()));
        }
        if self.store_timeout_ms == 0 {
            return Err(SaltSignError::Config(
                "STORE_TIMEOUT_MS must be positive".to_owned(),
            ));
        }
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(SaltSignError::Config(format!(
                "KDF_ITERATIONS must be at least {MIN_KDF_ITERATIONS}"
            )));
        }
        Ok(())
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        String::from("http://127.0.0.1:5000"),
        String::from("http://localhost:5000"),
    ]
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Parse a comma-separated list, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
