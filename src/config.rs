//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! It uses the "12-factor app" methodology where configuration comes from the environment.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 0.0.0.0)
//! - `PORT`: Server port (default: 3000)
//! - `DATABASE_URL`: SQLite database connection string
//! - `SESSION_SECRET`: Key used to sign the session cookie (required, at least 64 bytes)
//! - `APP_ENV`: `development` (default) or `production`
//! - `PUBLIC_DIR`: Directory served as static assets (default: public)
//! - `VIEWS_DIR`: Directory holding the page templates (default: views)
//! - `MAX_BODY_BYTES`: Largest accepted request body (default: 1 MiB)
//! - `BCRYPT_COST`: Work factor for password hashes
//! - `CONTEXT_FAILURE_POLICY`: `redirect` (default) or `propagate`
//! - `LOG_FORMAT`: `default`, `compact`, `pretty` or `json`

use anyhow::{bail, ensure, Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Sessions expire this long after they are issued, regardless of activity.
pub const SESSION_TTL: time::Duration = time::Duration::hours(3);

/// Minimum length of `SESSION_SECRET`; the cookie signing key needs 64 bytes.
pub const MIN_SECRET_LEN: usize = 64;

/// Application configuration
///
/// Built once at startup and shared through [`crate::state::AppState`].
/// Nothing downstream reads the process environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number (1-65535)
    pub port: u16,

    /// SQLite database connection URL
    /// Format: "sqlite:filename.db?mode=rwc"
    pub database_url: String,

    /// Secret used to sign session cookies
    pub session_secret: SessionSecret,

    /// Absolute lifetime of a session, counted from its first write
    pub session_ttl: time::Duration,

    /// Development or production; controls error detail and cookie security
    pub mode: RuntimeMode,

    /// Root of the static asset tree
    pub public_dir: PathBuf,

    /// Root of the template tree
    pub views_dir: PathBuf,

    /// Requests with a larger body are rejected before any handler runs
    pub max_body_bytes: usize,

    /// bcrypt work factor for new password hashes
    pub password_cost: u32,

    /// What the global context stage does when it cannot load its data
    pub context_failure_policy: ContextFailurePolicy,

    /// Output format of the tracing subscriber
    pub log_format: LogFormat,
}

/// Runtime mode of the process, injected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub fn is_development(self) -> bool {
        self == RuntimeMode::Development
    }

    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

impl FromStr for RuntimeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "production" | "prod" => Ok(RuntimeMode::Production),
            other => bail!("unknown APP_ENV '{}' (expected development or production)", other),
        }
    }
}

/// Policy applied when the global view context cannot be built.
///
/// `RedirectHome` logs the failure and sends the client to `/` without an
/// error page. `Propagate` forwards the error to the error boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextFailurePolicy {
    #[default]
    RedirectHome,
    Propagate,
}

impl FromStr for ContextFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redirect" => Ok(ContextFailurePolicy::RedirectHome),
            "propagate" => Ok(ContextFailurePolicy::Propagate),
            other => bail!(
                "unknown CONTEXT_FAILURE_POLICY '{}' (expected redirect or propagate)",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Default,
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "full" => Ok(LogFormat::Default),
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown LOG_FORMAT '{}'", other),
        }
    }
}

/// Session signing secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret([redacted])")
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads variables from .env file (if present) using dotenvy
    /// 2. Reads each configuration value from environment
    /// 3. Falls back to defaults where a variable is optional
    /// 4. Returns an error if a required variable is missing or a value fails to parse
    ///
    /// ## Example .env file
    /// ```text
    /// PORT=3000
    /// DATABASE_URL=sqlite:storefront.db?mode=rwc
    /// SESSION_SECRET=<at least 64 random characters>
    /// APP_ENV=development
    /// ```
    pub fn from_env() -> Result<Self> {
        // dotenvy doesn't error if the file is missing
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let session_secret = lookup("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        ensure!(
            session_secret.len() >= MIN_SECRET_LEN,
            "SESSION_SECRET must be at least {} bytes long (got {})",
            MIN_SECRET_LEN,
            session_secret.len()
        );

        let password_cost = match lookup("BCRYPT_COST") {
            Some(cost) => cost.parse().context("BCRYPT_COST must be a number")?,
            None => bcrypt::DEFAULT_COST,
        };
        ensure!(
            (4..=31).contains(&password_cost),
            "BCRYPT_COST must be between 4 and 31"
        );

        Ok(Config {
            host: var("HOST", "0.0.0.0"),

            // The ? operator propagates parse errors
            port: var("PORT", "3000")
                .parse()
                .context("PORT must be a valid port number")?,

            database_url: var("DATABASE_URL", "sqlite:storefront.db?mode=rwc"),
            session_secret: SessionSecret::new(session_secret),
            session_ttl: SESSION_TTL,
            mode: var("APP_ENV", "development").parse()?,
            public_dir: PathBuf::from(var("PUBLIC_DIR", "public")),
            views_dir: PathBuf::from(var("VIEWS_DIR", "views")),
            max_body_bytes: var("MAX_BODY_BYTES", "1048576")
                .parse()
                .context("MAX_BODY_BYTES must be a number")?,
            password_cost,
            context_failure_policy: var("CONTEXT_FAILURE_POLICY", "redirect").parse()?,
            log_format: var("LOG_FORMAT", "default").parse()?,
        })
    }

    /// Get the socket address to bind the server to
    ///
    /// Example: "0.0.0.0:3000"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn secret() -> String {
        "s".repeat(MIN_SECRET_LEN)
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let secret = secret();
        let config = Config::from_lookup(lookup_from(&[("SESSION_SECRET", &secret)])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.session_ttl, time::Duration::hours(3));
        assert_eq!(config.context_failure_policy, ContextFailurePolicy::RedirectHome);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.password_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SESSION_SECRET", "tiny")])).unwrap_err();
        assert!(err.to_string().contains("at least 64 bytes"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let secret = secret();
        let config = Config::from_lookup(lookup_from(&[
            ("SESSION_SECRET", &secret),
            ("PORT", "8081"),
            ("APP_ENV", "production"),
            ("CONTEXT_FAILURE_POLICY", "propagate"),
            ("LOG_FORMAT", "json"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8081);
        assert!(config.mode.is_production());
        assert_eq!(config.context_failure_policy, ContextFailurePolicy::Propagate);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.password_cost, 4);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let secret = secret();
        let result = Config::from_lookup(lookup_from(&[
            ("SESSION_SECRET", &secret),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert!("staging".parse::<RuntimeMode>().is_err());
        assert_eq!("PROD".parse::<RuntimeMode>().unwrap(), RuntimeMode::Production);
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let secret = secret();
        let config = Config::from_lookup(lookup_from(&[("SESSION_SECRET", &secret)])).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains(&secret));
        assert!(printed.contains("[redacted]"));
    }
}
