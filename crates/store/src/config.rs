//! Hosted data service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Project URL (e.g., `https://abcd.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public (anon) API key
//!
//! ## Optional
//! - `SUPABASE_TIMEOUT_SECS` - Per-request timeout (default: 30)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Anon key values that mean "not configured yet".
const PLACEHOLDER_PATTERNS: &[&str] = &["your_anon_key_here", "your-anon-key", "changeme"];

const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection settings for the hosted data service.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project base URL, without a trailing slash.
    pub url: Url,
    /// Public API key sent with every request.
    pub anon_key: SecretString,
    pub timeout: Duration,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SUPABASE_URL` or `SUPABASE_ANON_KEY` is
    /// missing, or if a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let url = parse_project_url(&get_required_env("SUPABASE_URL")?)?;
        // Placeholder keys load fine; see `has_placeholder_key`.
        let anon_key = get_required_env("SUPABASE_ANON_KEY")?;
        let timeout_secs = get_env_or_default("SUPABASE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SUPABASE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build a configuration directly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `url` is not an absolute
    /// http(s) URL.
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_project_url(url)?,
            anon_key: SecretString::from(anon_key.into()),
            timeout: Duration::from_secs(30),
        })
    }

    /// Whether the anon key is still a placeholder value.
    #[must_use]
    pub fn has_placeholder_key(&self) -> bool {
        is_placeholder(self.anon_key.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn is_placeholder(key: &str) -> bool {
    let lower = key.trim().to_lowercase();
    lower.is_empty() || PLACEHOLDER_PATTERNS.iter().any(|p| lower == *p)
}

/// Parse and normalize the project URL.
fn parse_project_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), reason);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    url.set_query(None);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_url_strips_trailing_slash() {
        let url = parse_project_url("https://abcd.supabase.co/").unwrap();
        assert_eq!(url.as_str().trim_end_matches('/'), "https://abcd.supabase.co");
    }

    #[test]
    fn test_parse_project_url_rejects_non_http() {
        assert!(matches!(
            parse_project_url("ftp://abcd.supabase.co"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_project_url("not a url").is_err());
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder("your_anon_key_here"));
        assert!(is_placeholder(""));
        assert!(!is_placeholder("eyJhbGciOiJIUzI1NiJ9.payload.sig"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = StoreConfig::new("https://abcd.supabase.co", "super-secret-key").unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-key"));
        assert!(!config.has_placeholder_key());
    }
}
