//! Configuration management for the RTIR client.
//!
//! Configuration is either built in code with [`Config::new`] and the
//! `with_*` builders, or loaded from environment variables with
//! [`Config::from_env`]. Both paths go through the same validation.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::RtirError;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0.2018";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to an RT / RTIR instance.
///
/// The password is stored but never logged; `Debug` prints it redacted.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the RT instance without trailing slash
    /// (e.g., `https://rtir.example.com`).
    pub base_url: String,

    /// RT user name.
    pub user: String,

    /// RT password. Must never be logged or included in error messages.
    password: String,

    /// `User-Agent` header value.
    pub user_agent: String,

    /// Proxy map keyed by scheme: `http`, `https` or `all`.
    pub proxies: BTreeMap<String, String>,

    /// Skip TLS certificate verification (self-signed RT installations).
    pub accept_invalid_certs: bool,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("proxies", &self.proxies)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Creates a configuration from credentials and the RT base URL.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::Config` if the URL is not an absolute http(s) URL
    /// or the user name is empty.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RtirError> {
        let user = user.into().trim().to_string();
        if user.is_empty() {
            return Err(RtirError::invalid_config("RT user must not be empty"));
        }

        Ok(Config {
            base_url: Self::validate_base_url(base_url.into())?,
            user,
            password: password.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxies: BTreeMap::new(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `RTIR_BASE_URL`: Base URL of the RT instance
    /// - `RTIR_USER`: RT user name
    /// - `RTIR_PASSWORD`: RT password
    ///
    /// # Optional Environment Variables
    ///
    /// - `RTIR_USER_AGENT`: overrides the default user agent
    /// - `RTIR_HTTP_PROXY` / `RTIR_HTTPS_PROXY`: proxy URLs per scheme
    /// - `RTIR_ACCEPT_INVALID_CERTS`: `true` disables certificate checks
    /// - `RTIR_TIMEOUT_SECS`: request timeout (default 30)
    ///
    /// # Errors
    ///
    /// Returns `RtirError::Config` if any required variable is missing
    /// or if values fail validation.
    pub fn from_env() -> Result<Self, RtirError> {
        let base_url = Self::get_required_env("RTIR_BASE_URL")?;
        let user = Self::get_required_env("RTIR_USER")?;
        let password = Self::get_required_env("RTIR_PASSWORD")?;

        Self::validate_password(&password)?;

        let mut config = Config::new(user, password, base_url)?;

        if let Some(agent) = Self::get_optional_env("RTIR_USER_AGENT") {
            config = config.with_user_agent(agent);
        }
        if let Some(proxy) = Self::get_optional_env("RTIR_HTTP_PROXY") {
            config = config.with_proxy("http", proxy)?;
        }
        if let Some(proxy) = Self::get_optional_env("RTIR_HTTPS_PROXY") {
            config = config.with_proxy("https", proxy)?;
        }
        if let Some(flag) = Self::get_optional_env("RTIR_ACCEPT_INVALID_CERTS") {
            config = config.with_accept_invalid_certs(Self::parse_bool(
                "RTIR_ACCEPT_INVALID_CERTS",
                &flag,
            )?);
        }
        if let Some(secs) = Self::get_optional_env("RTIR_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                RtirError::invalid_config("RTIR_TIMEOUT_SECS must be a whole number of seconds")
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a proxy for `http`, `https` or `all` traffic.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::Config` for an unknown scheme or a malformed URL.
    pub fn with_proxy(
        mut self,
        scheme: impl Into<String>,
        proxy_url: impl Into<String>,
    ) -> Result<Self, RtirError> {
        let scheme = scheme.into().to_lowercase();
        if !matches!(scheme.as_str(), "http" | "https" | "all") {
            return Err(RtirError::invalid_config(format!(
                "unsupported proxy scheme: {}",
                scheme
            )));
        }
        let proxy_url = proxy_url.into();
        Url::parse(&proxy_url)
            .map_err(|e| RtirError::invalid_config(format!("invalid proxy URL: {}", e)))?;
        self.proxies.insert(scheme, proxy_url);
        Ok(self)
    }

    /// Enables or disables TLS certificate verification bypass.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the password for authentication and sanitization.
    ///
    /// Never log the returned value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, RtirError> {
        env::var(name)
            .map_err(|_| RtirError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(RtirError::missing_env(name))
                } else {
                    Ok(value)
                }
            })
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_bool(name: &str, value: &str) -> Result<bool, RtirError> {
        match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(RtirError::invalid_config(format!(
                "{} must be true or false",
                name
            ))),
        }
    }

    /// Validates and normalizes the base URL.
    fn validate_base_url(url: String) -> Result<String, RtirError> {
        let url = url.trim().trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RtirError::invalid_config(
                "RTIR_BASE_URL must start with http:// or https://",
            ));
        }

        let parsed = Url::parse(&url)
            .map_err(|e| RtirError::invalid_config(format!("invalid RTIR_BASE_URL: {}", e)))?;
        if parsed.host().is_none() {
            return Err(RtirError::invalid_config("RTIR_BASE_URL must include a host"));
        }

        Ok(url)
    }

    /// Validates the password is not a placeholder value.
    fn validate_password(password: &str) -> Result<(), RtirError> {
        let lower = password.to_lowercase();
        let placeholder_patterns = ["your_password", "placeholder", "changeme", "xxx"];

        for pattern in placeholder_patterns {
            if lower.contains(pattern) {
                return Err(RtirError::invalid_config(
                    "RTIR_PASSWORD appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_removes_trailing_slash() {
        let result = Config::validate_base_url("https://rtir.example.com/".to_string()).unwrap();
        assert_eq!(result, "https://rtir.example.com");
    }

    #[test]
    fn test_validate_base_url_keeps_path() {
        let result = Config::validate_base_url("https://example.com/rt/".to_string()).unwrap();
        assert_eq!(result, "https://example.com/rt");
    }

    #[test]
    fn test_validate_base_url_requires_scheme() {
        assert!(Config::validate_base_url("rtir.example.com".to_string()).is_err());
    }

    #[test]
    fn test_validate_password_rejects_placeholder() {
        assert!(Config::validate_password("changeme").is_err());
    }

    #[test]
    fn test_validate_password_accepts_real_password() {
        assert!(Config::validate_password("k9!vQ2r7").is_ok());
    }

    #[test]
    fn test_new_applies_defaults() {
        let config = Config::new("analyst", "pw", "https://rtir.example.com/").unwrap();
        assert_eq!(config.base_url, "https://rtir.example.com");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.proxies.is_empty());
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_new_rejects_empty_user() {
        assert!(Config::new("  ", "pw", "https://rtir.example.com").is_err());
    }

    #[test]
    fn test_with_proxy() {
        let config = Config::new("analyst", "pw", "https://rtir.example.com")
            .unwrap()
            .with_proxy("HTTPS", "http://proxy.local:3128")
            .unwrap();
        assert_eq!(
            config.proxies.get("https").map(String::as_str),
            Some("http://proxy.local:3128")
        );
    }

    #[test]
    fn test_with_proxy_rejects_unknown_scheme() {
        let result = Config::new("analyst", "pw", "https://rtir.example.com")
            .unwrap()
            .with_proxy("ftp", "http://proxy.local:3128");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::new("analyst", "s3cret-pw", "https://rtir.example.com").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret-pw"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_bool() {
        assert!(Config::parse_bool("X", "TRUE").unwrap());
        assert!(!Config::parse_bool("X", "0").unwrap());
        assert!(Config::parse_bool("X", "maybe").is_err());
    }
}
