//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKTIME_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BOOKTIME_BASE_URL` - Public URL of the shop; an `https://` URL turns on secure cookies
//!
//! ## Optional
//! - `BOOKTIME_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKTIME_PORT` - Listen port (default: 3000)
//! - `BOOKTIME_RATE_LIMIT` - Throttle `/auth` and `/api` per client IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)
//! - `SMTP_HOST` - SMTP relay; when unset, emails are only logged
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USERNAME` / `SMTP_PASSWORD` - Relay credentials, required with `SMTP_HOST`
//! - `EMAIL_FROM` - Sender address (default: site@booktime.domain)
//! - `CUSTOMER_SERVICE_EMAIL` - Contact form recipient (default: customerservice@booktime.domain)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

use crate::AppOptions;

const DEFAULT_FROM_ADDRESS: &str = "site@booktime.domain";
const DEFAULT_CUSTOMER_SERVICE_ADDRESS: &str = "customerservice@booktime.domain";

/// Passwords below this many bits of entropy per character are refused.
const MIN_PASSWORD_ENTROPY: f64 = 3.0;

/// Values copied from a sample `.env` rather than set for real.
const PLACEHOLDERS: &[&str] = &["changeme", "your-", "placeholder", "example", "xxx", "todo"];

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL of the shop
    pub base_url: String,
    /// Per-IP rate limits on login, signup and the fulfillment API
    pub rate_limit: bool,
    pub email: EmailConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: String,
}

/// Where outgoing email goes and who receives contact-form messages.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP relay; `None` means emails are logged instead of sent
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
    pub customer_service_address: String,
}

/// SMTP relay credentials. `Debug` leaves the password out.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl StorefrontConfig {
    /// Load configuration from the environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value does
    /// not parse, or the SMTP password looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = required("BOOKTIME_DATABASE_URL")
            .or_else(|_| required("DATABASE_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("BOOKTIME_DATABASE_URL".to_string()))?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host: parsed_or("BOOKTIME_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed_or("BOOKTIME_PORT", 3000)?,
            base_url: required("BOOKTIME_BASE_URL")?,
            rate_limit: parsed_or("BOOKTIME_RATE_LIMIT", true)?,
            email: EmailConfig::from_env()?,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the session cookie should only travel over HTTPS.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Router switches derived from this configuration.
    #[must_use]
    pub fn app_options(&self) -> AppOptions {
        AppOptions {
            secure_cookies: self.secure_cookies(),
            rate_limit: self.rate_limit,
        }
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp = optional("SMTP_HOST")
            .map(|host| -> Result<SmtpConfig, ConfigError> {
                let password = required("SMTP_PASSWORD")?;
                check_password("SMTP_PASSWORD", &password)?;
                Ok(SmtpConfig {
                    host,
                    port: parsed_or("SMTP_PORT", 587)?,
                    username: required("SMTP_USERNAME")?,
                    password: SecretString::from(password),
                })
            })
            .transpose()?;

        Ok(Self {
            smtp,
            from_address: optional("EMAIL_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            customer_service_address: optional("CUSTOMER_SERVICE_EMAIL")
                .unwrap_or_else(|| DEFAULT_CUSTOMER_SERVICE_ADDRESS.to_string()),
        })
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp: None,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            customer_service_address: DEFAULT_CUSTOMER_SERVICE_ADDRESS.to_string(),
        }
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Empty values count as unset.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(key).map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Shannon entropy in bits per character.
fn entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / f64::from(total);
            -p * p.log2()
        })
        .sum()
}

/// Refuse sample values and trivially guessable passwords.
fn check_password(key: &str, value: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(found) = PLACEHOLDERS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a placeholder (contains '{found}')"),
        ));
    }

    let bits = entropy(value);
    if bits < MIN_PASSWORD_ENTROPY {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("entropy {bits:.2} bits/char is below {MIN_PASSWORD_ENTROPY:.1}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy() {
        assert!(entropy("").abs() < f64::EPSILON);
        assert!(entropy("zzzz").abs() < f64::EPSILON);
        assert!((entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_password_refused() {
        let err = check_password("SMTP_PASSWORD", "changeme-smtp-relay").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_repetitive_password_refused() {
        assert!(check_password("SMTP_PASSWORD", &"ab".repeat(12)).is_err());
        assert!(check_password("SMTP_PASSWORD", "q7Rv!m2Kx9#tLw4z").is_ok());
    }

    #[test]
    fn test_email_defaults() {
        let email = EmailConfig::default();
        assert!(email.smtp.is_none());
        assert_eq!(email.from_address, "site@booktime.domain");
        assert_eq!(
            email.customer_service_address,
            "customerservice@booktime.domain"
        );
    }

    #[test]
    fn test_smtp_debug_hides_password() {
        let smtp = SmtpConfig {
            host: "smtp.booktime.domain".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: SecretString::from("q7Rv!m2Kx9#tLw4z"),
        };
        let debug_output = format!("{smtp:?}");
        assert!(debug_output.contains("smtp.booktime.domain"));
        assert!(!debug_output.contains("q7Rv"));
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        let mut config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/booktime"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            rate_limit: true,
            email: EmailConfig::default(),
            sentry_dsn: None,
            sentry_environment: "test".to_string(),
        };
        assert!(!config.secure_cookies());
        assert_eq!(config.socket_addr().port(), 3000);

        config.base_url = "https://booktime.domain".to_string();
        assert!(config.secure_cookies());

        let options = config.app_options();
        assert!(options.secure_cookies);
        assert!(options.rate_limit);
    }
}
