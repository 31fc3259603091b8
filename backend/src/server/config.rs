//! Environment-driven application configuration.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::domain::accounts::MIN_PASSWORD_LEN;
use crate::domain::{AdminCredentials, EmailAddress};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_COUNTRY_CODE: &str = "+91";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {key}")]
    Missing { key: &'static str },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Mail provider credentials.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Url,
    pub api_key: String,
    pub sender: String,
}

/// SMS provider credentials.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_url: Url,
    pub account_sid: String,
    pub auth_token: String,
    pub sender: String,
}

/// Payment gateway credentials.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_url: Url,
    pub key_id: String,
    pub key_secret: String,
}

/// Image hosting credentials.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub api_url: Url,
    pub api_key: String,
}

/// Everything the server needs at startup, read once from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub admin: AdminCredentials,
    pub currency: String,
    pub default_country_code: String,
    pub mail: MailConfig,
    pub sms: SmsConfig,
    pub payment: PaymentConfig,
    pub image: ImageConfig,
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a required variable is absent or fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through a lookup function. Separated from
    /// [`Self::from_env`] so parsing can be tested without mutating the
    /// process environment.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse()
            .map_err(|error: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: error.to_string(),
            })?;
        let admin_email = required(&lookup, "ADMIN_EMAIL")?;
        let admin = AdminCredentials {
            email: EmailAddress::parse(&admin_email).map_err(|error| ConfigError::Invalid {
                key: "ADMIN_EMAIL",
                reason: error.to_string(),
            })?,
            password: required(&lookup, "ADMIN_PASSWORD")?,
        };
        if admin.password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::Invalid {
                key: "ADMIN_PASSWORD",
                reason: "too short".to_owned(),
            });
        }
        Ok(Self {
            bind_addr,
            admin,
            currency: lookup("CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
            default_country_code: lookup("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_owned()),
            mail: MailConfig {
                api_url: required_url(&lookup, "MAIL_API_URL")?,
                api_key: required(&lookup, "MAIL_API_KEY")?,
                sender: required(&lookup, "MAIL_SENDER")?,
            },
            sms: SmsConfig {
                api_url: required_url(&lookup, "SMS_API_URL")?,
                account_sid: required(&lookup, "SMS_ACCOUNT_SID")?,
                auth_token: required(&lookup, "SMS_AUTH_TOKEN")?,
                sender: required(&lookup, "SMS_SENDER")?,
            },
            payment: PaymentConfig {
                api_url: required_url(&lookup, "PAYMENT_API_URL")?,
                key_id: required(&lookup, "PAYMENT_KEY_ID")?,
                key_secret: required(&lookup, "PAYMENT_KEY_SECRET")?,
            },
            image: ImageConfig {
                api_url: required_url(&lookup, "IMAGE_API_URL")?,
                api_key: required(&lookup, "IMAGE_API_KEY")?,
            },
        })
    }
}

fn required(
    lookup: &impl Fn(&'static str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing { key })
}

fn required_url(
    lookup: &impl Fn(&'static str) -> Option<String>,
    key: &'static str,
) -> Result<Url, ConfigError> {
    let raw = required(lookup, key)?;
    Url::parse(&raw).map_err(|error| ConfigError::Invalid {
        key,
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("ADMIN_EMAIL", "admin@clinic.test"),
            ("ADMIN_PASSWORD", "admin-password-123"),
            ("MAIL_API_URL", "https://mail.test/send"),
            ("MAIL_API_KEY", "mail-key"),
            ("MAIL_SENDER", "noreply@clinic.test"),
            ("SMS_API_URL", "https://sms.test/2010-04-01/"),
            ("SMS_ACCOUNT_SID", "AC123"),
            ("SMS_AUTH_TOKEN", "sms-token"),
            ("SMS_SENDER", "+15550100"),
            ("PAYMENT_API_URL", "https://pay.test/v1/"),
            ("PAYMENT_KEY_ID", "key-id"),
            ("PAYMENT_KEY_SECRET", "key-secret"),
            ("IMAGE_API_URL", "https://img.test/upload"),
            ("IMAGE_API_KEY", "img-key"),
        ])
    }

    #[test]
    fn full_environment_parses_with_defaults() {
        let env = full_env();
        let config = AppConfig::from_lookup(|key| env.get(key).map(ToString::to_string))
            .expect("config parses");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.currency, "INR");
        assert_eq!(config.default_country_code, "+91");
        assert_eq!(config.admin.email.as_str(), "admin@clinic.test");
    }

    #[test]
    fn missing_admin_password_is_reported_by_name() {
        let mut env = full_env();
        env.remove("ADMIN_PASSWORD");
        let error = AppConfig::from_lookup(|key| env.get(key).map(ToString::to_string))
            .expect_err("missing variable");
        assert!(matches!(
            error,
            ConfigError::Missing {
                key: "ADMIN_PASSWORD"
            }
        ));
    }

    #[test]
    fn malformed_gateway_url_is_rejected() {
        let mut env = full_env();
        env.insert("PAYMENT_API_URL", "not a url");
        let error = AppConfig::from_lookup(|key| env.get(key).map(ToString::to_string))
            .expect_err("invalid url");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                key: "PAYMENT_API_URL",
                ..
            }
        ));
    }
}
