//! Process configuration read from the environment (and `.env`, if present).

use std::{env, net::SocketAddr, str::FromStr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pool-service.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_INVITATION_EXPIRY_DAYS: i64 = 7;
pub const MAX_INVITATION_EXPIRY_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Outbound mail provider. Absent when `MAIL_API_URL` is unset.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Url,
    pub api_key: SecretString,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub app_url: Url,
    pub invitation_expiry_days: i64,
    pub mail: Option<MailConfig>,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let mail = match get("MAIL_API_URL") {
            Some(url) => Some(MailConfig {
                api_url: parse("MAIL_API_URL", url)?,
                api_key: SecretString::from(get("MAIL_API_KEY").unwrap_or_default()),
                from: get("MAIL_FROM").unwrap_or_else(|| "no-reply@localhost".to_string()),
            }),
            None => None,
        };
        let invitation_expiry_days = get("INVITATION_EXPIRY_DAYS")
            .map(|v| parse("INVITATION_EXPIRY_DAYS", v))
            .transpose()?
            .unwrap_or(DEFAULT_INVITATION_EXPIRY_DAYS);
        if !(1..=MAX_INVITATION_EXPIRY_DAYS).contains(&invitation_expiry_days) {
            return Err(ConfigError::Invalid {
                name: "INVITATION_EXPIRY_DAYS",
                value: invitation_expiry_days.to_string(),
            });
        }

        Ok(Config {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get("PORT")
                .map(|v| parse("PORT", v))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
            jwt_secret: SecretString::from(jwt_secret),
            app_url: parse(
                "APP_URL",
                get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            )?,
            invitation_expiry_days,
            mail,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }

    /// Defaults plus the given secret, against an in-memory database.
    pub fn with_secret(jwt_secret: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|name| {
            (name == "JWT_SECRET").then(|| jwt_secret.to_string())
        })?;
        config.database_url = db::IN_MEMORY_URL.to_string();
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: self.host.clone(),
            })
    }

    /// Link a recipient follows to accept an invitation.
    pub fn invitation_link(&self, token: &str) -> String {
        let mut url = self.app_url.clone();
        url.set_path("/invitations/accept");
        url.query_pairs_mut().clear().append_pair("token", token);
        url.to_string()
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, 3001);
        assert_eq!(config.invitation_expiry_days, 7);
        assert_eq!(config.jwt_secret.expose_secret(), "s3cret");
        assert!(config.mail.is_none());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn secret_is_required() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
        assert!(
            Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("INVITATION_EXPIRY_DAYS", "0")]))
                .is_err()
        );
    }

    #[test]
    fn invitation_expiry_is_bounded() {
        let expiry = |days: &str| {
            Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("INVITATION_EXPIRY_DAYS", days)]))
        };
        assert_eq!(expiry("365").unwrap().invitation_expiry_days, 365);
        for days in ["366", "999999999999"] {
            assert!(matches!(
                expiry(days).unwrap_err(),
                ConfigError::Invalid {
                    name: "INVITATION_EXPIRY_DAYS",
                    ..
                }
            ));
        }
    }

    #[test]
    fn invitation_link_carries_token() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("APP_URL", "https://app.example.com/dashboard"),
        ]))
        .unwrap();
        assert_eq!(
            config.invitation_link("abc123"),
            "https://app.example.com/invitations/accept?token=abc123"
        );
    }

    #[test]
    fn mail_settings_are_grouped() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("MAIL_API_URL", "https://mail.example.com/send"),
            ("MAIL_API_KEY", "key"),
            ("MAIL_FROM", "team@poolco.test"),
        ]))
        .unwrap();
        let mail = config.mail.unwrap();
        assert_eq!(mail.from, "team@poolco.test");
        assert_eq!(mail.api_key.expose_secret(), "key");
    }
}
