//! Outbound email.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::config::MailConfig;

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
}

impl MailerError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl Email {
    pub fn invitation(to: &str, company_name: &str, role: &str, link: &str, expiry_days: i64) -> Self {
        Email {
            to: to.to_string(),
            subject: format!("You've been invited to join {company_name}"),
            text: format!(
                "You have been invited to join {company_name} as {role}.\n\n\
                 Accept the invitation: {link}\n\n\
                 This link expires in {expiry_days} days."
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        info!(to = %email.to, subject = %email.subject, "Email not sent (no mail provider configured)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// JSON-over-HTTP mail provider (`POST {from, to, subject, text}` with a bearer key).
#[derive(Debug, Clone)]
pub struct HttpMailer {
    http: Client,
    endpoint: Url,
    api_key: SecretString,
    from: String,
}

impl HttpMailer {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(config: &MailConfig) -> Result<Self, MailerError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("pool-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }

    async fn send_once(&self, email: &Email) -> Result<(), MailerError> {
        let body = SendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
        };
        let res = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(MailerError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(MailerError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        (|| async { self.send_once(email).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &MailerError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Mail send failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await?;
        info!(to = %email.to, "Email sent");
        Ok(())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> MailerError {
    if e.is_timeout() {
        MailerError::Timeout
    } else {
        MailerError::Transport(e.to_string())
    }
}
