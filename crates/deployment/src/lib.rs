use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use serde_json::Value;
use services::services::{
    auth::AuthService,
    config::{Config, ConfigError},
    invitations::InvitationService,
    mailer::{Mailer, MailerError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Mailer(#[from] MailerError),
}

/// Everything a request handler needs, shared across requests.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<Config>;

    fn db(&self) -> &DBService;

    fn auth(&self) -> &AuthService;

    fn mailer(&self) -> &Arc<dyn Mailer>;

    fn invitations(&self) -> InvitationService {
        InvitationService::new(
            self.db().pool.clone(),
            self.mailer().clone(),
            self.config().clone(),
        )
    }

    /// Records a product event. There is no analytics sink, so events only
    /// reach the log.
    async fn track_event(&self, event_name: &str, properties: Value) {
        tracing::info!(event = event_name, properties = %properties, "Event");
    }
}
