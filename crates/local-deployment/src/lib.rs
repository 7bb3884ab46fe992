use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    auth::AuthService,
    config::Config,
    mailer::{HttpMailer, LogMailer, Mailer},
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    auth: AuthService,
    mailer: Arc<dyn Mailer>,
}

impl LocalDeployment {
    /// Builds a deployment from already-constructed parts.
    pub fn from_parts(config: Config, db: DBService, mailer: Arc<dyn Mailer>) -> Self {
        let auth = AuthService::new(&config.jwt_secret);
        Self {
            config: Arc::new(config),
            db,
            auth,
            mailer,
        }
    }

    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::connect(&config.database_url).await?;
        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => {
                info!(endpoint = %mail.api_url, "Using HTTP mail provider");
                Arc::new(HttpMailer::new(mail)?)
            }
            None => {
                warn!("MAIL_API_URL not set; invitation emails will only be logged");
                Arc::new(LogMailer)
            }
        };
        Ok(Self::from_parts(config, db, mailer))
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        Self::from_config(Config::from_env()?).await
    }

    fn config(&self) -> &Arc<Config> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }
}

#[cfg(test)]
mod tests {
    use db::models::profile::Profile;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn in_memory_config_falls_back_to_log_mailer() {
        let config = Config::with_secret("secret").unwrap();
        assert!(config.mail.is_none());
        let deployment = LocalDeployment::from_config(config).await.unwrap();
        assert_eq!(deployment.config().invitation_expiry_days, 7);

        let members = Profile::find_by_company(&deployment.db().pool, Uuid::new_v4())
            .await
            .unwrap();
        assert!(members.is_empty());
    }
}
