//! Team invitation lifecycle: create, accept, revoke.

use std::sync::Arc;

use chrono::{Duration, Utc};
use db::models::{
    company::Company,
    profile::{Profile, UserRole},
    rate_limit::RateLimit,
    team_invitation::{CreateTeamInvitation, InvitationStatus, TeamInvitation},
};
use db::validation::ValidationError;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use utils::{server_timing, text::normalize_email};
use uuid::Uuid;

use super::{
    config::Config,
    mailer::{Email, Mailer},
    tenancy::TenantContext,
};

pub const CREATE_LIMIT_PER_HOUR: i64 = 20;
pub const ACCEPT_LIMIT_PER_HOUR: i64 = 10;
/// `Server-Timing` metric for outgoing mail.
pub const MAIL_METRIC: &str = "mail";
const HOUR: i64 = 60 * 60;

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("too many invitation requests, try again later")]
    RateLimited,
    #[error("invitation not found")]
    NotFound,
    #[error("invitation is {0}")]
    NotPending(InvitationStatus),
    #[error("invitation has expired")]
    Expired,
    #[error("invitation was sent to a different email address")]
    EmailMismatch,
    #[error("user already belongs to a company")]
    AlreadyMember,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Returned from [`InvitationService::create`]; `token` exists only here and in the email.
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    pub invitation: TeamInvitation,
    pub token: String,
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct InvitationService {
    pool: SqlitePool,
    mailer: Arc<dyn Mailer>,
    config: Arc<Config>,
}

impl InvitationService {
    pub fn new(pool: SqlitePool, mailer: Arc<dyn Mailer>, config: Arc<Config>) -> Self {
        Self {
            pool,
            mailer,
            config,
        }
    }

    pub async fn create(
        &self,
        ctx: &TenantContext,
        payload: &CreateTeamInvitation,
    ) -> Result<IssuedInvitation, InvitationError> {
        payload.validate()?;
        let key = format!("invite:{}", ctx.company_id);
        if !server_timing::db(RateLimit::check(&self.pool, &key, CREATE_LIMIT_PER_HOUR, HOUR))
            .await?
        {
            warn!(company_id = %ctx.company_id, "Invitation rate limit hit");
            return Err(InvitationError::RateLimited);
        }

        let email = normalize_email(&payload.email);
        let role = payload.role.unwrap_or(UserRole::Technician);
        let token = generate_token();
        let expires_at = Utc::now() + Duration::days(self.config.invitation_expiry_days);
        let invitation = server_timing::db(TeamInvitation::replace_pending(
            &self.pool,
            ctx.company_id,
            &email,
            role,
            &hash_token(&token),
            ctx.user_id,
            expires_at,
        ))
        .await?;
        info!(
            company_id = %ctx.company_id,
            invitation_id = %invitation.id,
            role = %role,
            "Invitation created"
        );

        let company_name = server_timing::db(Company::find_by_id(&self.pool, ctx.company_id))
            .await?
            .map(|c| c.name)
            .unwrap_or_default();
        let message = Email::invitation(
            &email,
            &company_name,
            &role.to_string(),
            &self.config.invitation_link(&token),
            self.config.invitation_expiry_days,
        );
        if let Err(e) = server_timing::measure(MAIL_METRIC, self.mailer.send(&message)).await {
            warn!(invitation_id = %invitation.id, error = %e, "Failed to send invitation email");
        }

        Ok(IssuedInvitation { invitation, token })
    }

    /// Joins the caller's profile to the inviting company.
    pub async fn accept(&self, profile: &Profile, token: &str) -> Result<Profile, InvitationError> {
        let key = format!("accept:{}", profile.id);
        if !server_timing::db(RateLimit::check(&self.pool, &key, ACCEPT_LIMIT_PER_HOUR, HOUR))
            .await?
        {
            warn!(user_id = %profile.id, "Invitation accept rate limit hit");
            return Err(InvitationError::RateLimited);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(ValidationError::new("token is required").into());
        }
        let token_hash = hash_token(token);
        let invitation =
            server_timing::db(TeamInvitation::find_by_token_hash(&self.pool, &token_hash))
                .await?
                .ok_or(InvitationError::NotFound)?;

        if invitation.status != InvitationStatus::Pending {
            return Err(InvitationError::NotPending(invitation.status));
        }
        if invitation.is_expired(Utc::now()) {
            server_timing::db(TeamInvitation::set_status(
                &self.pool,
                invitation.id,
                InvitationStatus::Expired,
            ))
            .await?;
            return Err(InvitationError::Expired);
        }
        if normalize_email(&profile.email) != invitation.email {
            return Err(InvitationError::EmailMismatch);
        }
        if profile.company_id.is_some() {
            return Err(InvitationError::AlreadyMember);
        }

        server_timing::db(async {
            let mut tx = self.pool.begin().await?;
            Profile::set_membership(
                &mut *tx,
                profile.id,
                Some(invitation.company_id),
                invitation.role,
            )
            .await?;
            TeamInvitation::set_status(&mut *tx, invitation.id, InvitationStatus::Accepted)
                .await?;
            tx.commit().await
        })
        .await?;
        info!(
            user_id = %profile.id,
            company_id = %invitation.company_id,
            "Invitation accepted"
        );

        server_timing::db(Profile::find_by_id(&self.pool, profile.id))
            .await?
            .ok_or(InvitationError::NotFound)
    }

    pub async fn revoke(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<TeamInvitation, InvitationError> {
        let invitation = server_timing::db(TeamInvitation::find_by_id_for_company(
            &self.pool,
            id,
            ctx.company_id,
        ))
        .await?
        .ok_or(InvitationError::NotFound)?;
        if invitation.status != InvitationStatus::Pending {
            return Err(InvitationError::NotPending(invitation.status));
        }
        let revoked = server_timing::db(TeamInvitation::set_status(
            &self.pool,
            invitation.id,
            InvitationStatus::Revoked,
        ))
        .await?;
        info!(company_id = %ctx.company_id, invitation_id = %id, "Invitation revoked");
        Ok(revoked)
    }
}
