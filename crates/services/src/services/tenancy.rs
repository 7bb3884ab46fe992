//! Resolves an authenticated user to their profile and company.

use db::models::profile::{Profile, UserRole};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use super::auth::AuthUser;

#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("no company associated with this user")]
    NoCompany,
    #[error("this action requires the owner or admin role")]
    Forbidden,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// The caller plus the company every query in the request is scoped to.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: UserRole,
    pub profile: Profile,
}

impl TenantContext {
    pub fn require_manager(&self) -> Result<(), TenancyError> {
        if self.role.can_manage_team() {
            Ok(())
        } else {
            Err(TenancyError::Forbidden)
        }
    }
}

/// Loads the caller's profile, provisioning one on first sight.
pub async fn load_profile(pool: &SqlitePool, user: &AuthUser) -> Result<Profile, TenancyError> {
    Ok(Profile::find_or_create(pool, user.user_id, &user.email).await?)
}

pub async fn resolve(pool: &SqlitePool, user: &AuthUser) -> Result<TenantContext, TenancyError> {
    let profile = load_profile(pool, user).await?;
    let company_id = profile.company_id.ok_or(TenancyError::NoCompany)?;
    Ok(TenantContext {
        user_id: profile.id,
        company_id,
        role: profile.role,
        profile,
    })
}
