use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::profile::UserRole;
use crate::validation::{self, ValidationError};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Revoked,
    Expired,
}

/// Invitation to join a company. Only the SHA-256 of the token is stored,
/// so the row is never serialized with it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TeamInvitation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub email: String,
    pub role: UserRole,
    #[serde(skip)]
    #[ts(skip)]
    pub token_hash: String,
    pub status: InvitationStatus,
    pub invited_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTeamInvitation {
    pub email: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AcceptTeamInvitation {
    pub token: String,
}

impl CreateTeamInvitation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let email = validation::required("email", &self.email)?;
        validation::email("email", &email)?;
        if self.role == Some(UserRole::Owner) {
            return Err(ValidationError::new("invitations cannot grant the owner role"));
        }
        Ok(())
    }
}

impl TeamInvitation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamInvitation>(
            "SELECT * FROM team_invitations WHERE company_id = $1 ORDER BY created_at DESC",
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamInvitation>(
            "SELECT * FROM team_invitations WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_token_hash(
        pool: &SqlitePool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamInvitation>("SELECT * FROM team_invitations WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revokes any pending invitation for `email` and inserts a fresh one.
    pub async fn replace_pending(
        pool: &SqlitePool,
        company_id: Uuid,
        email: &str,
        role: UserRole,
        token_hash: &str,
        invited_by: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            r#"UPDATE team_invitations
               SET status = 'revoked', updated_at = datetime('now', 'subsec')
               WHERE company_id = $1 AND email = $2 AND status = 'pending'"#,
        )
        .bind(company_id)
        .bind(email)
        .execute(&mut *tx)
        .await?;
        let invitation = sqlx::query_as::<_, TeamInvitation>(
            r#"INSERT INTO team_invitations (id, company_id, email, role, token_hash, invited_by, expires_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(email)
        .bind(role)
        .bind(token_hash)
        .bind(invited_by)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(invitation)
    }

    pub async fn set_status<'e, E>(
        executor: E,
        id: Uuid,
        status: InvitationStatus,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let accepted_at = (status == InvitationStatus::Accepted).then(Utc::now);
        sqlx::query_as::<_, TeamInvitation>(
            r#"UPDATE team_invitations
               SET status = $2, accepted_at = COALESCE($3, accepted_at),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(status)
        .bind(accepted_at)
        .fetch_one(executor)
        .await
    }

    pub async fn count_pending(pool: &SqlitePool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM team_invitations WHERE company_id = $1 AND status = 'pending'",
        )
        .bind(company_id)
        .fetch_one(pool)
        .await
    }
}
