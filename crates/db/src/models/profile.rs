use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::text::{normalize_email, trim_optional};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Owner,
    Admin,
    #[default]
    Technician,
}

impl UserRole {
    /// Owners and admins manage the team and company settings.
    pub fn can_manage_team(self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Admin)
    }
}

/// A user of the application; `id` is the auth provider's user id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Profile {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateProfile {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub full_name: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub phone: Option<Option<String>>,
}

impl UpdateProfile {
    pub fn apply(self, mut profile: Profile) -> Profile {
        if let Some(full_name) = self.full_name {
            profile.full_name = trim_optional(full_name);
        }
        if let Some(phone) = self.phone {
            profile.phone = trim_optional(phone);
        }
        profile
    }
}

impl Profile {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads the profile for an authenticated user, provisioning an empty one
    /// (no company, technician role) the first time the user is seen.
    pub async fn find_or_create(
        pool: &SqlitePool,
        id: Uuid,
        email: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO profiles (id, email)
               VALUES ($1, $2)
               ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(id)
        .bind(normalize_email(email))
        .execute(pool)
        .await?;

        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"SELECT * FROM profiles
               WHERE company_id = $1
               ORDER BY CASE role WHEN 'owner' THEN 0 WHEN 'admin' THEN 1 ELSE 2 END,
                        COALESCE(full_name, email)"#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    /// A profile that belongs to `company_id`, or `None`.
    pub async fn find_member(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn is_member(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        Ok(Self::find_member(pool, id, company_id).await?.is_some())
    }

    pub async fn update_details(pool: &SqlitePool, profile: &Profile) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"UPDATE profiles
               SET full_name = $2, phone = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(profile.id)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .fetch_one(pool)
        .await
    }

    /// Moves a profile into (or, with `None`, out of) a company.
    pub async fn set_membership<'e, E>(
        executor: E,
        id: Uuid,
        company_id: Option<Uuid>,
        role: UserRole,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE profiles
               SET company_id = $2, role = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(company_id)
        .bind(role)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_role(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"UPDATE profiles
               SET role = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND company_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(company_id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }
}
