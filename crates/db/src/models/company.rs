use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use super::profile::UserRole;
use crate::validation::{self, ValidationError};

/// A tenant. Every other tenant-scoped row hangs off a company.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCompany {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCompany {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub email: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub phone: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub address: Option<Option<String>>,
    pub timezone: Option<String>,
}

const DEFAULT_TIMEZONE: &str = "UTC";

impl CreateCompany {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::optional_email("email", self.email.as_deref())?;
        if let Some(tz) = &self.timezone {
            validation::required("timezone", tz)?;
        }
        Ok(())
    }
}

impl UpdateCompany {
    pub fn apply(self, mut company: Company) -> Company {
        if let Some(name) = self.name {
            company.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            company.email = trim_optional(email);
        }
        if let Some(phone) = self.phone {
            company.phone = trim_optional(phone);
        }
        if let Some(address) = self.address {
            company.address = trim_optional(address);
        }
        if let Some(timezone) = self.timezone {
            company.timezone = timezone.trim().to_string();
        }
        company
    }
}

impl Company {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::required("timezone", &self.timezone)?;
        validation::optional_email("email", self.email.as_deref())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Creates the company and makes `owner_id` its owner in one transaction.
    pub async fn create_with_owner(
        pool: &SqlitePool,
        owner_id: Uuid,
        data: &CreateCompany,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let company = sqlx::query_as::<_, Company>(
            r#"INSERT INTO companies (id, name, email, phone, address, timezone)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name.trim())
        .bind(trim_optional(data.email.clone()))
        .bind(trim_optional(data.phone.clone()))
        .bind(trim_optional(data.address.clone()))
        .bind(
            data.timezone
                .as_deref()
                .map(str::trim)
                .unwrap_or(DEFAULT_TIMEZONE),
        )
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"UPDATE profiles
               SET company_id = $2, role = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(owner_id)
        .bind(company.id)
        .bind(UserRole::Owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(company)
    }

    pub async fn update(pool: &SqlitePool, company: &Company) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"UPDATE companies
               SET name = $2, email = $3, phone = $4, address = $5, timezone = $6,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(&company.address)
        .bind(&company.timezone)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DBService, models::profile::Profile};

    #[tokio::test]
    async fn create_with_owner_promotes_creator() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = Profile::find_or_create(&db.pool, Uuid::new_v4(), "founder@reef.test")
            .await
            .unwrap();
        assert!(user.company_id.is_none());

        let company = Company::create_with_owner(
            &db.pool,
            user.id,
            &CreateCompany {
                name: "  Reef Pool Care ".into(),
                email: Some("".into()),
                phone: None,
                address: None,
                timezone: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(company.name, "Reef Pool Care");
        assert_eq!(company.email, None);
        assert_eq!(company.timezone, "UTC");

        let user = Profile::find_by_id(&db.pool, user.id).await.unwrap().unwrap();
        assert_eq!(user.company_id, Some(company.id));
        assert_eq!(user.role, UserRole::Owner);
    }

    #[test]
    fn update_can_clear_nullable_fields() {
        let payload: UpdateCompany =
            serde_json::from_str(r#"{"email": null, "name": " New "}"#).unwrap();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Old".into(),
            email: Some("a@b.co".into()),
            phone: Some("123".into()),
            address: None,
            timezone: "UTC".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let updated = payload.apply(company);
        assert_eq!(updated.name, "New");
        assert_eq!(updated.email, None);
        assert_eq!(updated.phone.as_deref(), Some("123"));
    }
}
