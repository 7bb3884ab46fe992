use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

/// Owner of one or more properties; billed for the work done there.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Customer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCustomer {
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
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

impl CreateCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::optional_email("email", self.email.as_deref())
    }
}

impl UpdateCustomer {
    pub fn apply(self, mut customer: Customer) -> Customer {
        if let Some(name) = self.name {
            customer.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            customer.email = trim_optional(email);
        }
        if let Some(phone) = self.phone {
            customer.phone = trim_optional(phone);
        }
        if let Some(address) = self.address {
            customer.address = trim_optional(address);
        }
        if let Some(notes) = self.notes {
            customer.notes = trim_optional(notes);
        }
        customer
    }
}

impl Customer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::optional_email("email", self.email.as_deref())
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE company_id = $1 ORDER BY name COLLATE NOCASE",
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
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        company_id: Uuid,
        data: &CreateCustomer,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"INSERT INTO customers (id, company_id, name, email, phone, address, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(data.name.trim())
        .bind(trim_optional(data.email.clone()))
        .bind(trim_optional(data.phone.clone()))
        .bind(trim_optional(data.address.clone()))
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, customer: &Customer) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"UPDATE customers
               SET name = $3, email = $4, phone = $5, address = $6, notes = $7,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND company_id = $2
               RETURNING *"#,
        )
        .bind(customer.id)
        .bind(customer.company_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, company_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
