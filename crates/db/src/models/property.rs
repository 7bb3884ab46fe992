use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "property_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyType {
    #[default]
    Residential,
    Commercial,
    HolidayLet,
    BodyCorporate,
}

/// A site holding one or more units (pools/spas). Owned directly by a company.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Property {
    pub id: Uuid,
    pub company_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub name: String,
    pub address: Option<String>,
    pub property_type: PropertyType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProperty {
    pub name: String,
    pub customer_id: Option<Uuid>,
    pub address: Option<String>,
    pub property_type: Option<PropertyType>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateProperty {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub customer_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub address: Option<Option<String>>,
    pub property_type: Option<PropertyType>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

impl CreateProperty {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name).map(|_| ())
    }
}

impl UpdateProperty {
    pub fn apply(self, mut property: Property) -> Property {
        if let Some(name) = self.name {
            property.name = name.trim().to_string();
        }
        if let Some(customer_id) = self.customer_id {
            property.customer_id = customer_id;
        }
        if let Some(address) = self.address {
            property.address = trim_optional(address);
        }
        if let Some(property_type) = self.property_type {
            property.property_type = property_type;
        }
        if let Some(notes) = self.notes {
            property.notes = trim_optional(notes);
        }
        property
    }
}

impl Property {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name).map(|_| ())
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE company_id = $1 ORDER BY name COLLATE NOCASE",
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
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        company_id: Uuid,
        data: &CreateProperty,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            r#"INSERT INTO properties (id, company_id, customer_id, name, address, property_type, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(data.customer_id)
        .bind(data.name.trim())
        .bind(trim_optional(data.address.clone()))
        .bind(data.property_type.unwrap_or_default())
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, property: &Property) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            r#"UPDATE properties
               SET customer_id = $3, name = $4, address = $5, property_type = $6, notes = $7,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND company_id = $2
               RETURNING *"#,
        )
        .bind(property.id)
        .bind(property.company_id)
        .bind(property.customer_id)
        .bind(&property.name)
        .bind(&property.address)
        .bind(property.property_type)
        .bind(&property.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, company_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
