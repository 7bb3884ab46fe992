use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use super::unit::UnitType;
use crate::validation::{self, ValidationError};

/// Service checklist a company reuses across visits.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Template {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_type: Option<UnitType>,
    #[ts(type = "string[]")]
    pub checklist: Json<Vec<String>>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub unit_type: Option<UnitType>,
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "UnitType | null")]
    pub unit_type: Option<Option<UnitType>>,
    pub checklist: Option<Vec<String>>,
    pub is_default: Option<bool>,
}

/// Drops blank checklist items and trims the rest.
fn clean_checklist(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

impl CreateTemplate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name).map(|_| ())
    }
}

impl UpdateTemplate {
    pub fn apply(self, mut template: Template) -> Template {
        if let Some(name) = self.name {
            template.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            template.description = trim_optional(description);
        }
        if let Some(unit_type) = self.unit_type {
            template.unit_type = unit_type;
        }
        if let Some(checklist) = self.checklist {
            template.checklist = Json(clean_checklist(checklist));
        }
        if let Some(is_default) = self.is_default {
            template.is_default = is_default;
        }
        template
    }
}

impl Template {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name).map(|_| ())
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Template>(
            r#"SELECT * FROM templates
               WHERE company_id = $1
               ORDER BY is_default DESC, name COLLATE NOCASE"#,
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
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        company_id: Uuid,
        data: &CreateTemplate,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if data.is_default {
            Self::clear_default(&mut *tx, company_id, data.unit_type).await?;
        }
        let template = sqlx::query_as::<_, Template>(
            r#"INSERT INTO templates (id, company_id, name, description, unit_type, checklist, is_default)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(data.name.trim())
        .bind(trim_optional(data.description.clone()))
        .bind(data.unit_type)
        .bind(Json(clean_checklist(data.checklist.clone())))
        .bind(data.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(template)
    }

    pub async fn update(pool: &SqlitePool, template: &Template) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if template.is_default {
            Self::clear_default(&mut *tx, template.company_id, template.unit_type).await?;
        }
        let updated = sqlx::query_as::<_, Template>(
            r#"UPDATE templates
               SET name = $3, description = $4, unit_type = $5, checklist = $6, is_default = $7,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND company_id = $2
               RETURNING *"#,
        )
        .bind(template.id)
        .bind(template.company_id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.unit_type)
        .bind(&template.checklist)
        .bind(template.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// At most one default per company and unit type.
    async fn clear_default(
        conn: &mut sqlx::SqliteConnection,
        company_id: Uuid,
        unit_type: Option<UnitType>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE templates SET is_default = 0
               WHERE company_id = $1 AND unit_type IS $2"#,
        )
        .bind(company_id)
        .bind(unit_type)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, company_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
