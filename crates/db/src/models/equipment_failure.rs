use chrono::{DateTime, NaiveDate, Utc};
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
#[sqlx(type_name = "failure_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FailureSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A breakdown of a piece of equipment; open until `resolved_on` is set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct EquipmentFailure {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub reported_by: Option<Uuid>,
    pub failed_on: NaiveDate,
    pub severity: FailureSeverity,
    pub description: String,
    pub resolved_on: Option<NaiveDate>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateEquipmentFailure {
    pub failed_on: NaiveDate,
    pub severity: Option<FailureSeverity>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateEquipmentFailure {
    pub severity: Option<FailureSeverity>,
    pub description: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub resolved_on: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub resolution: Option<Option<String>>,
}

impl CreateEquipmentFailure {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("description", &self.description).map(|_| ())
    }
}

impl UpdateEquipmentFailure {
    pub fn apply(self, mut failure: EquipmentFailure) -> EquipmentFailure {
        if let Some(severity) = self.severity {
            failure.severity = severity;
        }
        if let Some(description) = self.description {
            failure.description = description.trim().to_string();
        }
        if let Some(resolved_on) = self.resolved_on {
            failure.resolved_on = resolved_on;
        }
        if let Some(resolution) = self.resolution {
            failure.resolution = trim_optional(resolution);
        }
        failure
    }
}

impl EquipmentFailure {
    pub fn is_open(&self) -> bool {
        self.resolved_on.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("description", &self.description)?;
        match self.resolved_on {
            Some(resolved) if resolved < self.failed_on => Err(ValidationError::new(
                "resolved_on cannot be before failed_on",
            )),
            _ => Ok(()),
        }
    }

    pub async fn find_by_equipment(
        pool: &SqlitePool,
        equipment_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EquipmentFailure>(
            r#"SELECT * FROM equipment_failures
               WHERE equipment_id = $1
               ORDER BY failed_on DESC, created_at DESC"#,
        )
        .bind(equipment_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, EquipmentFailure>(
            r#"SELECT f.*
               FROM equipment_failures f
               JOIN equipment e ON e.id = f.equipment_id
               JOIN units u ON u.id = e.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE f.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        equipment_id: Uuid,
        reported_by: Option<Uuid>,
        data: &CreateEquipmentFailure,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, EquipmentFailure>(
            r#"INSERT INTO equipment_failures (id, equipment_id, reported_by, failed_on, severity, description)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(equipment_id)
        .bind(reported_by)
        .bind(data.failed_on)
        .bind(data.severity.unwrap_or_default())
        .bind(data.description.trim())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        failure: &EquipmentFailure,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, EquipmentFailure>(
            r#"UPDATE equipment_failures
               SET severity = $2, description = $3, resolved_on = $4, resolution = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(failure.id)
        .bind(failure.severity)
        .bind(&failure.description)
        .bind(failure.resolved_on)
        .bind(&failure.resolution)
        .fetch_one(pool)
        .await
    }
}
