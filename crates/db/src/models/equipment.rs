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
#[sqlx(type_name = "equipment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EquipmentType {
    Pump,
    Filter,
    Heater,
    Chlorinator,
    Cleaner,
    Controller,
    #[default]
    Other,
}

/// A piece of plant attached to a unit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Equipment {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub equipment_type: EquipmentType,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub installed_on: Option<NaiveDate>,
    pub warranty_expires_on: Option<NaiveDate>,
    pub maintenance_interval_days: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateEquipment {
    pub unit_id: Uuid,
    pub name: String,
    pub equipment_type: Option<EquipmentType>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub installed_on: Option<NaiveDate>,
    pub warranty_expires_on: Option<NaiveDate>,
    pub maintenance_interval_days: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub equipment_type: Option<EquipmentType>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub brand: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub model: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub serial_number: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub installed_on: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub warranty_expires_on: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "number | null")]
    pub maintenance_interval_days: Option<Option<i32>>,
    pub is_active: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

/// `?unit_id=` filter for equipment listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct EquipmentFilter {
    pub unit_id: Option<Uuid>,
    pub active: Option<bool>,
}

fn check_dates(
    installed_on: Option<NaiveDate>,
    warranty_expires_on: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (installed_on, warranty_expires_on) {
        (Some(installed), Some(expires)) if expires < installed => Err(ValidationError::new(
            "warranty_expires_on cannot be before installed_on",
        )),
        _ => Ok(()),
    }
}

impl CreateEquipment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::positive_days("maintenance_interval_days", self.maintenance_interval_days)?;
        check_dates(self.installed_on, self.warranty_expires_on)
    }
}

impl UpdateEquipment {
    pub fn apply(self, mut equipment: Equipment) -> Equipment {
        if let Some(name) = self.name {
            equipment.name = name.trim().to_string();
        }
        if let Some(equipment_type) = self.equipment_type {
            equipment.equipment_type = equipment_type;
        }
        if let Some(brand) = self.brand {
            equipment.brand = trim_optional(brand);
        }
        if let Some(model) = self.model {
            equipment.model = trim_optional(model);
        }
        if let Some(serial_number) = self.serial_number {
            equipment.serial_number = trim_optional(serial_number);
        }
        if let Some(installed_on) = self.installed_on {
            equipment.installed_on = installed_on;
        }
        if let Some(warranty_expires_on) = self.warranty_expires_on {
            equipment.warranty_expires_on = warranty_expires_on;
        }
        if let Some(interval) = self.maintenance_interval_days {
            equipment.maintenance_interval_days = interval;
        }
        if let Some(is_active) = self.is_active {
            equipment.is_active = is_active;
        }
        if let Some(notes) = self.notes {
            equipment.notes = trim_optional(notes);
        }
        equipment
    }
}

const SELECT_FOR_COMPANY: &str = r#"SELECT e.*
   FROM equipment e
   JOIN units u ON u.id = e.unit_id
   JOIN properties p ON p.id = u.property_id"#;

impl Equipment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::positive_days("maintenance_interval_days", self.maintenance_interval_days)?;
        check_dates(self.installed_on, self.warranty_expires_on)
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
        filter: &EquipmentFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"{SELECT_FOR_COMPANY}
               WHERE p.company_id = $1
                 AND ($2 IS NULL OR e.unit_id = $2)
                 AND ($3 IS NULL OR e.is_active = $3)
               ORDER BY e.name COLLATE NOCASE"#
        );
        sqlx::query_as::<_, Equipment>(&sql)
            .bind(company_id)
            .bind(filter.unit_id)
            .bind(filter.active)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_unit(pool: &SqlitePool, unit_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE unit_id = $1 ORDER BY name COLLATE NOCASE",
        )
        .bind(unit_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{SELECT_FOR_COMPANY} WHERE e.id = $1 AND p.company_id = $2");
        sqlx::query_as::<_, Equipment>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateEquipment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            r#"INSERT INTO equipment (id, unit_id, name, equipment_type, brand, model, serial_number,
                   installed_on, warranty_expires_on, maintenance_interval_days, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.unit_id)
        .bind(data.name.trim())
        .bind(data.equipment_type.unwrap_or_default())
        .bind(trim_optional(data.brand.clone()))
        .bind(trim_optional(data.model.clone()))
        .bind(trim_optional(data.serial_number.clone()))
        .bind(data.installed_on)
        .bind(data.warranty_expires_on)
        .bind(data.maintenance_interval_days)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, equipment: &Equipment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            r#"UPDATE equipment
               SET name = $2, equipment_type = $3, brand = $4, model = $5, serial_number = $6,
                   installed_on = $7, warranty_expires_on = $8, maintenance_interval_days = $9,
                   is_active = $10, notes = $11, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(equipment.id)
        .bind(&equipment.name)
        .bind(equipment.equipment_type)
        .bind(&equipment.brand)
        .bind(&equipment.model)
        .bind(&equipment.serial_number)
        .bind(equipment.installed_on)
        .bind(equipment.warranty_expires_on)
        .bind(equipment.maintenance_interval_days)
        .bind(equipment.is_active)
        .bind(&equipment.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
