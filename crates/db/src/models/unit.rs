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
#[sqlx(type_name = "unit_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitType {
    #[default]
    Pool,
    Spa,
    WadingPool,
    Other,
}

/// Sanitiser system; decides which readings matter (salt only for salt pools).
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "water_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaterType {
    #[default]
    Chlorine,
    Salt,
    Bromine,
    Mineral,
}

/// A serviced body of water. Belongs to a property.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Unit {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub unit_type: UnitType,
    pub water_type: WaterType,
    pub volume_litres: Option<f64>,
    pub is_indoor: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUnit {
    pub name: String,
    pub unit_type: Option<UnitType>,
    pub water_type: Option<WaterType>,
    pub volume_litres: Option<f64>,
    pub is_indoor: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateUnit {
    pub name: Option<String>,
    pub unit_type: Option<UnitType>,
    pub water_type: Option<WaterType>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "number | null")]
    pub volume_litres: Option<Option<f64>>,
    pub is_indoor: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

impl CreateUnit {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::non_negative("volume_litres", self.volume_litres)
    }
}

impl UpdateUnit {
    pub fn apply(self, mut unit: Unit) -> Unit {
        if let Some(name) = self.name {
            unit.name = name.trim().to_string();
        }
        if let Some(unit_type) = self.unit_type {
            unit.unit_type = unit_type;
        }
        if let Some(water_type) = self.water_type {
            unit.water_type = water_type;
        }
        if let Some(volume) = self.volume_litres {
            unit.volume_litres = volume;
        }
        if let Some(is_indoor) = self.is_indoor {
            unit.is_indoor = is_indoor;
        }
        if let Some(notes) = self.notes {
            unit.notes = trim_optional(notes);
        }
        unit
    }
}

impl Unit {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::non_negative("volume_litres", self.volume_litres)
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            r#"SELECT u.*
               FROM units u
               JOIN properties p ON p.id = u.property_id
               WHERE p.company_id = $1
               ORDER BY p.name COLLATE NOCASE, u.name COLLATE NOCASE"#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }

    /// Units of a property; callers check the property's ownership first.
    pub async fn find_by_property(
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            "SELECT * FROM units WHERE property_id = $1 ORDER BY name COLLATE NOCASE",
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            r#"SELECT u.*
               FROM units u
               JOIN properties p ON p.id = u.property_id
               WHERE u.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        property_id: Uuid,
        data: &CreateUnit,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            r#"INSERT INTO units (id, property_id, name, unit_type, water_type, volume_litres, is_indoor, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(data.name.trim())
        .bind(data.unit_type.unwrap_or_default())
        .bind(data.water_type.unwrap_or_default())
        .bind(data.volume_litres)
        .bind(data.is_indoor.unwrap_or(false))
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, unit: &Unit) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            r#"UPDATE units
               SET name = $2, unit_type = $3, water_type = $4, volume_litres = $5,
                   is_indoor = $6, notes = $7, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(unit.id)
        .bind(&unit.name)
        .bind(unit.unit_type)
        .bind(unit.water_type)
        .bind(unit.volume_litres)
        .bind(unit.is_indoor)
        .bind(&unit.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
