use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

/// Shared plant (pumps, dosing, balance tanks) serving a property.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PlantRoom {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub check_interval_days: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePlantRoom {
    pub name: String,
    pub location: Option<String>,
    pub check_interval_days: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePlantRoom {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub location: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "number | null")]
    pub check_interval_days: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

impl CreatePlantRoom {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::positive_days("check_interval_days", self.check_interval_days)
    }
}

impl UpdatePlantRoom {
    pub fn apply(self, mut room: PlantRoom) -> PlantRoom {
        if let Some(name) = self.name {
            room.name = name.trim().to_string();
        }
        if let Some(location) = self.location {
            room.location = trim_optional(location);
        }
        if let Some(interval) = self.check_interval_days {
            room.check_interval_days = interval;
        }
        if let Some(notes) = self.notes {
            room.notes = trim_optional(notes);
        }
        room
    }
}

impl PlantRoom {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name)?;
        validation::positive_days("check_interval_days", self.check_interval_days)
    }

    pub async fn find_by_property(
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PlantRoom>(
            "SELECT * FROM plant_rooms WHERE property_id = $1 ORDER BY name COLLATE NOCASE",
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
        sqlx::query_as::<_, PlantRoom>(
            r#"SELECT pr.*
               FROM plant_rooms pr
               JOIN properties p ON p.id = pr.property_id
               WHERE pr.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        property_id: Uuid,
        data: &CreatePlantRoom,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PlantRoom>(
            r#"INSERT INTO plant_rooms (id, property_id, name, location, check_interval_days, notes)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(data.name.trim())
        .bind(trim_optional(data.location.clone()))
        .bind(data.check_interval_days)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, room: &PlantRoom) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PlantRoom>(
            r#"UPDATE plant_rooms
               SET name = $2, location = $3, check_interval_days = $4, notes = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(&room.location)
        .bind(room.check_interval_days)
        .bind(&room.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM plant_rooms WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
