use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::ValidationError;

/// A walk-through of a plant room. `readings` is free-form (pressures, flow,
/// dosing tank levels) and stored as a JSON object.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PlantRoomCheck {
    pub id: Uuid,
    pub plant_room_id: Uuid,
    pub checked_by: Option<Uuid>,
    pub checked_at: DateTime<Utc>,
    #[ts(type = "Record<string, unknown>")]
    pub readings: Json<Value>,
    pub issues_found: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePlantRoomCheck {
    pub checked_at: Option<DateTime<Utc>>,
    #[ts(type = "Record<string, unknown> | null")]
    pub readings: Option<Value>,
    #[serde(default)]
    pub issues_found: bool,
    pub notes: Option<String>,
}

impl CreatePlantRoomCheck {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.readings {
            None | Some(Value::Object(_)) => Ok(()),
            Some(_) => Err(ValidationError::new("readings must be a JSON object")),
        }
    }
}

impl PlantRoomCheck {
    pub async fn find_by_plant_room(
        pool: &SqlitePool,
        plant_room_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PlantRoomCheck>(
            "SELECT * FROM plant_room_checks WHERE plant_room_id = $1 ORDER BY checked_at DESC",
        )
        .bind(plant_room_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        plant_room_id: Uuid,
        checked_by: Option<Uuid>,
        data: &CreatePlantRoomCheck,
    ) -> Result<Self, sqlx::Error> {
        let readings = data
            .readings
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        sqlx::query_as::<_, PlantRoomCheck>(
            r#"INSERT INTO plant_room_checks (id, plant_room_id, checked_by, checked_at, readings, issues_found, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(plant_room_id)
        .bind(checked_by)
        .bind(data.checked_at.unwrap_or_else(Utc::now))
        .bind(Json(readings))
        .bind(data.issues_found)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        models::plant_room::{PlantRoom, tests::plant_room},
        test_support,
    };

    #[test]
    fn readings_must_be_an_object() {
        let check = CreatePlantRoomCheck {
            checked_at: None,
            readings: Some(json!([1, 2])),
            issues_found: false,
            notes: None,
        };
        assert!(check.validate().is_err());
    }

    #[tokio::test]
    async fn readings_round_trip_through_sqlite() {
        let fx = test_support::fixture().await;
        let room = PlantRoom::create(&fx.db.pool, fx.property.id, &plant_room())
            .await
            .unwrap();
        let check = PlantRoomCheck::create(
            &fx.db.pool,
            room.id,
            Some(fx.owner.id),
            &CreatePlantRoomCheck {
                checked_at: None,
                readings: Some(json!({"filter_pressure_kpa": 110, "acid_tank_pct": 40})),
                issues_found: true,
                notes: Some("Acid tank low".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(check.readings.0["filter_pressure_kpa"], 110);

        let listed = PlantRoomCheck::find_by_plant_room(&fx.db.pool, room.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].issues_found);
    }
}
