use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

/// Measured water chemistry. Concentrations are ppm, temperature is °C.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct WaterReadings {
    pub ph: Option<f64>,
    pub free_chlorine: Option<f64>,
    pub total_chlorine: Option<f64>,
    pub total_alkalinity: Option<f64>,
    pub calcium_hardness: Option<f64>,
    pub cyanuric_acid: Option<f64>,
    pub salt: Option<f64>,
    pub temperature_c: Option<f64>,
    pub tds: Option<f64>,
}

impl WaterReadings {
    pub fn is_empty(&self) -> bool {
        *self == WaterReadings::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("at least one reading is required"));
        }
        validation::in_range("ph", self.ph, 0.0, 14.0)?;
        validation::non_negative("free_chlorine", self.free_chlorine)?;
        validation::non_negative("total_chlorine", self.total_chlorine)?;
        validation::non_negative("total_alkalinity", self.total_alkalinity)?;
        validation::non_negative("calcium_hardness", self.calcium_hardness)?;
        validation::non_negative("cyanuric_acid", self.cyanuric_acid)?;
        validation::non_negative("salt", self.salt)?;
        validation::non_negative("tds", self.tds)?;
        validation::in_range("temperature_c", self.temperature_c, -5.0, 60.0)?;
        match (self.free_chlorine, self.total_chlorine) {
            (Some(free), Some(total)) if free > total => Err(ValidationError::new(
                "free_chlorine cannot exceed total_chlorine",
            )),
            _ => Ok(()),
        }
    }

    /// Combined chlorine (chloramines): total minus free.
    pub fn combined_chlorine(&self) -> Option<f64> {
        match (self.free_chlorine, self.total_chlorine) {
            (Some(free), Some(total)) => Some((total - free).max(0.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WaterTest {
    pub id: Uuid,
    pub service_id: Uuid,
    pub tested_at: DateTime<Utc>,
    #[serde(flatten)]
    #[ts(flatten)]
    #[sqlx(flatten)]
    pub readings: WaterReadings,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateWaterTest {
    pub tested_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[ts(flatten)]
    pub readings: WaterReadings,
    pub notes: Option<String>,
}

impl CreateWaterTest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.readings.validate()
    }
}

const SELECT_FOR_COMPANY: &str = r#"SELECT wt.*
   FROM water_tests wt
   JOIN services s ON s.id = wt.service_id
   JOIN units u ON u.id = s.unit_id
   JOIN properties p ON p.id = u.property_id"#;

impl WaterTest {
    /// Tests recorded during a service, newest first.
    pub async fn find_by_service(
        pool: &SqlitePool,
        service_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaterTest>(
            "SELECT * FROM water_tests WHERE service_id = $1 ORDER BY tested_at DESC, created_at DESC",
        )
        .bind(service_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_latest_by_service(
        pool: &SqlitePool,
        service_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaterTest>(
            r#"SELECT * FROM water_tests
               WHERE service_id = $1
               ORDER BY tested_at DESC, created_at DESC
               LIMIT 1"#,
        )
        .bind(service_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{SELECT_FOR_COMPANY} WHERE wt.id = $1 AND p.company_id = $2");
        sqlx::query_as::<_, WaterTest>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Recent tests for one unit across services, newest first.
    pub async fn find_recent_by_unit(
        pool: &SqlitePool,
        unit_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaterTest>(
            r#"SELECT wt.*
               FROM water_tests wt
               JOIN services s ON s.id = wt.service_id
               WHERE s.unit_id = $1
               ORDER BY wt.tested_at DESC
               LIMIT $2"#,
        )
        .bind(unit_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        service_id: Uuid,
        data: &CreateWaterTest,
    ) -> Result<Self, sqlx::Error> {
        let r = &data.readings;
        sqlx::query_as::<_, WaterTest>(
            r#"INSERT INTO water_tests (id, service_id, tested_at, ph, free_chlorine, total_chlorine,
                   total_alkalinity, calcium_hardness, cyanuric_acid, salt, temperature_c, tds, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(service_id)
        .bind(data.tested_at.unwrap_or_else(Utc::now))
        .bind(r.ph)
        .bind(r.free_chlorine)
        .bind(r.total_chlorine)
        .bind(r.total_alkalinity)
        .bind(r.calcium_hardness)
        .bind(r.cyanuric_acid)
        .bind(r.salt)
        .bind(r.temperature_c)
        .bind(r.tds)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM water_tests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::test_support;

    fn reading(ph: f64, free: f64) -> WaterReadings {
        WaterReadings {
            ph: Some(ph),
            free_chlorine: Some(free),
            ..Default::default()
        }
    }

    #[test]
    fn validation_rules() {
        assert!(WaterReadings::default().validate().is_err());
        assert!(reading(7.4, 2.0).validate().is_ok());
        assert!(reading(15.0, 2.0).validate().is_err());
        assert!(reading(7.4, -0.5).validate().is_err());

        let inverted = WaterReadings {
            free_chlorine: Some(3.0),
            total_chlorine: Some(2.0),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn combined_chlorine_never_negative() {
        let r = WaterReadings {
            free_chlorine: Some(2.0),
            total_chlorine: Some(2.5),
            ..Default::default()
        };
        assert_eq!(r.combined_chlorine(), Some(0.5));
        assert_eq!(reading(7.2, 1.0).combined_chlorine(), None);
    }

    #[tokio::test]
    async fn latest_test_wins_and_chain_is_enforced() {
        let fx = test_support::fixture().await;
        let early = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        for (at, ph) in [(late, 7.6), (early, 7.1)] {
            WaterTest::create(
                &fx.db.pool,
                fx.service.id,
                &CreateWaterTest {
                    tested_at: Some(at),
                    readings: reading(ph, 2.0),
                    notes: None,
                },
            )
            .await
            .unwrap();
        }

        let latest = WaterTest::find_latest_by_service(&fx.db.pool, fx.service.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.readings.ph, Some(7.6));
        assert_eq!(latest.tested_at, late);

        let (_, other) = test_support::company(&fx.db, "x@other.test", "Other").await;
        assert!(
            WaterTest::find_by_id_for_company(&fx.db.pool, latest.id, other.id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            WaterTest::find_recent_by_unit(&fx.db.pool, fx.unit.id, 10)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn create_payload_is_flat_json() {
        let payload: CreateWaterTest =
            serde_json::from_str(r#"{"ph": 7.4, "free_chlorine": 1.5, "notes": "clear"}"#).unwrap();
        assert_eq!(payload.readings.ph, Some(7.4));
        assert_eq!(payload.tested_at, None);
    }
}
