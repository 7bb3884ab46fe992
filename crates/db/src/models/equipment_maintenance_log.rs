use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct EquipmentMaintenanceLog {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub service_id: Option<Uuid>,
    pub performed_by: Option<Uuid>,
    pub performed_on: NaiveDate,
    pub action: String,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    pub next_due_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateEquipmentMaintenanceLog {
    pub service_id: Option<Uuid>,
    pub performed_on: NaiveDate,
    pub action: String,
    pub notes: Option<String>,
    pub cost: Option<f64>,
    pub next_due_on: Option<NaiveDate>,
}

impl CreateEquipmentMaintenanceLog {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("action", &self.action)?;
        validation::non_negative("cost", self.cost)?;
        match self.next_due_on {
            Some(due) if due < self.performed_on => Err(ValidationError::new(
                "next_due_on cannot be before performed_on",
            )),
            _ => Ok(()),
        }
    }

    /// Fills `next_due_on` from the equipment's interval when the caller left it out.
    pub fn with_default_due(mut self, interval_days: Option<i32>) -> Self {
        if self.next_due_on.is_none() {
            self.next_due_on = interval_days
                .filter(|days| *days > 0)
                .map(|days| self.performed_on + chrono::Duration::days(i64::from(days)));
        }
        self
    }
}

impl EquipmentMaintenanceLog {
    pub async fn find_by_equipment(
        pool: &SqlitePool,
        equipment_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EquipmentMaintenanceLog>(
            r#"SELECT * FROM equipment_maintenance_logs
               WHERE equipment_id = $1
               ORDER BY performed_on DESC, created_at DESC"#,
        )
        .bind(equipment_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        equipment_id: Uuid,
        performed_by: Option<Uuid>,
        data: &CreateEquipmentMaintenanceLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, EquipmentMaintenanceLog>(
            r#"INSERT INTO equipment_maintenance_logs
                   (id, equipment_id, service_id, performed_by, performed_on, action, notes, cost, next_due_on)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(equipment_id)
        .bind(data.service_id)
        .bind(performed_by)
        .bind(data.performed_on)
        .bind(data.action.trim())
        .bind(trim_optional(data.notes.clone()))
        .bind(data.cost)
        .bind(data.next_due_on)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::equipment::{Equipment, tests::pump},
        test_support,
    };

    fn backwash(performed_on: NaiveDate) -> CreateEquipmentMaintenanceLog {
        CreateEquipmentMaintenanceLog {
            service_id: None,
            performed_on,
            action: "Backwash and inspect".into(),
            notes: None,
            cost: Some(0.0),
            next_due_on: None,
        }
    }

    #[test]
    fn due_date_defaults_from_interval() {
        let on = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let log = backwash(on).with_default_due(Some(90));
        assert_eq!(log.next_due_on, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert_eq!(backwash(on).with_default_due(None).next_due_on, None);
    }

    #[tokio::test]
    async fn logs_are_listed_newest_first() {
        let fx = test_support::fixture().await;
        let equipment = Equipment::create(&fx.db.pool, &pump(fx.unit.id)).await.unwrap();
        for day in [3, 20, 11] {
            let payload = backwash(NaiveDate::from_ymd_opt(2025, 1, day).unwrap());
            EquipmentMaintenanceLog::create(&fx.db.pool, equipment.id, Some(fx.owner.id), &payload)
                .await
                .unwrap();
        }
        let logs = EquipmentMaintenanceLog::find_by_equipment(&fx.db.pool, equipment.id)
            .await
            .unwrap();
        let days: Vec<_> = logs.iter().map(|l| l.performed_on.to_string()).collect();
        assert_eq!(days, ["2025-01-20", "2025-01-11", "2025-01-03"]);
    }
}
