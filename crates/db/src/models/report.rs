//! Read-only aggregates behind the reports endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use crate::validation::ValidationError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct EquipmentFailureSummary {
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub unit_name: String,
    pub property_name: String,
    pub total_failures: i64,
    pub unresolved_failures: i64,
    pub last_failure_on: Option<NaiveDate>,
}

impl EquipmentFailureSummary {
    /// One row per piece of equipment with at least one failure on or after `since`.
    pub async fn for_company(
        pool: &SqlitePool,
        company_id: Uuid,
        since: Option<NaiveDate>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EquipmentFailureSummary>(
            r#"SELECT e.id AS equipment_id,
                      e.name AS equipment_name,
                      u.name AS unit_name,
                      p.name AS property_name,
                      COUNT(f.id) AS total_failures,
                      SUM(CASE WHEN f.resolved_on IS NULL THEN 1 ELSE 0 END) AS unresolved_failures,
                      MAX(f.failed_on) AS last_failure_on
               FROM equipment_failures f
               JOIN equipment e ON e.id = f.equipment_id
               JOIN units u ON u.id = e.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE p.company_id = $1 AND ($2 IS NULL OR f.failed_on >= $2)
               GROUP BY e.id, e.name, u.name, p.name
               ORDER BY total_failures DESC, last_failure_on DESC"#,
        )
        .bind(company_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportRange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.to < self.from {
            return Err(ValidationError::new("to cannot be before from"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct StatusTotals {
    pub total: i64,
    pub scheduled: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub skipped: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TechnicianTotal {
    pub technician_id: Uuid,
    pub technician_name: String,
    pub completed: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ChemicalTotal {
    pub chemical: String,
    pub unit_of_measure: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ServiceReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub totals: StatusTotals,
    pub by_technician: Vec<TechnicianTotal>,
    pub chemicals: Vec<ChemicalTotal>,
}

const IN_RANGE: &str = "p.company_id = $1 AND s.service_date >= $2 AND s.service_date <= $3";

impl ServiceReport {
    pub async fn generate(
        pool: &SqlitePool,
        company_id: Uuid,
        range: &ReportRange,
    ) -> Result<Self, sqlx::Error> {
        let totals_sql = format!(
            r#"SELECT COUNT(*) AS total,
                      COALESCE(SUM(s.status = 'scheduled'), 0) AS scheduled,
                      COALESCE(SUM(s.status = 'in_progress'), 0) AS in_progress,
                      COALESCE(SUM(s.status = 'completed'), 0) AS completed,
                      COALESCE(SUM(s.status = 'skipped'), 0) AS skipped,
                      COALESCE(SUM(s.status = 'cancelled'), 0) AS cancelled
               FROM services s
               JOIN units u ON u.id = s.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE {IN_RANGE}"#
        );
        let totals = sqlx::query_as::<_, StatusTotals>(&totals_sql)
            .bind(company_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_one(pool)
            .await?;

        let technician_sql = format!(
            r#"SELECT pr.id AS technician_id,
                      COALESCE(pr.full_name, pr.email) AS technician_name,
                      COUNT(*) AS completed
               FROM services s
               JOIN profiles pr ON pr.id = s.technician_id
               JOIN units u ON u.id = s.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE {IN_RANGE} AND s.status = 'completed'
               GROUP BY pr.id
               ORDER BY completed DESC, technician_name"#
        );
        let by_technician = sqlx::query_as::<_, TechnicianTotal>(&technician_sql)
            .bind(company_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(pool)
            .await?;

        let chemicals_sql = format!(
            r#"SELECT ca.chemical, ca.unit_of_measure, SUM(ca.quantity) AS quantity
               FROM chemical_additions ca
               JOIN services s ON s.id = ca.service_id
               JOIN units u ON u.id = s.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE {IN_RANGE}
               GROUP BY ca.chemical, ca.unit_of_measure
               ORDER BY ca.chemical, ca.unit_of_measure"#
        );
        let chemicals = sqlx::query_as::<_, ChemicalTotal>(&chemicals_sql)
            .bind(company_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(pool)
            .await?;

        Ok(ServiceReport {
            from: range.from,
            to: range.to,
            totals,
            by_technician,
            chemicals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            chemical_addition::{ChemicalAddition, CreateChemicalAddition},
            equipment::{Equipment, tests::pump},
            equipment_failure::{CreateEquipmentFailure, EquipmentFailure},
            service::Service,
        },
        test_support,
    };

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn inverted_range_rejected() {
        let range = ReportRange {
            from: date(3, 2),
            to: date(3, 1),
        };
        assert!(range.validate().is_err());
    }

    #[tokio::test]
    async fn failure_summary_counts_open_and_total() {
        let fx = test_support::fixture().await;
        let equipment = Equipment::create(&fx.db.pool, &pump(fx.unit.id)).await.unwrap();
        for day in [1, 15] {
            EquipmentFailure::create(
                &fx.db.pool,
                equipment.id,
                None,
                &CreateEquipmentFailure {
                    failed_on: date(2, day),
                    severity: None,
                    description: "Tripped breaker".into(),
                },
            )
            .await
            .unwrap();
        }

        let rows = EquipmentFailureSummary::for_company(&fx.db.pool, fx.company.id, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_failures, 2);
        assert_eq!(rows[0].unresolved_failures, 2);
        assert_eq!(rows[0].last_failure_on, Some(date(2, 15)));
        assert_eq!(rows[0].property_name, "Harbour View");

        let recent =
            EquipmentFailureSummary::for_company(&fx.db.pool, fx.company.id, Some(date(2, 10)))
                .await
                .unwrap();
        assert_eq!(recent[0].total_failures, 1);
    }

    #[tokio::test]
    async fn service_report_aggregates() {
        let fx = test_support::fixture().await;
        for quantity in [1.5, 2.0] {
            ChemicalAddition::create(
                &fx.db.pool,
                fx.service.id,
                &CreateChemicalAddition {
                    chemical: "Liquid chlorine".into(),
                    quantity,
                    unit_of_measure: "L".into(),
                    notes: None,
                    added_at: None,
                },
            )
            .await
            .unwrap();
        }
        Service::mark_completed(&fx.db.pool, fx.service.id, None)
            .await
            .unwrap();

        let report = ServiceReport::generate(
            &fx.db.pool,
            fx.company.id,
            &ReportRange {
                from: date(3, 1),
                to: date(3, 31),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.totals.total, 1);
        assert_eq!(report.totals.completed, 1);
        assert_eq!(report.by_technician.len(), 1);
        assert_eq!(report.by_technician[0].technician_id, fx.owner.id);
        assert_eq!(report.chemicals.len(), 1);
        assert!((report.chemicals[0].quantity - 3.5).abs() < f64::EPSILON);
    }
}
