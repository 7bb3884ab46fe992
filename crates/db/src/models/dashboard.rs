use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Headline counts for a company's home screen.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct DashboardSummary {
    pub properties: i64,
    pub units: i64,
    pub customers: i64,
    pub services_today: i64,
    pub completed_today: i64,
    pub overdue_services: i64,
    pub open_failures: i64,
    pub open_jobs: i64,
    pub pending_invitations: i64,
    pub upcoming_checkouts: i64,
}

impl DashboardSummary {
    pub async fn get(
        pool: &SqlitePool,
        company_id: Uuid,
        today: NaiveDate,
    ) -> Result<Self, sqlx::Error> {
        let week_end = today + Duration::days(7);
        sqlx::query_as::<_, DashboardSummary>(
            r#"WITH company_services AS (
                   SELECT s.status, s.service_date
                   FROM services s
                   JOIN units u ON u.id = s.unit_id
                   JOIN properties p ON p.id = u.property_id
                   WHERE p.company_id = $1
               )
               SELECT
                   (SELECT COUNT(*) FROM properties WHERE company_id = $1) AS properties,
                   (SELECT COUNT(*) FROM units u JOIN properties p ON p.id = u.property_id
                     WHERE p.company_id = $1) AS units,
                   (SELECT COUNT(*) FROM customers WHERE company_id = $1) AS customers,
                   (SELECT COUNT(*) FROM company_services WHERE service_date = $2) AS services_today,
                   (SELECT COUNT(*) FROM company_services
                     WHERE service_date = $2 AND status = 'completed') AS completed_today,
                   (SELECT COUNT(*) FROM company_services
                     WHERE service_date < $2
                       AND status NOT IN ('completed', 'skipped', 'cancelled')) AS overdue_services,
                   (SELECT COUNT(*) FROM equipment_failures f
                     JOIN equipment e ON e.id = f.equipment_id
                     JOIN units u ON u.id = e.unit_id
                     JOIN properties p ON p.id = u.property_id
                     WHERE p.company_id = $1 AND f.resolved_on IS NULL) AS open_failures,
                   (SELECT COUNT(*) FROM jobs
                     WHERE company_id = $1 AND status IN ('open', 'in_progress')) AS open_jobs,
                   (SELECT COUNT(*) FROM team_invitations
                     WHERE company_id = $1 AND status = 'pending') AS pending_invitations,
                   (SELECT COUNT(*) FROM bookings b JOIN properties p ON p.id = b.property_id
                     WHERE p.company_id = $1 AND b.status = 'confirmed'
                       AND b.check_out >= $2 AND b.check_out <= $3) AS upcoming_checkouts"#,
        )
        .bind(company_id)
        .bind(today)
        .bind(week_end)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            booking::{Booking, CreateBooking},
            service::{CreateService, Service},
        },
        test_support,
    };

    #[tokio::test]
    async fn counts_are_scoped_and_dated() {
        let fx = test_support::fixture().await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        Service::create(
            &fx.db.pool,
            &CreateService {
                unit_id: fx.unit.id,
                technician_id: None,
                template_id: None,
                service_type: None,
                service_date: today,
                notes: None,
            },
        )
        .await
        .unwrap();
        Booking::create(
            &fx.db.pool,
            &CreateBooking {
                property_id: fx.property.id,
                guest_name: "Guest".into(),
                check_in: today,
                check_out: today + Duration::days(3),
                guests: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let summary = DashboardSummary::get(&fx.db.pool, fx.company.id, today)
            .await
            .unwrap();
        assert_eq!(summary.properties, 1);
        assert_eq!(summary.units, 1);
        assert_eq!(summary.services_today, 1);
        assert_eq!(summary.completed_today, 0);
        // Fixture service on 2025-03-10 is still scheduled.
        assert_eq!(summary.overdue_services, 1);
        assert_eq!(summary.upcoming_checkouts, 1);

        let (_, other) = test_support::company(&fx.db, "x@other.test", "Other").await;
        let empty = DashboardSummary::get(&fx.db.pool, other.id, today).await.unwrap();
        assert_eq!(empty, DashboardSummary::default());
    }
}
