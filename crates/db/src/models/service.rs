use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceType {
    #[default]
    Scheduled,
    OneOff,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "service_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Skipped,
    Cancelled,
}

impl ServiceStatus {
    /// Completed, skipped and cancelled visits no longer count as outstanding.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            ServiceStatus::Completed | ServiceStatus::Skipped | ServiceStatus::Cancelled
        )
    }
}

/// A visit to a unit, either generated from a schedule or booked one-off.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Service {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub status: ServiceStatus,
    pub service_date: NaiveDate,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service row joined with where it happens, for list views.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ServiceWithLocation {
    #[serde(flatten)]
    #[ts(flatten)]
    #[sqlx(flatten)]
    pub service: Service,
    pub unit_name: String,
    pub property_id: Uuid,
    pub property_name: String,
}

impl std::ops::Deref for ServiceWithLocation {
    type Target = Service;
    fn deref(&self) -> &Self::Target {
        &self.service
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateService {
    pub unit_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub service_type: Option<ServiceType>,
    pub service_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateService {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub technician_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub template_id: Option<Option<Uuid>>,
    pub service_type: Option<ServiceType>,
    pub status: Option<ServiceStatus>,
    pub service_date: Option<NaiveDate>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

/// Query-string filters for service listings. All optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ServiceFilter {
    pub unit_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<ServiceStatus>,
}

impl UpdateService {
    pub fn apply(self, mut service: Service) -> Service {
        if let Some(technician_id) = self.technician_id {
            service.technician_id = technician_id;
        }
        if let Some(template_id) = self.template_id {
            service.template_id = template_id;
        }
        if let Some(service_type) = self.service_type {
            service.service_type = service_type;
        }
        if let Some(status) = self.status {
            if status == ServiceStatus::Completed && service.completed_at.is_none() {
                service.completed_at = Some(Utc::now());
            } else if status != ServiceStatus::Completed {
                service.completed_at = None;
            }
            service.status = status;
        }
        if let Some(service_date) = self.service_date {
            service.service_date = service_date;
        }
        if let Some(notes) = self.notes {
            service.notes = trim_optional(notes);
        }
        service
    }
}

const SELECT_WITH_LOCATION: &str = r#"SELECT s.*, u.name AS unit_name, p.id AS property_id, p.name AS property_name
   FROM services s
   JOIN units u ON u.id = s.unit_id
   JOIN properties p ON p.id = u.property_id"#;

impl Service {
    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
        filter: &ServiceFilter,
    ) -> Result<Vec<ServiceWithLocation>, sqlx::Error> {
        let sql = format!(
            r#"{SELECT_WITH_LOCATION}
               WHERE p.company_id = $1
                 AND ($2 IS NULL OR s.unit_id = $2)
                 AND ($3 IS NULL OR s.service_date >= $3)
                 AND ($4 IS NULL OR s.service_date <= $4)
                 AND ($5 IS NULL OR s.status = $5)
               ORDER BY s.service_date DESC, p.name COLLATE NOCASE, u.name COLLATE NOCASE"#
        );
        sqlx::query_as::<_, ServiceWithLocation>(&sql)
            .bind(company_id)
            .bind(filter.unit_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.status)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"SELECT s.*
               FROM services s
               JOIN units u ON u.id = s.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE s.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_with_location(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<ServiceWithLocation>, sqlx::Error> {
        let sql = format!("{SELECT_WITH_LOCATION} WHERE s.id = $1 AND p.company_id = $2");
        sqlx::query_as::<_, ServiceWithLocation>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateService) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"INSERT INTO services (id, unit_id, technician_id, template_id, service_type, service_date, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.unit_id)
        .bind(data.technician_id)
        .bind(data.template_id)
        .bind(data.service_type.unwrap_or_default())
        .bind(data.service_date)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, service: &Service) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"UPDATE services
               SET technician_id = $2, template_id = $3, service_type = $4, status = $5,
                   service_date = $6, notes = $7, completed_at = $8,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(service.id)
        .bind(service.technician_id)
        .bind(service.template_id)
        .bind(service.service_type)
        .bind(service.status)
        .bind(service.service_date)
        .bind(&service.notes)
        .bind(service.completed_at)
        .fetch_one(pool)
        .await
    }

    /// Marks the visit completed, keeping an earlier completion time if set.
    pub async fn mark_completed(
        pool: &SqlitePool,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"UPDATE services
               SET status = 'completed',
                   completed_at = COALESCE(completed_at, $2),
                   notes = COALESCE($3, notes),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(Utc::now())
        .bind(trim_optional(notes))
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
