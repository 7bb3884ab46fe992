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
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "job_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Repair or quote work outside the regular service round.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateJob {
    pub customer_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<JobPriority>,
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateJob {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub customer_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub property_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub unit_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub assigned_to: Option<Option<Uuid>>,
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    pub status: Option<JobStatus>,
    pub priority: Option<JobPriority>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub scheduled_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
}

impl CreateJob {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("title", &self.title).map(|_| ())
    }
}

impl UpdateJob {
    pub fn apply(self, mut job: Job) -> Job {
        if let Some(customer_id) = self.customer_id {
            job.customer_id = customer_id;
        }
        if let Some(property_id) = self.property_id {
            job.property_id = property_id;
        }
        if let Some(unit_id) = self.unit_id {
            job.unit_id = unit_id;
        }
        if let Some(assigned_to) = self.assigned_to {
            job.assigned_to = assigned_to;
        }
        if let Some(title) = self.title {
            job.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            job.description = trim_optional(description);
        }
        if let Some(status) = self.status {
            match status {
                JobStatus::Completed if job.completed_at.is_none() => {
                    job.completed_at = Some(Utc::now())
                }
                JobStatus::Completed => {}
                _ => job.completed_at = None,
            }
            job.status = status;
        }
        if let Some(priority) = self.priority {
            job.priority = priority;
        }
        if let Some(scheduled_date) = self.scheduled_date {
            job.scheduled_date = scheduled_date;
        }
        job
    }
}

impl Job {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("title", &self.title).map(|_| ())
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
        filter: &JobFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"SELECT * FROM jobs
               WHERE company_id = $1 AND ($2 IS NULL OR status = $2)
               ORDER BY CASE priority
                            WHEN 'urgent' THEN 0 WHEN 'high' THEN 1
                            WHEN 'normal' THEN 2 ELSE 3
                        END,
                        scheduled_date IS NULL, scheduled_date, created_at DESC"#,
        )
        .bind(company_id)
        .bind(filter.status)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        company_id: Uuid,
        data: &CreateJob,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"INSERT INTO jobs (id, company_id, customer_id, property_id, unit_id, assigned_to,
                   title, description, priority, scheduled_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(data.customer_id)
        .bind(data.property_id)
        .bind(data.unit_id)
        .bind(data.assigned_to)
        .bind(data.title.trim())
        .bind(trim_optional(data.description.clone()))
        .bind(data.priority.unwrap_or_default())
        .bind(data.scheduled_date)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, job: &Job) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"UPDATE jobs
               SET customer_id = $3, property_id = $4, unit_id = $5, assigned_to = $6,
                   title = $7, description = $8, status = $9, priority = $10,
                   scheduled_date = $11, completed_at = $12,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND company_id = $2
               RETURNING *"#,
        )
        .bind(job.id)
        .bind(job.company_id)
        .bind(job.customer_id)
        .bind(job.property_id)
        .bind(job.unit_id)
        .bind(job.assigned_to)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.status)
        .bind(job.priority)
        .bind(job.scheduled_date)
        .bind(job.completed_at)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, company_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
