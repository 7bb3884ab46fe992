use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::ValidationError;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "rule_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RuleFrequency {
    Daily,
    #[default]
    Weekly,
    Fortnightly,
    Monthly,
}

/// Recurring service plan for a property (optionally narrowed to one unit).
/// `days_of_week` uses 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct SchedulingRule {
    pub id: Uuid,
    pub property_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub frequency: RuleFrequency,
    #[ts(type = "number[]")]
    pub days_of_week: Json<Vec<u8>>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSchedulingRule {
    pub unit_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub frequency: Option<RuleFrequency>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateSchedulingRule {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub unit_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub template_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub technician_id: Option<Option<Uuid>>,
    pub frequency: Option<RuleFrequency>,
    pub days_of_week: Option<Vec<u8>>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

fn check_rule(
    days_of_week: &[u8],
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if days_of_week.iter().any(|d| *d > 6) {
        return Err(ValidationError::new(
            "days_of_week entries must be between 0 and 6",
        ));
    }
    match end_date {
        Some(end) if end < start_date => Err(ValidationError::new(
            "end_date cannot be before start_date",
        )),
        _ => Ok(()),
    }
}

fn normalize_days(mut days: Vec<u8>) -> Vec<u8> {
    days.sort_unstable();
    days.dedup();
    days
}

impl CreateSchedulingRule {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_rule(&self.days_of_week, self.start_date, self.end_date)
    }
}

impl UpdateSchedulingRule {
    pub fn apply(self, mut rule: SchedulingRule) -> SchedulingRule {
        if let Some(unit_id) = self.unit_id {
            rule.unit_id = unit_id;
        }
        if let Some(template_id) = self.template_id {
            rule.template_id = template_id;
        }
        if let Some(technician_id) = self.technician_id {
            rule.technician_id = technician_id;
        }
        if let Some(frequency) = self.frequency {
            rule.frequency = frequency;
        }
        if let Some(days) = self.days_of_week {
            rule.days_of_week = Json(normalize_days(days));
        }
        if let Some(start_date) = self.start_date {
            rule.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            rule.end_date = end_date;
        }
        if let Some(is_active) = self.is_active {
            rule.is_active = is_active;
        }
        if let Some(notes) = self.notes {
            rule.notes = trim_optional(notes);
        }
        rule
    }
}

impl SchedulingRule {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_rule(&self.days_of_week.0, self.start_date, self.end_date)
    }

    pub async fn find_by_property(
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SchedulingRule>(
            r#"SELECT * FROM property_scheduling_rules
               WHERE property_id = $1
               ORDER BY is_active DESC, start_date"#,
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
        sqlx::query_as::<_, SchedulingRule>(
            r#"SELECT r.*
               FROM property_scheduling_rules r
               JOIN properties p ON p.id = r.property_id
               WHERE r.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        property_id: Uuid,
        data: &CreateSchedulingRule,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SchedulingRule>(
            r#"INSERT INTO property_scheduling_rules
                   (id, property_id, unit_id, template_id, technician_id, frequency, days_of_week,
                    start_date, end_date, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(data.unit_id)
        .bind(data.template_id)
        .bind(data.technician_id)
        .bind(data.frequency.unwrap_or_default())
        .bind(Json(normalize_days(data.days_of_week.clone())))
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, rule: &SchedulingRule) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SchedulingRule>(
            r#"UPDATE property_scheduling_rules
               SET unit_id = $2, template_id = $3, technician_id = $4, frequency = $5,
                   days_of_week = $6, start_date = $7, end_date = $8, is_active = $9, notes = $10,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(rule.id)
        .bind(rule.unit_id)
        .bind(rule.template_id)
        .bind(rule.technician_id)
        .bind(rule.frequency)
        .bind(&rule.days_of_week)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.is_active)
        .bind(&rule.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM property_scheduling_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly(days: Vec<u8>) -> CreateSchedulingRule {
        CreateSchedulingRule {
            unit_id: None,
            template_id: None,
            technician_id: None,
            frequency: None,
            days_of_week: days,
            start_date: date(2025, 1, 6),
            end_date: None,
            notes: None,
        }
    }

    #[test]
    fn day_and_date_bounds() {
        assert!(weekly(vec![1, 4]).validate().is_ok());
        assert!(weekly(vec![7]).validate().is_err());

        let mut backwards = weekly(vec![1]);
        backwards.end_date = Some(date(2024, 12, 31));
        assert!(backwards.validate().is_err());
    }

    #[tokio::test]
    async fn days_are_stored_sorted_and_unique() {
        let fx = test_support::fixture().await;
        let rule = SchedulingRule::create(&fx.db.pool, fx.property.id, &weekly(vec![5, 1, 5]))
            .await
            .unwrap();
        assert_eq!(rule.days_of_week.0, vec![1, 5]);
        assert_eq!(rule.frequency, RuleFrequency::Weekly);
        assert!(rule.is_active);

        let paused = UpdateSchedulingRule {
            is_active: Some(false),
            end_date: Some(Some(date(2025, 6, 30))),
            ..Default::default()
        }
        .apply(rule);
        let saved = SchedulingRule::update(&fx.db.pool, &paused).await.unwrap();
        assert!(!saved.is_active);
        assert_eq!(saved.end_date, Some(date(2025, 6, 30)));
    }
}
