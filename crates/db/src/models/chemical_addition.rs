use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::text::trim_optional;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

/// Chemical dosed into a unit during a service.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ChemicalAddition {
    pub id: Uuid,
    pub service_id: Uuid,
    pub chemical: String,
    pub quantity: f64,
    pub unit_of_measure: String,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChemicalAddition {
    pub chemical: String,
    pub quantity: f64,
    pub unit_of_measure: String,
    pub notes: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

impl CreateChemicalAddition {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("chemical", &self.chemical)?;
        validation::required("unit_of_measure", &self.unit_of_measure)?;
        validation::positive("quantity", self.quantity)
    }
}

impl ChemicalAddition {
    pub async fn find_by_service(
        pool: &SqlitePool,
        service_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChemicalAddition>(
            "SELECT * FROM chemical_additions WHERE service_id = $1 ORDER BY added_at",
        )
        .bind(service_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id_for_company(
        pool: &SqlitePool,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChemicalAddition>(
            r#"SELECT ca.*
               FROM chemical_additions ca
               JOIN services s ON s.id = ca.service_id
               JOIN units u ON u.id = s.unit_id
               JOIN properties p ON p.id = u.property_id
               WHERE ca.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        service_id: Uuid,
        data: &CreateChemicalAddition,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChemicalAddition>(
            r#"INSERT INTO chemical_additions (id, service_id, chemical, quantity, unit_of_measure, notes, added_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(service_id)
        .bind(data.chemical.trim())
        .bind(data.quantity)
        .bind(data.unit_of_measure.trim())
        .bind(trim_optional(data.notes.clone()))
        .bind(data.added_at.unwrap_or_else(Utc::now))
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chemical_additions WHERE id = $1")
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

    fn chlorine(quantity: f64) -> CreateChemicalAddition {
        CreateChemicalAddition {
            chemical: "Liquid chlorine".into(),
            quantity,
            unit_of_measure: "L".into(),
            notes: None,
            added_at: None,
        }
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(chlorine(0.0).validate().is_err());
        assert!(chlorine(2.5).validate().is_ok());
    }

    #[tokio::test]
    async fn additions_follow_service_chain() {
        let fx = test_support::fixture().await;
        let added = ChemicalAddition::create(&fx.db.pool, fx.service.id, &chlorine(2.5))
            .await
            .unwrap();
        assert_eq!(
            ChemicalAddition::find_by_service(&fx.db.pool, fx.service.id)
                .await
                .unwrap()
                .len(),
            1
        );
        let (_, other) = test_support::company(&fx.db, "x@other.test", "Other").await;
        assert!(
            ChemicalAddition::find_by_id_for_company(&fx.db.pool, added.id, other.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            ChemicalAddition::find_by_id_for_company(&fx.db.pool, added.id, fx.company.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
