use std::{str::FromStr, time::Duration};

use sqlx::{
    Error, Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::info;

pub mod models;
pub mod validation;

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Opens (creating if missing) the database at `database_url` and runs
    /// pending migrations.
    pub async fn connect(database_url: &str) -> Result<DBService, Error> {
        if database_url == IN_MEMORY_URL {
            return Self::new_in_memory().await;
        }
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;
        info!(database_url, "Database ready");
        Ok(DBService { pool })
    }

    /// Private in-memory database with the full schema.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn new_in_memory() -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(IN_MEMORY_URL)?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;
        Ok(DBService { pool })
    }

    async fn migrate(pool: &Pool<Sqlite>) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::DBService;
    use crate::models::{
        company::{Company, CreateCompany},
        profile::Profile,
        property::{CreateProperty, Property},
        service::{CreateService, Service},
        unit::{CreateUnit, Unit},
    };

    /// A company with one owner, one property, one pool unit and one service.
    pub struct Fixture {
        pub db: DBService,
        pub owner: Profile,
        pub company: Company,
        pub property: Property,
        pub unit: Unit,
        pub service: Service,
    }

    pub async fn company(db: &DBService, email: &str, name: &str) -> (Profile, Company) {
        let owner = Profile::find_or_create(&db.pool, Uuid::new_v4(), email)
            .await
            .unwrap();
        let company = Company::create_with_owner(
            &db.pool,
            owner.id,
            &CreateCompany {
                name: name.to_string(),
                email: None,
                phone: None,
                address: None,
                timezone: None,
            },
        )
        .await
        .unwrap();
        let owner = Profile::find_by_id(&db.pool, owner.id).await.unwrap().unwrap();
        (owner, company)
    }

    pub async fn fixture() -> Fixture {
        let db = DBService::new_in_memory().await.unwrap();
        let (owner, company) = company(&db, "owner@bluewater.test", "Bluewater Pools").await;
        let property = Property::create(
            &db.pool,
            company.id,
            &CreateProperty {
                name: "Harbour View".to_string(),
                customer_id: None,
                address: Some("1 Harbour St".to_string()),
                property_type: None,
                notes: None,
            },
        )
        .await
        .unwrap();
        let unit = Unit::create(
            &db.pool,
            property.id,
            &CreateUnit {
                name: "Main pool".to_string(),
                unit_type: None,
                water_type: None,
                volume_litres: Some(50_000.0),
                is_indoor: None,
                notes: None,
            },
        )
        .await
        .unwrap();
        let service = Service::create(
            &db.pool,
            &CreateService {
                unit_id: unit.id,
                technician_id: Some(owner.id),
                template_id: None,
                service_type: None,
                service_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                notes: None,
            },
        )
        .await
        .unwrap();
        Fixture {
            db,
            owner,
            company,
            property,
            unit,
            service,
        }
    }
}
