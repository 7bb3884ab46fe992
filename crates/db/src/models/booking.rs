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
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
    Completed,
}

/// Guest stay at a holiday-let property; drives pre-arrival and changeover services.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: Option<i32>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateBooking {
    pub property_id: Uuid,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateBooking {
    pub guest_name: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "number | null")]
    pub guests: Option<Option<i32>>,
    pub status: Option<BookingStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[ts(type = "string | null")]
    pub notes: Option<Option<String>>,
}

/// Bookings overlapping `[from, to]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct BookingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn check_stay(
    guest_name: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: Option<i32>,
) -> Result<(), ValidationError> {
    validation::required("guest_name", guest_name)?;
    if check_out < check_in {
        return Err(ValidationError::new("check_out cannot be before check_in"));
    }
    match guests {
        Some(g) if g < 0 => Err(ValidationError::new("guests cannot be negative")),
        _ => Ok(()),
    }
}

impl CreateBooking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_stay(&self.guest_name, self.check_in, self.check_out, self.guests)
    }
}

impl UpdateBooking {
    pub fn apply(self, mut booking: Booking) -> Booking {
        if let Some(guest_name) = self.guest_name {
            booking.guest_name = guest_name.trim().to_string();
        }
        if let Some(check_in) = self.check_in {
            booking.check_in = check_in;
        }
        if let Some(check_out) = self.check_out {
            booking.check_out = check_out;
        }
        if let Some(guests) = self.guests {
            booking.guests = guests;
        }
        if let Some(status) = self.status {
            booking.status = status;
        }
        if let Some(notes) = self.notes {
            booking.notes = trim_optional(notes);
        }
        booking
    }
}

impl Booking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_stay(&self.guest_name, self.check_in, self.check_out, self.guests)
    }

    pub async fn find_by_company(
        pool: &SqlitePool,
        company_id: Uuid,
        filter: &BookingFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"SELECT b.*
               FROM bookings b
               JOIN properties p ON p.id = b.property_id
               WHERE p.company_id = $1
                 AND ($2 IS NULL OR b.check_out >= $2)
                 AND ($3 IS NULL OR b.check_in <= $3)
               ORDER BY b.check_in, p.name COLLATE NOCASE"#,
        )
        .bind(company_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_property(
        pool: &SqlitePool,
        property_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE property_id = $1 ORDER BY check_in",
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
        sqlx::query_as::<_, Booking>(
            r#"SELECT b.*
               FROM bookings b
               JOIN properties p ON p.id = b.property_id
               WHERE b.id = $1 AND p.company_id = $2"#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateBooking) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"INSERT INTO bookings (id, property_id, guest_name, check_in, check_out, guests, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.property_id)
        .bind(data.guest_name.trim())
        .bind(data.check_in)
        .bind(data.check_out)
        .bind(data.guests)
        .bind(trim_optional(data.notes.clone()))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, booking: &Booking) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"UPDATE bookings
               SET guest_name = $2, check_in = $3, check_out = $4, guests = $5, status = $6,
                   notes = $7, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(booking.id)
        .bind(&booking.guest_name)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.guests)
        .bind(booking.status)
        .bind(&booking.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
