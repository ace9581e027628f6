//! # Appointment Repository
//!
//! Bookings for service businesses. Kept thin: CRUD plus a day-range
//! listing for the booking screen.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use corner_core::{Appointment, AppointmentStatus};

const SELECT_COLUMNS: &str =
    "id, customer_id, staff_id, service, status, starts_at, ends_at, notes, created_at";

/// Repository for appointment database operations.
#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

impl AppointmentRepository {
    /// Creates a new AppointmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    /// Books a new appointment.
    pub async fn insert(&self, appt: &Appointment) -> DbResult<()> {
        debug!(id = %appt.id, service = %appt.service, "Booking appointment");

        sqlx::query(
            "INSERT INTO appointments (\
                id, customer_id, staff_id, service, status, starts_at, \
                ends_at, notes, created_at\
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&appt.id)
        .bind(&appt.customer_id)
        .bind(&appt.staff_id)
        .bind(&appt.service)
        .bind(appt.status)
        .bind(appt.starts_at)
        .bind(appt.ends_at)
        .bind(&appt.notes)
        .bind(appt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an appointment by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Appointment>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM appointments WHERE id = ?1");
        let appt = sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(appt)
    }

    /// Lists appointments starting within [from, to), ordered by start time.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM appointments \
             WHERE starts_at >= ?1 AND starts_at < ?2 \
             ORDER BY starts_at ASC"
        );
        let appts = sqlx::query_as::<_, Appointment>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(appts)
    }

    /// Moves an appointment through its lifecycle (completed, cancelled,
    /// no-show).
    pub async fn set_status(&self, id: &str, status: AppointmentStatus) -> DbResult<()> {
        debug!(id = %id, ?status, "Updating appointment status");

        let result = sqlx::query("UPDATE appointments SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use corner_core::Customer;
    use uuid::Uuid;

    async fn seed_customer(db: &Database) -> String {
        let c = Customer {
            id: Uuid::new_v4().to_string(),
            name: "Alice".to_string(),
            email: None,
            phone: None,
            balance_cents: 0,
            loyalty_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.customers().insert(&c).await.unwrap();
        c.id
    }

    fn appt(customer_id: &str, starts: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            staff_id: "staff-1".to_string(),
            service: "Cut & blow dry".to_string(),
            status: AppointmentStatus::Booked,
            starts_at: starts,
            ends_at: starts + Duration::minutes(45),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_book_and_list_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer_id = seed_customer(&db).await;
        let repo = db.appointments();

        let today = Utc::now();
        repo.insert(&appt(&customer_id, today)).await.unwrap();
        repo.insert(&appt(&customer_id, today + Duration::days(2)))
            .await
            .unwrap();

        let listed = repo
            .list_between(today - Duration::hours(1), today + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].service, "Cut & blow dry");
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer_id = seed_customer(&db).await;
        let repo = db.appointments();

        let a = appt(&customer_id, Utc::now());
        repo.insert(&a).await.unwrap();

        repo.set_status(&a.id, AppointmentStatus::Completed)
            .await
            .unwrap();
        let loaded = repo.get(&a.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Completed);

        let err = repo
            .set_status("missing", AppointmentStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
