//! Registration repository for database operations.

use domain::models::NewRegistration;
use sqlx::PgPool;

use crate::entities::{RegistrationEntity, RegistrationStatusDb, RegistrationWithEventEntity};
use crate::metrics::QueryTimer;

/// Repository for registration database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count registrations of an event that are still active.
    pub async fn count_active(&self, event_id: &str) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_registrations");
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM registrations
            WHERE event_id = $1 AND status = 'registered'
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.0)
    }

    /// Insert a registration unless the pair already has one.
    ///
    /// Returns `None` when the pair constraint suppressed the insert. A token
    /// collision still surfaces as a unique violation.
    pub async fn insert(
        &self,
        registration: &NewRegistration,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            INSERT INTO registrations (event_id, student_id, token, status, registered_at)
            VALUES ($1, $2, $3, 'registered', $4)
            ON CONFLICT ON CONSTRAINT registrations_event_student_key DO NOTHING
            RETURNING reg_id, event_id, student_id, token, status, registered_at
            "#,
        )
        .bind(&registration.event_id)
        .bind(registration.student_id.as_str())
        .bind(&registration.token)
        .bind(registration.registered_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_pair(
        &self,
        event_id: &str,
        student_id: &str,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT reg_id, event_id, student_id, token, status, registered_at
            FROM registrations
            WHERE event_id = $1 AND student_id = $2
            "#,
        )
        .bind(event_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_active_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_token");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT reg_id, event_id, student_id, token, status, registered_at
            FROM registrations
            WHERE token = $1 AND status = 'registered'
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move the pair's registration from one status to another.
    pub async fn transition(
        &self,
        event_id: &str,
        student_id: &str,
        from: RegistrationStatusDb,
        to: RegistrationStatusDb,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("transition_registration");
        let result = sqlx::query(
            r#"
            UPDATE registrations SET status = $4
            WHERE event_id = $1 AND student_id = $2 AND status = $3
            "#,
        )
        .bind(event_id)
        .bind(student_id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Cancels every active registration of an event.
    pub async fn cancel_active(&self, event_id: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("cancel_active_registrations");
        let result = sqlx::query(
            r#"
            UPDATE registrations SET status = 'cancelled'
            WHERE event_id = $1 AND status = 'registered'
            "#,
        )
        .bind(event_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// A student's registrations with event details, newest first.
    pub async fn list_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<RegistrationWithEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations_for_student");
        let result = sqlx::query_as::<_, RegistrationWithEventEntity>(
            r#"
            SELECT r.reg_id, r.event_id, r.token, r.status, r.registered_at,
                   e.title AS event_title,
                   e.starts_at AS event_starts_at,
                   e.event_type AS event_type,
                   e.description AS event_description,
                   e.capacity AS event_capacity
            FROM registrations r
            LEFT JOIN events e ON e.event_id = r.event_id
            WHERE r.student_id = $1
            ORDER BY r.registered_at DESC, r.reg_id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
