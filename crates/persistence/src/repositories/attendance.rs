//! Attendance repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::{AttendanceEntity, UpsertedAttendanceEntity};
use crate::metrics::QueryTimer;

/// Repository for attendance database operations.
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert-or-update in one statement.
    ///
    /// `xmax = 0` holds only for a tuple this statement inserted, which tells
    /// a first mark from a re-mark.
    pub async fn upsert(
        &self,
        event_id: &str,
        student_id: &str,
        at: DateTime<Utc>,
    ) -> Result<UpsertedAttendanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_attendance");
        let result = sqlx::query_as::<_, UpsertedAttendanceEntity>(
            r#"
            INSERT INTO attendance (event_id, student_id, present, attended_at)
            VALUES ($1, $2, TRUE, $3)
            ON CONFLICT ON CONSTRAINT attendance_event_student_key DO UPDATE SET
                attended_at = EXCLUDED.attended_at,
                present = TRUE
            RETURNING att_id, event_id, student_id, present, attended_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(event_id)
        .bind(student_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Plain insert; a second mark for the pair fails with a unique violation.
    pub async fn insert(
        &self,
        event_id: &str,
        student_id: &str,
        at: DateTime<Utc>,
    ) -> Result<AttendanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_attendance");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            INSERT INTO attendance (event_id, student_id, present, attended_at)
            VALUES ($1, $2, TRUE, $3)
            RETURNING att_id, event_id, student_id, present, attended_at
            "#,
        )
        .bind(event_id)
        .bind(student_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Re-mark an existing row as present at `at`.
    pub async fn mark_again(
        &self,
        event_id: &str,
        student_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_attendance");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            UPDATE attendance SET attended_at = $3, present = TRUE
            WHERE event_id = $1 AND student_id = $2
            RETURNING att_id, event_id, student_id, present, attended_at
            "#,
        )
        .bind(event_id)
        .bind(student_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_pair(
        &self,
        event_id: &str,
        student_id: &str,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_attendance");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            SELECT att_id, event_id, student_id, present, attended_at
            FROM attendance
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

    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_attendance");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            SELECT att_id, event_id, student_id, present, attended_at
            FROM attendance
            WHERE event_id = $1
            ORDER BY attended_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
