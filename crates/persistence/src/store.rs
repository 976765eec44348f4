//! Postgres implementation of the domain store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    Attendance, Event, EventPatch, EventSummary, Feedback, ListEventsQuery, NewEvent, NewFeedback,
    NewRegistration, Registration, RegistrationStatus, RegistrationWithEvent,
};
use domain::store::{
    AttendanceStore, CampusStore, EventStore, FeedbackStore, InsertOutcome, RegistrationStore,
    StoreError, UpsertOutcome,
};
use shared::{IdentifierError, StudentId};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::entities::{AttendanceEntity, RegistrationStatusDb};
use crate::error::{
    constraint, is_transient, is_unique_violation, map_error, map_write_error,
    ATTENDANCE_PAIR_CONSTRAINT, EVENTS_PKEY_CONSTRAINT, REGISTRATION_TOKEN_CONSTRAINT,
};
use crate::metrics::record_pool_metrics;
use crate::repositories::{
    AttendanceRepository, EventRepository, FeedbackRepository, RegistrationRepository,
};
use crate::upsert::{retry_transient, UpsertStrategy};

fn corrupt_row(err: IdentifierError) -> StoreError {
    StoreError::Backend(format!("stored row failed normalization: {}", err))
}

/// Store backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    events: EventRepository,
    registrations: RegistrationRepository,
    attendance: AttendanceRepository,
    feedback: FeedbackRepository,
    strategy: UpsertStrategy,
}

impl PgStore {
    pub fn new(pool: PgPool, strategy: UpsertStrategy) -> Self {
        info!(strategy = %strategy, "Attendance upsert strategy selected");
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            feedback: FeedbackRepository::new(pool.clone()),
            pool,
            strategy,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Upsert strategy fixed at construction.
    pub fn strategy(&self) -> UpsertStrategy {
        self.strategy
    }

    async fn upsert_once(
        &self,
        event_id: &str,
        student_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(AttendanceEntity, bool), sqlx::Error> {
        match self.strategy {
            UpsertStrategy::Native => {
                let row = self.attendance.upsert(event_id, student_id, at).await?;
                Ok((row.attendance, row.inserted))
            }
            UpsertStrategy::InsertThenUpdate => {
                match self.attendance.insert(event_id, student_id, at).await {
                    Ok(row) => Ok((row, true)),
                    Err(err)
                        if is_unique_violation(&err)
                            && constraint(&err)
                                .map_or(true, |c| c == ATTENDANCE_PAIR_CONSTRAINT) =>
                    {
                        debug!(event_id, student_id, "Attendance row exists, updating");
                        self.attendance
                            .mark_again(event_id, student_id, at)
                            .await?
                            .map(|row| (row, false))
                            .ok_or(sqlx::Error::RowNotFound)
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        let entity = self.events.find_by_id(event_id).await.map_err(map_error)?;
        Ok(entity.map(Into::into))
    }

    async fn list_events(&self, query: &ListEventsQuery) -> Result<Vec<EventSummary>, StoreError> {
        let rows = self.events.list(query).await.map_err(map_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        match self.events.insert(event).await {
            Ok(entity) => Ok(entity.into()),
            Err(err)
                if is_unique_violation(&err)
                    && constraint(&err).map_or(true, |c| c == EVENTS_PKEY_CONSTRAINT) =>
            {
                Err(StoreError::DuplicateEvent(event.event_id.clone()))
            }
            Err(err) => Err(map_error(err)),
        }
    }

    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Option<Event>, StoreError> {
        let entity = self
            .events
            .update(event_id, patch)
            .await
            .map_err(map_error)?;
        Ok(entity.map(Into::into))
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, StoreError> {
        self.events.delete(event_id).await.map_err(map_error)
    }
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn count_active_registrations(&self, event_id: &str) -> Result<i64, StoreError> {
        self.registrations
            .count_active(event_id)
            .await
            .map_err(map_error)
    }

    async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<InsertOutcome, StoreError> {
        match self.registrations.insert(registration).await {
            Ok(Some(entity)) => Ok(InsertOutcome::Inserted(
                entity.into_domain().map_err(corrupt_row)?,
            )),
            Ok(None) => Ok(InsertOutcome::PairExists),
            Err(err)
                if is_unique_violation(&err)
                    && constraint(&err) == Some(REGISTRATION_TOKEN_CONSTRAINT) =>
            {
                Err(StoreError::DuplicateToken)
            }
            Err(err) => Err(map_write_error(err, &registration.event_id)),
        }
    }

    async fn find_registration(
        &self,
        event_id: &str,
        student_id: &StudentId,
    ) -> Result<Option<Registration>, StoreError> {
        self.registrations
            .find_by_pair(event_id, student_id.as_str())
            .await
            .map_err(map_error)?
            .map(|e| e.into_domain().map_err(corrupt_row))
            .transpose()
    }

    async fn find_active_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Registration>, StoreError> {
        self.registrations
            .find_active_by_token(token)
            .await
            .map_err(map_error)?
            .map(|e| e.into_domain().map_err(corrupt_row))
            .transpose()
    }

    async fn transition_registration(
        &self,
        event_id: &str,
        student_id: &StudentId,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<bool, StoreError> {
        self.registrations
            .transition(
                event_id,
                student_id.as_str(),
                RegistrationStatusDb::from(from),
                RegistrationStatusDb::from(to),
            )
            .await
            .map_err(map_error)
    }

    async fn cancel_active_registrations(&self, event_id: &str) -> Result<u64, StoreError> {
        self.registrations
            .cancel_active(event_id)
            .await
            .map_err(map_error)
    }

    async fn list_registrations_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<RegistrationWithEvent>, StoreError> {
        let rows = self
            .registrations
            .list_for_student(student_id.as_str())
            .await
            .map_err(map_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AttendanceStore for PgStore {
    async fn upsert_attendance(
        &self,
        event_id: &str,
        student_id: &StudentId,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        let student = student_id.as_str();
        let (entity, inserted) = retry_transient("upsert_attendance", is_transient, move || {
            self.upsert_once(event_id, student, at)
        })
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::EventNotFound(event_id.to_string()),
            other => map_write_error(other, event_id),
        })?;

        let attendance = entity.into_domain().map_err(corrupt_row)?;
        Ok(if inserted {
            UpsertOutcome::Created(attendance)
        } else {
            UpsertOutcome::Updated(attendance)
        })
    }

    async fn find_attendance(
        &self,
        event_id: &str,
        student_id: &StudentId,
    ) -> Result<Option<Attendance>, StoreError> {
        self.attendance
            .find_by_pair(event_id, student_id.as_str())
            .await
            .map_err(map_error)?
            .map(|e| e.into_domain().map_err(corrupt_row))
            .transpose()
    }

    async fn list_attendance(&self, event_id: &str) -> Result<Vec<Attendance>, StoreError> {
        self.attendance
            .list_for_event(event_id)
            .await
            .map_err(map_error)?
            .into_iter()
            .map(|e| e.into_domain().map_err(corrupt_row))
            .collect()
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, StoreError> {
        self.feedback
            .insert(feedback)
            .await
            .map_err(|err| map_write_error(err, &feedback.event_id))?
            .into_domain()
            .map_err(corrupt_row)
    }
}

#[async_trait]
impl CampusStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        record_pool_metrics(&self.pool);
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_error)
    }
}
