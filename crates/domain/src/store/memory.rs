//! In-process store used by tests and local development.
//!
//! All tables live behind one lock, so every trait method is a single
//! critical section and the uniqueness rules hold under concurrent callers
//! the same way the database constraints do.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::StudentId;
use tokio::sync::RwLock;

use super::{
    AttendanceStore, CampusStore, EventStore, FeedbackStore, InsertOutcome, RegistrationStore,
    StoreError, UpsertOutcome,
};
use crate::models::{
    Attendance, Event, EventPatch, EventSummary, Feedback, ListEventsQuery, NewEvent, NewFeedback,
    NewRegistration, Registration, RegistrationStatus, RegistrationWithEvent,
};

type PairKey = (String, String);

fn pair_key(event_id: &str, student_id: &StudentId) -> PairKey {
    (event_id.to_string(), student_id.as_str().to_string())
}

#[derive(Default)]
struct Tables {
    events: HashMap<String, Event>,
    registrations: HashMap<PairKey, Registration>,
    tokens: HashMap<String, PairKey>,
    attendance: HashMap<PairKey, Attendance>,
    feedback: Vec<Feedback>,
    next_reg_id: i64,
    next_att_id: i64,
    next_fb_id: i64,
}

impl Tables {
    fn active_count(&self, event_id: &str) -> i64 {
        self.registrations
            .values()
            .filter(|r| r.event_id == event_id && r.status.is_active())
            .count() as i64
    }
}

/// Thread-safe in-memory implementation of [`CampusStore`].
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registration rows in any status.
    pub async fn registration_rows(&self) -> usize {
        self.tables.read().await.registrations.len()
    }

    /// Number of attendance rows.
    pub async fn attendance_rows(&self) -> usize {
        self.tables.read().await.attendance.len()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.read().await.events.get(event_id).cloned())
    }

    async fn list_events(&self, query: &ListEventsQuery) -> Result<Vec<EventSummary>, StoreError> {
        let tables = self.tables.read().await;
        let mut events: Vec<EventSummary> = tables
            .events
            .values()
            .filter(|e| query.matches(e))
            .map(|e| EventSummary {
                event: e.clone(),
                registered_count: tables.active_count(&e.event_id),
            })
            .collect();
        events.sort_by(|a, b| {
            a.event
                .starts_at
                .cmp(&b.event.starts_at)
                .then_with(|| a.event.event_id.cmp(&b.event.event_id))
        });
        Ok(events)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&event.event_id) {
            return Err(StoreError::DuplicateEvent(event.event_id.clone()));
        }

        let row = Event {
            event_id: event.event_id.clone(),
            title: event.title.clone(),
            event_type: event.event_type.clone(),
            description: event.description.clone(),
            starts_at: event.starts_at,
            capacity: event.capacity,
            college_id: event.college_id.clone(),
            cancelled: event.cancelled,
            features: event.features.clone(),
            created_at: event.created_at,
        };
        tables.events.insert(row.event_id.clone(), row.clone());
        Ok(row)
    }

    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.get_mut(event_id).map(|event| {
            patch.apply_to(event);
            event.clone()
        }))
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.events.remove(event_id).is_none() {
            return Ok(false);
        }

        tables.registrations.retain(|(e, _), _| e != event_id);
        tables.tokens.retain(|_, (e, _)| e != event_id);
        tables.attendance.retain(|(e, _), _| e != event_id);
        tables.feedback.retain(|f| f.event_id != event_id);
        Ok(true)
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn count_active_registrations(&self, event_id: &str) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.active_count(event_id))
    }

    async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&registration.event_id) {
            return Err(StoreError::EventNotFound(registration.event_id.clone()));
        }

        let key = pair_key(&registration.event_id, &registration.student_id);
        if tables.registrations.contains_key(&key) {
            return Ok(InsertOutcome::PairExists);
        }
        if tables.tokens.contains_key(&registration.token) {
            return Err(StoreError::DuplicateToken);
        }

        tables.next_reg_id += 1;
        let row = Registration {
            reg_id: tables.next_reg_id,
            event_id: registration.event_id.clone(),
            student_id: registration.student_id.clone(),
            token: registration.token.clone(),
            status: RegistrationStatus::Registered,
            registered_at: registration.registered_at,
        };
        tables.tokens.insert(row.token.clone(), key.clone());
        tables.registrations.insert(key, row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn find_registration(
        &self,
        event_id: &str,
        student_id: &StudentId,
    ) -> Result<Option<Registration>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .get(&pair_key(event_id, student_id))
            .cloned())
    }

    async fn find_active_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(token)
            .and_then(|key| tables.registrations.get(key))
            .filter(|r| r.status.is_active())
            .cloned())
    }

    async fn transition_registration(
        &self,
        event_id: &str,
        student_id: &StudentId,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.registrations.get_mut(&pair_key(event_id, student_id)) {
            Some(row) if row.status == from => {
                row.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_active_registrations(&self, event_id: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let mut moved = 0;
        for row in tables
            .registrations
            .values_mut()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Registered)
        {
            row.status = RegistrationStatus::Cancelled;
            moved += 1;
        }
        Ok(moved)
    }

    async fn list_registrations_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<RegistrationWithEvent>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<RegistrationWithEvent> = tables
            .registrations
            .values()
            .filter(|r| r.student_id == *student_id)
            .map(|r| {
                let event = tables.events.get(&r.event_id);
                RegistrationWithEvent {
                    reg_id: r.reg_id,
                    event_id: r.event_id.clone(),
                    token: r.token.clone(),
                    status: r.status,
                    registered_at: r.registered_at,
                    event_title: event.map(|e| e.title.clone()),
                    event_starts_at: event.map(|e| e.starts_at),
                    event_type: event.map(|e| e.event_type.clone()),
                    event_description: event.map(|e| e.description.clone()),
                    event_capacity: event.and_then(|e| e.capacity),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.registered_at
                .cmp(&a.registered_at)
                .then_with(|| b.reg_id.cmp(&a.reg_id))
        });
        Ok(rows)
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn upsert_attendance(
        &self,
        event_id: &str,
        student_id: &StudentId,
        at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(event_id) {
            return Err(StoreError::EventNotFound(event_id.to_string()));
        }

        let key = pair_key(event_id, student_id);
        if let Some(row) = tables.attendance.get_mut(&key) {
            row.present = true;
            row.attended_at = at;
            return Ok(UpsertOutcome::Updated(row.clone()));
        }

        tables.next_att_id += 1;
        let row = Attendance {
            att_id: tables.next_att_id,
            event_id: event_id.to_string(),
            student_id: student_id.clone(),
            present: true,
            attended_at: at,
        };
        tables.attendance.insert(key, row.clone());
        Ok(UpsertOutcome::Created(row))
    }

    async fn find_attendance(
        &self,
        event_id: &str,
        student_id: &StudentId,
    ) -> Result<Option<Attendance>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.attendance.get(&pair_key(event_id, student_id)).cloned())
    }

    async fn list_attendance(&self, event_id: &str) -> Result<Vec<Attendance>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Attendance> = tables
            .attendance
            .values()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.attended_at.cmp(&a.attended_at));
        Ok(rows)
    }
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&feedback.event_id) {
            return Err(StoreError::EventNotFound(feedback.event_id.clone()));
        }

        tables.next_fb_id += 1;
        let row = Feedback {
            fb_id: tables.next_fb_id,
            event_id: feedback.event_id.clone(),
            student_id: feedback.student_id.clone(),
            rating: feedback.rating,
            comment: feedback.comment.clone(),
            submitted_at: feedback.submitted_at,
        };
        tables.feedback.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl CampusStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::normalize_student_id;
    use std::sync::Arc;

    fn new_event(event_id: &str) -> NewEvent {
        NewEvent {
            event_id: event_id.to_string(),
            title: "Robotics Demo".to_string(),
            event_type: "demo".to_string(),
            description: String::new(),
            starts_at: Utc::now() + Duration::days(3),
            capacity: None,
            college_id: "c1".to_string(),
            cancelled: false,
            features: vec![],
            created_at: Utc::now(),
        }
    }

    fn new_registration(event_id: &str, student: &str, token: &str) -> NewRegistration {
        NewRegistration {
            event_id: event_id.to_string(),
            student_id: normalize_student_id(student).unwrap(),
            token: token.to_string(),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_registration_pair_unique() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();

        let first = store
            .insert_registration(&new_registration("ev1", "s1", "tok-a"))
            .await
            .unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(_)));

        let second = store
            .insert_registration(&new_registration("ev1", "s1", "tok-b"))
            .await
            .unwrap();
        assert_eq!(second, InsertOutcome::PairExists);
        assert_eq!(store.registration_rows().await, 1);
    }

    #[tokio::test]
    async fn test_insert_registration_token_unique() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();
        store
            .insert_registration(&new_registration("ev1", "s1", "tok"))
            .await
            .unwrap();

        let err = store
            .insert_registration(&new_registration("ev1", "s2", "tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateToken));
    }

    #[tokio::test]
    async fn test_insert_registration_requires_event() {
        let store = InMemoryStore::new();
        let err = store
            .insert_registration(&new_registration("missing", "s1", "tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn test_token_lookup_only_active() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();
        store
            .insert_registration(&new_registration("ev1", "s1", "tok"))
            .await
            .unwrap();
        assert!(store.find_active_by_token("tok").await.unwrap().is_some());

        let student = normalize_student_id("s1").unwrap();
        let moved = store
            .transition_registration(
                "ev1",
                &student,
                RegistrationStatus::Registered,
                RegistrationStatus::Cancelled,
            )
            .await
            .unwrap();
        assert!(moved);
        assert!(store.find_active_by_token("tok").await.unwrap().is_none());
        assert_eq!(store.count_active_registrations("ev1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_attendance_single_row() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();
        let student = normalize_student_id("s1").unwrap();
        let t1 = Utc::now();
        let t2 = t1 + Duration::minutes(5);

        let UpsertOutcome::Created(first) =
            store.upsert_attendance("ev1", &student, t1).await.unwrap()
        else {
            panic!("first mark should create the row");
        };
        let UpsertOutcome::Updated(second) =
            store.upsert_attendance("ev1", &student, t2).await.unwrap()
        else {
            panic!("second mark should update the row");
        };

        assert_eq!(second.att_id, first.att_id);
        assert_eq!(second.attended_at, t2);
        assert_eq!(store.attendance_rows().await, 1);
    }

    #[tokio::test]
    async fn test_delete_event_cascades() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();
        store
            .insert_registration(&new_registration("ev1", "s1", "tok"))
            .await
            .unwrap();
        let student = normalize_student_id("s1").unwrap();
        store
            .upsert_attendance("ev1", &student, Utc::now())
            .await
            .unwrap();

        assert!(store.delete_event("ev1").await.unwrap());
        assert!(!store.delete_event("ev1").await.unwrap());
        assert_eq!(store.registration_rows().await, 0);
        assert_eq!(store.attendance_rows().await, 0);
        assert!(store.find_active_by_token("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_one_row() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_event(&new_event("ev1")).await.unwrap();
        let student = normalize_student_id("s1").unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let student = student.clone();
            handles.push(tokio::spawn(async move {
                store.upsert_attendance("ev1", &student, Utc::now()).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if let UpsertOutcome::Created(_) = handle.await.unwrap().unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.attendance_rows().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_active_registrations_scoped_to_event() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();
        store.insert_event(&new_event("ev2")).await.unwrap();
        for (event, student, token) in [("ev1", "s1", "t1"), ("ev1", "s2", "t2"), ("ev2", "s1", "t3")] {
            store
                .insert_registration(&new_registration(event, student, token))
                .await
                .unwrap();
        }
        let s2 = normalize_student_id("s2").unwrap();
        store
            .transition_registration(
                "ev1",
                &s2,
                RegistrationStatus::Registered,
                RegistrationStatus::Withdrawn,
            )
            .await
            .unwrap();

        assert_eq!(store.cancel_active_registrations("ev1").await.unwrap(), 1);
        assert_eq!(store.count_active_registrations("ev1").await.unwrap(), 0);
        assert_eq!(store.count_active_registrations("ev2").await.unwrap(), 1);

        let withdrawn = store.find_registration("ev1", &s2).await.unwrap().unwrap();
        assert_eq!(withdrawn.status, RegistrationStatus::Withdrawn);
        assert!(store.find_active_by_token("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_events_counts_active_only() {
        let store = InMemoryStore::new();
        store.insert_event(&new_event("ev1")).await.unwrap();
        store
            .insert_registration(&new_registration("ev1", "s1", "t1"))
            .await
            .unwrap();
        store
            .insert_registration(&new_registration("ev1", "s2", "t2"))
            .await
            .unwrap();
        let s2 = normalize_student_id("s2").unwrap();
        store
            .transition_registration(
                "ev1",
                &s2,
                RegistrationStatus::Registered,
                RegistrationStatus::Withdrawn,
            )
            .await
            .unwrap();

        let events = store.list_events(&ListEventsQuery::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].registered_count, 1);
    }
}
