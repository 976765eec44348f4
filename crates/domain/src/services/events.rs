//! Event management.

use chrono::{DateTime, Utc};
use shared::normalize_event_id;
use tracing::info;
use validator::Validate;

use super::CoreError;
use crate::models::{CreateEventRequest, Event, EventSummary, ListEventsQuery, UpdateEventRequest};
use crate::store::{EventStore, RegistrationStore};

pub async fn create_event<S>(
    store: &S,
    request: CreateEventRequest,
    now: DateTime<Utc>,
) -> Result<Event, CoreError>
where
    S: EventStore + ?Sized,
{
    request.validate()?;

    let new_event = request.into_new_event(now);
    let event = store.insert_event(&new_event).await?;

    info!(event_id = %event.event_id, title = %event.title, "Event created");
    Ok(event)
}

pub async fn get_event<S>(store: &S, event_id: &str) -> Result<Event, CoreError>
where
    S: EventStore + ?Sized,
{
    let event_id = normalize_event_id(event_id)?;
    store
        .find_event(&event_id)
        .await?
        .ok_or(CoreError::EventNotFound)
}

pub async fn list_events<S>(
    store: &S,
    query: &ListEventsQuery,
) -> Result<Vec<EventSummary>, CoreError>
where
    S: EventStore + ?Sized,
{
    Ok(store.list_events(query).await?)
}

/// Applies a partial update. An update naming no fields is rejected.
///
/// Cancelling an event also cancels its active registrations, which
/// invalidates their check-in tokens.
pub async fn update_event<S>(
    store: &S,
    event_id: &str,
    request: UpdateEventRequest,
) -> Result<Event, CoreError>
where
    S: EventStore + RegistrationStore + ?Sized,
{
    request.validate()?;
    request.check_capacity().map_err(CoreError::Validation)?;

    let patch = request.into_patch();
    if patch.is_empty() {
        return Err(CoreError::Validation("no fields to update".to_string()));
    }

    let event = store
        .update_event(event_id, &patch)
        .await?
        .ok_or(CoreError::EventNotFound)?;

    if patch.cancelled == Some(true) {
        let cancelled = store.cancel_active_registrations(event_id).await?;
        info!(event_id, registrations = cancelled, "Event cancelled");
    }

    info!(event_id, cancelled = event.cancelled, "Event updated");
    Ok(event)
}

/// Deletes an event together with its registrations, attendance and feedback.
pub async fn delete_event<S>(store: &S, event_id: &str) -> Result<(), CoreError>
where
    S: EventStore + ?Sized,
{
    if !store.delete_event(event_id).await? {
        return Err(CoreError::EventNotFound);
    }
    info!(event_id, "Event deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn create_request(value: serde_json::Value) -> CreateEventRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let event = create_event(
            &store,
            create_request(json!({
                "event_id": "ev1",
                "title": "Open Mic",
                "type": "cultural",
                "starts_at": "2026-12-01T18:00:00Z",
                "capacity": 40
            })),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(event.capacity, Some(40));

        let fetched = get_event(&store, "ev1").await.unwrap();
        assert_eq!(fetched, event);
    }

    #[tokio::test]
    async fn test_create_duplicate_id() {
        let store = InMemoryStore::new();
        let body = json!({
            "event_id": "ev1",
            "title": "Open Mic",
            "type": "cultural",
            "starts_at": "2026-12-01T18:00:00Z"
        });
        create_event(&store, create_request(body.clone()), Utc::now())
            .await
            .unwrap();

        let err = create_event(&store, create_request(body), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EventExists(id) if id == "ev1"));
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let store = InMemoryStore::new();
        let err = create_event(
            &store,
            create_request(json!({
                "title": "",
                "type": "cultural",
                "starts_at": "2026-12-01T18:00:00Z"
            })),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
        assert!(err.to_string().contains("title"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::new();
        create_event(
            &store,
            create_request(json!({
                "event_id": "ev1",
                "title": "Open Mic",
                "type": "cultural",
                "starts_at": "2026-12-01T18:00:00Z"
            })),
            Utc::now(),
        )
        .await
        .unwrap();

        let update: UpdateEventRequest =
            serde_json::from_value(json!({"cancelled_flag": true, "capacity": 10})).unwrap();
        let updated = update_event(&store, "ev1", update).await.unwrap();
        assert!(updated.cancelled);
        assert_eq!(updated.capacity, Some(10));

        let empty = update_event(&store, "ev1", UpdateEventRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(empty, CoreError::Validation(_)));

        let missing: UpdateEventRequest = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert!(matches!(
            update_event(&store, "ev9", missing).await.unwrap_err(),
            CoreError::EventNotFound
        ));

        delete_event(&store, "ev1").await.unwrap();
        assert!(matches!(
            get_event(&store, "ev1").await.unwrap_err(),
            CoreError::EventNotFound
        ));
        assert!(matches!(
            delete_event(&store, "ev1").await.unwrap_err(),
            CoreError::EventNotFound
        ));
    }

    #[tokio::test]
    async fn test_cancelling_event_cancels_registrations() {
        let store = InMemoryStore::new();
        create_event(
            &store,
            create_request(json!({
                "event_id": "ev1",
                "title": "Hack Night",
                "type": "technical",
                "starts_at": "2026-12-05T20:00:00Z"
            })),
            Utc::now(),
        )
        .await
        .unwrap();
        let outcome = crate::services::register(&store, "ev1", "s1", Utc::now())
            .await
            .unwrap();
        let crate::services::RegisterOutcome::Created(registration) = outcome else {
            panic!("first registration should be created");
        };

        let cancel: UpdateEventRequest =
            serde_json::from_value(json!({"cancelled": true})).unwrap();
        update_event(&store, "ev1", cancel).await.unwrap();

        assert_eq!(store.count_active_registrations("ev1").await.unwrap(), 0);
        assert!(store
            .find_active_by_token(&registration.token)
            .await
            .unwrap()
            .is_none());
        let row = store
            .find_registration("ev1", &registration.student_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, crate::models::RegistrationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_id() {
        let store = InMemoryStore::new();
        let err = get_event(&store, "bad id").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentifier(_)));
    }
}
