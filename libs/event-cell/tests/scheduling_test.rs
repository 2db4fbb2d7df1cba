use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use event_cell::models::{CreateEventRequest, DateRange, UpdateEventRequest, WindowQuery};
use event_cell::services::scheduling::{CreatedEvents, EventSchedulingService};
use realtime_cell::{NotificationDispatcher, PatientSignal};
use shared_cache::{MemoryKv, TimeRangeCache};
use shared_database::{MemoryStore, PatientRecord, PatientStore};
use shared_models::error::AppError;

struct Harness {
    service: EventSchedulingService,
    store: Arc<MemoryStore>,
    dispatcher: NotificationDispatcher,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(TimeRangeCache::new(Arc::new(MemoryKv::new())));
    let dispatcher = NotificationDispatcher::new();
    let service = EventSchedulingService::new(
        store.clone(),
        store.clone(),
        cache,
        dispatcher.clone(),
    );
    Harness {
        service,
        store,
        dispatcher,
    }
}

async fn seed_patient(store: &MemoryStore, name: &str) -> Uuid {
    let patient = PatientRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        timezone: "Europe/Lisbon".to_string(),
        password_hash: "unused".to_string(),
    };
    let id = patient.id;
    PatientStore::insert(store, patient).await.unwrap();
    id
}

fn single_request(patient: Uuid, start: &str) -> CreateEventRequest {
    CreateEventRequest {
        patient: patient.to_string(),
        start_instant: Some(start.to_string()),
        start_date_range: None,
        duration: None,
        title: Some("Checkup".to_string()),
        description: None,
    }
}

#[tokio::test]
async fn create_single_populates_the_patient_and_round_trips() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let created = h
        .service
        .create(doctor, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    let view = match created {
        CreatedEvents::Single(view) => view,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };

    let patient_ref = view.patient.as_ref().expect("patient populated");
    assert_eq!(patient_ref.id, patient);
    assert_eq!(patient_ref.name, "Amara Ike");
    assert_eq!(patient_ref.timezone, "Europe/Lisbon");
    assert_eq!(view.duration, 30);
    assert_eq!(
        view.start_instant,
        "2024-01-10T09:00:00Z"
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap()
    );

    let fetched = h.service.get(doctor, &view.id.to_string()).await.unwrap();
    assert_eq!(fetched.id, view.id);
    assert_eq!(fetched.patient.unwrap().name, "Amara Ike");
}

#[tokio::test]
async fn create_batch_expands_one_event_per_day() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let request = CreateEventRequest {
        patient: patient.to_string(),
        start_instant: None,
        start_date_range: Some(DateRange {
            start: "2024-01-01T09:00:00Z".to_string(),
            end: "2024-01-03T09:00:00Z".to_string(),
        }),
        duration: Some(45),
        title: None,
        description: None,
    };
    let created = h.service.create(doctor, request).await.unwrap();
    let views = match created {
        CreatedEvents::Batch(views) => views,
        CreatedEvents::Single(_) => panic!("expected a batch"),
    };

    assert_eq!(views.len(), 3);
    let expected = [
        "2024-01-01T09:00:00Z",
        "2024-01-02T09:00:00Z",
        "2024-01-03T09:00:00Z",
    ];
    for (view, start) in views.iter().zip(expected) {
        assert_eq!(
            view.start_instant,
            start.parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );
        assert_eq!(view.duration, 45);
    }
}

#[tokio::test]
async fn create_rejects_ambiguous_and_missing_shapes() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let mut both = single_request(patient, "2024-01-10T09:00:00Z");
    both.start_date_range = Some(DateRange {
        start: "2024-01-10T09:00:00Z".to_string(),
        end: "2024-01-12T09:00:00Z".to_string(),
    });
    assert_matches!(
        h.service.create(doctor, both).await,
        Err(AppError::Validation(_))
    );

    let mut neither = single_request(patient, "2024-01-10T09:00:00Z");
    neither.start_instant = None;
    assert_matches!(
        h.service.create(doctor, neither).await,
        Err(AppError::Validation(_))
    );
}

#[tokio::test]
async fn create_rejects_inverted_ranges_and_bad_input() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let inverted = CreateEventRequest {
        patient: patient.to_string(),
        start_instant: None,
        start_date_range: Some(DateRange {
            start: "2024-01-05T09:00:00Z".to_string(),
            end: "2024-01-01T09:00:00Z".to_string(),
        }),
        duration: None,
        title: None,
        description: None,
    };
    assert_matches!(
        h.service.create(doctor, inverted).await,
        Err(AppError::Validation(_))
    );

    let mut unparseable = single_request(patient, "yesterday at nine");
    unparseable.duration = None;
    assert_matches!(
        h.service.create(doctor, unparseable).await,
        Err(AppError::Validation(_))
    );

    let mut zero_duration = single_request(patient, "2024-01-10T09:00:00Z");
    zero_duration.duration = Some(0);
    assert_matches!(
        h.service.create(doctor, zero_duration).await,
        Err(AppError::Validation(_))
    );

    assert_matches!(
        h.service
            .create(doctor, single_request(Uuid::new_v4(), "2024-01-10T09:00:00Z"))
            .await,
        Err(AppError::Validation(msg)) if msg == "Patient not found"
    );

    let mut malformed = single_request(patient, "2024-01-10T09:00:00Z");
    malformed.patient = "not-a-uuid".to_string();
    assert_matches!(
        h.service.create(doctor, malformed).await,
        Err(AppError::InvalidId(_))
    );
}

#[tokio::test]
async fn titles_are_trimmed_and_blank_titles_dropped() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let mut padded = single_request(patient, "2024-01-10T09:00:00Z");
    padded.title = Some("  Follow-up  ".to_string());
    let created = h.service.create(doctor, padded).await.unwrap();
    let view = match created {
        CreatedEvents::Single(view) => view,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };
    assert_eq!(view.title.as_deref(), Some("Follow-up"));

    let mut blank = single_request(patient, "2024-01-11T09:00:00Z");
    blank.title = Some("   ".to_string());
    let created = h.service.create(doctor, blank).await.unwrap();
    let view = match created {
        CreatedEvents::Single(view) => view,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };
    assert_eq!(view.title, None);
}

#[tokio::test]
async fn update_sets_and_clears_the_description() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let mut request = single_request(patient, "2024-01-10T09:00:00Z");
    request.description = Some("Bring previous scans".to_string());
    let created = h.service.create(doctor, request).await.unwrap();
    let event_id = match created {
        CreatedEvents::Single(view) => view.id,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };

    let patch = UpdateEventRequest {
        description: Some("Fasting bloodwork first".to_string()),
        ..UpdateEventRequest::default()
    };
    let updated = h
        .service
        .update(doctor, &event_id.to_string(), patch)
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Fasting bloodwork first"));

    // An explicitly blank description clears the field.
    let patch = UpdateEventRequest {
        description: Some("   ".to_string()),
        ..UpdateEventRequest::default()
    };
    let updated = h
        .service
        .update(doctor, &event_id.to_string(), patch)
        .await
        .unwrap();
    assert_eq!(updated.description, None);

    // Omitting the field leaves the stored value alone.
    let patch = UpdateEventRequest {
        description: Some("Fasting bloodwork first".to_string()),
        ..UpdateEventRequest::default()
    };
    h.service
        .update(doctor, &event_id.to_string(), patch)
        .await
        .unwrap();
    let untouched = h
        .service
        .update(doctor, &event_id.to_string(), UpdateEventRequest::default())
        .await
        .unwrap();
    assert_eq!(untouched.description.as_deref(), Some("Fasting bloodwork first"));
}

#[tokio::test]
async fn patient_reassignment_notifies_both_channels() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let old_patient = seed_patient(&h.store, "Amara Ike").await;
    let new_patient = seed_patient(&h.store, "Bode Sanni").await;

    let mut old_rx = h.dispatcher.subscribe(old_patient).await;
    let mut new_rx = h.dispatcher.subscribe(new_patient).await;

    let created = h
        .service
        .create(doctor, single_request(old_patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    let event_id = match created {
        CreatedEvents::Single(view) => view.id,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };
    assert_eq!(old_rx.try_recv().unwrap(), PatientSignal::Created);

    let patch = UpdateEventRequest {
        patient: Some(new_patient.to_string()),
        ..UpdateEventRequest::default()
    };
    let updated = h
        .service
        .update(doctor, &event_id.to_string(), patch)
        .await
        .unwrap();
    assert_eq!(updated.patient.unwrap().id, new_patient);

    assert_eq!(old_rx.try_recv().unwrap(), PatientSignal::Deleted);
    assert_eq!(new_rx.try_recv().unwrap(), PatientSignal::Updated);
}

#[tokio::test]
async fn update_without_a_patient_change_signals_the_same_channel() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let created = h
        .service
        .create(doctor, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    let event_id = match created {
        CreatedEvents::Single(view) => view.id,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };

    let mut rx = h.dispatcher.subscribe(patient).await;
    let patch = UpdateEventRequest {
        duration: Some(60),
        ..UpdateEventRequest::default()
    };
    let updated = h
        .service
        .update(doctor, &event_id.to_string(), patch)
        .await
        .unwrap();

    assert_eq!(updated.duration, 60);
    assert_eq!(rx.try_recv().unwrap(), PatientSignal::Updated);
}

#[tokio::test]
async fn events_of_other_doctors_are_not_found() {
    let h = harness();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let created = h
        .service
        .create(owner, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    let event_id = match created {
        CreatedEvents::Single(view) => view.id,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };

    assert_matches!(
        h.service.get(intruder, &event_id.to_string()).await,
        Err(AppError::NotFound(_))
    );
    assert_matches!(
        h.service
            .update(intruder, &event_id.to_string(), UpdateEventRequest::default())
            .await,
        Err(AppError::NotFound(_))
    );
    assert_matches!(
        h.service.delete(intruder, &event_id.to_string()).await,
        Err(AppError::NotFound(_))
    );
    assert_matches!(
        h.service.get(owner, "not-a-uuid").await,
        Err(AppError::InvalidId(_))
    );
}

#[tokio::test]
async fn delete_removes_the_event_and_signals_the_patient() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let created = h
        .service
        .create(doctor, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    let event_id = match created {
        CreatedEvents::Single(view) => view.id,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };

    let mut rx = h.dispatcher.subscribe(patient).await;
    h.service.delete(doctor, &event_id.to_string()).await.unwrap();

    assert_eq!(rx.try_recv().unwrap(), PatientSignal::Deleted);
    assert_matches!(
        h.service.get(doctor, &event_id.to_string()).await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn windowed_listings_are_cached_until_the_doctor_mutates() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let other_doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    h.service
        .create(doctor, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();

    let window = WindowQuery {
        start: Some("2024-01-01T00:00:00Z".to_string()),
        end: Some("2024-01-31T00:00:00Z".to_string()),
    };
    let first = h.service.list_for_doctor(doctor, &window).await.unwrap();
    assert_eq!(first.len(), 1);

    // A write through the store alone leaves the cached window stale.
    use shared_database::{EventStore, NewEvent};
    EventStore::insert(
        h.store.as_ref(),
        NewEvent {
            doctor_id: doctor,
            patient_id: patient,
            start_at: "2024-01-15T09:00:00Z".parse().unwrap(),
            duration_minutes: 30,
            title: None,
            description: None,
        },
    )
    .await
    .unwrap();
    let stale = h.service.list_for_doctor(doctor, &window).await.unwrap();
    assert_eq!(stale.len(), 1);

    // Another doctor's mutation must not touch this doctor's cache.
    h.service
        .create(other_doctor, single_request(patient, "2024-01-20T09:00:00Z"))
        .await
        .unwrap();
    let still_stale = h.service.list_for_doctor(doctor, &window).await.unwrap();
    assert_eq!(still_stale.len(), 1);

    // The doctor's own mutation invalidates, so the next read is fresh.
    h.service
        .create(doctor, single_request(patient, "2024-01-25T09:00:00Z"))
        .await
        .unwrap();
    let fresh = h.service.list_for_doctor(doctor, &window).await.unwrap();
    assert_eq!(fresh.len(), 3);
}

#[tokio::test]
async fn listing_and_fetch_responses_are_enveloped() {
    use axum::extract::{Path, Query, State};
    use axum::Extension;
    use shared_models::auth::{AuthUser, UserType};

    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let created = h
        .service
        .create(doctor, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    let event_id = match created {
        CreatedEvents::Single(view) => view.id,
        CreatedEvents::Batch(_) => panic!("expected a single event"),
    };

    let service = Arc::new(h.service);
    let user = AuthUser {
        id: doctor,
        name: "Dr. Okafor".to_string(),
        email: "okafor@example.com".to_string(),
        user_type: UserType::Doctor,
    };

    let listing = event_cell::handlers::list_events(
        State(service.clone()),
        Extension(user.clone()),
        Query(WindowQuery { start: None, end: None }),
    )
    .await
    .unwrap();
    assert_eq!(listing.0["events"].as_array().map(Vec::len), Some(1));

    let fetched = event_cell::handlers::get_event(
        State(service),
        Extension(user),
        Path(event_id.to_string()),
    )
    .await
    .unwrap();
    assert_eq!(fetched.0["event"]["id"], serde_json::json!(event_id));
}

#[tokio::test]
async fn unwindowed_listings_bypass_the_cache() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let patient = seed_patient(&h.store, "Amara Ike").await;

    let window = WindowQuery {
        start: Some("2024-01-01T00:00:00Z".to_string()),
        end: Some("2024-01-31T00:00:00Z".to_string()),
    };
    h.service
        .create(doctor, single_request(patient, "2024-01-10T09:00:00Z"))
        .await
        .unwrap();
    h.service.list_for_doctor(doctor, &window).await.unwrap();

    use shared_database::{EventStore, NewEvent};
    EventStore::insert(
        h.store.as_ref(),
        NewEvent {
            doctor_id: doctor,
            patient_id: patient,
            start_at: "2024-01-15T09:00:00Z".parse().unwrap(),
            duration_minutes: 30,
            title: None,
            description: None,
        },
    )
    .await
    .unwrap();

    let unwindowed = h
        .service
        .list_for_doctor(doctor, &WindowQuery { start: None, end: None })
        .await
        .unwrap();
    assert_eq!(unwindowed.len(), 2);

    let half_window = WindowQuery {
        start: Some("2024-01-01T00:00:00Z".to_string()),
        end: None,
    };
    assert_matches!(
        h.service.list_for_doctor(doctor, &half_window).await,
        Err(AppError::Validation(_))
    );
}
