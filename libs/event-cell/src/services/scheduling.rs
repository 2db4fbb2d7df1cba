use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::info;
use uuid::Uuid;

use realtime_cell::NotificationDispatcher;
use shared_cache::TimeRangeCache;
use shared_database::{
    EventPatch, EventRecord, EventStore, NewEvent, PatientRecord, PatientStore, StoreError,
};
use shared_models::error::AppError;

use crate::models::{
    CreateEventRequest, EventView, OverlapCheckRequest, OverlapCheckResponse, UpdateEventRequest,
    WindowQuery,
};
use crate::services::overlap;

const DEFAULT_DURATION_MINUTES: i32 = 30;

/// Result of a create call; the batch shape returns every expanded event.
#[derive(Debug)]
pub enum CreatedEvents {
    Single(EventView),
    Batch(Vec<EventView>),
}

/// Doctor-facing event operations. Every mutation invalidates the doctor's
/// cached windows and signals the affected patient before returning.
pub struct EventSchedulingService {
    events: Arc<dyn EventStore>,
    patients: Arc<dyn PatientStore>,
    cache: Arc<TimeRangeCache>,
    dispatcher: NotificationDispatcher,
}

impl EventSchedulingService {
    pub fn new(
        events: Arc<dyn EventStore>,
        patients: Arc<dyn PatientStore>,
        cache: Arc<TimeRangeCache>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            events,
            patients,
            cache,
            dispatcher,
        }
    }

    /// Windowed listings are served from the cache when possible and
    /// populate it after a miss. Unwindowed listings always hit the store.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        query: &WindowQuery,
    ) -> Result<Vec<EventView>, AppError> {
        match (&query.start, &query.end) {
            (Some(start_raw), Some(end_raw)) => {
                if let Some(cached) = self
                    .cache
                    .get::<Vec<EventView>>(doctor_id, start_raw, end_raw)
                    .await
                {
                    return Ok(cached);
                }

                let window_start = parse_instant(start_raw, "Invalid start")?;
                let window_end = parse_instant(end_raw, "Invalid end")?;
                let records = self
                    .events
                    .find_by_doctor(doctor_id, Some((window_start, window_end)))
                    .await
                    .map_err(store_err)?;
                let views = self.enrich(&records).await?;

                self.cache.put(doctor_id, start_raw, end_raw, &views).await;
                Ok(views)
            }
            (None, None) => {
                let records = self
                    .events
                    .find_by_doctor(doctor_id, None)
                    .await
                    .map_err(store_err)?;
                self.enrich(&records).await
            }
            _ => Err(AppError::Validation(
                "Provide both start and end, or neither".to_string(),
            )),
        }
    }

    pub async fn get(&self, doctor_id: Uuid, event_id: &str) -> Result<EventView, AppError> {
        let event_id = parse_id(event_id, "event")?;
        let record = self
            .events
            .find_owned(doctor_id, event_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        self.enrich_one(&record).await
    }

    pub async fn create(
        &self,
        doctor_id: Uuid,
        request: CreateEventRequest,
    ) -> Result<CreatedEvents, AppError> {
        let patient_id = parse_id(&request.patient, "patient")?;
        let duration = resolve_duration(request.duration)?;
        let title = normalize_title(request.title);

        let patient = self
            .patients
            .find_by_id(patient_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::Validation("Patient not found".to_string()))?;

        let created = match (&request.start_instant, &request.start_date_range) {
            (Some(start_raw), None) => {
                let start_at = parse_instant(start_raw, "Invalid start")?;
                let record = self
                    .events
                    .insert(NewEvent {
                        doctor_id,
                        patient_id,
                        start_at,
                        duration_minutes: duration,
                        title,
                        description: request.description,
                    })
                    .await
                    .map_err(store_err)?;
                info!("Doctor {doctor_id} created event {}", record.id);
                CreatedEvents::Single(EventView::from_record(&record, Some(&patient)))
            }
            (None, Some(range)) => {
                let range_start = parse_instant(&range.start, "Invalid start")?;
                let range_end = parse_instant(&range.end, "Invalid end")?;
                if range_start > range_end {
                    return Err(AppError::Validation(
                        "Range start must not be after range end".to_string(),
                    ));
                }

                let starts = expand_daily(range_start, range_end);
                let group = starts
                    .into_iter()
                    .map(|start_at| NewEvent {
                        doctor_id,
                        patient_id,
                        start_at,
                        duration_minutes: duration,
                        title: title.clone(),
                        description: request.description.clone(),
                    })
                    .collect();
                let records = self.events.insert_many(group).await.map_err(store_err)?;
                info!(
                    "Doctor {doctor_id} created a batch of {} events",
                    records.len()
                );
                CreatedEvents::Batch(
                    records
                        .iter()
                        .map(|record| EventView::from_record(record, Some(&patient)))
                        .collect(),
                )
            }
            _ => {
                return Err(AppError::Validation(
                    "Provide exactly one of startInstant or startDateRange".to_string(),
                ))
            }
        };

        self.cache.invalidate(doctor_id).await;
        self.dispatcher.emit_created(patient_id).await;
        Ok(created)
    }

    pub async fn update(
        &self,
        doctor_id: Uuid,
        event_id: &str,
        request: UpdateEventRequest,
    ) -> Result<EventView, AppError> {
        let event_id = parse_id(event_id, "event")?;

        let mut patch = EventPatch::default();
        if let Some(patient_raw) = &request.patient {
            let patient_id = parse_id(patient_raw, "patient")?;
            self.patients
                .find_by_id(patient_id)
                .await
                .map_err(store_err)?
                .ok_or_else(|| AppError::Validation("Patient not found".to_string()))?;
            patch.patient_id = Some(patient_id);
        }
        if let Some(start_raw) = &request.start_instant {
            patch.start_at = Some(parse_instant(start_raw, "Invalid start")?);
        }
        if let Some(duration) = request.duration {
            patch.duration_minutes = Some(resolve_duration(Some(duration))?);
        }
        if let Some(title) = request.title {
            // An explicitly empty title clears the field.
            patch.title = Some(normalize_title(Some(title)));
        }
        if let Some(description) = request.description {
            patch.description = Some(if description.trim().is_empty() {
                None
            } else {
                Some(description)
            });
        }

        let previous = self
            .events
            .find_owned(doctor_id, event_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let updated = self
            .events
            .update_owned(doctor_id, event_id, patch)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        self.cache.invalidate(doctor_id).await;

        if updated.patient_id != previous.patient_id {
            // The old patient's view loses the event; the new one gains it.
            self.dispatcher.emit_deleted(previous.patient_id).await;
            self.dispatcher.emit_updated(updated.patient_id).await;
        } else {
            self.dispatcher.emit_updated(updated.patient_id).await;
        }

        self.enrich_one(&updated).await
    }

    pub async fn delete(&self, doctor_id: Uuid, event_id: &str) -> Result<(), AppError> {
        let event_id = parse_id(event_id, "event")?;
        let removed = self
            .events
            .delete_owned(doctor_id, event_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        info!("Doctor {doctor_id} deleted event {event_id}");
        self.cache.invalidate(doctor_id).await;
        self.dispatcher.emit_deleted(removed.patient_id).await;
        Ok(())
    }

    /// Advisory check only; creating an overlapping booking is still allowed.
    pub async fn overlap_check(
        &self,
        doctor_id: Uuid,
        request: OverlapCheckRequest,
    ) -> Result<OverlapCheckResponse, AppError> {
        let start = parse_instant(&request.start_instant, "Invalid start")?;
        let duration = resolve_duration(request.duration)?;
        let end = start + chrono::Duration::minutes(duration as i64);
        let exclude = request
            .exclude_event_id
            .as_deref()
            .map(|raw| parse_id(raw, "event"))
            .transpose()?;

        let existing = self
            .events
            .find_by_doctor(doctor_id, None)
            .await
            .map_err(store_err)?;
        let conflicts: Vec<EventRecord> = overlap::find_conflicts(start, end, &existing, exclude)
            .into_iter()
            .cloned()
            .collect();
        let conflicting_events = self.enrich(&conflicts).await?;

        Ok(OverlapCheckResponse {
            overlaps: !conflicting_events.is_empty(),
            conflicting_events,
        })
    }

    async fn enrich_one(&self, record: &EventRecord) -> Result<EventView, AppError> {
        let patient = self
            .patients
            .find_by_id(record.patient_id)
            .await
            .map_err(store_err)?;
        Ok(EventView::from_record(record, patient.as_ref()))
    }

    async fn enrich(&self, records: &[EventRecord]) -> Result<Vec<EventView>, AppError> {
        let mut looked_up: HashMap<Uuid, Option<PatientRecord>> = HashMap::new();
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            if !looked_up.contains_key(&record.patient_id) {
                let patient = self
                    .patients
                    .find_by_id(record.patient_id)
                    .await
                    .map_err(store_err)?;
                looked_up.insert(record.patient_id, patient);
            }
            let patient = looked_up.get(&record.patient_id).and_then(Option::as_ref);
            views.push(EventView::from_record(record, patient));
        }
        Ok(views)
    }
}

fn store_err(e: StoreError) -> AppError {
    AppError::Database(e.to_string())
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(format!("Invalid {what} id")))
}

fn parse_instant(raw: &str, message: &str) -> Result<DateTime<Utc>, AppError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|_| AppError::Validation(message.to_string()))
}

fn resolve_duration(duration: Option<i32>) -> Result<i32, AppError> {
    let duration = duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration <= 0 {
        return Err(AppError::Validation(
            "Duration must be positive".to_string(),
        ));
    }
    Ok(duration)
}

fn normalize_title(title: Option<String>) -> Option<String> {
    let trimmed = title?.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// One start instant per UTC calendar day from the start's day through the
/// end's day inclusive, each at the range start's wall-clock time.
pub fn expand_daily(range_start: DateTime<Utc>, range_end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let wall_clock = range_start.time();
    let last_day = range_end.date_naive();

    let mut starts = Vec::new();
    let mut day = range_start.date_naive();
    while day <= last_day {
        starts.push(Utc.from_utc_datetime(&day.and_time(wall_clock)));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    starts
}
