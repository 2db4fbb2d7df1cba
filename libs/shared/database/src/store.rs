use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::records::{DoctorRecord, EventPatch, EventRecord, NewEvent, PatientRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Persistence collaborator for events. Every operation is scoped by explicit
/// filter fields; ownership checks (doctor id) happen inside the store so a
/// mismatched owner and a missing row are indistinguishable to callers.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: NewEvent) -> Result<EventRecord, StoreError>;

    /// Inserts the whole group in one call; a failure creates nothing.
    async fn insert_many(&self, events: Vec<NewEvent>) -> Result<Vec<EventRecord>, StoreError>;

    /// Doctor's events, optionally filtered to `start_at` within the
    /// inclusive window. Returned ascending by start.
    async fn find_by_doctor(
        &self,
        doctor_id: Uuid,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<EventRecord>, StoreError>;

    /// Patient's events, ascending by start.
    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<EventRecord>, StoreError>;

    async fn find_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventRecord>, StoreError>;

    /// Applies the patch and bumps `updated_at`. `None` if the event does not
    /// exist or belongs to another doctor.
    async fn update_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
        patch: EventPatch,
    ) -> Result<Option<EventRecord>, StoreError>;

    /// Removes the event, returning it so the caller knows which patient to
    /// notify.
    async fn delete_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventRecord>, StoreError>;

    /// Events with `start_at` in `[window_start, window_end)` and no reminder
    /// sent yet.
    async fn find_reminders_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, StoreError>;

    async fn mark_reminder_sent(
        &self,
        event_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn insert(&self, patient: PatientRecord) -> Result<PatientRecord, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PatientRecord>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<PatientRecord>, StoreError>;
    async fn list(&self) -> Result<Vec<PatientRecord>, StoreError>;
    async fn update_timezone(&self, id: Uuid, timezone: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn insert(&self, doctor: DoctorRecord) -> Result<DoctorRecord, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DoctorRecord>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<DoctorRecord>, StoreError>;
}
