use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::records::{DoctorRecord, EventPatch, EventRecord, NewEvent, PatientRecord};
use crate::store::{DoctorStore, EventStore, PatientStore, StoreError};

/// Process-local store. Backs tests and any deployment without a configured
/// REST persistence endpoint.
#[derive(Default)]
pub struct MemoryStore {
    events: Arc<RwLock<HashMap<Uuid, EventRecord>>>,
    patients: Arc<RwLock<HashMap<Uuid, PatientRecord>>>,
    doctors: Arc<RwLock<HashMap<Uuid, DoctorRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn materialize(event: NewEvent) -> EventRecord {
        let now = Utc::now();
        EventRecord {
            id: Uuid::new_v4(),
            doctor_id: event.doctor_id,
            patient_id: event.patient_id,
            start_at: event.start_at,
            duration_minutes: event.duration_minutes,
            title: event.title,
            description: event.description,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            patients: Arc::clone(&self.patients),
            doctors: Arc::clone(&self.doctors),
        }
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        let record = Self::materialize(event);
        let mut events = self.events.write().await;
        events.insert(record.id, record.clone());
        Ok(record)
    }

    async fn insert_many(&self, new_events: Vec<NewEvent>) -> Result<Vec<EventRecord>, StoreError> {
        // One write lock for the whole group keeps the batch all-or-nothing.
        let mut events = self.events.write().await;
        let records: Vec<EventRecord> = new_events.into_iter().map(Self::materialize).collect();
        for record in &records {
            events.insert(record.id, record.clone());
        }
        Ok(records)
    }

    async fn find_by_doctor(
        &self,
        doctor_id: Uuid,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let events = self.events.read().await;
        let mut found: Vec<EventRecord> = events
            .values()
            .filter(|e| e.doctor_id == doctor_id)
            .filter(|e| match window {
                Some((start, end)) => e.start_at >= start && e.start_at <= end,
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start_at);
        Ok(found)
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        let events = self.events.read().await;
        let mut found: Vec<EventRecord> = events
            .values()
            .filter(|e| e.patient_id == patient_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start_at);
        Ok(found)
    }

    async fn find_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventRecord>, StoreError> {
        let events = self.events.read().await;
        Ok(events
            .get(&event_id)
            .filter(|e| e.doctor_id == doctor_id)
            .cloned())
    }

    async fn update_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
        patch: EventPatch,
    ) -> Result<Option<EventRecord>, StoreError> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(&event_id).filter(|e| e.doctor_id == doctor_id) else {
            return Ok(None);
        };

        if let Some(patient_id) = patch.patient_id {
            event.patient_id = patient_id;
        }
        if let Some(start_at) = patch.start_at {
            event.start_at = start_at;
        }
        if let Some(duration) = patch.duration_minutes {
            event.duration_minutes = duration;
        }
        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        event.updated_at = Utc::now();

        Ok(Some(event.clone()))
    }

    async fn delete_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventRecord>, StoreError> {
        let mut events = self.events.write().await;
        let owned = events
            .get(&event_id)
            .map(|e| e.doctor_id == doctor_id)
            .unwrap_or(false);
        if !owned {
            return Ok(None);
        }
        Ok(events.remove(&event_id))
    }

    async fn find_reminders_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let events = self.events.read().await;
        let mut due: Vec<EventRecord> = events
            .values()
            .filter(|e| {
                e.reminder_sent_at.is_none()
                    && e.start_at >= window_start
                    && e.start_at < window_end
            })
            .cloned()
            .collect();
        due.sort_by_key(|e| e.start_at);
        Ok(due)
    }

    async fn mark_reminder_sent(
        &self,
        event_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        if let Some(event) = events.get_mut(&event_id) {
            event.reminder_sent_at = Some(sent_at);
            event.updated_at = sent_at;
        }
        Ok(())
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn insert(&self, patient: PatientRecord) -> Result<PatientRecord, StoreError> {
        let mut patients = self.patients.write().await;
        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PatientRecord>, StoreError> {
        let patients = self.patients.read().await;
        Ok(patients.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PatientRecord>, StoreError> {
        let patients = self.patients.read().await;
        Ok(patients.values().find(|p| p.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let patients = self.patients.read().await;
        let mut all: Vec<PatientRecord> = patients.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn update_timezone(&self, id: Uuid, timezone: &str) -> Result<(), StoreError> {
        let mut patients = self.patients.write().await;
        if let Some(patient) = patients.get_mut(&id) {
            patient.timezone = timezone.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl DoctorStore for MemoryStore {
    async fn insert(&self, doctor: DoctorRecord) -> Result<DoctorRecord, StoreError> {
        let mut doctors = self.doctors.write().await;
        doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DoctorRecord>, StoreError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<DoctorRecord>, StoreError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.values().find(|d| d.email == email).cloned())
    }
}
