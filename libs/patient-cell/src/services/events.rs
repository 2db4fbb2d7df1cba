use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use shared_database::{DoctorRecord, DoctorStore, EventStore};
use shared_models::error::AppError;

use crate::models::PatientEventView;

/// Patient-facing event listing, ascending by start, with the doctor's
/// display name attached.
pub struct PatientEventsService {
    events: Arc<dyn EventStore>,
    doctors: Arc<dyn DoctorStore>,
}

impl PatientEventsService {
    pub fn new(events: Arc<dyn EventStore>, doctors: Arc<dyn DoctorStore>) -> Self {
        Self { events, doctors }
    }

    pub async fn list(&self, patient_id: Uuid) -> Result<Vec<PatientEventView>, AppError> {
        let records = self
            .events
            .find_by_patient(patient_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut looked_up: HashMap<Uuid, Option<DoctorRecord>> = HashMap::new();
        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            if !looked_up.contains_key(&record.doctor_id) {
                let doctor = self
                    .doctors
                    .find_by_id(record.doctor_id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                looked_up.insert(record.doctor_id, doctor);
            }
            let doctor = looked_up.get(&record.doctor_id).and_then(Option::as_ref);
            views.push(PatientEventView::from_record(record, doctor));
        }
        Ok(views)
    }
}
