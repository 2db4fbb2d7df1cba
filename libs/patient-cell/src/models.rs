use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::{DoctorRecord, EventRecord, PatientRecord};

/// Directory entry on the doctor surface. Email is exposed here (doctors
/// need it to reach patients); the password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub timezone: String,
}

impl From<&PatientRecord> for PatientSummary {
    fn from(patient: &PatientRecord) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            email: patient.email.clone(),
            timezone: patient.timezone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorRef {
    pub id: Uuid,
    pub name: String,
}

/// Wire shape of an event on the patient surface; the doctor's name is
/// populated so the client can render it without another round trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEventView {
    pub id: Uuid,
    pub doctor: Option<DoctorRef>,
    pub start_instant: DateTime<Utc>,
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PatientEventView {
    pub fn from_record(record: &EventRecord, doctor: Option<&DoctorRecord>) -> Self {
        Self {
            id: record.id,
            doctor: doctor.map(|d| DoctorRef {
                id: d.id,
                name: d.name.clone(),
            }),
            start_instant: record.start_at,
            duration: record.duration_minutes,
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }
}
