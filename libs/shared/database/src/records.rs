use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar event as stored. `start_at` is always an absolute UTC instant;
/// local interpretation happens at the client edge only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

/// Insert payload; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Partial update. `None` leaves a field untouched; for the text fields the
/// inner option distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub patient_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub timezone: String,
    // Never serialized; patient views are built field by field.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
