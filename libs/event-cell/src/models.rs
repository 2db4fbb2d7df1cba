use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::{EventRecord, PatientRecord};

/// Body for POST /doctors/events. `start_instant` books a single slot,
/// `start_date_range` expands to one event per calendar day; exactly one of
/// the two shapes must be present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub patient: String,
    pub start_instant: Option<String>,
    pub start_date_range: Option<DateRange>,
    pub duration: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Partial patch for PUT /doctors/events/{id}. Absent fields are untouched;
/// a title that trims to empty clears the stored title.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub patient: Option<String>,
    pub start_instant: Option<String>,
    pub duration: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapCheckRequest {
    pub start_instant: String,
    pub duration: Option<i32>,
    pub exclude_event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Patient display fields attached to an event view. Never carries the
/// password hash or email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
}

impl From<&PatientRecord> for PatientRef {
    fn from(patient: &PatientRecord) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            timezone: patient.timezone.clone(),
        }
    }
}

/// Wire shape of an event on the doctor surface. `patient` is null when the
/// referenced patient no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: Uuid,
    pub patient: Option<PatientRef>,
    pub start_instant: DateTime<Utc>,
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventView {
    pub fn from_record(record: &EventRecord, patient: Option<&PatientRecord>) -> Self {
        Self {
            id: record.id,
            patient: patient.map(PatientRef::from),
            start_instant: record.start_at,
            duration: record.duration_minutes,
            title: record.title.clone(),
            description: record.description.clone(),
            reminder_sent_at: record.reminder_sent_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapCheckResponse {
    pub overlaps: bool,
    pub conflicting_events: Vec<EventView>,
}
