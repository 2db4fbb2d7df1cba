use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signal pushed to a patient's channel. Lifecycle signals carry no payload;
/// receivers re-fetch their event list instead of diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PatientSignal {
    #[serde(rename = "event:created")]
    Created,

    #[serde(rename = "event:updated")]
    Updated,

    #[serde(rename = "event:deleted")]
    Deleted,

    #[serde(rename = "event:reminder", rename_all = "camelCase")]
    Reminder {
        event_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        start_instant: DateTime<Utc>,
    },
}
