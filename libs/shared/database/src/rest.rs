use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::records::{DoctorRecord, EventPatch, EventRecord, NewEvent, PatientRecord};
use crate::store::{DoctorStore, EventStore, PatientStore, StoreError};

/// PostgREST-style persistence backend. Rows are exchanged as JSON with
/// `Prefer: return=representation` on every write so callers always get the
/// stored row back.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    fn headers(&self, write: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if write {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        headers
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: {} {}", method, url);

        let write = matches!(method, Method::POST | Method::PATCH | Method::DELETE);
        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(write));
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, text);
            return Err(StoreError::Database(format!("{}: {}", status, text)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn range_filter(column: &str, op: &str, instant: DateTime<Utc>) -> String {
        let encoded = urlencoding::encode(&instant.to_rfc3339()).into_owned();
        format!("{column}={op}.{encoded}")
    }

    fn patch_body(patch: EventPatch) -> Value {
        let mut body = serde_json::Map::new();
        if let Some(patient_id) = patch.patient_id {
            body.insert("patient_id".to_string(), json!(patient_id));
        }
        if let Some(start_at) = patch.start_at {
            body.insert("start_at".to_string(), json!(start_at.to_rfc3339()));
        }
        if let Some(duration) = patch.duration_minutes {
            body.insert("duration_minutes".to_string(), json!(duration));
        }
        if let Some(title) = patch.title {
            body.insert("title".to_string(), json!(title));
        }
        if let Some(description) = patch.description {
            body.insert("description".to_string(), json!(description));
        }
        body.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        Value::Object(body)
    }
}

#[async_trait]
impl EventStore for RestStore {
    async fn insert(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        let mut rows: Vec<EventRecord> = self
            .request(Method::POST, "/events", Some(json!([event])))
            .await?;
        rows.pop()
            .ok_or_else(|| StoreError::Database("insert returned no row".to_string()))
    }

    async fn insert_many(&self, events: Vec<NewEvent>) -> Result<Vec<EventRecord>, StoreError> {
        // Single POST of the whole group; the backend applies it atomically.
        let mut rows: Vec<EventRecord> = self
            .request(Method::POST, "/events", Some(json!(events)))
            .await?;
        rows.sort_by_key(|e| e.start_at);
        Ok(rows)
    }

    async fn find_by_doctor(
        &self,
        doctor_id: Uuid,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let mut path = format!("/events?doctor_id=eq.{doctor_id}&order=start_at.asc");
        if let Some((start, end)) = window {
            path.push('&');
            path.push_str(&Self::range_filter("start_at", "gte", start));
            path.push('&');
            path.push_str(&Self::range_filter("start_at", "lte", end));
        }
        self.request(Method::GET, &path, None).await
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        let path = format!("/events?patient_id=eq.{patient_id}&order=start_at.asc");
        self.request(Method::GET, &path, None).await
    }

    async fn find_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventRecord>, StoreError> {
        let path = format!("/events?id=eq.{event_id}&doctor_id=eq.{doctor_id}");
        let mut rows: Vec<EventRecord> = self.request(Method::GET, &path, None).await?;
        Ok(rows.pop())
    }

    async fn update_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
        patch: EventPatch,
    ) -> Result<Option<EventRecord>, StoreError> {
        let path = format!("/events?id=eq.{event_id}&doctor_id=eq.{doctor_id}");
        let mut rows: Vec<EventRecord> = self
            .request(Method::PATCH, &path, Some(Self::patch_body(patch)))
            .await?;
        Ok(rows.pop())
    }

    async fn delete_owned(
        &self,
        doctor_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventRecord>, StoreError> {
        let path = format!("/events?id=eq.{event_id}&doctor_id=eq.{doctor_id}");
        let mut rows: Vec<EventRecord> = self.request(Method::DELETE, &path, None).await?;
        Ok(rows.pop())
    }

    async fn find_reminders_due(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let path = format!(
            "/events?reminder_sent_at=is.null&{}&{}&order=start_at.asc",
            Self::range_filter("start_at", "gte", window_start),
            Self::range_filter("start_at", "lt", window_end),
        );
        self.request(Method::GET, &path, None).await
    }

    async fn mark_reminder_sent(
        &self,
        event_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let path = format!("/events?id=eq.{event_id}");
        let body = json!({
            "reminder_sent_at": sent_at.to_rfc3339(),
            "updated_at": sent_at.to_rfc3339(),
        });
        let _: Vec<EventRecord> = self.request(Method::PATCH, &path, Some(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl PatientStore for RestStore {
    async fn insert(&self, patient: PatientRecord) -> Result<PatientRecord, StoreError> {
        let body = json!([{
            "id": patient.id,
            "name": patient.name,
            "email": patient.email,
            "timezone": patient.timezone,
            "password_hash": patient.password_hash,
        }]);
        let mut rows: Vec<PatientRecord> =
            self.request(Method::POST, "/patients", Some(body)).await?;
        rows.pop()
            .ok_or_else(|| StoreError::Database("insert returned no row".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PatientRecord>, StoreError> {
        let path = format!("/patients?id=eq.{id}");
        let mut rows: Vec<PatientRecord> = self.request(Method::GET, &path, None).await?;
        Ok(rows.pop())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PatientRecord>, StoreError> {
        let path = format!("/patients?email=eq.{}", urlencoding::encode(email));
        let mut rows: Vec<PatientRecord> = self.request(Method::GET, &path, None).await?;
        Ok(rows.pop())
    }

    async fn list(&self) -> Result<Vec<PatientRecord>, StoreError> {
        self.request(Method::GET, "/patients?order=name.asc", None)
            .await
    }

    async fn update_timezone(&self, id: Uuid, timezone: &str) -> Result<(), StoreError> {
        let path = format!("/patients?id=eq.{id}");
        let _: Vec<PatientRecord> = self
            .request(Method::PATCH, &path, Some(json!({ "timezone": timezone })))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DoctorStore for RestStore {
    async fn insert(&self, doctor: DoctorRecord) -> Result<DoctorRecord, StoreError> {
        let body = json!([{
            "id": doctor.id,
            "name": doctor.name,
            "email": doctor.email,
            "password_hash": doctor.password_hash,
        }]);
        let mut rows: Vec<DoctorRecord> =
            self.request(Method::POST, "/doctors", Some(body)).await?;
        rows.pop()
            .ok_or_else(|| StoreError::Database("insert returned no row".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DoctorRecord>, StoreError> {
        let path = format!("/doctors?id=eq.{id}");
        let mut rows: Vec<DoctorRecord> = self.request(Method::GET, &path, None).await?;
        Ok(rows.pop())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<DoctorRecord>, StoreError> {
        let path = format!("/doctors?email=eq.{}", urlencoding::encode(email));
        let mut rows: Vec<DoctorRecord> = self.request(Method::GET, &path, None).await?;
        Ok(rows.pop())
    }
}
