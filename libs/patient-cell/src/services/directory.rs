use std::sync::Arc;

use shared_cache::DirectoryCache;
use shared_database::PatientStore;
use shared_models::error::AppError;

use crate::models::PatientSummary;

/// The patient directory doctors pick from when booking. Cached as one
/// entry; any write that changes a patient profile invalidates it.
pub struct PatientDirectoryService {
    patients: Arc<dyn PatientStore>,
    cache: Arc<DirectoryCache>,
}

impl PatientDirectoryService {
    pub fn new(patients: Arc<dyn PatientStore>, cache: Arc<DirectoryCache>) -> Self {
        Self { patients, cache }
    }

    pub async fn list(&self) -> Result<Vec<PatientSummary>, AppError> {
        if let Some(cached) = self.cache.get::<Vec<PatientSummary>>().await {
            return Ok(cached);
        }

        let patients = self
            .patients
            .list()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let summaries: Vec<PatientSummary> = patients.iter().map(PatientSummary::from).collect();

        self.cache.put(&summaries).await;
        Ok(summaries)
    }
}
