use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::PatientSignal;

pub type SignalSender = broadcast::Sender<PatientSignal>;
pub type SignalReceiver = broadcast::Receiver<PatientSignal>;

const CHANNEL_CAPACITY: usize = 64;

/// Per-patient broadcast registry. Delivery is at-most-once and best-effort:
/// with no receiver joined, a signal is simply dropped, and receivers re-sync
/// from the repository on reconnect.
pub struct NotificationDispatcher {
    channels: Arc<RwLock<HashMap<Uuid, SignalSender>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Joins the patient's channel, creating it on first subscription.
    pub async fn subscribe(&self, patient_id: Uuid) -> SignalReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels.entry(patient_id).or_insert_with(|| {
            debug!("Created notification channel for patient {patient_id}");
            broadcast::channel(CHANNEL_CAPACITY).0
        });
        sender.subscribe()
    }

    /// Drops the channel once its last receiver is gone.
    pub async fn prune(&self, patient_id: Uuid) {
        let mut channels = self.channels.write().await;
        if channels
            .get(&patient_id)
            .map(|s| s.receiver_count() == 0)
            .unwrap_or(false)
        {
            channels.remove(&patient_id);
            debug!("Removed notification channel for patient {patient_id}");
        }
    }

    pub async fn emit(&self, patient_id: Uuid, signal: PatientSignal) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(&patient_id) {
            if sender.send(signal).is_err() {
                // All receivers dropped between subscribe and now.
                debug!("No live receivers for patient {patient_id}");
            }
        }
    }

    pub async fn emit_created(&self, patient_id: Uuid) {
        self.emit(patient_id, PatientSignal::Created).await;
    }

    pub async fn emit_updated(&self, patient_id: Uuid) {
        self.emit(patient_id, PatientSignal::Updated).await;
    }

    pub async fn emit_deleted(&self, patient_id: Uuid) {
        self.emit(patient_id, PatientSignal::Deleted).await;
    }

    pub async fn active_channels(&self) -> Vec<Uuid> {
        let channels = self.channels.read().await;
        channels.keys().copied().collect()
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for NotificationDispatcher {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}
