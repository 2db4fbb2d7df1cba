use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shared_database::{EventStore, StoreError};

use crate::models::PatientSignal;
use crate::services::dispatcher::NotificationDispatcher;

const SCAN_INTERVAL: Duration = Duration::from_secs(60);
const LEAD_TIME_MINUTES: i64 = 5;

/// Periodic scan for events starting five minutes out. Each due event gets a
/// reminder signal pushed to its patient and is then stamped so the next scan
/// skips it. A failure on one event never blocks the rest of the batch.
pub struct ReminderScanner {
    events: Arc<dyn EventStore>,
    dispatcher: NotificationDispatcher,
}

impl ReminderScanner {
    pub fn new(events: Arc<dyn EventStore>, dispatcher: NotificationDispatcher) -> Self {
        Self { events, dispatcher }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SCAN_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = self.tick(Utc::now()).await {
                    warn!("Reminder scan failed: {e}");
                }
            }
        })
    }

    /// Runs one scan over the window `[now + 5m, now + 6m)` and returns how
    /// many reminders were sent.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let window_start = now + chrono::Duration::minutes(LEAD_TIME_MINUTES);
        let window_end = window_start + chrono::Duration::minutes(1);

        let due = self
            .events
            .find_reminders_due(window_start, window_end)
            .await?;
        if due.is_empty() {
            return Ok(0);
        }
        debug!("{} reminder(s) due", due.len());

        let mut sent = 0;
        for event in due {
            self.dispatcher
                .emit(
                    event.patient_id,
                    PatientSignal::Reminder {
                        event_id: event.id,
                        title: event.title.clone(),
                        start_instant: event.start_at,
                    },
                )
                .await;

            match self.events.mark_reminder_sent(event.id, now).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Failed to stamp reminder for event {}: {e}", event.id);
                }
            }
        }

        Ok(sent)
    }
}
