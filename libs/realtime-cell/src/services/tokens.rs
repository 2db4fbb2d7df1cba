use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use tracing::debug;
use uuid::Uuid;

use shared_cache::{CacheError, KvBackend};

const TOKEN_TTL: Duration = Duration::from_secs(60);
const KEY_PREFIX: &str = "socket-token:";

/// Single-use token -> patient id mapping that authorizes the upgrade from an
/// HTTP session to a realtime channel join, so the session credential never
/// crosses the websocket handshake. With the in-process backend, tokens are
/// valid only within this process.
pub struct SocketTokenStore {
    backend: Arc<dyn KvBackend>,
    ttl: Duration,
}

impl SocketTokenStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            ttl: TOKEN_TTL,
        }
    }

    pub fn with_ttl(backend: Arc<dyn KvBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub async fn issue(&self, subject: Uuid) -> Result<String, CacheError> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        });

        self.backend
            .set_ex(
                &format!("{KEY_PREFIX}{token}"),
                &subject.to_string(),
                self.ttl,
            )
            .await?;

        Ok(token)
    }

    /// Atomically looks up and deletes the token. A second consumption of the
    /// same token, or an expired one, yields `None`.
    pub async fn consume(&self, token: &str) -> Option<Uuid> {
        match self.backend.get_del(&format!("{KEY_PREFIX}{token}")).await {
            Ok(Some(subject)) => Uuid::parse_str(&subject).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("Token lookup failed: {e}");
                None
            }
        }
    }
}
