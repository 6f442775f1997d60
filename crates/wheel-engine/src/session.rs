//! Broker session lifecycle.
//!
//! One [`BrokerSession`] is opened per request and closed on every exit
//! path. `close` is the normal release; if the session is dropped while
//! still connected (panic, cancelled future) the drop handler schedules
//! the disconnect on the current runtime.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use wheel_advisor_core::{BrokerConfig, BrokerProvider, Result, WheelError};

/// Client id for a fresh session: the configured base plus a time offset,
/// so concurrent processes sharing a gateway rarely collide.
pub fn session_client_id(base: i32, unix_secs: i64) -> i32 {
    // rem_euclid keeps the offset in 0..1000 for any clock value.
    let offset = unix_secs.rem_euclid(1000) as i32;
    base.saturating_add(offset)
}

/// Scoped owner of a broker connection.
pub struct BrokerSession {
    provider: Arc<dyn BrokerProvider>,
    config: BrokerConfig,
    opened: bool,
}

impl BrokerSession {
    pub fn new(provider: Arc<dyn BrokerProvider>, config: BrokerConfig) -> Self {
        Self {
            provider,
            config,
            opened: false,
        }
    }

    /// Connects unless the provider already has a live session.
    ///
    /// # Errors
    /// Returns [`WheelError::ConnectionFailed`] when the gateway cannot be
    /// reached or refuses the session.
    pub async fn ensure_connected(&mut self) -> Result<&dyn BrokerProvider> {
        if self.provider.is_connected() {
            debug!("Reusing broker session");
            self.opened = true;
            return Ok(self.provider.as_ref());
        }

        let client_id = session_client_id(self.config.client_id, Utc::now().timestamp());
        let connected = self
            .provider
            .connect(
                &self.config.host,
                self.config.port,
                client_id,
                self.config.readonly,
            )
            .await
            .map_err(|e| match e {
                WheelError::ConnectionFailed(_) => e,
                other => WheelError::connection_failed(other),
            })?;

        if !connected {
            return Err(WheelError::ConnectionFailed(format!(
                "gateway at {}:{} refused client {client_id}",
                self.config.host, self.config.port
            )));
        }

        info!(
            host = %self.config.host,
            port = self.config.port,
            client_id,
            "Broker session opened"
        );
        self.opened = true;
        Ok(self.provider.as_ref())
    }

    /// Disconnects if connected. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.opened && self.provider.is_connected() {
            self.provider.disconnect().await;
            debug!("Broker session closed");
        }
        self.opened = false;
    }
}

impl Drop for BrokerSession {
    fn drop(&mut self) {
        if !self.opened || !self.provider.is_connected() {
            return;
        }

        warn!("Broker session dropped without close, disconnecting in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let provider = Arc::clone(&self.provider);
                handle.spawn(async move {
                    provider.disconnect().await;
                });
            }
            Err(_) => warn!("No runtime available, broker session leaked"),
        }
    }
}
