//! IB gateway client connection management.

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use wheel_advisor_core::{BrokerConfig, MarketDataType};

use crate::error::{IbError, Result};
use crate::types::RawAuthStatus;

/// IB client configuration.
#[derive(Debug, Clone)]
pub struct IBConfig {
    /// "https" for a real gateway; tests point this at a plain HTTP mock.
    pub scheme: String,
    /// The gateway ships a self-signed certificate.
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IBConfig {
    fn default() -> Self {
        Self::from(&BrokerConfig::default())
    }
}

impl From<&BrokerConfig> for IBConfig {
    fn from(config: &BrokerConfig) -> Self {
        Self {
            scheme: config.scheme.clone(),
            accept_invalid_certs: config.accept_invalid_certs,
            timeout_secs: config.timeout_secs,
        }
    }
}

impl IBConfig {
    /// Base URL of the gateway web API for a host and port.
    pub fn api_url(&self, host: &str, port: u16) -> String {
        format!("{}://{}:{}/v1/api", self.scheme, host, port)
    }
}

#[derive(Debug)]
struct SessionState {
    base_url: Option<String>,
    connected: bool,
    client_id: Option<i32>,
    readonly: bool,
    market_data_type: MarketDataType,
    account_id: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            base_url: None,
            connected: false,
            client_id: None,
            readonly: true,
            market_data_type: MarketDataType::Live,
            account_id: None,
        }
    }
}

/// Gateway client holding one brokerage session.
pub struct IBClient {
    config: IBConfig,
    http: Client,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for IBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IBClient")
            .field("base_url", &state.base_url)
            .field("connected", &state.connected)
            .field("client_id", &state.client_id)
            .finish_non_exhaustive()
    }
}

impl IBClient {
    /// Creates a client. No network traffic until [`IBClient::open_session`].
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: IBConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| IbError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &IBConfig {
        &self.config
    }

    /// Opens a session against the gateway at `host:port`.
    ///
    /// Returns `Ok(false)` when the gateway answers but has no
    /// authenticated brokerage connection.
    ///
    /// # Errors
    /// Returns error if the gateway cannot be reached.
    pub async fn open_session(
        &self,
        host: &str,
        port: u16,
        client_id: i32,
        readonly: bool,
    ) -> Result<bool> {
        let base_url = self.config.api_url(host, port);
        info!(url = %base_url, client_id, readonly, "Connecting to IB gateway");

        let status: RawAuthStatus = self
            .send(self.http.post(format!("{base_url}/iserver/auth/status")))
            .await?;

        if status.competing {
            warn!("Another session is competing for this gateway");
        }

        let connected = status.authenticated && status.connected;
        {
            let mut state = self.state.lock();
            state.base_url = Some(base_url);
            state.connected = connected;
            state.client_id = Some(client_id);
            state.readonly = readonly;
            state.account_id = None;
        }

        if connected {
            info!(client_id, "Connected to IB gateway");
        } else {
            warn!(
                authenticated = status.authenticated,
                connected = status.connected,
                "IB gateway has no authenticated brokerage session"
            );
        }
        Ok(connected)
    }

    /// Check if the session is alive.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Releases this client's hold on the gateway: drops the cached session
    /// state and clears every market data line it opened. The gateway's
    /// authenticated brokerage session stays up for the next request.
    /// Failures are logged, never returned.
    pub async fn close_session(&self) {
        let base_url = {
            let mut state = self.state.lock();
            state.connected = false;
            state.account_id = None;
            state.base_url.clone()
        };

        let Some(base_url) = base_url else {
            return;
        };

        let result: Result<serde_json::Value> = self
            .send(self.http.get(format!("{base_url}/iserver/marketdata/unsubscribeall")))
            .await;
        match result {
            Ok(_) => info!("Released IB gateway session"),
            Err(e) => warn!(error = %e, "Failed to clear IB market data lines"),
        }
    }

    pub(crate) fn market_data_type(&self) -> MarketDataType {
        self.state.lock().market_data_type
    }

    pub(crate) fn set_market_data_type(&self, mode: MarketDataType) {
        self.state.lock().market_data_type = mode;
    }

    pub(crate) fn cached_account(&self) -> Option<String> {
        self.state.lock().account_id.clone()
    }

    pub(crate) fn cache_account(&self, account_id: &str) {
        self.state.lock().account_id = Some(account_id.to_string());
    }

    fn base_url(&self) -> Result<String> {
        let state = self.state.lock();
        match (&state.base_url, state.connected) {
            (Some(url), true) => Ok(url.clone()),
            _ => Err(IbError::NotConnected),
        }
    }

    /// GET against the open session.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url()?, path);
        debug!(url = %url, ?query, "GET");
        self.send(self.http.get(&url).query(query)).await
    }

    /// POST a JSON body against the open session.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url()?, path);
        debug!(url = %url, "POST");
        self.send(self.http.post(&url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(IbError::api(status.as_u16(), text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Validates an identifier placed in a URL path (account ids).
pub(crate) fn validate_identifier(id: &str) -> Result<&str> {
    if id.is_empty() {
        return Err(IbError::Contract("identifier cannot be empty".to_string()));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(IbError::Contract(format!("invalid identifier: {id}")));
    }
    Ok(id)
}
