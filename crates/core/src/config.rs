use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub snapshot: SnapshotConfig,
    pub polling: PollingConfig,
}

/// Broker gateway session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Use 127.0.0.1, not localhost; gateways may refuse IPv6.
    pub host: String,
    pub port: u16,
    /// Base client id; each new session adds a time-based offset.
    pub client_id: i32,
    pub readonly: bool,
    pub scheme: String,
    /// Local gateways serve a self-signed certificate.
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 1,
            readonly: true,
            scheme: "https".to_string(),
            accept_invalid_certs: true,
            timeout_secs: 10,
        }
    }
}

/// Delayed snapshot API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub base_url: String,
    /// Caps every snapshot request; the fallback path is only as fast as this.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".to_string(),
            timeout_secs: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub price_attempts: u32,
    pub greeks_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            price_attempts: 10,
            greeks_attempts: 30,
            interval_ms: 100,
        }
    }
}
