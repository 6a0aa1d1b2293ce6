//! Application configuration for the Tripdesk API server.

use serde::Deserialize;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `TRIPDESK_`:
/// - `TRIPDESK_HOST`: Server bind address (default: "0.0.0.0")
/// - `TRIPDESK_PORT`: Server port (default: 8080)
/// - `TRIPDESK_DEBUG`: Enable debug mode (default: false)
/// - `TRIPDESK_SERVER_NAME`: Server name for identification
/// - `TRIPDESK_LOG_FORMAT`: `text` or `json`
/// - `TRIPDESK_ENCRYPTION_KEY`: Base64 32-byte key for travel documents
/// - `TRIPDESK_DEFAULT_CURRENCY`: Currency for agencies created without one
/// - `TRIPDESK_DEFAULT_ADVISOR_SHARE_BPS`: Advisor share of agency revenue
/// - `TRIPDESK_UPCOMING_WINDOW_DAYS`: Dashboard look-ahead window
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable debug mode
    #[serde(default)]
    pub debug: bool,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Base64 AES-256 key for travel documents and snapshots
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Currency used when an agency does not specify one
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Advisor share of agency revenue, in basis points
    #[serde(default = "default_advisor_share_bps")]
    pub default_advisor_share_bps: i32,

    /// Days ahead counted as "upcoming" on the dashboard
    #[serde(default = "default_upcoming_window_days")]
    pub upcoming_window_days: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_server_name() -> String {
    "tripdesk-server".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_advisor_share_bps() -> i32 {
    7_000
}

fn default_upcoming_window_days() -> i64 {
    30
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `TRIPDESK_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("TRIPDESK_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            server_name: default_server_name(),
            log_format: LogFormat::default(),
            encryption_key: None,
            default_currency: default_currency(),
            default_advisor_share_bps: default_advisor_share_bps(),
            upcoming_window_days: default_upcoming_window_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.default_advisor_share_bps, 7_000);
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_iter_applies_defaults() {
        let vars = vec![
            ("PORT".to_string(), "9090".to_string()),
            ("LOG_FORMAT".to_string(), "json".to_string()),
        ];
        let config: AppConfig = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.upcoming_window_days, 30);
        assert!(config.encryption_key.is_none());
    }
}
