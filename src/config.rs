use crate::models::SearchSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_PORT: u16 = 4747;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Immutable service configuration.
///
/// Built once at startup and passed by value into whatever needs it; in
/// particular `default_settings` is cloned into every new tab so no two tabs
/// can alias the same settings object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the real search backend. When unset the service runs in
    /// offline mode and every search resolves to synthetic results.
    pub search_api_url: Option<String>,

    /// Timeout for outbound search requests.
    pub request_timeout_secs: u64,

    /// Port the frontend-facing API listens on.
    pub server_port: u16,

    /// Settings assigned to newly created tabs.
    #[serde(default)]
    pub default_settings: SearchSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search_api_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            server_port: DEFAULT_SERVER_PORT,
            default_settings: SearchSettings::default(),
        }
    }
}

impl AppConfig {
    /// Defaults with environment overrides applied.
    ///
    /// `FRAMESCOUT_API_URL` sets the backend base URL, `FRAMESCOUT_PORT` the
    /// listen port, `FRAMESCOUT_TIMEOUT_SECS` the request timeout.
    /// Unparseable numeric values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FRAMESCOUT_API_URL") {
            if !url.is_empty() {
                config.search_api_url = Some(url);
            }
        }

        if let Ok(port) = std::env::var("FRAMESCOUT_PORT") {
            match port.parse() {
                Ok(port) => config.server_port = port,
                Err(_) => log::warn!("Ignoring invalid FRAMESCOUT_PORT: {}", port),
            }
        }

        if let Ok(timeout) = std::env::var("FRAMESCOUT_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.request_timeout_secs = secs,
                Err(_) => log::warn!("Ignoring invalid FRAMESCOUT_TIMEOUT_SECS: {}", timeout),
            }
        }

        config
    }
}
