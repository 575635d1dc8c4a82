use crate::utils::errors::SettingsError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api_base: String,
    pub reconnect_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub lobby_poll_interval_ms: u64,
    pub identity_file: String,
    pub log_level: String,
}

impl Settings {
    /// Loads settings from an optional `Settings.toml` and `STAB_*` environment variables.
    pub fn load() -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("reconnect_delay_ms", 2000_i64)?
            .set_default("poll_interval_ms", 1000_i64)?
            .set_default("lobby_poll_interval_ms", 1500_i64)?
            .set_default("identity_file", ".stab_identity.json")?
            .set_default("log_level", "info")?
            .add_source(File::with_name("Settings").required(false))
            .add_source(Environment::with_prefix("STAB").try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(settings)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn lobby_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lobby_poll_interval_ms)
    }

    /// HTTP base without the trailing slash.
    pub fn http_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// WebSocket endpoint for a game, derived from the HTTP base.
    pub fn push_url(&self, game_code: &str) -> String {
        let base = self.http_base();
        let ws_base = match base.strip_prefix("http") {
            Some(rest) => format!("ws{rest}"),
            None => base.to_string(),
        };
        format!("{ws_base}/ws/{game_code}")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            reconnect_delay_ms: 2000,
            poll_interval_ms: 1000,
            lobby_poll_interval_ms: 1500,
            identity_file: ".stab_identity.json".to_string(),
            log_level: "info".to_string(),
        }
    }
}
