use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeConfig {
    /// Defaults to the API base URL when unset.
    pub url: Option<String>,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// None retries forever.
    pub max_reconnect_attempts: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

fn default_base_url() -> String { "http://localhost:5000".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_reconnect_delay() -> u64 { 1000 }
fn default_session_path() -> PathBuf { PathBuf::from(".homefix/session.json") }

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_seconds: default_timeout() }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self { url: None, reconnect_delay_ms: default_reconnect_delay(), max_reconnect_attempts: None }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { path: default_session_path() }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl RealtimeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Every field has a default, so even the base file is optional
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment overrides, nested keys split on `__`
            .add_source(config::Environment::with_prefix("HOMEFIX").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Socket endpoint, falling back to the API host.
    pub fn realtime_url(&self) -> String {
        self.realtime
            .url
            .clone()
            .unwrap_or_else(|| self.api.base_url.clone())
    }
}
