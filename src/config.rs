//! Application configuration
//!
//! Aggregates the per-service configs. Defaults suit local development;
//! [`AppConfig::from_env`] overrides them from `LMS_*` environment variables.

use api_client::ApiClientConfig;
use app_state::{EffectiveScheme, ThemeConfig};
use std::path::PathBuf;
use storage::KvConfig;

/// Environment variable holding the API base URL
pub const ENV_API_URL: &str = "LMS_API_URL";
/// Environment variable holding the API version prefix
pub const ENV_API_PREFIX: &str = "LMS_API_PREFIX";
/// Environment variable holding the data directory
pub const ENV_DATA_DIR: &str = "LMS_DATA_DIR";
/// Environment variable selecting the authenticator (`demo` or `remote`)
pub const ENV_AUTH_MODE: &str = "LMS_AUTH_MODE";

/// File name of the key-value database inside the data directory
pub const KV_FILE_NAME: &str = "lms_kv.db";

/// How credentials are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Built-in demo account
    #[default]
    Demo,
    /// LMS backend
    Remote,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(AuthMode::Demo),
            "remote" => Ok(AuthMode::Remote),
            other => Err(format!("unknown auth mode: {}", other)),
        }
    }
}

/// Configuration for the whole client
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Directory for durable state; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// HTTP client settings
    pub api: ApiClientConfig,
    /// Theme timers
    pub theme: ThemeConfig,
    /// Authenticator selection
    pub auth_mode: AuthMode,
    /// Scheme reported by the device at startup
    pub device_scheme: Option<EffectiveScheme>,
}

impl AppConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `LMS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            config.api.base_url = url;
        }
        if let Some(prefix) = lookup(ENV_API_PREFIX) {
            config.api.version_prefix = prefix;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(mode) = lookup(ENV_AUTH_MODE) {
            match mode.parse() {
                Ok(mode) => config.auth_mode = mode,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_AUTH_MODE, e),
            }
        }

        config
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the HTTP client settings
    pub fn with_api(mut self, api: ApiClientConfig) -> Self {
        self.api = api;
        self
    }

    /// Set the theme timers
    pub fn with_theme(mut self, theme: ThemeConfig) -> Self {
        self.theme = theme;
        self
    }

    /// Set the authenticator
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Set the device scheme reported at startup
    pub fn with_device_scheme(mut self, scheme: Option<EffectiveScheme>) -> Self {
        self.device_scheme = scheme;
        self
    }

    /// Key-value store settings, if state is durable
    pub fn kv_config(&self) -> Option<KvConfig> {
        self.data_dir
            .as_ref()
            .map(|dir| KvConfig::new(dir.join(KV_FILE_NAME).to_string_lossy().into_owned()))
    }
}
