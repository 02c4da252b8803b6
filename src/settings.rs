//! Layered configuration: defaults, Settings.toml, environment overrides

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BitqiuSettings {
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

/// Provider endpoints and request plumbing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    /// Channel identifier the provider expects on every call
    pub org_channel: String,
    /// Template used to render a scannable image for a QR payload;
    /// `{}` is replaced with the URL-encoded payload
    pub qr_render_url: String,
    pub request_timeout_secs: u64,
}

/// QR login handshake tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Seconds between status polls while waiting for the scan
    pub poll_interval_secs: u64,
    /// Overall wait budget for one login attempt, in seconds
    pub wait_timeout_secs: u64,
    /// Re-run the QR handshake and retry once when the provider reports
    /// the session expired mid-operation
    pub reauth_on_expiry: bool,
}

/// Session persistence
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionSettings {
    /// Where to persist the session record; `None` keeps it in memory only
    pub store_path: Option<PathBuf>,
    /// Optional local validity window applied to new sessions, in hours.
    /// Absent a value, expiry is left to the server.
    pub ttl_hours: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://pan.bitqiu.com".to_string(),
            org_channel: "default|default|stpan".to_string(),
            qr_render_url: "https://api.qrserver.com/v1/create-qr-code/?data={}".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            wait_timeout_secs: 120,
            reauth_on_expiry: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BitqiuSettings {
    /// Load settings from configuration files and environment variables.
    ///
    /// Priority, highest to lowest: environment variables, the file named by
    /// `BITQIU_CONFIG`, `Settings.toml` in the working directory, defaults.
    /// Also initializes the logger (stderr; stdout belongs to the MCP
    /// transport).
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or
    /// parsed, or if logger initialization fails.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        env_logger::try_init()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or TOML parsing
    /// fails.
    pub fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            log::info!("loaded base settings from {}", default_config_path.display());
        }

        // An explicit config file wins over the working-directory one
        if let Ok(config_path) = std::env::var("BITQIU_CONFIG") {
            let path = PathBuf::from(&config_path);
            if path.exists() {
                let toml_content = fs::read_to_string(&path)?;
                settings = basic_toml::from_str(&toml_content)?;
                log::info!("overriding settings from {}", path.display());
            } else {
                log::warn!("BITQIU_CONFIG set but no file found at {config_path}");
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        if let Ok(base_url) = std::env::var("BITQIU_BASE_URL") {
            settings.api.base_url = base_url;
        }
        if let Ok(org_channel) = std::env::var("BITQIU_ORG_CHANNEL") {
            settings.api.org_channel = org_channel;
        }
        if let Ok(secs) = std::env::var("BITQIU_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                settings.api.request_timeout_secs = secs;
            }
        }
        if let Ok(secs) = std::env::var("BITQIU_POLL_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                settings.auth.poll_interval_secs = secs;
            }
        }
        if let Ok(secs) = std::env::var("BITQIU_WAIT_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                settings.auth.wait_timeout_secs = secs;
            }
        }
        if let Ok(path) = std::env::var("BITQIU_SESSION_FILE") {
            settings.session.store_path = Some(PathBuf::from(path));
        }
    }
}
