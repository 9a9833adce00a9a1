//! Service Configuration
//!
//! Loaded from a JSON file, then overridden field by field from `HELPDESK_*`
//! environment variables.

use std::path::{Path, PathBuf};

use helpdesk_core::application::dto::SeedUser;
use helpdesk_core::infrastructure::SmtpSettings;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_VAR: &str = "HELPDESK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "helpdesk.json";
const DEV_SECRET: &str = "helpdesk-dev-secret-change-in-production";

/// API service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConfig {
    /// Listen address
    pub bind_addr: String,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Token lifetime
    pub token_ttl_hours: i64,
    /// Store snapshot; `None` keeps everything in memory only
    pub data_file: Option<PathBuf>,
    /// Outgoing mail; notifications are only logged when absent
    pub smtp: Option<SmtpSettings>,
    /// Accounts created at startup when their email is not yet registered
    pub seed_users: Vec<SeedUser>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            jwt_secret: DEV_SECRET.into(),
            token_ttl_hours: 8,
            data_file: None,
            smtp: None,
            seed_users: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("invalid config {path}: {source}")]
    Parse { path: String, source: serde_json::Error },

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

impl ApiConfig {
    /// Load from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }

    /// File named by `HELPDESK_CONFIG` (or `helpdesk.json`), then env overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let path = Path::new(&path);
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;

        if config.jwt_secret == DEV_SECRET {
            tracing::warn!("using the built-in development JWT secret; set HELPDESK_JWT_SECRET");
        }
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("HELPDESK_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(secret) = lookup("HELPDESK_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(ttl) = lookup("HELPDESK_TOKEN_TTL_HOURS") {
            let hours = parse_env("HELPDESK_TOKEN_TTL_HOURS", ttl.clone())?;
            self.token_ttl_hours = check_ttl(hours, ttl)?;
        }
        if let Some(file) = lookup("HELPDESK_DATA_FILE") {
            self.data_file = Some(PathBuf::from(file));
        }

        if let Some(host) = lookup("HELPDESK_SMTP_HOST") {
            let smtp = self.smtp.get_or_insert_with(|| SmtpSettings {
                host: String::new(),
                port: 587,
                username: None,
                password: None,
                from: "HelpDesk <helpdesk@localhost>".into(),
            });
            smtp.host = host;
        }
        if let Some(smtp) = self.smtp.as_mut() {
            if let Some(port) = lookup("HELPDESK_SMTP_PORT") {
                smtp.port = parse_env("HELPDESK_SMTP_PORT", port)?;
            }
            if let Some(user) = lookup("HELPDESK_SMTP_USER") {
                smtp.username = Some(user);
            }
            if let Some(password) = lookup("HELPDESK_SMTP_PASSWORD") {
                smtp.password = Some(password);
            }
            if let Some(from) = lookup("HELPDESK_MAIL_FROM") {
                smtp.from = from;
            }
        }
        Ok(())
    }
}

/// Token lifetimes must be positive and fit a `chrono::Duration`
fn check_ttl(hours: i64, raw: String) -> Result<i64, ConfigError> {
    match chrono::Duration::try_hours(hours) {
        Some(_) if hours > 0 => Ok(hours),
        _ => Err(ConfigError::InvalidEnv { var: "HELPDESK_TOKEN_TTL_HOURS", value: raw }),
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv { var, value })
}
