//! Batch configuration.
//!
//! Loaded once per run from a JSON file, then overlaid with environment
//! variables (a `.env` file is honoured through `dotenvy`). The resolved
//! [`BatchConfiguration`] is never mutated while a batch runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {path} not found or unreadable: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub sender_email: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub password: Secret,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender_email: String::new(),
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            password: Secret::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub enabled: bool,
    pub account_sid: String,
    pub auth_token: Secret,
    pub from_number: String,
    /// Prefix added to numbers that do not start with `+`.
    pub default_country_code: String,
    pub api_base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account_sid: String::new(),
            auth_token: Secret::default(),
            from_number: String::new(),
            default_country_code: "+91".to_string(),
            api_base_url: "https://api.twilio.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<Secret>,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint_url: Option<String>,
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bucket: String::new(),
            region: String::new(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            key_prefix: "payslips".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub name: String,
    pub address_lines: Vec<String>,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            name: "RS MAN-TECH".to_string(),
            address_lines: vec![
                "# 14, 3rd Cross, Parappana Agrahara".to_string(),
                "Bangalore-100".to_string(),
            ],
        }
    }
}

/// What to do with a record whose net pay is missing or zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroNetPayPolicy {
    #[default]
    Render,
    Skip,
}

/// What to do when the net pay cannot be spelled (e.g., it is negative).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidAmountPolicy {
    #[default]
    Placeholder,
    Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub zero_net_pay: ZeroNetPayPolicy,
    pub invalid_amount: InvalidAmountPolicy,
}

/// Which optional providers can actually be used in this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub messaging: bool,
    pub storage: bool,
}

impl Capabilities {
    fn resolve(config: &BatchConfiguration) -> Self {
        let whatsapp = &config.whatsapp;
        let storage = &config.storage;
        Self {
            messaging: !whatsapp.account_sid.trim().is_empty()
                && !whatsapp.auth_token.is_empty()
                && !whatsapp.from_number.trim().is_empty(),
            storage: !storage.bucket.trim().is_empty() && !storage.region.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfiguration {
    pub output_directory: PathBuf,
    pub email: EmailConfig,
    pub whatsapp: WhatsAppConfig,
    pub storage: StorageConfig,
    pub company: CompanyConfig,
    pub policy: PolicyConfig,
    /// Records processed at the same time; 1 keeps the batch sequential.
    pub concurrency: usize,
    pub channel_timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub template_path: Option<PathBuf>,
    pub typst_binary: PathBuf,
    pub log_file: Option<PathBuf>,
    #[serde(skip)]
    pub capabilities: Capabilities,
}

impl Default for BatchConfiguration {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("payslips"),
            email: EmailConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            storage: StorageConfig::default(),
            company: CompanyConfig::default(),
            policy: PolicyConfig::default(),
            concurrency: 1,
            channel_timeout_secs: 30,
            render_timeout_secs: 60,
            template_path: None,
            typst_binary: PathBuf::from("typst"),
            log_file: None,
            capabilities: Capabilities::default(),
        }
    }
}

impl BatchConfiguration {
    /// Read the JSON file, apply environment overrides and resolve capabilities.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config.resolved())
    }

    /// Parse JSON without consulting the environment.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config.resolved())
    }

    /// Overlay credentials and storage settings from environment variables.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_empty("SMTP_PASSWORD") {
            self.email.password = Secret::new(value);
        }
        if let Some(value) = non_empty("TWILIO_ACCOUNT_SID") {
            self.whatsapp.account_sid = value;
        }
        if let Some(value) = non_empty("TWILIO_AUTH_TOKEN") {
            self.whatsapp.auth_token = Secret::new(value);
        }
        if let Some(value) = non_empty("AWS_REGION") {
            self.storage.region = value;
        }
        if let Some(value) = non_empty("S3_BUCKET") {
            self.storage.bucket = value;
        }
        if let Some(value) = non_empty("AWS_ACCESS_KEY_ID") {
            self.storage.access_key_id = Some(value);
        }
        if let Some(value) = non_empty("AWS_SECRET_ACCESS_KEY") {
            self.storage.secret_access_key = Some(Secret::new(value));
        }
        self
    }

    /// Recompute [`Capabilities`] from the current settings.
    pub fn resolved(mut self) -> Self {
        self.capabilities = Capabilities::resolve(&self);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.channel_timeout_secs == 0 || self.render_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn ensure_output_directory(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_directory).map_err(|source| {
            ConfigError::OutputDirectory {
                path: self.output_directory.clone(),
                source,
            }
        })
    }
}
