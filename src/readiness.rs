//! System readiness checks run before the first batch.

use log::{error, info, warn};
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::BatchConfiguration;

const PLACEHOLDER_VALUES: [&str; 4] = [
    "your-email@gmail.com",
    "your-app-password",
    "your-twilio-account-sid",
    "your-twilio-auth-token",
];

const ENGINE_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: Vec<String>,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            details: vec![detail.into()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadinessReport {
    pub checks: Vec<CheckResult>,
}

impl ReadinessReport {
    /// Ready when no check failed; warnings do not block.
    pub fn is_ready(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn log(&self) {
        for check in &self.checks {
            for detail in &check.details {
                match check.status {
                    CheckStatus::Pass => info!("[PASS] {}: {}", check.name, detail),
                    CheckStatus::Warn => warn!("[WARN] {}: {}", check.name, detail),
                    CheckStatus::Fail => error!("[FAIL] {}: {}", check.name, detail),
                }
            }
        }
        if self.is_ready() {
            info!("All checks passed. The system is ready.");
        } else {
            error!("Some checks failed. Fix the issues above before running a batch.");
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDER_VALUES.contains(&value)
}

/// Load the configuration and flag credentials left at their sample values.
pub fn check_configuration(path: &Path) -> (CheckResult, Option<BatchConfiguration>) {
    let config = match BatchConfiguration::load(path) {
        Ok(config) => config,
        Err(err) => {
            return (
                CheckResult::new("Configuration", CheckStatus::Fail, err.to_string()),
                None,
            )
        }
    };

    let mut result = CheckResult {
        name: "Configuration",
        status: CheckStatus::Pass,
        details: vec![format!("{} is valid", path.display())],
    };
    let mut flag = |detail: &str| {
        result.status = CheckStatus::Warn;
        result.details.push(detail.to_string());
    };

    if config.email.enabled
        && (is_placeholder(&config.email.sender_email)
            || is_placeholder(config.email.password.expose()))
    {
        flag("email is enabled but its credentials are not configured");
    }
    if config.whatsapp.enabled
        && (is_placeholder(&config.whatsapp.account_sid)
            || is_placeholder(config.whatsapp.auth_token.expose()))
    {
        flag("whatsapp is enabled but its credentials are not configured");
    }
    if config.storage.enabled && !config.capabilities.storage {
        flag("storage is enabled but bucket or region is missing");
    }

    (result, Some(config))
}

/// The document engine must answer `--version`.
pub async fn check_engine(binary: &Path) -> CheckResult {
    let probe = Command::new(binary)
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(ENGINE_PROBE_TIMEOUT, probe).await {
        Ok(Ok(output)) if output.status.success() => CheckResult::new(
            "Document engine",
            CheckStatus::Pass,
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ),
        Ok(Ok(output)) => CheckResult::new(
            "Document engine",
            CheckStatus::Fail,
            format!("{} exited with {}", binary.display(), output.status),
        ),
        Ok(Err(err)) => CheckResult::new(
            "Document engine",
            CheckStatus::Fail,
            format!("{} could not be run: {}", binary.display(), err),
        ),
        Err(_) => CheckResult::new(
            "Document engine",
            CheckStatus::Fail,
            format!("{} did not answer within {:?}", binary.display(), ENGINE_PROBE_TIMEOUT),
        ),
    }
}

pub fn check_output_directory(dir: &Path) -> CheckResult {
    if dir.is_dir() {
        CheckResult::new(
            "Output directory",
            CheckStatus::Pass,
            format!("{} exists", dir.display()),
        )
    } else if dir.exists() {
        CheckResult::new(
            "Output directory",
            CheckStatus::Fail,
            format!("{} exists but is not a directory", dir.display()),
        )
    } else {
        CheckResult::new(
            "Output directory",
            CheckStatus::Pass,
            format!("{} will be created automatically", dir.display()),
        )
    }
}

pub fn check_sample_data(path: &Path) -> CheckResult {
    if path.is_file() {
        CheckResult::new(
            "Sample data",
            CheckStatus::Pass,
            format!("{} found", path.display()),
        )
    } else {
        CheckResult::new(
            "Sample data",
            CheckStatus::Warn,
            format!("{} not found; create your own CSV file", path.display()),
        )
    }
}

pub async fn run_checks(config_path: &Path, sample_path: &Path) -> ReadinessReport {
    let (config_check, config) = check_configuration(config_path);
    let config = config.unwrap_or_default();

    let checks = vec![
        config_check,
        check_engine(&config.typst_binary).await,
        check_output_directory(&config.output_directory),
        check_sample_data(sample_path),
    ];

    ReadinessReport { checks }
}
