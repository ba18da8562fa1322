//! Distribution module - delivers rendered wage slips.
//!
//! - `email` - SMTP delivery with the PDF attached
//! - `messaging` - WhatsApp summary through the Twilio REST API
//!
//! Object storage lives in [`crate::storage`]. Every channel is independent:
//! a failure on one is recorded and the next channel still runs.

pub mod email;
pub mod messaging;

pub use email::{compose_payslip_mail, MailTransport, OutgoingMail, SmtpMailer};
pub use messaging::{normalize_phone, summary_message, MessagingClient, TwilioClient};

use log::{error, info, warn};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::BatchConfiguration;
use crate::generators::layout::resolve_net_pay;
use crate::generators::RenderedDocument;
use crate::records::EmployeeRecord;
use crate::storage::{content_type_for, object_key, ObjectStorage, StorageError};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid address {address}: {message}")]
    InvalidAddress { address: String, message: String },
    #[error("failed to compose message: {0}")]
    Compose(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Messaging,
    Storage,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Messaging, Channel::Storage];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Messaging => "messaging",
            Channel::Storage => "storage",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ChannelStatus {
    Sent,
    Skipped(String),
    Failed(String),
}

impl ChannelStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelStatus::Sent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChannelStatus::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ChannelStatus::Skipped(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub employee_id: String,
    pub channel: Channel,
    #[serde(flatten)]
    pub status: ChannelStatus,
}

/// Outcomes of every channel for one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<DeliveryOutcome>,
    /// Key the document was uploaded under, when storage succeeded.
    pub storage_key: Option<String>,
}

impl DispatchReport {
    pub fn status(&self, channel: Channel) -> Option<&ChannelStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.channel == channel)
            .map(|outcome| &outcome.status)
    }

    pub fn storage_failed(&self) -> bool {
        self.status(Channel::Storage)
            .is_some_and(ChannelStatus::is_failed)
    }

    pub fn any_failed(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.status.is_failed())
    }
}

/// Sends one rendered document over every configured channel.
pub struct Dispatcher {
    config: Arc<BatchConfiguration>,
    mailer: Option<Arc<dyn MailTransport>>,
    messenger: Option<Arc<dyn MessagingClient>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(config: Arc<BatchConfiguration>) -> Self {
        let timeout = config.channel_timeout();
        Self {
            config,
            mailer: None,
            messenger: None,
            storage: None,
            timeout,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn MailTransport>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_messenger(mut self, messenger: Arc<dyn MessagingClient>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Deliver over email, messaging and storage, in that order.
    pub async fn dispatch(
        &self,
        document: &RenderedDocument,
        record: &EmployeeRecord,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let email = self.send_email(document, record).await;
        report.outcomes.push(self.outcome(document, Channel::Email, email));

        let messaging = self.send_message(document, record).await;
        report
            .outcomes
            .push(self.outcome(document, Channel::Messaging, messaging));

        let storage = match self.upload(document).await {
            Ok(Some(key)) => {
                report.storage_key = Some(key);
                Ok(None)
            }
            Ok(None) => Ok(Some(self.storage_skip_reason())),
            Err(err) => Err(err),
        };
        report
            .outcomes
            .push(self.outcome(document, Channel::Storage, storage));

        report
    }

    /// `Ok(None)` is a delivery, `Ok(Some(reason))` a skip.
    fn outcome(
        &self,
        document: &RenderedDocument,
        channel: Channel,
        result: Result<Option<String>, DeliveryError>,
    ) -> DeliveryOutcome {
        let status = match result {
            Ok(None) => ChannelStatus::Sent,
            Ok(Some(reason)) => {
                warn!(
                    "Skipping {} for {}: {}",
                    channel, document.employee_id, reason
                );
                ChannelStatus::Skipped(reason)
            }
            Err(err) => {
                if channel == Channel::Storage {
                    error!("Upload failed for {}: {}", document.employee_id, err);
                } else {
                    warn!(
                        "{} delivery failed for {}: {}",
                        channel, document.employee_id, err
                    );
                }
                ChannelStatus::Failed(err.to_string())
            }
        };
        DeliveryOutcome {
            employee_id: document.employee_id.clone(),
            channel,
            status,
        }
    }

    async fn bounded<F, T>(&self, fut: F) -> Result<T, DeliveryError>
    where
        F: Future<Output = Result<T, DeliveryError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| DeliveryError::Timeout(self.timeout))?
    }

    async fn send_email(
        &self,
        document: &RenderedDocument,
        record: &EmployeeRecord,
    ) -> Result<Option<String>, DeliveryError> {
        if !self.config.email.enabled {
            return Ok(Some("email disabled".to_string()));
        }
        let Some(address) = record.email() else {
            return Ok(Some("no email address".to_string()));
        };
        let Some(mailer) = &self.mailer else {
            return Err(DeliveryError::Transport(
                "email transport unavailable".to_string(),
            ));
        };

        let name = record.name().unwrap_or_else(|| document.employee_id.clone());
        let mail = compose_payslip_mail(&name, &address, &self.config.company.name, document);
        self.bounded(mailer.send(mail)).await?;

        info!("Email sent to {} ({})", address, document.employee_id);
        Ok(None)
    }

    async fn send_message(
        &self,
        document: &RenderedDocument,
        record: &EmployeeRecord,
    ) -> Result<Option<String>, DeliveryError> {
        if !self.config.whatsapp.enabled {
            return Ok(Some("messaging disabled".to_string()));
        }
        if !self.config.capabilities.messaging {
            return Ok(Some("messaging provider not configured".to_string()));
        }
        let Some(raw_number) = record.mobile() else {
            return Ok(Some("no mobile number".to_string()));
        };
        let country_code = &self.config.whatsapp.default_country_code;
        let Some(number) = normalize_phone(&raw_number, country_code) else {
            return Ok(Some("no mobile number".to_string()));
        };
        let Some(messenger) = &self.messenger else {
            return Err(DeliveryError::Transport(
                "messaging client unavailable".to_string(),
            ));
        };

        let name = record.name().unwrap_or_else(|| document.employee_id.clone());
        let net_pay = resolve_net_pay(record).ok().flatten();
        let body = summary_message(&name, &document.month, net_pay, &self.config.company.name);
        let sid = self.bounded(messenger.send(&number, &body)).await?;

        info!(
            "WhatsApp message sent to {} ({}), SID: {}",
            number, document.employee_id, sid
        );
        Ok(None)
    }

    fn storage_skip_reason(&self) -> String {
        if !self.config.storage.enabled {
            "storage disabled".to_string()
        } else {
            "storage provider not configured".to_string()
        }
    }

    /// Upload and drop the local copy. `Ok(None)` means storage was skipped.
    async fn upload(&self, document: &RenderedDocument) -> Result<Option<String>, DeliveryError> {
        if !self.config.storage.enabled || !self.config.capabilities.storage {
            return Ok(None);
        }
        let Some(storage) = &self.storage else {
            return Err(DeliveryError::Transport(
                "storage client unavailable".to_string(),
            ));
        };

        let key = object_key(
            &self.config.storage.key_prefix,
            &document.month,
            &document.employee_id,
            &document.filename,
        );
        let content_type = content_type_for(&document.filename);
        self.bounded(async {
            storage
                .upload_file(&key, &document.pdf, &content_type)
                .await
                .map_err(DeliveryError::from)
        })
        .await?;

        info!("Uploaded {} to {}", document.filename, storage.object_url(&key));

        if let Err(err) = tokio::fs::remove_file(&document.local_path).await {
            warn!(
                "Could not remove local copy {}: {}",
                document.local_path.display(),
                err
            );
        }
        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capabilities;
    use crate::records::FieldValue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    struct HangingMailer;

    #[async_trait]
    impl MailTransport for HangingMailer {
        async fn send(&self, _mail: OutgoingMail) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    struct FailingStorage;

    #[async_trait]
    impl ObjectStorage for FailingStorage {
        async fn upload_file(&self, key: &str, _: &[u8], _: &str) -> Result<(), StorageError> {
            Err(StorageError::Upload {
                key: key.to_string(),
                message: "access denied".to_string(),
            })
        }

        fn object_url(&self, key: &str) -> String {
            format!("memory://{key}")
        }
    }

    fn document(dir: &std::path::Path) -> RenderedDocument {
        let local_path = dir.join("E1_May_Payslip.pdf");
        std::fs::write(&local_path, b"%PDF").unwrap();
        RenderedDocument {
            employee_id: "E1".to_string(),
            filename: "E1_May_Payslip.pdf".to_string(),
            local_path,
            pdf: b"%PDF".to_vec(),
            month: "May".to_string(),
            net_pay_words: "Zero Rupees Only".to_string(),
        }
    }

    fn record(pairs: &[(&str, &str)]) -> EmployeeRecord {
        pairs.iter().map(|(k, v)| (*k, FieldValue::from(*v))).collect()
    }

    #[tokio::test]
    async fn test_everything_disabled_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = Dispatcher::new(Arc::new(BatchConfiguration::default()))
            .with_mailer(Arc::new(RecordingMailer::default()));

        let report = dispatcher
            .dispatch(&document(dir.path()), &record(&[("Email", "a@x.com")]))
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes.iter().all(|o| o.status.is_skipped()));
        assert_eq!(
            report.status(Channel::Email),
            Some(&ChannelStatus::Skipped("email disabled".to_string()))
        );
        assert!(dir.path().join("E1_May_Payslip.pdf").exists());
    }

    #[tokio::test]
    async fn test_blank_email_is_skipped_not_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.email.enabled = true;
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = Dispatcher::new(Arc::new(config)).with_mailer(mailer.clone());

        let report = dispatcher
            .dispatch(&document(dir.path()), &record(&[("Email", "  ")]))
            .await;

        assert_eq!(
            report.status(Channel::Email),
            Some(&ChannelStatus::Skipped("no email address".to_string()))
        );
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_attaches_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.email.enabled = true;
        config.company.name = "Acme Labour Co".to_string();
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = Dispatcher::new(Arc::new(config)).with_mailer(mailer.clone());

        let report = dispatcher
            .dispatch(
                &document(dir.path()),
                &record(&[("Name", "A. Kumar"), ("Email", "a@x.com")]),
            )
            .await;

        assert_eq!(report.status(Channel::Email), Some(&ChannelStatus::Sent));
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "a@x.com");
        assert_eq!(sent[0].subject, "Payslip for May");
        assert_eq!(sent[0].attachment_name, "E1_May_Payslip.pdf");
        assert!(sent[0].body.contains("HR Department\nAcme Labour Co"));
    }

    #[tokio::test]
    async fn test_hanging_channel_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.email.enabled = true;
        config.channel_timeout_secs = 1;
        let dispatcher = Dispatcher::new(Arc::new(config)).with_mailer(Arc::new(HangingMailer));

        let report = dispatcher
            .dispatch(&document(dir.path()), &record(&[("Email", "a@x.com")]))
            .await;

        match report.status(Channel::Email) {
            Some(ChannelStatus::Failed(detail)) => assert!(detail.contains("timed out")),
            other => panic!("expected timeout failure, got {other:?}"),
        }
        assert!(report.status(Channel::Storage).is_some_and(ChannelStatus::is_skipped));
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.storage.enabled = true;
        config.capabilities = Capabilities {
            messaging: false,
            storage: true,
        };
        let dispatcher = Dispatcher::new(Arc::new(config)).with_storage(Arc::new(FailingStorage));

        let doc = document(dir.path());
        let report = dispatcher.dispatch(&doc, &record(&[])).await;

        assert!(report.storage_failed());
        assert!(report.storage_key.is_none());
        assert!(doc.local_path.exists());
    }

    #[tokio::test]
    async fn test_enabled_email_without_transport_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.email.enabled = true;
        let dispatcher = Dispatcher::new(Arc::new(config));

        let report = dispatcher
            .dispatch(&document(dir.path()), &record(&[("Email", "a@x.com")]))
            .await;

        match report.status(Channel::Email) {
            Some(ChannelStatus::Failed(detail)) => {
                assert!(detail.contains("email transport unavailable"))
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
        assert!(report.any_failed());
    }

    #[tokio::test]
    async fn test_configured_storage_without_client_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.storage.enabled = true;
        config.capabilities = Capabilities {
            messaging: false,
            storage: true,
        };
        let dispatcher = Dispatcher::new(Arc::new(config));

        let doc = document(dir.path());
        let report = dispatcher.dispatch(&doc, &record(&[])).await;

        assert!(report.storage_failed());
        assert!(doc.local_path.exists());
    }

    #[tokio::test]
    async fn test_messaging_without_capability_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BatchConfiguration::default();
        config.whatsapp.enabled = true;
        let dispatcher = Dispatcher::new(Arc::new(config));

        let report = dispatcher
            .dispatch(&document(dir.path()), &record(&[("Mobile", "9876543210")]))
            .await;

        assert_eq!(
            report.status(Channel::Messaging),
            Some(&ChannelStatus::Skipped(
                "messaging provider not configured".to_string()
            ))
        );
    }
}
