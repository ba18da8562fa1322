#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use payslip_distributor::config::{BatchConfiguration, Capabilities};
use payslip_distributor::distribution::{
    DeliveryError, Dispatcher, MailTransport, MessagingClient, OutgoingMail,
};
use payslip_distributor::generators::{
    DocumentEngine, EngineError, WageSlipGenerator,
};
use payslip_distributor::records::{EmployeeRecord, FieldValue, RecordSet};
use payslip_distributor::storage::{ObjectStorage, StorageError};
use payslip_distributor::BatchOrchestrator;

/// Name that makes [`FakeEngine`] fail the compile.
pub const FAILING_NAME: &str = "FAIL-RENDER";

/// Returns fixed PDF bytes and keeps every source it was asked to compile.
#[derive(Default)]
pub struct FakeEngine {
    pub sources: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentEngine for FakeEngine {
    async fn compile(&self, source: &str) -> Result<Vec<u8>, EngineError> {
        self.sources.lock().await.push(source.to_string());
        if source.contains(FAILING_NAME) {
            return Err(EngineError::TypstExit {
                code: 1,
                stderr: "error: layout failed".to_string(),
            });
        }
        Ok(b"%PDF-1.7 fake".to_vec())
    }
}

/// In-memory object storage.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail: bool,
}

impl MemoryStorage {
    pub fn failing() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.files.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.files.lock().await.get(key).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload_file(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "bucket unreachable".to_string(),
            });
        }
        self.files
            .lock()
            .await
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("http://test.example.com/{}", key)
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), DeliveryError> {
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

pub struct RejectingMailer;

#[async_trait]
impl MailTransport for RejectingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("535 authentication failed".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessagingClient for RecordingMessenger {
    async fn send(&self, to: &str, body: &str) -> Result<String, DeliveryError> {
        let mut sent = self.sent.lock().await;
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("SM{}", sent.len()))
    }
}

/// Configuration writing into `dir` with email and storage on, messaging off.
pub fn config_in(dir: &Path) -> BatchConfiguration {
    let mut config = BatchConfiguration::default();
    config.output_directory = dir.to_path_buf();
    config.email.enabled = true;
    config.email.sender_email = "hr@example.com".to_string();
    config.storage.enabled = true;
    config.storage.bucket = "payslips-test".to_string();
    config.storage.region = "ap-south-1".to_string();
    config.resolved()
}

pub fn enable_messaging(mut config: BatchConfiguration) -> BatchConfiguration {
    config.whatsapp.enabled = true;
    config.capabilities = Capabilities {
        messaging: true,
        ..config.capabilities
    };
    config
}

pub fn record(pairs: &[(&str, &str)]) -> EmployeeRecord {
    pairs
        .iter()
        .map(|(k, v)| (*k, FieldValue::from(*v)))
        .collect()
}

pub fn employee(id: &str, name: &str, email: &str, net_pay: &str) -> EmployeeRecord {
    record(&[
        ("EMP_ID", id),
        ("Name", name),
        ("Email", email),
        ("Net_Pay", net_pay),
    ])
}

pub fn record_set(rows: Vec<EmployeeRecord>) -> RecordSet {
    RecordSet::from_rows(rows)
}

pub struct Harness {
    pub orchestrator: BatchOrchestrator,
    pub engine: Arc<FakeEngine>,
    pub mailer: Arc<RecordingMailer>,
    pub messenger: Arc<RecordingMessenger>,
    pub storage: Arc<MemoryStorage>,
}

pub fn harness(config: BatchConfiguration) -> Harness {
    harness_with_storage(config, MemoryStorage::default())
}

pub fn harness_with_storage(config: BatchConfiguration, storage: MemoryStorage) -> Harness {
    let config = Arc::new(config);
    let engine = Arc::new(FakeEngine::default());
    let mailer = Arc::new(RecordingMailer::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let storage = Arc::new(storage);

    let renderer = WageSlipGenerator::new(&config, engine.clone())
        .expect("bundled template should load");
    let dispatcher = Dispatcher::new(Arc::clone(&config))
        .with_mailer(mailer.clone())
        .with_messenger(messenger.clone())
        .with_storage(storage.clone());

    Harness {
        orchestrator: BatchOrchestrator::new(config, Arc::new(renderer), Arc::new(dispatcher)),
        engine,
        mailer,
        messenger,
        storage,
    }
}
