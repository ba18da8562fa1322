//! Object storage for generated wage slips.
//!
//! [`ObjectStorage`] is the seam the dispatcher uploads through; [`S3Storage`]
//! is the production implementation on top of `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use log::{debug, info};
use thiserror::Error;

use crate::config::StorageConfig;
use crate::generators::common::month_slug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not configured: {0}")]
    NotConfigured(String),
    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload_file(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Public location of an object, used in logs and reports.
    fn object_url(&self, key: &str) -> String;
}

/// `<prefix>/<month-slug>/<EMP_ID>/<filename>`
pub fn object_key(prefix: &str, month: &str, employee_id: &str, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let employee = ::sanitize_filename::sanitize(employee_id.trim());
    let employee = if employee.is_empty() {
        "unknown".to_string()
    } else {
        employee
    };
    let tail = format!("{}/{}/{}", month_slug(month), employee, filename);
    if prefix.is_empty() {
        tail
    } else {
        format!("{}/{}", prefix, tail)
    }
}

pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3Storage {
    /// Build a client from the storage section. Explicit keys win over the
    /// default AWS credential chain.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() || config.region.trim().is_empty() {
            return Err(StorageError::NotConfigured(
                "bucket and region are required".to_string(),
            ));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.expose().to_string(),
                None,
                None,
                "payslip-config",
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        info!(
            "S3 storage initialized: bucket={}, region={}",
            config.bucket, config.region
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload_file(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;

        debug!("Uploaded {} bytes to s3://{}/{}", data.len(), self.bucket, key);
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}
