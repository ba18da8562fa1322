//! Messaging channel: a short WhatsApp notice through Twilio.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use super::DeliveryError;
use crate::config::{Secret, WhatsAppConfig};
use crate::generators::common::{format_grouped_amount, PLACEHOLDER};

lazy_static! {
    static ref PHONE_NOISE: Regex =
        Regex::new(r"[\s\-().]").expect("Invalid phone separator regex");
}

#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Send `body` to an E.164 number; returns the provider message id.
    async fn send(&self, to: &str, body: &str) -> Result<String, DeliveryError>;
}

/// E.164 form of a contact number, adding `country_code` when there is no `+`.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let compact = PHONE_NOISE.replace_all(raw.trim(), "");
    if compact.is_empty() {
        return None;
    }
    if compact.starts_with('+') {
        Some(compact.into_owned())
    } else {
        Some(format!("{}{}", country_code, compact))
    }
}

pub fn summary_message(
    name: &str,
    month: &str,
    net_pay: Option<Decimal>,
    company: &str,
) -> String {
    let net = net_pay
        .map(format_grouped_amount)
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    format!(
        "Hello {name},\n\n\
         Your salary for {month} has been processed.\n\n\
         Net Salary: \u{20b9}{net}\n\n\
         Your payslip has been sent to your registered email address.\n\n\
         - {company} HR"
    )
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

/// Twilio Messages API client using `whatsapp:` addressing.
pub struct TwilioClient {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: Secret,
    from_number: String,
}

impl TwilioClient {
    pub fn from_config(config: &WhatsAppConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl MessagingClient for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<String, DeliveryError> {
        let from = format!("whatsapp:{}", self.from_number);
        let to = format!("whatsapp:{}", to);
        let params = [("From", from.as_str()), ("To", to.as_str()), ("Body", body)];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose()))
            .form(&params)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(resource.sid)
    }
}
