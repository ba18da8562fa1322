//! Email channel: the wage slip as a PDF attachment over SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::DeliveryError;
use crate::config::EmailConfig;
use crate::generators::RenderedDocument;

/// A fully composed message, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), DeliveryError>;
}

/// The payslip email, signed by the HR department of `company`.
pub fn compose_payslip_mail(
    name: &str,
    address: &str,
    company: &str,
    document: &RenderedDocument,
) -> OutgoingMail {
    let month = &document.month;
    let body = format!(
        "Dear {name},\n\n\
         Please find attached your payslip for {month}.\n\n\
         If you have any questions regarding your salary, please contact the HR department.\n\n\
         Best Regards,\n\
         HR Department\n\
         {company}\n\n\
         ---\n\
         This is an automated email. Please do not reply to this message.\n"
    );

    OutgoingMail {
        to: address.to_string(),
        subject: format!("Payslip for {month}"),
        body,
        attachment_name: document.filename.clone(),
        attachment: document.pdf.clone(),
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| DeliveryError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })
}

/// STARTTLS SMTP session authenticated with the sender's credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        let sender = parse_mailbox(&config.sender_email)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender_email.clone(),
                config.password.expose().to_string(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, sender })
    }

    fn build_message(&self, mail: OutgoingMail) -> Result<Message, DeliveryError> {
        let pdf = ContentType::parse("application/pdf")
            .map_err(|e| DeliveryError::Compose(e.to_string()))?;

        Message::builder()
            .from(self.sender.clone())
            .to(parse_mailbox(&mail.to)?)
            .subject(mail.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(mail.body))
                    .singlepart(Attachment::new(mail.attachment_name).body(mail.attachment, pdf)),
            )
            .map_err(|e| DeliveryError::Compose(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), DeliveryError> {
        let message = self.build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(())
    }
}
