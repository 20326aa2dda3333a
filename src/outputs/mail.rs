//! Optional e-mail delivery of a rendered digest.
//!
//! The digest is sent from and to the configured address over STARTTLS SMTP.
//! Delivery problems are reported to the caller, which logs them; the file
//! digest has already been written by then.

use crate::config::MailSettings;
use chrono::NaiveDate;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Subject line for the digest of `date`.
pub fn digest_subject(date: NaiveDate) -> String {
    format!("每日新聞摘要 - {}", date.format("%Y-%m-%d"))
}

/// Build the HTML message without sending it.
pub fn build_message(
    settings: &MailSettings,
    subject: &str,
    html: &str,
) -> Result<Message, MailError> {
    let mailbox: Mailbox = settings
        .address
        .parse()
        .map_err(|source| MailError::Address {
            address: settings.address.clone(),
            source,
        })?;

    let message = Message::builder()
        .from(mailbox.clone())
        .to(mailbox)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())?;
    Ok(message)
}

/// Send the digest through the configured SMTP relay.
#[instrument(level = "info", skip_all, fields(host = %settings.smtp_host, port = settings.smtp_port))]
pub async fn send_digest(
    settings: &MailSettings,
    subject: &str,
    html: &str,
) -> Result<(), MailError> {
    let message = build_message(settings, subject, html)?;
    let credentials = Credentials::new(settings.address.clone(), settings.password.clone());

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
        .port(settings.smtp_port)
        .credentials(credentials)
        .build();

    mailer.send(message).await?;
    info!(subject, "Digest e-mail sent");
    Ok(())
}
