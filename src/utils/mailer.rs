// src/utils/mailer.rs

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::{config::SmtpConfig, error::AppError, utils::otp::PURPOSE_RESET};

/// Outbound email. Only OTP messages are sent.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, otp: &str, purpose: &str) -> Result<(), AppError>;
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Invalid sender address: {0}")]
    Address(#[from] lettre::address::AddressError),
}

/// Builds the plain-text OTP email for `purpose`.
pub fn otp_message(from: &Mailbox, to: &str, otp: &str, purpose: &str) -> Result<Message, AppError> {
    let to: Mailbox = to
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;

    let (subject, body) = if purpose == PURPOSE_RESET {
        (
            "Password Reset OTP",
            format!("Your OTP for resetting your InterviewAI password is: {}", otp),
        )
    } else {
        (
            "Your OTP for InterviewAI",
            format!("Your OTP for InterviewAI is: {}", otp),
        )
    };

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Delivers OTPs through an authenticated SMTP relay.
///
/// Port 465 uses implicit TLS, any other port STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp(&self, to: &str, otp: &str, purpose: &str) -> Result<(), AppError> {
        let message = otp_message(&self.from, to, otp, purpose)?;
        self.transport.send(message).await.map_err(|e| {
            tracing::error!(to, purpose, "OTP email delivery failed: {}", e);
            AppError::InternalServerError("Failed to send OTP email".to_string())
        })?;
        tracing::info!(to, purpose, "OTP email sent");
        Ok(())
    }
}

/// Development stand-in used when no SMTP relay is configured. Nothing is
/// delivered and the code itself is never logged.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp(&self, to: &str, _otp: &str, purpose: &str) -> Result<(), AppError> {
        tracing::warn!(to, purpose, "SMTP not configured, OTP email not delivered");
        Ok(())
    }
}
