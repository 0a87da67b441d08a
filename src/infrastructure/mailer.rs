use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpSettings;
use crate::domain::errors::DomainError;
use crate::domain::notification::Email;
use crate::domain::ports::Mailer;

/// Sends HTML mail through an SMTP relay with STARTTLS.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, DomainError> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|e| DomainError::Internal(format!("invalid MAIL_FROM: {e}")))?;
        let mut builder = SmtpTransport::starttls_relay(&settings.host)
            .map_err(|e| DomainError::Internal(format!("invalid SMTP relay: {e}")))?
            .port(settings.port);
        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: &Email) -> Result<(), DomainError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| DomainError::invalid(format!("bad recipient '{}': {e}", email.to)))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| DomainError::Internal(format!("failed to build email: {e}")))?;
        self.transport
            .send(&message)
            .map_err(|e| DomainError::Internal(format!("SMTP send failed: {e}")))?;
        log::info!("Sent '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

/// Used when no SMTP relay is configured: the message is only logged.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), DomainError> {
        log::info!(
            "Email (not sent) to {}: {} ({} bytes)",
            email.to,
            email.subject,
            email.html_body.len()
        );
        Ok(())
    }
}
