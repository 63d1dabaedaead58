//! # Expediente Notify
//!
//! Fire-and-report notifications. A failed or unconfigured send is a
//! warning for the caller to surface, never an error that blocks the
//! workflow that triggered it: registrations and migrations must complete
//! whether or not the confirmation email goes out.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::warn;

/// Errors raised by notification dispatch.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport accepted the message but delivery failed.
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),

    /// No transport is configured; nothing was sent.
    #[error("notifications are not configured")]
    Disabled,
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// One outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

/// Timestamp format shown inside confirmation bodies.
const BODY_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Build the pre-enrollment confirmation email.
pub fn confirmation_message(
    to: &str,
    full_name: &str,
    identifier: &str,
    folio: &str,
    program: &str,
    at: NaiveDateTime,
) -> EmailMessage {
    let registered = at.format(BODY_TIMESTAMP_FORMAT);
    let body_html = format!(
        "<html><body>\
         <h1>Confirmación de Pre-Inscripción</h1>\
         <p>Estimado/a <strong>{full_name}</strong>,</p>\
         <p>Hemos recibido exitosamente tu solicitud de pre-inscripción:</p>\
         <ul>\
         <li><strong>Matrícula:</strong> {identifier}</li>\
         <li><strong>Folio:</strong> {folio}</li>\
         <li><strong>Programa:</strong> {program}</li>\
         <li><strong>Fecha de registro:</strong> {registered}</li>\
         <li><strong>Estatus:</strong> Pre-inscrito</li>\
         </ul>\
         <p>Guarda esta información: tu matrícula y folio serán necesarios \
         para cualquier consulta sobre tu proceso de admisión.</p>\
         <p>Este es un correo automático, por favor no respondas a este mensaje.</p>\
         </body></html>"
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("Confirmación de Pre-Inscripción - {identifier}"),
        body_html,
    }
}

/// A notification transport.
#[async_trait]
pub trait Notifier: Debug + Send + Sync {
    /// Dispatch one message.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Transport used when no email configuration exists.
///
/// Every send reports [`NotifyError::Disabled`], which callers surface as
/// a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
        Err(NotifyError::Disabled)
    }
}

#[derive(Debug, Default)]
struct MemoryNotifierInner {
    sent: Vec<EmailMessage>,
    fail_with: Option<String>,
}

/// In-memory transport for tests: records what was sent.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<MemoryNotifierInner>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with the given reason.
    pub fn fail_with(&self, reason: impl Into<String>) {
        self.inner.lock().fail_with = Some(reason.into());
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.inner.lock().sent.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.fail_with {
            return Err(NotifyError::Dispatch(reason.clone()));
        }
        inner.sent.push(message.clone());
        Ok(())
    }
}

/// Send a message, downgrading any failure to a warning.
///
/// Returns whether the message went out.
pub async fn send_or_warn<N>(notifier: &N, message: &EmailMessage) -> bool
where
    N: Notifier + ?Sized,
{
    match notifier.send(message).await {
        Ok(()) => true,
        Err(e) => {
            warn!(to = %message.to, error = %e, "notification not sent");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn message() -> EmailMessage {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        confirmation_message(
            "ana@example.edu",
            "Ana López",
            "INS-00042",
            "FOL-20240501-1234",
            "Enfermería General",
            at,
        )
    }

    #[test]
    fn test_confirmation_message_carries_registration_details() {
        let msg = message();
        assert_eq!(msg.subject, "Confirmación de Pre-Inscripción - INS-00042");
        assert!(msg.body_html.contains("INS-00042"));
        assert!(msg.body_html.contains("FOL-20240501-1234"));
        assert!(msg.body_html.contains("01/05/2024 10:30"));
        assert!(msg.body_html.contains("Pre-inscrito"));
    }

    #[tokio::test]
    async fn test_memory_notifier_records_sends() {
        let notifier = MemoryNotifier::new();
        assert!(send_or_warn(&notifier, &message()).await);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent()[0].to, "ana@example.edu");
    }

    #[tokio::test]
    async fn test_send_or_warn_downgrades_failures() {
        let notifier = MemoryNotifier::new();
        notifier.fail_with("smtp unreachable");
        assert!(!send_or_warn(&notifier, &message()).await);
        assert!(notifier.sent().is_empty());

        assert!(!send_or_warn(&NoopNotifier, &message()).await);
    }
}
