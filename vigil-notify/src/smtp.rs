//! SMTP delivery over TLS.

use crate::{Notifier, RenderedEmail};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use vigil_core::{NotifyError, VigilResult};

/// Notifier that delivers the rendered summary via authenticated SMTP.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        from: &str,
        to: &str,
    ) -> VigilResult<Self> {
        let from = parse_mailbox(from)?;
        let to = parse_mailbox(to)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotifyError::BuildFailed {
                reason: format!("invalid SMTP relay {}: {}", host, e),
            })?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self { transport, from, to })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse::<Mailbox>().map_err(|e| NotifyError::BuildFailed {
        reason: format!("invalid address {}: {}", address, e),
    })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn deliver(&self, email: &RenderedEmail) -> VigilResult<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| NotifyError::BuildFailed {
                reason: e.to_string(),
            })?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                recipient: self.to.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(recipient = %self.to, "summary email delivered");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
