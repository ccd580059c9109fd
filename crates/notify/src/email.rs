//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers VIP client alerts as emails. Supports STARTTLS and
//! implicit TLS connections.

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use vipwatch_core::SmtpConfig;

use crate::traits::{Notification, Notifier, NotifyError};

/// Sends alerts as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
    /// Recipient mailboxes.
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration.
    ///
    /// The port defaults to 587; port 465 always uses implicit TLS.
    /// `tls: None` or `Some(true)` enables STARTTLS on other ports.
    ///
    /// SMTP credentials are resolved from the `SMTP_USERNAME` and
    /// `SMTP_PASSWORD` environment variables. If both are set, they
    /// are passed to the transport; otherwise the connection is
    /// unauthenticated.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let to: Vec<Mailbox> = config
            .recipients
            .iter()
            .map(|addr| {
                addr.parse()
                    .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(NotifyError::Config(
                "at least one alert recipient is required".to_string(),
            ));
        }

        let port = config.port.unwrap_or(587);
        let use_tls = config.tls.unwrap_or(true);

        // Port 465 uses implicit TLS; everything else uses STARTTLS when TLS is enabled.
        let mut builder = if port == 465 || use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(port)
        };

        // Attach credentials from environment if available.
        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send an alert email to all configured recipients.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut message_builder = Message::builder().from(self.from.clone());

        for recipient in &self.to {
            message_builder = message_builder.to(recipient.clone());
        }

        let email = message_builder
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipients = self.to.len(),
            "alert delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}
