use anyhow::{anyhow, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport};
use spdlog::info;

use crate::config::MailConfig;

/// A single outgoing message
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

pub trait Transport {
    fn send(&mut self, envelope: &Envelope) -> Result<()>;
}

/// Authenticated STARTTLS session to the configured relay
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Connects and logs in once, before anything is sent
    pub fn connect(cfg: &MailConfig, password: String) -> Result<SmtpMailer> {
        let from: Mailbox = cfg.from_header().parse()
            .with_context(|| format!("Invalid sender address {}", cfg.from_header()))?;

        let transport = SmtpTransport::starttls_relay(&cfg.server)
            .with_context(|| format!("Error setting up TLS for {}", cfg.server))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.sender.clone(), password))
            .build();

        let connected = transport.test_connection()
            .with_context(|| format!("Error connecting to {}:{}", cfg.server, cfg.port))?;
        if !connected {
            return Err(anyhow!("Unable to connect to {}:{}", cfg.server, cfg.port));
        }
        info!("Connected to {}:{} as {}", cfg.server, cfg.port, cfg.sender);

        Ok(SmtpMailer { transport, from })
    }
}

/// Builds the HTML message as the relay receives it
pub fn build_message(from: &Mailbox, envelope: &Envelope) -> Result<Message> {
    let to: Mailbox = envelope.to.parse()
        .with_context(|| format!("Invalid recipient address {}", envelope.to))?;
    let message = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(envelope.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(envelope.html_body.clone())?;
    Ok(message)
}

impl Transport for SmtpMailer {
    fn send(&mut self, envelope: &Envelope) -> Result<()> {
        let message = build_message(&self.from, envelope)?;
        lettre::Transport::send(&self.transport, &message)
            .with_context(|| format!("Error sending to {}", envelope.to))?;
        Ok(())
    }
}
