use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use spdlog::{error, info};

use crate::mail::subscribers::Subscriber;
use crate::mail::transport::{Envelope, Transport};

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipientResult {
    pub email: String,
    pub outcome: SendOutcome,
}

/// What to do after a recipient fails
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FailurePolicy {
    Abort,
    Continue,
}

/// Addresses that were sent successfully, one per line
pub struct SentLog<W: Write> {
    out: W,
}

impl SentLog<File> {
    /// Starts a fresh log, replacing any previous one
    pub fn create(path: &Path) -> Result<SentLog<File>> {
        let out = File::create(path)
            .with_context(|| format!("Error creating sent log {}", path.display()))?;
        Ok(SentLog::new(out))
    }
}

impl<W: Write> SentLog<W> {
    pub fn new(out: W) -> SentLog<W> {
        SentLog { out }
    }

    pub fn record(&mut self, email: &str) -> Result<()> {
        writeln!(self.out, "{}", email)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub struct Campaign<'a> {
    pub subject: &'a str,
    /// HTML file, read again for every recipient
    pub message: &'a Path,
}

/// Sends the campaign to every subscriber in order. Transport failures become
/// [`SendOutcome::Failed`]; with [`FailurePolicy::Abort`] nobody after the
/// failed recipient is tried. A message file that cannot be read is an error.
pub fn send_all<T: Transport, W: Write>(
    transport: &mut T,
    subscribers: &[Subscriber],
    campaign: &Campaign,
    sent_log: &mut SentLog<W>,
    policy: FailurePolicy,
) -> Result<Vec<RecipientResult>> {
    let mut results = Vec::with_capacity(subscribers.len());

    for subscriber in subscribers {
        let html_body = fs::read_to_string(campaign.message)
            .with_context(|| format!("Error reading message {}", campaign.message.display()))?;
        let envelope = Envelope {
            to: subscriber.email.clone(),
            subject: campaign.subject.to_string(),
            html_body,
        };

        let outcome = match transport.send(&envelope) {
            Ok(()) => {
                info!("Sent to {}", subscriber.email);
                sent_log.record(&subscriber.email)?;
                SendOutcome::Sent
            }
            Err(e) => {
                error!("Failed sending to {}: {:#}", subscriber.email, e);
                SendOutcome::Failed(format!("{:#}", e))
            }
        };

        let failed = matches!(outcome, SendOutcome::Failed(_));
        results.push(RecipientResult { email: subscriber.email.clone(), outcome });
        if failed && policy == FailurePolicy::Abort {
            break;
        }
    }

    Ok(results)
}
