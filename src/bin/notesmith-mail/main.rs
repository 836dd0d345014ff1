use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use spdlog::{error, info, warn};

use notesmith::config::{read_config, MailSettings};
use notesmith::logger::configure_logger;
use notesmith::mail::sender::{send_all, Campaign, FailurePolicy, SendOutcome, SentLog};
use notesmith::mail::subscribers::load_subscribers;
use notesmith::mail::transport::SmtpMailer;

/// Sends an HTML message to every subscriber of the list
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Subscribers CSV, needs a `Subscriber` column
    #[arg(long)]
    subscribers: PathBuf,

    /// Subject line
    #[arg(long)]
    subject: String,

    /// HTML file with the message body
    #[arg(long)]
    message: PathBuf,

    /// Config path, only the [mail] and [log] sections are used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where successful recipients are written, one per line
    #[arg(long, default_value = "sent.log")]
    sent_log: PathBuf,

    /// Keep sending after a recipient fails
    #[arg(long)]
    keep_going: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings: MailSettings = match args.config {
        Some(ref path) => read_config(path)?,
        None => MailSettings::default(),
    };
    if let Err(err) = configure_logger(settings.log.as_ref()) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let mail = &settings.mail;
    let password = env::var(&mail.password_env)
        .with_context(|| format!("SMTP password not set, export {}", mail.password_env))?;

    let subscribers = load_subscribers(&args.subscribers)?;
    info!("Sending \"{}\" to {} subscribers", args.subject, subscribers.len());

    let mut transport = SmtpMailer::connect(mail, password)?;
    let mut sent_log = SentLog::create(&args.sent_log)?;
    let campaign = Campaign {
        subject: &args.subject,
        message: &args.message,
    };
    let policy = if args.keep_going { FailurePolicy::Continue } else { FailurePolicy::Abort };

    let results = send_all(&mut transport, &subscribers, &campaign, &mut sent_log, policy)?;

    let failed: Vec<&str> = results.iter()
        .filter(|r| matches!(r.outcome, SendOutcome::Failed(_)))
        .map(|r| r.email.as_str())
        .collect();
    let sent = results.len() - failed.len();
    info!("Sent {} of {} messages, log in {}", sent, subscribers.len(), args.sent_log.display());

    if !failed.is_empty() {
        error!("Failed recipients: {}", failed.join(", "));
        return Err(anyhow!("{} recipient(s) failed", failed.len()));
    }

    Ok(())
}
