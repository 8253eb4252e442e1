//! `postline` - send one message through an SMTP relay
//!
//! Reads the sender configuration from JSON, the body from a file or stdin,
//! and exits with status 0 if the relay accepted the message, 1 otherwise.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod args;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postline_core::{Attachment, MailSender, OutgoingMessage, RecipientList, SenderConfig};

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postline=info,postline_core=info,postline_smtp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = SenderConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let body = crlf_line_endings(&read_body(&cli).await?);
    let message = build_message(&cli, body).await?;
    let recipients = RecipientList::from(cli.to.as_str());

    info!(
        host = %config.host,
        recipients = recipients.len(),
        attachments = message.attachments.len(),
        "Sending message"
    );

    let sender = MailSender::new(config);
    if sender.send_mail(recipients, &message).await {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn read_body(cli: &Cli) -> anyhow::Result<String> {
    if let Some(path) = &cli.body_file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read body from {}", path.display()));
    }

    debug!("Reading body from stdin");
    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("Failed to read body from stdin")?;
    Ok(body)
}

/// Rewrites bare LF line breaks as CRLF so they stay hard breaks in the
/// encoded body.
fn crlf_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

async fn build_message(cli: &Cli, body: String) -> anyhow::Result<OutgoingMessage> {
    let mut message = OutgoingMessage::new(cli.subject.clone(), body)
        .content_type(cli.content_type.clone())
        .charset(cli.charset.clone());

    for arg in &cli.attachments {
        let content = tokio::fs::read(&arg.path)
            .await
            .with_context(|| format!("Failed to read attachment {}", arg.path.display()))?;
        debug!(file = %arg.path.display(), bytes = content.len(), content_type = %arg.content_type, "Attaching file");
        message = message.attach(Attachment::new(
            arg.filename(),
            arg.content_type.clone(),
            content,
        ));
    }

    Ok(message)
}
