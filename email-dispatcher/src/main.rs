//! Email Dispatcher
//!
//! Reads newline-delimited JSON notifications from stdin and sends them over
//! SMTP. Stops on Ctrl+C, or at end of input once the queue has drained.

use anyhow::Result;
use courier_config::{FileTransportSource, LogFormat, WorkerConfig};
use courier_logging::{init_console_logging, init_logging};
use courier_types::Notification;
use email_dispatcher::{EmailDispatcher, SmtpMailTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "email-dispatcher";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = WorkerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    let logging = match config.log_format {
        LogFormat::Json => init_logging(SERVICE_NAME, config.log_level()),
        LogFormat::Console => init_console_logging(SERVICE_NAME, config.log_level()),
    };
    logging.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        transport_file = %config.transport_file.display(),
        queue_capacity = ?config.queue_capacity,
        smtp_timeout_secs = config.smtp_timeout_secs,
        "Starting Email Dispatcher"
    );

    let source = Arc::new(FileTransportSource::new(config.transport_file.clone()));
    let transport = Arc::new(SmtpMailTransport::new(Duration::from_secs(
        config.smtp_timeout_secs,
    )));
    let dispatcher = Arc::new(
        EmailDispatcher::new(source, transport).with_queue_capacity(config.queue_capacity),
    );

    let shutdown = CancellationToken::new();
    let worker_handle = {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    info!("Email Dispatcher running. Press Ctrl+C to stop.");
    tokio::select! {
        signal = signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Shutdown signal received"),
                Err(err) => error!(error = %err, "Unable to listen for shutdown signal"),
            }
            shutdown.cancel();
        }
        result = read_notifications(&dispatcher) => {
            if let Err(e) = result {
                error!(error = %e, "Failed reading notifications from stdin");
            }
            info!(pending = dispatcher.queue_len(), "End of input, draining queue");
            dispatcher.close();
        }
    }

    worker_handle
        .await
        .map_err(|e| anyhow::anyhow!("Dispatcher task failed: {}", e))?;

    info!("Email Dispatcher stopped");
    Ok(())
}

/// Producer side: one JSON `Notification` per line
async fn read_notifications(dispatcher: &EmailDispatcher) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Notification::from_json(line) {
            Ok(notification) => dispatcher
                .submit_notification_wait(notification)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to enqueue notification: {}", e))?,
            Err(e) => warn!(error = %e, "Skipping invalid notification"),
        }
    }

    Ok(())
}
