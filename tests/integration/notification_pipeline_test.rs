//! Integration Tests for the Notification Pipeline
//!
//! Producer → queue → dispatcher → transport, with the in-memory transport
//! standing in for SMTP. The last test needs a local SMTP server.

use courier_config::{FileTransportSource, StaticTransportSource};
use courier_types::{EmailConfig, Notification, NotificationData};
use email_dispatcher::{
    compose_notification, EmailDispatcher, MockTransport, SmtpMailTransport, LINE_SEPARATOR,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn static_source() -> Arc<StaticTransportSource> {
    Arc::new(StaticTransportSource::new([
        ("mail.smtp.host", "localhost"),
        ("mail.smtp.port", "1025"),
        ("mail.smtp.starttls.enable", "false"),
        ("mail.smtp.auth", "false"),
        ("mail.smtp.user", ""),
        ("mail.smtp.password", ""),
        ("mail.smtp.from", "identity@example.com"),
    ]))
}

#[tokio::test]
async fn test_confirmation_email_carries_footer_twice() {
    let transport = Arc::new(MockTransport::new());
    let dispatcher = EmailDispatcher::new(static_source(), transport.clone());

    let config = EmailConfig {
        subject: "Confirm your account, {first-name}".to_string(),
        target_epr: "https://id.example.com/confirm".to_string(),
        email_body: String::new(),
        email_footer: Some("Identity Team".to_string()),
    };
    let data = NotificationData::new("ann@example.com")
        .with_notification_code("XYZ")
        .with_parameter("first-name", "Ann");

    dispatcher
        .submit_notification(compose_notification(&config, &data))
        .unwrap();
    dispatcher.dispatch_once().await.unwrap();

    let deliveries = transport.deliveries().await;
    assert_eq!(deliveries.len(), 1);

    let email = &deliveries[0].email;
    assert_eq!(email.subject, "Confirm your account, Ann");
    assert_eq!(
        email.body,
        format!(
            "{}\nhttps://id.example.com/confirm?confirmationXYZ\n\nIdentity Team{sep}{sep}Identity Team",
            EmailConfig::DEFAULT_VALUE_MESSAGE,
            sep = LINE_SEPARATOR
        )
    );
    assert_eq!(email.body.matches("Identity Team").count(), 2);
}

#[tokio::test]
async fn test_file_backed_source_feeds_dispatcher() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp file");
    write!(
        file,
        r#"
[mail.smtp]
host = "localhost"
port = 1025
auth = false
user = ""
password = ""
from = "file@example.com"

[mail.smtp.starttls]
enable = false

[transport.mail]
ContentType = "text/html"
"#
    )
    .expect("write temp file");

    let source = Arc::new(
        FileTransportSource::new(file.path()).with_env_prefix("COURIER_PIPELINE_TEST"),
    );
    let transport = Arc::new(MockTransport::new());
    let dispatcher = EmailDispatcher::new(source, transport.clone());

    dispatcher
        .submit_notification(Notification::new("a@x.com", "S", "<p>B</p>", ""))
        .unwrap();
    dispatcher.dispatch_once().await.unwrap();

    let deliveries = transport.deliveries().await;
    assert_eq!(deliveries[0].config.content_type, "text/html");
    assert_eq!(deliveries[0].email.from.email.to_string(), "file@example.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_are_delivered_in_order() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 25;

    let transport = Arc::new(MockTransport::new());
    let dispatcher = Arc::new(EmailDispatcher::new(static_source(), transport.clone()));
    let shutdown = CancellationToken::new();

    let worker = {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    let mut producers = Vec::new();
    for producer in 0..PRODUCERS {
        let dispatcher = dispatcher.clone();
        producers.push(tokio::spawn(async move {
            for seq in 0..PER_PRODUCER {
                let json = serde_json::json!({
                    "send_to": format!("producer{}@example.com", producer),
                    "subject": seq.to_string(),
                    "body": "Body",
                })
                .to_string();
                dispatcher
                    .submit_notification(Notification::from_json(&json).unwrap())
                    .unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    dispatcher.close();
    tokio::time::timeout(Duration::from_secs(10), worker)
        .await
        .expect("dispatcher should drain and stop")
        .unwrap();

    let deliveries = transport.deliveries().await;
    assert_eq!(deliveries.len(), PRODUCERS * PER_PRODUCER);

    for producer in 0..PRODUCERS {
        let address = format!("producer{}@example.com", producer);
        let sequence: Vec<usize> = deliveries
            .iter()
            .filter(|d| d.email.recipients() == address)
            .map(|d| d.email.subject.parse().unwrap())
            .collect();
        assert_eq!(sequence, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}

#[tokio::test]
#[ignore] // Requires a local SMTP server such as Mailpit on port 1025
async fn test_pipeline_against_local_smtp() {
    let dispatcher = EmailDispatcher::new(
        static_source(),
        Arc::new(SmtpMailTransport::new(Duration::from_secs(5))),
    );

    dispatcher
        .submit_notification(Notification::new("a@x.com", "Pipeline", "Body", "Footer"))
        .unwrap();

    let report = dispatcher.dispatch_once().await.expect("send via local SMTP");
    assert_eq!(report.recipients, "a@x.com");
}
