//! Load Tests for the Email Dispatcher
//!
//! Many producers push through one dispatcher backed by the in-memory
//! transport.
//!
//! Run with: cargo test --test load_test --release -- --ignored

use courier_config::StaticTransportSource;
use courier_types::Notification;
use email_dispatcher::{EmailDispatcher, MockTransport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn source() -> Arc<StaticTransportSource> {
    Arc::new(StaticTransportSource::new([
        ("mail.smtp.host", "localhost"),
        ("mail.smtp.port", "1025"),
        ("mail.smtp.starttls.enable", "false"),
        ("mail.smtp.auth", "false"),
        ("mail.smtp.user", ""),
        ("mail.smtp.password", ""),
        ("mail.smtp.from", "load@example.com"),
    ]))
}

async fn push_through(dispatcher: Arc<EmailDispatcher>, producers: usize, per_producer: usize) {
    let mut handles = Vec::new();
    for producer in 0..producers {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            for seq in 0..per_producer {
                dispatcher
                    .submit_notification_wait(Notification::new(
                        format!("user{}@example.com", producer),
                        format!("Load {}", seq),
                        "Body",
                        "Footer",
                    ))
                    .await
                    .expect("enqueue");
            }
        }));
    }

    for handle in handles {
        handle.await.expect("producer task");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore] // Should be run manually
async fn test_high_volume_unbounded_queue() {
    let num_producers = 100;
    let per_producer = 100;

    let transport = Arc::new(MockTransport::new());
    let dispatcher = Arc::new(EmailDispatcher::new(source(), transport.clone()));
    let shutdown = CancellationToken::new();

    let start = Instant::now();
    let worker = {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    push_through(dispatcher.clone(), num_producers, per_producer).await;
    dispatcher.close();

    timeout(Duration::from_secs(60), worker)
        .await
        .expect("dispatcher did not drain in time")
        .expect("dispatcher task");

    let elapsed = start.elapsed();
    let sent = transport.sent_count().await;
    assert_eq!(sent, num_producers * per_producer);

    println!(
        "Dispatched {} emails in {:?} ({:.0} emails/sec)",
        sent,
        elapsed,
        sent as f64 / elapsed.as_secs_f64()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore] // Should be run manually
async fn test_backpressure_with_bounded_queue() {
    let num_producers = 50;
    let per_producer = 200;

    let transport = Arc::new(MockTransport::new());
    let dispatcher = Arc::new(
        EmailDispatcher::new(source(), transport.clone()).with_queue_capacity(Some(16)),
    );
    let shutdown = CancellationToken::new();

    let worker = {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { dispatcher.run(shutdown).await })
    };

    push_through(dispatcher.clone(), num_producers, per_producer).await;
    assert!(dispatcher.queue_len() <= 16);
    dispatcher.close();

    timeout(Duration::from_secs(60), worker)
        .await
        .expect("dispatcher did not drain in time")
        .expect("dispatcher task");

    assert_eq!(transport.sent_count().await, num_producers * per_producer);
}
