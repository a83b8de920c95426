//! In-memory transport that records outbound email

use async_trait::async_trait;
use courier_types::TransportConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::compose::OutboundEmail;
use crate::error::DispatchError;
use crate::transport::MailTransport;

/// One recorded send
#[derive(Debug, Clone)]
pub struct Delivery {
    pub config: TransportConfig,
    pub email: OutboundEmail,
}

/// Mock transport that captures sent emails instead of talking SMTP
pub struct MockTransport {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    attempts: AtomicU32,
    failures_left: AtomicU32,
    failure_message: Option<String>,
}

impl MockTransport {
    /// Create a transport that accepts every email
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            attempts: AtomicU32::new(0),
            failures_left: AtomicU32::new(0),
            failure_message: None,
        }
    }

    /// Create a transport that always fails with a transient error
    pub fn failing(message: impl Into<String>) -> Self {
        Self::failing_times(u32::MAX, message)
    }

    /// Fail the first `times` sends, then accept
    pub fn failing_times(times: u32, message: impl Into<String>) -> Self {
        Self {
            failures_left: AtomicU32::new(times),
            failure_message: Some(message.into()),
            ..Self::new()
        }
    }

    /// Emails accepted so far
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.deliveries.lock().await.len()
    }

    /// Send calls so far, including failed ones
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Check if an email was sent to a specific address
    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.deliveries
            .lock()
            .await
            .iter()
            .any(|d| d.email.to.iter().any(|m| m.email.to_string() == address))
    }

    pub async fn clear(&self) {
        self.deliveries.lock().await.clear();
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(
        &self,
        config: &TransportConfig,
        email: &OutboundEmail,
    ) -> Result<(), DispatchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        // Same validation a real send goes through
        email.to_message()?;

        if self.failure_message.is_some() && self.take_failure() {
            return Err(DispatchError::TransportFailure {
                reason: self
                    .failure_message
                    .clone()
                    .unwrap_or_else(|| "Mock failure".to_string()),
                transient: true,
            });
        }

        self.deliveries.lock().await.push(Delivery {
            config: config.clone(),
            email: email.clone(),
        });
        Ok(())
    }
}
