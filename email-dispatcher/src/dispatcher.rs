//! Email Dispatcher - Queue Consumption and Delivery
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::compose::OutboundEmail;
use crate::context::{NoopTenantFlow, TenantFlow, TenantFlowGuard};
use crate::error::{DequeueError, DispatchError, QueueError};
use crate::queue::NotificationQueue;
use crate::retry::{NoRetry, RetryPolicy};
use crate::transport::MailTransport;
use courier_config::TransportConfigSource;
use courier_types::{Notification, TransportConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of a successful dispatch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    /// Comma separated recipient addresses
    pub recipients: String,
    pub attempts: u32,
}

/// Single consumer of the notification queue.
///
/// Every cycle takes one notification, resolves a fresh transport snapshot,
/// assembles the email and sends it. Failures are logged and the
/// notification is dropped; nothing is reported back to producers.
pub struct EmailDispatcher {
    queue: NotificationQueue,
    source: Arc<dyn TransportConfigSource>,
    transport: Arc<dyn MailTransport>,
    tenant_flow: Arc<dyn TenantFlow>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl EmailDispatcher {
    /// Create a dispatcher with an unbounded queue, no tenant context and
    /// no retries
    pub fn new(source: Arc<dyn TransportConfigSource>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            queue: NotificationQueue::new(),
            source,
            transport,
            tenant_flow: Arc::new(NoopTenantFlow),
            retry_policy: Arc::new(NoRetry),
        }
    }

    /// Replace the queue with one of the given capacity (`None` = unbounded)
    pub fn with_queue_capacity(mut self, capacity: Option<usize>) -> Self {
        self.queue = NotificationQueue::with_capacity(capacity);
        self
    }

    pub fn with_tenant_flow(mut self, tenant_flow: Arc<dyn TenantFlow>) -> Self {
        self.tenant_flow = tenant_flow;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Run the dispatcher until `shutdown` fires or the queue is closed
    /// and drained.
    ///
    /// Shutdown is only observed between sends; a send in progress always
    /// finishes first.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            queue_capacity = ?self.queue.capacity(),
            "Waiting for notifications..."
        );

        loop {
            // Covers the wait as well as the send
            let _tenant = TenantFlowGuard::enter(self.tenant_flow.as_ref());

            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(pending = self.queue.len(), "Shutdown requested, stopping dispatcher");
                    break;
                }
                next = self.queue.dequeue() => next,
            };

            match next {
                Ok(notification) => {
                    // Outcome is logged by process
                    let _ = self.process(notification).await;
                }
                Err(DequeueError::Interrupted) => {
                    warn!("{}", DispatchError::InterruptedWait);
                    if shutdown.is_cancelled() {
                        break;
                    }
                }
                Err(DequeueError::Closed) => {
                    info!("Notification queue closed and drained");
                    break;
                }
            }
        }

        info!("Email dispatcher stopped");
    }

    /// Wait for one notification and dispatch it.
    ///
    /// The tenant flow spans the whole attempt, so it is ended even when the
    /// wait is interrupted.
    pub async fn dispatch_once(&self) -> Result<DispatchReport, DispatchError> {
        let _tenant = TenantFlowGuard::enter(self.tenant_flow.as_ref());
        let notification = self.queue.dequeue().await?;

        self.process(notification).await
    }

    /// Must be called inside a tenant flow
    async fn process(&self, notification: Notification) -> Result<DispatchReport, DispatchError> {
        let dispatch_id = Uuid::new_v4();

        let result = self.deliver(dispatch_id, &notification).await;

        if let Err(e) = &result {
            error!(
                dispatch_id = %dispatch_id,
                send_to = %notification.send_to,
                error = %e,
                "Failed to send email notification"
            );
        }

        result
    }

    async fn deliver(
        &self,
        dispatch_id: Uuid,
        notification: &Notification,
    ) -> Result<DispatchReport, DispatchError> {
        let config = self.resolve_transport().await?;
        let email = OutboundEmail::assemble(notification, &config)?;
        let recipients = email.recipients();

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.transport.send(&config, &email).await {
                Ok(()) => break,
                Err(e) => match self.retry_policy.next_delay(attempts, &e) {
                    Some(delay) => {
                        warn!(
                            dispatch_id = %dispatch_id,
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Email send failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }

        info!(
            dispatch_id = %dispatch_id,
            recipients = %recipients,
            attempts = attempts,
            "Email notification has been sent"
        );
        debug!(dispatch_id = %dispatch_id, body = %email.body, "Email content");

        Ok(DispatchReport {
            dispatch_id,
            recipients,
            attempts,
        })
    }

    /// Sources may read files or remote stores, so resolve off the async
    /// worker threads
    async fn resolve_transport(&self) -> Result<TransportConfig, DispatchError> {
        let source = Arc::clone(&self.source);
        let config = tokio::task::spawn_blocking(move || source.resolve())
            .await
            .map_err(|e| {
                DispatchError::MissingConfiguration(format!("transport source task failed: {}", e))
            })??;
        Ok(config)
    }

    /// Copy of the next notification to be dispatched
    pub fn peek_notification(&self) -> Option<Notification> {
        self.queue.peek()
    }

    /// Enqueue a notification without waiting
    pub fn submit_notification(&self, notification: Notification) -> Result<(), QueueError> {
        self.queue.enqueue(notification)
    }

    /// Enqueue a notification, waiting for space in a bounded queue
    pub async fn submit_notification_wait(
        &self,
        notification: Notification,
    ) -> Result<(), QueueError> {
        self.queue.enqueue_wait(notification).await
    }

    /// Stop accepting notifications; `run` returns once the rest are sent
    pub fn close(&self) {
        self.queue.close();
    }

    /// Wake a waiting `dispatch_once` with [`DispatchError::InterruptedWait`]
    pub fn interrupt(&self) {
        self.queue.interrupt();
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}
