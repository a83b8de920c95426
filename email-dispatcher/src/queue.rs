//! Notification hand-off queue
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


use courier_types::Notification;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{DequeueError, QueueError};

#[derive(Default)]
struct QueueState {
    items: VecDeque<Notification>,
    closed: bool,
    interrupted: bool,
}

/// FIFO hand-off between many producers and a single consumer.
///
/// Unbounded unless a capacity is given. `enqueue` and `peek` never block;
/// `dequeue` is the only call that waits. The lock is never held across an
/// await point.
pub struct NotificationQueue {
    state: Mutex<QueueState>,
    available: Notify,
    space: Notify,
    capacity: Option<usize>,
}

impl NotificationQueue {
    /// Create an unbounded queue
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create a queue that rejects (or, with `enqueue_wait`, holds back)
    /// producers once `capacity` notifications are pending
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            available: Notify::new(),
            space: Notify::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A panicking producer cannot leave the deque half-modified
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a notification to the tail without waiting
    pub fn enqueue(&self, notification: Notification) -> Result<(), QueueError> {
        self.push(notification).map_err(|(err, _)| err)
    }

    /// Append a notification, waiting for space when the queue is bounded
    pub async fn enqueue_wait(&self, notification: Notification) -> Result<(), QueueError> {
        let mut pending = notification;
        loop {
            let space = self.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            match self.push(pending) {
                Ok(()) => return Ok(()),
                Err((QueueError::Full(_), returned)) => pending = returned,
                Err((err, _)) => return Err(err),
            }

            space.await;
        }
    }

    fn push(&self, notification: Notification) -> Result<(), (QueueError, Notification)> {
        let mut state = self.lock();
        if state.closed {
            return Err((QueueError::Closed, notification));
        }
        if let Some(capacity) = self.capacity {
            if state.items.len() >= capacity {
                return Err((QueueError::Full(capacity), notification));
            }
        }
        state.items.push_back(notification);
        let depth = state.items.len();
        drop(state);

        debug!(queue_depth = depth, "Notification enqueued");
        self.available.notify_one();
        Ok(())
    }

    /// Wait for the head notification and remove it.
    ///
    /// Returns [`DequeueError::Interrupted`] once per call to [`interrupt`],
    /// and [`DequeueError::Closed`] when the queue is closed and drained.
    ///
    /// [`interrupt`]: NotificationQueue::interrupt
    pub async fn dequeue(&self) -> Result<Notification, DequeueError> {
        loop {
            let available = self.available.notified();
            tokio::pin!(available);
            available.as_mut().enable();

            {
                let mut state = self.lock();
                if state.interrupted {
                    state.interrupted = false;
                    return Err(DequeueError::Interrupted);
                }
                let head = state.items.pop_front();
                if let Some(notification) = head {
                    drop(state);
                    self.space.notify_one();
                    return Ok(notification);
                }
                if state.closed {
                    return Err(DequeueError::Closed);
                }
            }

            available.await;
        }
    }

    /// Copy of the head notification, if any
    pub fn peek(&self) -> Option<Notification> {
        self.lock().items.front().cloned()
    }

    /// Wake the consumer with [`DequeueError::Interrupted`]. If nobody is
    /// waiting, the next `dequeue` call is interrupted instead.
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
        self.available.notify_waiters();
    }

    /// Stop accepting notifications. Pending ones can still be dequeued.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
        self.space.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// `None` for an unbounded queue
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}
