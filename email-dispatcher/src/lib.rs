//! Email Dispatcher Library
//!
//! Hands notifications from producers to a single SMTP dispatcher:
//! - Notification queue (FIFO, optional capacity)
//! - Message assembly and placeholder substitution
//! - SMTP transport (lettre) and an in-memory mock
//! - Tenant context guard and retry policy seams
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


pub mod compose;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod queue;
pub mod retry;
pub mod transport;

pub use compose::{
    compose_notification, compose_request_message, substitute_placeholders, OutboundEmail,
    LINE_SEPARATOR,
};
pub use context::{NoopTenantFlow, TenantFlow, TenantFlowGuard};
pub use dispatcher::{DispatchReport, EmailDispatcher};
pub use error::{DequeueError, DispatchError, QueueError};
pub use mock::{Delivery, MockTransport};
pub use queue::NotificationQueue;
pub use retry::{NoRetry, RetryPolicy};
pub use transport::{MailTransport, SmtpMailTransport, DEFAULT_SMTP_TIMEOUT};
