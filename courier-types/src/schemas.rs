//! Notification records
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


use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

// ============================================================================
// Queued Notification
// ============================================================================

/// A fully assembled pending email
///
/// Every field is required at construction, so a value that reaches the
/// queue is always complete. The body already has user parameters
/// substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Comma separated recipient addresses
    pub send_to: String,
    pub subject: String,
    pub body: String,
    /// May be empty
    #[serde(default)]
    pub footer: String,
}

impl Notification {
    /// Create a new notification
    pub fn new(
        send_to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self {
            send_to: send_to.into(),
            subject: subject.into(),
            body: body.into(),
            footer: footer.into(),
        }
    }

    /// Decode a notification from a single JSON document
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

// ============================================================================
// Producer Configuration
// ============================================================================

/// Email settings supplied by the producer for one notification kind
/// (account confirmation, password reset, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Subject template, may contain `{key}` placeholders
    #[serde(default)]
    pub subject: String,
    /// Endpoint the confirmation link points at
    #[serde(default)]
    pub target_epr: String,
    /// Pre-set body; empty means "build the default message"
    #[serde(default)]
    pub email_body: String,
    #[serde(default)]
    pub email_footer: Option<String>,
}

impl EmailConfig {
    /// Body used when no explicit body is configured
    pub const DEFAULT_VALUE_MESSAGE: &'static str = "Please refer the link for verification";

    /// Query marker placed between the endpoint and the notification code
    pub const CONFIRMATION_MARKER: &'static str = "confirmation";
}

/// Per-recipient data that accompanies an [`EmailConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub send_to: String,
    /// Code appended to the confirmation link
    #[serde(default)]
    pub notification_code: Option<String>,
    /// Values substituted into `{key}` placeholders
    #[serde(default)]
    pub user_parameters: HashMap<String, String>,
}

impl NotificationData {
    /// Create notification data for the given recipients
    pub fn new(send_to: impl Into<String>) -> Self {
        Self {
            send_to: send_to.into(),
            ..Default::default()
        }
    }

    pub fn with_notification_code(mut self, code: impl Into<String>) -> Self {
        self.notification_code = Some(code.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_parameters.insert(key.into(), value.into());
        self
    }
}
