//! Dispatch error taxonomy
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


use courier_config::ConfigError;
use courier_types::CourierError;
use thiserror::Error;

/// Errors returned to producers by the notification queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Notification queue is full (capacity {0})")]
    Full(usize),

    #[error("Notification queue is closed")]
    Closed,
}

/// Errors returned to the consumer while waiting on the queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    #[error("Notification queue closed and drained")]
    Closed,

    #[error("Interrupted while waiting for a notification")]
    Interrupted,
}

/// Errors from one dispatch cycle.
///
/// None of these reach producers; the dispatcher records them and moves on
/// to the next notification.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Interrupted while waiting until a notification becomes available")]
    InterruptedWait,

    #[error("Notification queue closed")]
    QueueClosed,

    #[error("Invalid email address: {0:?}")]
    InvalidAddress(String),

    #[error("Missing transport configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid transport configuration {key}: {value:?}")]
    InvalidConfiguration { key: String, value: String },

    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    #[error("SMTP transport failure: {reason}")]
    TransportFailure { reason: String, transient: bool },
}

impl DispatchError {
    /// Whether a later attempt could succeed with the same input
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportFailure { transient: true, .. })
    }
}

impl From<DequeueError> for DispatchError {
    fn from(err: DequeueError) -> Self {
        match err {
            DequeueError::Closed => Self::QueueClosed,
            DequeueError::Interrupted => Self::InterruptedWait,
        }
    }
}

impl From<ConfigError> for DispatchError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Parameter(CourierError::MissingParameter(key)) => {
                Self::MissingConfiguration(key)
            }
            ConfigError::Parameter(CourierError::InvalidParameter { key, value }) => {
                Self::InvalidConfiguration { key, value }
            }
            ConfigError::InvalidSetting { name, value } => {
                Self::InvalidConfiguration { key: name, value }
            }
            other => Self::MissingConfiguration(other.to_string()),
        }
    }
}

impl From<lettre::transport::smtp::Error> for DispatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::TransportFailure {
            transient: err.is_transient() || err.is_timeout(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dequeue_errors_map_to_dispatch_errors() {
        assert!(matches!(
            DispatchError::from(DequeueError::Interrupted),
            DispatchError::InterruptedWait
        ));
        assert!(matches!(
            DispatchError::from(DequeueError::Closed),
            DispatchError::QueueClosed
        ));
    }

    #[test]
    fn test_missing_parameter_keeps_key() {
        let err = DispatchError::from(ConfigError::Parameter(CourierError::MissingParameter(
            "mail.smtp.host".to_string(),
        )));

        match err {
            DispatchError::MissingConfiguration(key) => assert_eq!(key, "mail.smtp.host"),
            other => panic!("expected missing configuration, got {:?}", other),
        }
        assert!(!DispatchError::QueueClosed.is_transient());
    }
}
