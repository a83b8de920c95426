//! SMTP transmission
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


use async_trait::async_trait;
use courier_types::TransportConfig;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

use crate::compose::OutboundEmail;
use crate::error::DispatchError;

/// Default network timeout for one SMTP exchange
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one assembled email with the settings resolved for this cycle
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        config: &TransportConfig,
        email: &OutboundEmail,
    ) -> Result<(), DispatchError>;
}

/// Opens a fresh SMTP session for every send
#[derive(Debug, Clone)]
pub struct SmtpMailTransport {
    timeout: Duration,
}

impl SmtpMailTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build the session for one send. Credentials are attached only when
    /// authentication is enabled and are dropped with the session.
    fn session(
        &self,
        config: &TransportConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
        let mut builder = if config.starttls_enabled {
            let tls = TlsParameters::new(config.smtp_host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.as_str())
                .tls(Tls::Opportunistic(tls))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.as_str())
        };

        builder = builder
            .port(config.smtp_port)
            .timeout(Some(self.timeout));

        if config.auth_enabled {
            builder = builder.credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(builder.build())
    }
}

impl Default for SmtpMailTransport {
    fn default() -> Self {
        Self::new(DEFAULT_SMTP_TIMEOUT)
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(
        &self,
        config: &TransportConfig,
        email: &OutboundEmail,
    ) -> Result<(), DispatchError> {
        let message = email.to_message()?;
        let session = self.session(config)?;

        debug!(
            smtp_host = %config.smtp_host,
            smtp_port = config.smtp_port,
            starttls = config.starttls_enabled,
            auth = config.auth_enabled,
            "Opening SMTP session"
        );

        session.send(message).await?;
        Ok(())
    }
}
