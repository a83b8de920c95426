//! Message assembly
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


use courier_types::{EmailConfig, Notification, NotificationData, TransportConfig, MAIL_CONTENT_TYPE};
use lettre::message::{header::ContentType, Mailbox, Mailboxes};
use lettre::Message;
use std::collections::HashMap;

use crate::error::DispatchError;

/// Platform line separator placed between body and footer
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Replace every `{key}` token whose key is present in `parameters`.
///
/// Unknown tokens stay literal. The text is scanned once, so a substituted
/// value is never scanned again for further tokens.
pub fn substitute_placeholders(text: &str, parameters: &HashMap<String, String>) -> String {
    if parameters.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let replaced = after_open.find('}').and_then(|close| {
            parameters
                .get(&after_open[..close])
                .map(|value| (value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after_open[close + 1..];
            }
            None => {
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Render the body for a confirmation style notification.
///
/// Without an explicit body this is the default message followed by the
/// confirmation link (only when a code is given). The configured footer,
/// if any, is appended after a blank line.
pub fn compose_request_message(config: &EmailConfig, notification_code: Option<&str>) -> String {
    let mut msg = if config.email_body.is_empty() {
        let mut msg = String::from(EmailConfig::DEFAULT_VALUE_MESSAGE);
        msg.push('\n');
        if let Some(code) = notification_code {
            msg.push_str(&config.target_epr);
            msg.push('?');
            msg.push_str(EmailConfig::CONFIRMATION_MARKER);
            msg.push_str(code);
            msg.push('\n');
        }
        msg
    } else {
        let mut msg = config.email_body.clone();
        msg.push('\n');
        msg
    };

    if let Some(footer) = &config.email_footer {
        msg.push('\n');
        msg.push_str(footer);
    }

    msg
}

/// Build the queued notification for one recipient list.
///
/// The footer is folded into the body by [`compose_request_message`] and
/// also carried separately, so the sent email shows it twice. Both copies
/// get the same substitutions.
pub fn compose_notification(config: &EmailConfig, data: &NotificationData) -> Notification {
    let subject = substitute_placeholders(&config.subject, &data.user_parameters);
    let body = substitute_placeholders(
        &compose_request_message(config, data.notification_code.as_deref()),
        &data.user_parameters,
    );

    Notification::new(
        data.send_to.clone(),
        subject,
        body,
        substitute_placeholders(
            config.email_footer.as_deref().unwrap_or_default(),
            &data.user_parameters,
        ),
    )
}

/// A validated email ready for transmission
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub body: String,
    pub content_type: ContentType,
}

impl OutboundEmail {
    /// Validate addresses and content type, and join body and footer
    pub fn assemble(
        notification: &Notification,
        transport: &TransportConfig,
    ) -> Result<Self, DispatchError> {
        let from = parse_mailbox(&transport.smtp_from)?;
        let to = parse_recipients(&notification.send_to)?;

        let content_type = ContentType::parse(&transport.content_type).map_err(|_| {
            DispatchError::InvalidConfiguration {
                key: MAIL_CONTENT_TYPE.to_string(),
                value: transport.content_type.clone(),
            }
        })?;

        let body = format!(
            "{}{}{}{}",
            notification.body, LINE_SEPARATOR, LINE_SEPARATOR, notification.footer
        );

        Ok(Self {
            from,
            to,
            subject: notification.subject.clone(),
            body,
            content_type,
        })
    }

    /// Comma separated recipient list, for logging
    pub fn recipients(&self) -> String {
        self.to
            .iter()
            .map(|mailbox| mailbox.email.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Build the lettre message
    pub fn to_message(&self) -> Result<Message, DispatchError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.clone());

        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }

        builder
            .header(self.content_type.clone())
            .body(self.body.clone())
            .map_err(|e| DispatchError::MessageBuild(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DispatchError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| DispatchError::InvalidAddress(address.to_string()))
}

/// Parse an RFC 5322 address list; display names may be quoted and contain
/// commas
fn parse_recipients(send_to: &str) -> Result<Vec<Mailbox>, DispatchError> {
    let invalid = || DispatchError::InvalidAddress(send_to.to_string());

    if send_to.trim().is_empty() {
        return Err(invalid());
    }

    let recipients: Vec<Mailbox> = send_to
        .trim()
        .parse::<Mailboxes>()
        .map_err(|_| invalid())?
        .into_iter()
        .collect();

    if recipients.is_empty() {
        return Err(invalid());
    }

    Ok(recipients)
}
