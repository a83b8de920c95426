//! SMTP transport parameters

use std::fmt;

use crate::error::{CourierError, Result};

pub const MAIL_SMTP_HOST: &str = "mail.smtp.host";
pub const MAIL_SMTP_PORT: &str = "mail.smtp.port";
pub const MAIL_SMTP_STARTTLS: &str = "mail.smtp.starttls.enable";
pub const MAIL_SMTP_AUTH: &str = "mail.smtp.auth";
pub const MAIL_SMTP_USER: &str = "mail.smtp.user";
pub const MAIL_SMTP_PASSWORD: &str = "mail.smtp.password";
pub const MAIL_SMTP_FROM: &str = "mail.smtp.from";
pub const MAIL_CONTENT_TYPE: &str = "transport.mail.ContentType";

/// Content type used when the source does not provide one
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Snapshot of the SMTP settings for a single send.
///
/// Resolved fresh for every dispatch cycle and dropped when the cycle ends,
/// so credentials never outlive one attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub starttls_enabled: bool,
    pub auth_enabled: bool,
    pub smtp_user: String,
    pub smtp_password: String,
    pub smtp_from: String,
    pub content_type: String,
}

impl TransportConfig {
    /// Build a snapshot from keyed parameters.
    ///
    /// Every key except [`MAIL_CONTENT_TYPE`] is required. Boolean flags
    /// follow the `"true"`/`"false"` convention (anything other than `true`,
    /// case-insensitive, is false).
    pub fn from_parameters<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key).ok_or_else(|| CourierError::MissingParameter(key.to_string()))
        };

        let smtp_host = required(MAIL_SMTP_HOST)?;
        let port = required(MAIL_SMTP_PORT)?;
        let smtp_port = port.trim().parse::<u16>().map_err(|_| CourierError::InvalidParameter {
            key: MAIL_SMTP_PORT.to_string(),
            value: port.clone(),
        })?;
        let starttls_enabled = parse_flag(&required(MAIL_SMTP_STARTTLS)?);
        let auth_enabled = parse_flag(&required(MAIL_SMTP_AUTH)?);
        let smtp_user = required(MAIL_SMTP_USER)?;
        let smtp_password = required(MAIL_SMTP_PASSWORD)?;
        let smtp_from = required(MAIL_SMTP_FROM)?;
        let content_type =
            lookup(MAIL_CONTENT_TYPE).unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Self {
            smtp_host,
            smtp_port,
            starttls_enabled,
            auth_enabled,
            smtp_user,
            smtp_password,
            smtp_from,
            content_type,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("starttls_enabled", &self.starttls_enabled)
            .field("auth_enabled", &self.auth_enabled)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"<redacted>")
            .field("smtp_from", &self.smtp_from)
            .field("content_type", &self.content_type)
            .finish()
    }
}
