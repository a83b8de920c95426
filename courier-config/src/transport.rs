//! Sources for SMTP transport parameters
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


use config::{Config, Environment, File, Map, Source, Value, ValueKind};
use courier_types::TransportConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::ConfigError;

/// Supplies transport parameters for one dispatch cycle.
///
/// Implementations are queried on every cycle and must not cache a snapshot
/// across calls: the parameters may be reconfigured while the worker runs.
/// `resolve` may block; the dispatcher calls it on the blocking thread pool.
pub trait TransportConfigSource: Send + Sync {
    /// Resolve a fresh transport snapshot
    fn resolve(&self) -> Result<TransportConfig, ConfigError>;
}

/// Reads transport parameters from a configuration file on every resolve.
/// Resolving does synchronous file I/O.
///
/// Keys are the dotted `mail.smtp.*` names, so a TOML file looks like:
///
/// ```toml
/// [mail.smtp]
/// host = "smtp.example.com"
/// port = 587
/// auth = true
/// user = "mailer"
/// password = "secret"
/// from = "noreply@example.com"
///
/// [mail.smtp.starttls]
/// enable = true
///
/// [transport.mail]
/// ContentType = "text/html"
/// ```
///
/// Environment variables prefixed with `COURIER_TRANSPORT__` override file
/// values (`COURIER_TRANSPORT__MAIL__SMTP__HOST`). Keys are compared
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct FileTransportSource {
    path: PathBuf,
    env_prefix: String,
}

impl FileTransportSource {
    /// Create a source backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_prefix: "COURIER_TRANSPORT".to_string(),
        }
    }

    /// Use a different environment override prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_parameters(&self) -> Result<HashMap<String, String>, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::Unavailable(format!(
                "transport file {} not found",
                self.path.display()
            )));
        }

        let settings = Config::builder()
            .add_source(File::from(self.path.as_path()))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut parameters = HashMap::new();
        flatten("", settings.collect()?, &mut parameters);

        debug!(
            path = %self.path.display(),
            parameter_count = parameters.len(),
            "Transport parameters loaded"
        );

        Ok(parameters)
    }
}

impl TransportConfigSource for FileTransportSource {
    fn resolve(&self) -> Result<TransportConfig, ConfigError> {
        let parameters = self.load_parameters()?;
        let config =
            TransportConfig::from_parameters(|key| parameters.get(&key.to_lowercase()).cloned())?;
        Ok(config)
    }
}

fn flatten(prefix: &str, table: Map<String, Value>, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        if matches!(value.kind, ValueKind::Table(_)) {
            if let Ok(inner) = value.into_table() {
                flatten(&path, inner, out);
            }
        } else if let Ok(text) = value.into_string() {
            out.insert(path.to_lowercase(), text);
        }
    }
}

/// In-memory parameters that can be swapped while the worker runs
#[derive(Debug, Default)]
pub struct StaticTransportSource {
    parameters: RwLock<Option<HashMap<String, String>>>,
}

impl StaticTransportSource {
    /// Create a source with the given parameters
    pub fn new<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            parameters: RwLock::new(Some(parameters)),
        }
    }

    /// Create a source whose configuration context cannot be resolved
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Set or replace a single parameter
    pub fn set_parameter(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut guard = self.parameters.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
    }

    /// Remove a single parameter
    pub fn remove_parameter(&self, key: &str) {
        let mut guard = self.parameters.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(parameters) = guard.as_mut() {
            parameters.remove(key);
        }
    }
}

impl TransportConfigSource for StaticTransportSource {
    fn resolve(&self) -> Result<TransportConfig, ConfigError> {
        let guard = self.parameters.read().unwrap_or_else(PoisonError::into_inner);
        let parameters = guard
            .as_ref()
            .ok_or_else(|| ConfigError::Unavailable("no transport parameters configured".to_string()))?;

        let config = TransportConfig::from_parameters(|key| parameters.get(key).cloned())?;
        Ok(config)
    }
}
