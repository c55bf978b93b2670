//! Job configuration.
//!
//! A job names the target process, an optional window-title filter and the
//! payloads to type. It comes from command-line flags or a JSON file:
//!
//! ```json
//! {
//!   "process_name": "notepad",
//!   "window_title": "Untitled",
//!   "payloads": [
//!     {"text": "Hello\\nWorld"},
//!     {"text": "^a", "literal": true}
//!   ],
//!   "focus_delay": "200ms"
//! }
//! ```
//!
//! Configuration is read-only; nothing is ever written back.

use std::fs;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{PtsError, Result};
use crate::payload::{InputPayload, TargetSpec};

/// How payload text reaches the target window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Let the platform decide per payload.
    #[default]
    Auto,
    /// Synthetic key injection.
    Direct,
    /// Clipboard substitution plus a paste shortcut.
    Clipboard,
}

/// What a failed payload does to the rest of the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drop the failing payload's remaining lines, go on with the next payload.
    #[default]
    ContinueWithNextPayload,
    /// Stop at the first failure; later payloads are skipped.
    AbortRemaining,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub process_name: String,

    #[serde(default)]
    pub window_title: Option<String>,

    #[serde(default)]
    pub payloads: Vec<InputPayload>,

    #[serde(default)]
    pub delivery_mode: DeliveryMode,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(
        default = "default_input_idle_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub input_idle_timeout: Duration,

    #[serde(
        default = "default_focus_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub focus_delay: Duration,

    #[serde(
        default = "default_paste_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub paste_delay: Duration,

    #[serde(default)]
    pub verbose: bool,
}

fn default_input_idle_timeout() -> Duration {
    Duration::from_millis(1000)
}

fn default_focus_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_paste_delay() -> Duration {
    Duration::from_millis(80)
}

impl Config {
    /// A job with default timings.
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            window_title: None,
            payloads: Vec::new(),
            delivery_mode: DeliveryMode::default(),
            failure_policy: FailurePolicy::default(),
            input_idle_timeout: default_input_idle_timeout(),
            focus_delay: default_focus_delay(),
            paste_delay: default_paste_delay(),
            verbose: false,
        }
    }

    /// Load a job from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| PtsError::config_load(path, e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| PtsError::config_load(path, e.to_string()))
    }

    pub fn target(&self) -> TargetSpec {
        TargetSpec {
            process_name: self.process_name.clone(),
            window_title: self.window_title.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.process_name.trim().is_empty() {
            return Err(PtsError::config_validation("process_name cannot be empty"));
        }

        if matches!(&self.window_title, Some(title) if title.is_empty()) {
            return Err(PtsError::config_validation(
                "window_title cannot be empty when given",
            ));
        }

        if self.payloads.is_empty() {
            return Err(PtsError::config_validation(
                "at least one payload must be configured",
            ));
        }

        if self.input_idle_timeout > Duration::from_secs(60) {
            return Err(PtsError::config_validation(
                "input_idle_timeout cannot exceed 60s",
            ));
        }

        Ok(())
    }
}

/// Parse a human duration: `500ms`, `2s`, `1m`, or bare milliseconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(PtsError::invalid_duration(value, "empty duration"));
    }

    let (number, unit_millis) = if let Some(number) = normalized.strip_suffix("ms") {
        (number, 1)
    } else if let Some(number) = normalized.strip_suffix('s') {
        (number, 1_000)
    } else if let Some(number) = normalized.strip_suffix('m') {
        (number, 60_000)
    } else {
        (normalized.as_str(), 1)
    };

    let amount: u64 = number
        .trim()
        .parse()
        .map_err(|_| PtsError::invalid_duration(value, "expected a non-negative integer"))?;

    amount
        .checked_mul(unit_millis)
        .map(Duration::from_millis)
        .ok_or_else(|| PtsError::invalid_duration(value, "duration too large"))
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Millis(u64),
        Text(String),
    }

    match RawDuration::deserialize(deserializer)? {
        RawDuration::Millis(ms) => Ok(Duration::from_millis(ms)),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
