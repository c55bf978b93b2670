//! Payloads and delivery targets.

use serde::Deserialize;

use crate::error::{PtsError, Result};

/// One unit of text to deliver.
///
/// Escaped payloads go through the transcoder; literal payloads are sent
/// exactly as given (on Windows that means as key markup, so `^a` is Ctrl+A).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputPayload {
    pub text: String,
    #[serde(default)]
    pub literal: bool,
}

impl InputPayload {
    pub fn escaped(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            literal: false,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            literal: true,
        }
    }
}

/// The window a delivery is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub process_name: String,
    /// Case-sensitive substring of the window title.
    pub window_title: Option<String>,
}

impl TargetSpec {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            window_title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }
}

/// Parse positional payload arguments: `[-r|--raw] <text>` repeated.
///
/// `--raw` marks only the text that directly follows it as literal.
pub fn parse_payload_args<S: AsRef<str>>(args: &[S]) -> Result<Vec<InputPayload>> {
    let mut payloads = Vec::with_capacity(args.len());
    let mut iter = args.iter().map(AsRef::as_ref);

    while let Some(arg) = iter.next() {
        if arg == "-r" || arg == "--raw" {
            let text = iter.next().ok_or_else(|| {
                PtsError::invalid_arguments(format!("'{arg}' must be followed by a text to send"))
            })?;
            payloads.push(InputPayload::literal(text));
        } else {
            payloads.push(InputPayload::escaped(arg));
        }
    }

    Ok(payloads)
}
