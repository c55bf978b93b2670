//! Delivery orchestration.
//!
//! [`KeySender`] resolves the target window, takes focus, sends each payload
//! by the chosen path and restores the foreground window and clipboard on
//! the way out.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{Config, DeliveryMode, FailurePolicy};
use crate::desktop::{Desktop, ProcessInfo, WindowHandle};
use crate::error::{PtsError, Result};
use crate::focus::{ClipboardGuard, FocusGuard};
use crate::payload::{InputPayload, TargetSpec};
use crate::transcoder::{self, OutputStyle, Platform, Transcoded};

/// Timing and policy knobs of a delivery.
#[derive(Debug, Clone)]
pub struct SendOptions {
    pub delivery_mode: DeliveryMode,
    pub failure_policy: FailurePolicy,
    pub input_idle_timeout: Duration,
    pub focus_delay: Duration,
    pub paste_delay: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::from(&Config::new(""))
    }
}

impl From<&Config> for SendOptions {
    fn from(config: &Config) -> Self {
        Self {
            delivery_mode: config.delivery_mode,
            failure_policy: config.failure_policy,
            input_idle_timeout: config.input_idle_timeout,
            focus_delay: config.focus_delay,
            paste_delay: config.paste_delay,
        }
    }
}

/// The window a delivery resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub process: ProcessInfo,
    pub window: WindowHandle,
}

/// Path a payload takes to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    Direct,
    Clipboard,
}

/// A payload that could not be delivered.
#[derive(Debug)]
pub struct PayloadFailure {
    pub index: usize,
    pub error: PtsError,
}

/// Outcome of one `send` call.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<usize>,
    pub failures: Vec<PayloadFailure>,
    pub skipped: Vec<usize>,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// The first failure as an error, if any payload failed.
    pub fn into_result(self) -> Result<()> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }
}

/// Sends payloads to the window of a named process.
pub struct KeySender {
    desktop: Desktop,
    options: SendOptions,
}

impl KeySender {
    pub fn new(desktop: Desktop, options: SendOptions) -> Self {
        Self { desktop, options }
    }

    pub fn platform(&self) -> Platform {
        self.desktop.platform
    }

    pub fn options(&self) -> &SendOptions {
        &self.options
    }

    /// Transcoded form of each payload, without touching the desktop.
    pub fn preview(&self, payloads: &[InputPayload]) -> Vec<Transcoded> {
        preview(self.platform(), payloads)
    }

    /// Deliver `payloads` in order to the window resolved from `target`.
    ///
    /// Resolution failures are returned as errors before any desktop state is
    /// touched. Per-payload failures are collected in the report; the
    /// foreground window and clipboard are restored either way.
    pub fn send(&self, target: &TargetSpec, payloads: &[InputPayload]) -> Result<DeliveryReport> {
        info!(
            "Sending {} payload(s) to process '{}' on {}",
            payloads.len(),
            target.process_name,
            self.platform()
        );

        let resolved = self.resolve_target(target)?;
        info!(
            "Target window {} (PID {}, '{}')",
            resolved.window, resolved.process.pid, resolved.process.name
        );

        let focus = FocusGuard::acquire(
            self.desktop.windows.as_ref(),
            resolved.window,
            self.options.focus_delay,
        );

        let mut report = DeliveryReport::default();
        for (index, payload) in payloads.iter().enumerate() {
            match self.deliver(index, payload) {
                Ok(()) => report.delivered.push(index),
                Err(e) => {
                    error!("Payload {} failed: {}", index, e);
                    report.failures.push(PayloadFailure { index, error: e });
                    if self.options.failure_policy == FailurePolicy::AbortRemaining {
                        report.skipped.extend(index + 1..payloads.len());
                        warn!("Skipping {} remaining payload(s)", report.skipped.len());
                        break;
                    }
                }
            }
        }

        drop(focus);
        info!(
            "Delivered {}/{} payload(s)",
            report.delivered.len(),
            payloads.len()
        );
        Ok(report)
    }

    /// Find the window to deliver to.
    pub fn resolve_target(&self, target: &TargetSpec) -> Result<ResolvedTarget> {
        let windows = self.desktop.windows.as_ref();

        let processes = windows.find_processes_by_name(&target.process_name)?;
        let Some(first) = processes.first() else {
            warn!("Process '{}' was not found", target.process_name);
            return Err(PtsError::target_not_found(&target.process_name));
        };
        debug!(
            "Found {} process(es): {:?}",
            processes.len(),
            processes.iter().map(|p| p.pid).collect::<Vec<_>>()
        );

        if !windows.wait_for_input_idle(first, self.options.input_idle_timeout) {
            debug!(
                "PID {} not input-idle after {:?}, continuing",
                first.pid, self.options.input_idle_timeout
            );
        }

        if target.window_title.is_none() {
            if let Some((process, window)) = processes
                .iter()
                .find_map(|p| p.main_window.map(|window| (p, window)))
            {
                debug!("Using main window {} of PID {}", window, process.pid);
                return Ok(ResolvedTarget {
                    process: process.clone(),
                    window,
                });
            }
            debug!("No main window, enumerating top-level windows");
        }

        let pids: HashSet<u32> = processes.iter().map(|p| p.pid).collect();
        let mut enumerated = Vec::new();
        let mut matched = None;

        for window in windows.enumerate_top_level_windows()? {
            let Some(pid) = windows.window_owner_process_id(window) else {
                continue;
            };
            if !pids.contains(&pid) {
                continue;
            }
            let title = windows.window_title(window);
            debug!("handle = {} (PID {}, title '{}')", window, pid, title);
            enumerated.push(window);

            let is_match = target
                .window_title
                .as_deref()
                .is_some_and(|filter| title.contains(filter));
            if is_match && matched.is_none() {
                matched = Some((pid, window));
            }
        }

        if let Some((pid, window)) = matched {
            let process = processes
                .iter()
                .find(|p| p.pid == pid)
                .cloned()
                .unwrap_or_else(|| first.clone());
            debug!("Window {} matched title filter", window);
            return Ok(ResolvedTarget { process, window });
        }

        match &target.window_title {
            Some(filter) => warn!(
                "No window of '{}' has a title containing '{}'",
                target.process_name, filter
            ),
            None => warn!("Window handle of '{}' is invalid", target.process_name),
        }
        for window in &enumerated {
            warn!("handle = {}", window);
        }

        Err(PtsError::window_not_found(
            &target.process_name,
            target.window_title.clone(),
            enumerated,
        ))
    }

    /// Pick the delivery path for a payload.
    pub fn delivery_path(&self, payload: &InputPayload) -> DeliveryPath {
        match self.platform().output_style() {
            // Not a caller choice here: markup cannot carry everything.
            OutputStyle::Markup => {
                if self.options.delivery_mode != DeliveryMode::Auto {
                    debug!("Delivery mode is chosen automatically on {}", self.platform());
                }
                if !payload.literal && !markup_safe(&transcoder::to_plain_text(&payload.text, "\n"))
                {
                    DeliveryPath::Clipboard
                } else {
                    DeliveryPath::Direct
                }
            }
            OutputStyle::Lines => match self.options.delivery_mode {
                DeliveryMode::Clipboard => DeliveryPath::Clipboard,
                DeliveryMode::Auto | DeliveryMode::Direct => DeliveryPath::Direct,
            },
        }
    }

    fn deliver(&self, index: usize, payload: &InputPayload) -> Result<()> {
        let path = self.delivery_path(payload);
        debug!(
            "Payload {} (literal={}) via {:?}: `{}`",
            index, payload.literal, path, payload.text
        );

        match path {
            DeliveryPath::Direct => self.deliver_direct(payload),
            DeliveryPath::Clipboard => self.deliver_clipboard(payload),
        }
    }

    fn deliver_direct(&self, payload: &InputPayload) -> Result<()> {
        let injector = self.desktop.injector.as_ref();
        let transcoded = transcode_payload(self.platform(), payload);
        info!("Sending text '{}' (passed: `{}`)", transcoded.describe(), payload.text);

        match transcoded {
            Transcoded::Markup(markup) => injector.send_key_sequence(&markup),
            Transcoded::Lines(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        injector.send_line_break()?;
                    }
                    if !line.is_empty() {
                        injector.send_key_sequence(line)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn deliver_clipboard(&self, payload: &InputPayload) -> Result<()> {
        let text = if payload.literal {
            payload.text.clone()
        } else {
            transcoder::to_plain_text(&payload.text, self.platform().newline())
        };
        info!("Pasting {} char(s) through the clipboard", text.chars().count());

        let clipboard = ClipboardGuard::capture(self.desktop.clipboard.as_ref())?;
        clipboard.set_text(&text)?;
        pause(self.options.paste_delay);

        let pasted = self.desktop.injector.send_paste_combo();
        pause(self.options.paste_delay);
        drop(clipboard);
        pasted
    }
}

/// What each payload would be sent as on `platform`.
pub fn preview(platform: Platform, payloads: &[InputPayload]) -> Vec<Transcoded> {
    payloads
        .iter()
        .map(|payload| transcode_payload(platform, payload))
        .collect()
}

fn transcode_payload(platform: Platform, payload: &InputPayload) -> Transcoded {
    match (payload.literal, platform.output_style()) {
        (true, OutputStyle::Markup) => Transcoded::Markup(payload.text.clone()),
        (true, OutputStyle::Lines) => Transcoded::Lines(vec![payload.text.clone()]),
        (false, style) => transcoder::transcode(&payload.text, style),
    }
}

/// Text the markup injector can type key by key.
fn markup_safe(text: &str) -> bool {
    text.chars()
        .all(|c| c == '\n' || c == '\t' || (!c.is_control() && u32::from(c) <= 0xFFFF))
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_safe() {
        assert!(markup_safe("plain ascii {with} markup+chars"));
        assert!(markup_safe("line\nbreak\tand tab, äöü"));
        assert!(!markup_safe("emoji \u{1F600}"));
        assert!(!markup_safe("bell \u{7}"));
    }

    #[test]
    fn test_preview_keeps_literal_payloads() {
        let payloads = [InputPayload::escaped("a\\nb"), InputPayload::literal("a\\nb")];
        assert_eq!(
            preview(Platform::Linux, &payloads),
            vec![
                Transcoded::Lines(vec!["a".to_string(), "b".to_string()]),
                Transcoded::Lines(vec!["a\\nb".to_string()]),
            ]
        );
        assert_eq!(
            preview(Platform::Windows, &payloads),
            vec![
                Transcoded::Markup("a{ENTER}b".to_string()),
                Transcoded::Markup("a\\nb".to_string()),
            ]
        );
    }

    #[test]
    fn test_report_success() {
        let mut report = DeliveryReport::default();
        report.delivered.push(0);
        assert!(report.is_success());

        report.failures.push(PayloadFailure {
            index: 1,
            error: PtsError::delivery_failed("type", "exit status 1"),
        });
        assert!(!report.is_success());
        assert!(matches!(
            report.into_result(),
            Err(PtsError::DeliveryFailed { .. })
        ));
    }
}
