//! macOS backend driving System Events through `osascript`.
//!
//! AppleScript activates applications, not individual windows, so a window
//! handle here is the owning process id and each application contributes one
//! top-level "window" titled after its front window.

use std::time::Duration;

use tracing::debug;

use super::command::run_tool;
use super::{Desktop, KeyInjector, ProcessInfo, WindowHandle, WindowSystem};
use crate::error::Result;
use crate::process_finder::ProcessFinder;

const OSASCRIPT: &str = "osascript";

/// Build the osascript desktop.
#[cfg(not(windows))]
pub fn desktop() -> Result<Desktop> {
    Ok(Desktop {
        platform: crate::transcoder::Platform::MacOs,
        windows: Box::new(AppleScriptWindowSystem::new()),
        injector: Box::new(AppleScriptInjector),
        clipboard: Box::new(super::SystemClipboard::new()?),
    })
}

#[cfg(windows)]
pub fn desktop() -> Result<Desktop> {
    Err(crate::error::PtsError::unsupported_platform(
        "the osascript backend is not available on Windows",
    ))
}

/// Run a System Events statement and return its result.
fn system_events(statement: &str) -> Result<String> {
    let script = format!("tell application \"System Events\" to {statement}");
    run_tool(OSASCRIPT, &["-e", &script])
}

/// Quote `text` as an AppleScript string literal.
fn applescript_string(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn process_by_pid(pid: u64) -> String {
    format!("(first process whose unix id is {pid})")
}

/// Parse an AppleScript list of integers such as `412, 977, 1033`.
fn parse_pid_list(output: &str) -> Vec<u64> {
    output
        .split(',')
        .filter_map(|pid| pid.trim().parse().ok())
        .collect()
}

#[derive(Default)]
pub struct AppleScriptWindowSystem {
    finder: ProcessFinder,
}

impl AppleScriptWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowSystem for AppleScriptWindowSystem {
    fn find_processes_by_name(&self, name: &str) -> Result<Vec<ProcessInfo>> {
        Ok(self
            .finder
            .find_by_name(name)
            .into_iter()
            .map(|process| ProcessInfo {
                main_window: Some(WindowHandle::new(u64::from(process.pid))),
                pid: process.pid,
                name: process.name,
            })
            .collect())
    }

    fn wait_for_input_idle(&self, _process: &ProcessInfo, _timeout: Duration) -> bool {
        true
    }

    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        let output = system_events("get unix id of every process whose background only is false")?;
        Ok(parse_pid_list(&output)
            .into_iter()
            .map(WindowHandle::new)
            .collect())
    }

    fn window_owner_process_id(&self, window: WindowHandle) -> Option<u32> {
        u32::try_from(window.raw()).ok()
    }

    fn window_title(&self, window: WindowHandle) -> String {
        let statement = format!("get name of front window of {}", process_by_pid(window.raw()));
        system_events(&statement).unwrap_or_else(|e| {
            debug!("No front window title for {}: {}", window, e);
            String::new()
        })
    }

    fn window_thread_id(&self, _window: WindowHandle) -> Option<u32> {
        None
    }

    fn current_thread_id(&self) -> Option<u32> {
        None
    }

    fn get_foreground_window(&self) -> Option<WindowHandle> {
        system_events("get unix id of first process whose frontmost is true")
            .ok()
            .and_then(|pid| pid.trim().parse().ok())
            .map(WindowHandle::new)
    }

    fn set_foreground_window(&self, window: WindowHandle) -> bool {
        let statement = format!("set frontmost of {} to true", process_by_pid(window.raw()));
        system_events(&statement).is_ok()
    }

    fn restore_from_minimized(&self, window: WindowHandle) -> bool {
        let statement = format!(
            "set value of attribute \"AXMinimized\" of every window of {} to false",
            process_by_pid(window.raw())
        );
        system_events(&statement).is_ok()
    }

    fn attach_input_queues(&self, _thread: u32, _target_thread: u32, _attach: bool) -> bool {
        false
    }
}

/// Types into the frontmost application with `keystroke`.
pub struct AppleScriptInjector;

impl KeyInjector for AppleScriptInjector {
    fn send_key_sequence(&self, text: &str) -> Result<()> {
        system_events(&format!("keystroke {}", applescript_string(text))).map(drop)
    }

    fn send_line_break(&self) -> Result<()> {
        system_events("keystroke return").map(drop)
    }

    fn send_paste_combo(&self) -> Result<()> {
        system_events("keystroke \" \"")?;
        // key code 51 is Delete (backspace)
        system_events("key code 51")?;
        system_events("keystroke \"v\" using command down").map(drop)
    }
}
