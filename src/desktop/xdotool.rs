//! Linux backend driving the `xdotool` command-line tool.
//!
//! X11 has no per-thread input queues, so focus is taken with
//! `windowactivate --sync` alone. Text is typed one line at a time with
//! `xdotool type` and line breaks are sent as the `Return` key.
//! Note: xdotool must be installed and an X11 (or XWayland) session running.

use std::time::Duration;

use tracing::debug;

use super::command::run_tool;
use super::{Desktop, KeyInjector, ProcessInfo, WindowHandle, WindowSystem};
use crate::error::Result;
use crate::process_finder::ProcessFinder;

const XDOTOOL: &str = "xdotool";

/// Delay between typed characters, in milliseconds.
const TYPE_DELAY_MS: &str = "12";

/// Build the xdotool desktop.
#[cfg(not(windows))]
pub fn desktop() -> Result<Desktop> {
    Ok(Desktop {
        platform: crate::transcoder::Platform::Linux,
        windows: Box::new(XdotoolWindowSystem::new()),
        injector: Box::new(XdotoolInjector),
        clipboard: Box::new(super::SystemClipboard::new()?),
    })
}

#[cfg(windows)]
pub fn desktop() -> Result<Desktop> {
    Err(crate::error::PtsError::unsupported_platform(
        "the xdotool backend is not available on Windows",
    ))
}

/// Parse whitespace separated decimal window ids.
fn parse_window_ids(output: &str) -> Vec<WindowHandle> {
    output
        .split_whitespace()
        .filter_map(|id| id.parse::<u64>().ok())
        .map(WindowHandle::new)
        .collect()
}

#[derive(Default)]
pub struct XdotoolWindowSystem {
    finder: ProcessFinder,
}

impl XdotoolWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// First visible window of `pid`; X11 has no main-window notion.
    fn main_window(pid: u32) -> Option<WindowHandle> {
        let pid = pid.to_string();
        run_tool(XDOTOOL, &["search", "--onlyvisible", "--pid", &pid])
            .ok()
            .and_then(|output| parse_window_ids(&output).into_iter().next())
    }
}

impl WindowSystem for XdotoolWindowSystem {
    fn find_processes_by_name(&self, name: &str) -> Result<Vec<ProcessInfo>> {
        Ok(self
            .finder
            .find_by_name(name)
            .into_iter()
            .map(|process| ProcessInfo {
                main_window: Self::main_window(process.pid),
                pid: process.pid,
                name: process.name,
            })
            .collect())
    }

    fn wait_for_input_idle(&self, _process: &ProcessInfo, _timeout: Duration) -> bool {
        true
    }

    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        // `search` exits non-zero when nothing matches
        match run_tool(XDOTOOL, &["search", "--onlyvisible", "--name", "."]) {
            Ok(output) => Ok(parse_window_ids(&output)),
            Err(e) => {
                debug!("xdotool search returned no windows: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn window_owner_process_id(&self, window: WindowHandle) -> Option<u32> {
        let id = window.raw().to_string();
        run_tool(XDOTOOL, &["getwindowpid", &id])
            .ok()
            .and_then(|pid| pid.parse().ok())
    }

    fn window_title(&self, window: WindowHandle) -> String {
        let id = window.raw().to_string();
        run_tool(XDOTOOL, &["getwindowname", &id]).unwrap_or_default()
    }

    fn window_thread_id(&self, _window: WindowHandle) -> Option<u32> {
        None
    }

    fn current_thread_id(&self) -> Option<u32> {
        None
    }

    fn get_foreground_window(&self) -> Option<WindowHandle> {
        run_tool(XDOTOOL, &["getactivewindow"])
            .ok()
            .and_then(|output| parse_window_ids(&output).into_iter().next())
    }

    fn set_foreground_window(&self, window: WindowHandle) -> bool {
        let id = window.raw().to_string();
        run_tool(XDOTOOL, &["windowactivate", "--sync", &id]).is_ok()
    }

    fn restore_from_minimized(&self, window: WindowHandle) -> bool {
        // windowactivate de-iconifies under EWMH window managers; map covers the rest.
        let id = window.raw().to_string();
        run_tool(XDOTOOL, &["windowmap", &id]).is_ok()
    }

    fn attach_input_queues(&self, _thread: u32, _target_thread: u32, _attach: bool) -> bool {
        false
    }
}

/// Types into the focused window with `xdotool type` / `xdotool key`.
pub struct XdotoolInjector;

impl KeyInjector for XdotoolInjector {
    fn send_key_sequence(&self, text: &str) -> Result<()> {
        run_tool(XDOTOOL, &["type", "--delay", TYPE_DELAY_MS, "--", text]).map(drop)
    }

    fn send_line_break(&self) -> Result<()> {
        run_tool(XDOTOOL, &["key", "Return"]).map(drop)
    }

    fn send_paste_combo(&self) -> Result<()> {
        run_tool(XDOTOOL, &["type", "--", " "])?;
        run_tool(XDOTOOL, &["key", "BackSpace"])?;
        run_tool(XDOTOOL, &["key", "ctrl+v"]).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_ids() {
        let ids = parse_window_ids("62914561\n62914575\nbogus\n");
        assert_eq!(
            ids,
            vec![WindowHandle::new(62914561), WindowHandle::new(62914575)]
        );
        assert!(parse_window_ids("").is_empty());
    }
}
