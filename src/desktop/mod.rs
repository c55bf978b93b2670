//! Desktop collaborators: window inspection, focus control, synthetic input
//! and clipboard access.
//!
//! The orchestrator only talks to the traits defined here. Concrete backends
//! live in the submodules and are picked at runtime by [`Desktop::for_platform`]
//! so the delivery logic stays platform-agnostic and can run against fakes
//! in tests.

mod clipboard;
mod command;
pub mod macos;
pub mod windows;
pub mod xdotool;

pub use clipboard::SystemClipboard;

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::transcoder::Platform;

/// Opaque identifier of a top-level window.
///
/// The backend that produced it owns the underlying OS object; a handle is
/// only meaningful for the duration of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(u64);

impl WindowHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// A running process that matched the requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// The process's well-defined main window, if the platform knows one.
    pub main_window: Option<WindowHandle>,
}

/// Process lookup, window enumeration and focus control.
pub trait WindowSystem {
    fn find_processes_by_name(&self, name: &str) -> Result<Vec<ProcessInfo>>;

    /// Bounded wait for the process to accept input. Returns `false` on timeout.
    fn wait_for_input_idle(&self, process: &ProcessInfo, timeout: Duration) -> bool;

    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>>;

    fn window_owner_process_id(&self, window: WindowHandle) -> Option<u32>;

    fn window_title(&self, window: WindowHandle) -> String;

    /// Thread owning the window's input queue, where the platform has one.
    fn window_thread_id(&self, window: WindowHandle) -> Option<u32>;

    /// Calling thread's id, where the platform has input queues per thread.
    fn current_thread_id(&self) -> Option<u32>;

    fn get_foreground_window(&self) -> Option<WindowHandle>;

    fn set_foreground_window(&self, window: WindowHandle) -> bool;

    fn restore_from_minimized(&self, window: WindowHandle) -> bool;

    fn attach_input_queues(&self, thread: u32, target_thread: u32, attach: bool) -> bool;
}

/// Synthetic keyboard input into the focused window.
pub trait KeyInjector {
    /// Markup on markup-style platforms, one literal line elsewhere.
    fn send_key_sequence(&self, text: &str) -> Result<()>;

    fn send_line_break(&self) -> Result<()>;

    /// Type a throwaway character, delete it, then paste.
    fn send_paste_combo(&self) -> Result<()>;
}

/// Clipboard content format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardFormat {
    Text,
    Rtf,
    Html,
    /// File paths, one per line.
    Files,
    /// Image encoded as PNG.
    Png,
    /// Any other format by its platform name, payload stored as raw bytes.
    Other(String),
}

/// Full clipboard content captured before a paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    entries: Vec<(ClipboardFormat, Vec<u8>)>,
}

impl ClipboardSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, format: ClipboardFormat, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(f, _)| *f == format) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((format, data)),
        }
    }

    pub fn get(&self, format: &ClipboardFormat) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(f, _)| f == format)
            .map(|(_, data)| data.as_slice())
    }

    pub fn text(&self) -> Option<&str> {
        self.get(&ClipboardFormat::Text)
            .and_then(|data| std::str::from_utf8(data).ok())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ClipboardFormat, &[u8])> {
        self.entries
            .iter()
            .map(|(format, data)| (format, data.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// System clipboard.
pub trait ClipboardAccess {
    fn snapshot(&self) -> Result<ClipboardSnapshot>;

    fn set_text(&self, text: &str) -> Result<()>;

    /// Replace the clipboard with `snapshot`; an empty snapshot clears it.
    fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<()>;
}

/// The desktop collaborators for one platform.
pub struct Desktop {
    pub platform: Platform,
    pub windows: Box<dyn WindowSystem>,
    pub injector: Box<dyn KeyInjector>,
    pub clipboard: Box<dyn ClipboardAccess>,
}

impl Desktop {
    /// Backends for the platform this process runs on.
    pub fn detect() -> Result<Self> {
        Self::for_platform(Platform::current()?)
    }

    pub fn for_platform(platform: Platform) -> Result<Self> {
        tracing::debug!("Selecting desktop backend for {}", platform);
        match platform {
            Platform::Windows => windows::desktop(),
            Platform::Linux => xdotool::desktop(),
            Platform::MacOs => macos::desktop(),
        }
    }
}

impl fmt::Debug for Desktop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Desktop")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_handle_display() {
        assert_eq!(WindowHandle::new(0xabc).to_string(), "0000000000000ABC");
    }

    #[test]
    fn test_snapshot_insert_replaces_format() {
        let mut snapshot = ClipboardSnapshot::new();
        snapshot.insert(ClipboardFormat::Text, b"one".to_vec());
        snapshot.insert(ClipboardFormat::Other("text/uri-list".into()), vec![1, 2, 3]);
        snapshot.insert(ClipboardFormat::Text, b"two".to_vec());

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.text(), Some("two"));
        assert_eq!(
            snapshot.get(&ClipboardFormat::Other("text/uri-list".into())),
            Some(&[1u8, 2, 3][..])
        );
        assert!(snapshot.get(&ClipboardFormat::Html).is_none());
    }
}
