//! Scoped ownership of desktop-global state.
//!
//! [`FocusGuard`] takes the foreground for a target window and [`ClipboardGuard`]
//! holds a clipboard snapshot. Both put the previous state back when dropped,
//! so every exit path (success, `?` early return, panic unwind) restores it.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::desktop::{ClipboardAccess, ClipboardSnapshot, WindowHandle, WindowSystem};
use crate::error::Result;

/// Input focus held on a target window.
pub struct FocusGuard<'a> {
    windows: &'a dyn WindowSystem,
    target: WindowHandle,
    previous: Option<WindowHandle>,
    attached: Option<(u32, u32)>,
}

impl<'a> FocusGuard<'a> {
    /// Record the current foreground window, attach input queues where the
    /// platform has them, restore `target` if minimized and bring it forward.
    pub fn acquire(windows: &'a dyn WindowSystem, target: WindowHandle, settle: Duration) -> Self {
        let previous = windows.get_foreground_window();
        match previous {
            Some(window) => debug!("Current foreground window: {}", window),
            None => debug!("No foreground window recorded"),
        }

        let mut guard = Self {
            windows,
            target,
            previous,
            attached: None,
        };

        if let (Some(current), Some(target_thread)) =
            (windows.current_thread_id(), windows.window_thread_id(target))
        {
            if current != target_thread
                && windows.attach_input_queues(current, target_thread, true)
            {
                debug!("Attached input of thread {} to {}", current, target_thread);
                guard.attached = Some((current, target_thread));
            } else {
                debug!("Input queues of {} and {} not attached", current, target_thread);
            }
        }

        if !windows.restore_from_minimized(target) {
            warn!("Could not restore window {} from minimized state", target);
        }
        if windows.set_foreground_window(target) {
            info!("Window {} brought to foreground", target);
        } else {
            warn!("SetForeground for window {} was refused", target);
        }

        if !settle.is_zero() {
            thread::sleep(settle);
        }
        guard
    }

    pub fn target(&self) -> WindowHandle {
        self.target
    }

    pub fn previous(&self) -> Option<WindowHandle> {
        self.previous
    }
}

impl Drop for FocusGuard<'_> {
    fn drop(&mut self) {
        if let Some((current, target_thread)) = self.attached.take() {
            if !self.windows.attach_input_queues(current, target_thread, false) {
                warn!("Failed to detach input of thread {} from {}", current, target_thread);
            }
        }

        if let Some(previous) = self.previous.take() {
            if previous == self.target {
                return;
            }
            if self.windows.set_foreground_window(previous) {
                debug!("Restored foreground window {}", previous);
            } else {
                warn!("Failed to restore foreground window {}", previous);
            }
        }
    }
}

/// Clipboard content held aside while a paste is in flight.
pub struct ClipboardGuard<'a> {
    clipboard: &'a dyn ClipboardAccess,
    snapshot: Option<ClipboardSnapshot>,
}

impl<'a> ClipboardGuard<'a> {
    /// Snapshot the current clipboard.
    pub fn capture(clipboard: &'a dyn ClipboardAccess) -> Result<Self> {
        let snapshot = clipboard.snapshot()?;
        debug!("Saved clipboard with {} format(s)", snapshot.len());
        Ok(Self {
            clipboard,
            snapshot: Some(snapshot),
        })
    }

    pub fn set_text(&self, text: &str) -> Result<()> {
        self.clipboard.set_text(text)
    }
}

impl Drop for ClipboardGuard<'_> {
    fn drop(&mut self) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        match self.clipboard.restore(&snapshot) {
            Ok(()) => debug!("Restored clipboard ({} format(s))", snapshot.len()),
            Err(e) => warn!("Failed to restore clipboard: {}", e),
        }
    }
}
