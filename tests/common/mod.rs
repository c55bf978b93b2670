//! In-memory desktop used by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use process_text_sender::desktop::{
    ClipboardAccess, ClipboardFormat, ClipboardSnapshot, Desktop, KeyInjector, ProcessInfo,
    WindowHandle, WindowSystem,
};
use process_text_sender::{Platform, PtsError, Result, SendOptions};

/// Something the fake desktop was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Attach { thread: u32, target: u32 },
    Detach { thread: u32, target: u32 },
    Restore(WindowHandle),
    Foreground(WindowHandle),
    Keys(String),
    LineBreak,
    Paste,
    ClipboardSet(String),
    ClipboardRestore,
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub handle: WindowHandle,
    pub pid: u32,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub processes: Vec<ProcessInfo>,
    pub windows: Vec<FakeWindow>,
    pub foreground: Option<WindowHandle>,
    pub clipboard: ClipboardSnapshot,
    pub events: Vec<Event>,
    /// Key sequences containing this text fail.
    pub fail_keys_containing: Option<String>,
    pub fail_paste: bool,
    pub fail_clipboard_snapshot: bool,
    pub input_idle: bool,
    /// Thread ids of the caller; `None` models platforms without input queues.
    pub current_thread: Option<u32>,
}

#[derive(Clone, Default)]
pub struct FakeDesktop {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        let desktop = Self::default();
        desktop.state.borrow_mut().input_idle = true;
        desktop
    }

    /// Add a process with the given windows; the first window is its main window
    /// when `with_main_window` is set.
    pub fn add_process(
        &self,
        pid: u32,
        name: &str,
        windows: &[(u64, &str)],
        with_main_window: bool,
    ) {
        let mut state = self.state.borrow_mut();
        let main_window = with_main_window
            .then(|| windows.first().map(|(raw, _)| WindowHandle::new(*raw)))
            .flatten();
        state.processes.push(ProcessInfo {
            pid,
            name: name.to_string(),
            main_window,
        });
        for (raw, title) in windows {
            state.windows.push(FakeWindow {
                handle: WindowHandle::new(*raw),
                pid,
                title: title.to_string(),
            });
        }
    }

    pub fn set_foreground(&self, window: u64) {
        self.state.borrow_mut().foreground = Some(WindowHandle::new(window));
    }

    pub fn set_clipboard_text(&self, text: &str) {
        let mut snapshot = ClipboardSnapshot::new();
        snapshot.insert(ClipboardFormat::Text, text.as_bytes().to_vec());
        self.state.borrow_mut().clipboard = snapshot;
    }

    pub fn foreground(&self) -> Option<WindowHandle> {
        self.state.borrow().foreground
    }

    pub fn clipboard(&self) -> ClipboardSnapshot {
        self.state.borrow().clipboard.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Only the input events, in order.
    pub fn typed(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Keys(_) | Event::LineBreak | Event::Paste))
            .collect()
    }

    pub fn desktop(&self, platform: Platform) -> Desktop {
        Desktop {
            platform,
            windows: Box::new(self.clone()),
            injector: Box::new(self.clone()),
            clipboard: Box::new(self.clone()),
        }
    }

    fn record(&self, event: Event) {
        self.state.borrow_mut().events.push(event);
    }

    fn window(&self, handle: WindowHandle) -> Option<FakeWindow> {
        self.state
            .borrow()
            .windows
            .iter()
            .find(|w| w.handle == handle)
            .cloned()
    }
}

impl WindowSystem for FakeDesktop {
    fn find_processes_by_name(&self, name: &str) -> Result<Vec<ProcessInfo>> {
        Ok(self
            .state
            .borrow()
            .processes
            .iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }

    fn wait_for_input_idle(&self, _process: &ProcessInfo, _timeout: Duration) -> bool {
        self.state.borrow().input_idle
    }

    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        Ok(self.state.borrow().windows.iter().map(|w| w.handle).collect())
    }

    fn window_owner_process_id(&self, window: WindowHandle) -> Option<u32> {
        self.window(window).map(|w| w.pid)
    }

    fn window_title(&self, window: WindowHandle) -> String {
        self.window(window).map(|w| w.title).unwrap_or_default()
    }

    fn window_thread_id(&self, window: WindowHandle) -> Option<u32> {
        self.state.borrow().current_thread?;
        self.window(window).map(|w| w.pid * 10)
    }

    fn current_thread_id(&self) -> Option<u32> {
        self.state.borrow().current_thread
    }

    fn get_foreground_window(&self) -> Option<WindowHandle> {
        self.state.borrow().foreground
    }

    fn set_foreground_window(&self, window: WindowHandle) -> bool {
        self.record(Event::Foreground(window));
        self.state.borrow_mut().foreground = Some(window);
        true
    }

    fn restore_from_minimized(&self, window: WindowHandle) -> bool {
        self.record(Event::Restore(window));
        true
    }

    fn attach_input_queues(&self, thread: u32, target: u32, attach: bool) -> bool {
        self.record(if attach {
            Event::Attach { thread, target }
        } else {
            Event::Detach { thread, target }
        });
        true
    }
}

impl KeyInjector for FakeDesktop {
    fn send_key_sequence(&self, text: &str) -> Result<()> {
        let fails = matches!(
            &self.state.borrow().fail_keys_containing,
            Some(needle) if text.contains(needle.as_str())
        );
        if fails {
            return Err(PtsError::delivery_failed("type", "injected failure"));
        }
        self.record(Event::Keys(text.to_string()));
        Ok(())
    }

    fn send_line_break(&self) -> Result<()> {
        self.record(Event::LineBreak);
        Ok(())
    }

    fn send_paste_combo(&self) -> Result<()> {
        if self.state.borrow().fail_paste {
            return Err(PtsError::delivery_failed("paste", "injected failure"));
        }
        self.record(Event::Paste);
        Ok(())
    }
}

impl ClipboardAccess for FakeDesktop {
    fn snapshot(&self) -> Result<ClipboardSnapshot> {
        let state = self.state.borrow();
        if state.fail_clipboard_snapshot {
            return Err(PtsError::clipboard("clipboard is locked"));
        }
        Ok(state.clipboard.clone())
    }

    fn set_text(&self, text: &str) -> Result<()> {
        self.record(Event::ClipboardSet(text.to_string()));
        let mut snapshot = ClipboardSnapshot::new();
        snapshot.insert(ClipboardFormat::Text, text.as_bytes().to_vec());
        self.state.borrow_mut().clipboard = snapshot;
        Ok(())
    }

    fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<()> {
        self.record(Event::ClipboardRestore);
        self.state.borrow_mut().clipboard = snapshot.clone();
        Ok(())
    }
}

/// Options with every delay zeroed.
pub fn fast_options() -> SendOptions {
    SendOptions {
        input_idle_timeout: Duration::ZERO,
        focus_delay: Duration::ZERO,
        paste_delay: Duration::ZERO,
        ..SendOptions::default()
    }
}

/// Log output captured from a tracing subscriber.
#[derive(Clone, Default)]
pub struct SharedLogBuffer {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedLogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter {
            buffer: self.buffer.clone(),
        }
    }
}

pub struct SharedLogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with log events at `level` and above captured.
pub fn capture_logs<T>(level: &str, f: impl FnOnce() -> T) -> (T, String) {
    let logs = SharedLogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_writer(logs.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}
