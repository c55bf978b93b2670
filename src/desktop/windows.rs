//! Win32 backend.
//!
//! Windows is the markup-style platform: payloads arrive as key markup,
//! are parsed by [`markup_keys`](crate::markup_keys) and played back with
//! `SendInput`. Focus is taken with `AttachThreadInput` +
//! `SetForegroundWindow`.

use super::Desktop;
use crate::error::Result;

#[cfg(windows)]
pub use imp::{Win32Injector, Win32WindowSystem};

/// Build the Win32 desktop.
#[cfg(windows)]
pub fn desktop() -> Result<Desktop> {
    Ok(Desktop {
        platform: crate::transcoder::Platform::Windows,
        windows: Box::new(Win32WindowSystem::new()),
        injector: Box::new(Win32Injector),
        clipboard: Box::new(super::SystemClipboard::new()?),
    })
}

#[cfg(not(windows))]
pub fn desktop() -> Result<Desktop> {
    Err(crate::error::PtsError::unsupported_platform(
        "the Win32 backend is only available on Windows",
    ))
}

#[cfg(windows)]
mod imp {
    use std::ptr;
    use std::time::Duration;

    use tracing::debug;
    use winapi::shared::minwindef::{BOOL, DWORD, FALSE, LPARAM, TRUE, UINT};
    use winapi::shared::windef::HWND;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{GetCurrentThreadId, OpenProcess};
    use winapi::um::winnt::{PROCESS_QUERY_INFORMATION, SYNCHRONIZE};
    use winapi::um::winuser::{
        AttachThreadInput, EnumWindows, GetForegroundWindow, GetWindow, GetWindowTextLengthW,
        GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindowVisible, SendInput,
        SetForegroundWindow, ShowWindow, VkKeyScanW, WaitForInputIdle, GW_OWNER, INPUT,
        INPUT_KEYBOARD, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, SW_RESTORE, VK_BACK, VK_CONTROL,
        VK_DELETE, VK_DOWN, VK_END, VK_ESCAPE, VK_F1, VK_HOME, VK_INSERT, VK_LEFT, VK_MENU,
        VK_NEXT, VK_PRIOR, VK_RETURN, VK_RIGHT, VK_SHIFT, VK_SPACE, VK_TAB, VK_UP,
    };

    use crate::desktop::{KeyInjector, ProcessInfo, WindowHandle, WindowSystem};
    use crate::error::{PtsError, Result};
    use crate::markup_keys::{self, KeyCode, KeyStroke, NamedKey};
    use crate::process_finder::ProcessFinder;

    const WAIT_TIMEOUT: DWORD = 0x0000_0102;

    fn hwnd(window: WindowHandle) -> HWND {
        window.raw() as usize as HWND
    }

    fn handle(hwnd: HWND) -> WindowHandle {
        WindowHandle::new(hwnd as usize as u64)
    }

    unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let windows = &mut *(lparam as *mut Vec<HWND>);
        windows.push(hwnd);
        TRUE
    }

    fn all_top_level_windows() -> Vec<HWND> {
        let mut windows: Vec<HWND> = Vec::new();
        unsafe {
            EnumWindows(
                Some(collect_window),
                &mut windows as *mut Vec<HWND> as LPARAM,
            );
        }
        windows
    }

    fn owner_pid(hwnd: HWND) -> u32 {
        let mut pid: DWORD = 0;
        unsafe { GetWindowThreadProcessId(hwnd, &mut pid) };
        pid
    }

    #[derive(Default)]
    pub struct Win32WindowSystem {
        finder: ProcessFinder,
    }

    impl Win32WindowSystem {
        pub fn new() -> Self {
            Self::default()
        }

        /// First visible, unowned top-level window of `pid`.
        fn main_window(pid: u32, windows: &[HWND]) -> Option<WindowHandle> {
            windows
                .iter()
                .copied()
                .find(|&hwnd| unsafe {
                    owner_pid(hwnd) == pid
                        && IsWindowVisible(hwnd) != 0
                        && GetWindow(hwnd, GW_OWNER).is_null()
                })
                .map(handle)
        }
    }

    impl WindowSystem for Win32WindowSystem {
        fn find_processes_by_name(&self, name: &str) -> Result<Vec<ProcessInfo>> {
            let windows = all_top_level_windows();
            Ok(self
                .finder
                .find_by_name(name)
                .into_iter()
                .map(|process| ProcessInfo {
                    main_window: Self::main_window(process.pid, &windows),
                    pid: process.pid,
                    name: process.name,
                })
                .collect())
        }

        fn wait_for_input_idle(&self, process: &ProcessInfo, timeout: Duration) -> bool {
            unsafe {
                let handle =
                    OpenProcess(PROCESS_QUERY_INFORMATION | SYNCHRONIZE, FALSE, process.pid);
                if handle.is_null() {
                    debug!("OpenProcess failed for PID {}", process.pid);
                    return true;
                }
                let millis = timeout.as_millis().min(u128::from(u32::MAX)) as DWORD;
                let result = WaitForInputIdle(handle, millis);
                CloseHandle(handle);
                result != WAIT_TIMEOUT
            }
        }

        fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
            Ok(all_top_level_windows().into_iter().map(handle).collect())
        }

        fn window_owner_process_id(&self, window: WindowHandle) -> Option<u32> {
            match owner_pid(hwnd(window)) {
                0 => None,
                pid => Some(pid),
            }
        }

        fn window_title(&self, window: WindowHandle) -> String {
            unsafe {
                let len = GetWindowTextLengthW(hwnd(window));
                if len <= 0 {
                    return String::new();
                }
                let mut buffer = vec![0u16; len as usize + 1];
                let copied =
                    GetWindowTextW(hwnd(window), buffer.as_mut_ptr(), buffer.len() as i32);
                String::from_utf16_lossy(&buffer[..copied.max(0) as usize])
            }
        }

        fn window_thread_id(&self, window: WindowHandle) -> Option<u32> {
            match unsafe { GetWindowThreadProcessId(hwnd(window), ptr::null_mut()) } {
                0 => None,
                thread => Some(thread),
            }
        }

        fn current_thread_id(&self) -> Option<u32> {
            Some(unsafe { GetCurrentThreadId() })
        }

        fn get_foreground_window(&self) -> Option<WindowHandle> {
            let hwnd = unsafe { GetForegroundWindow() };
            (!hwnd.is_null()).then(|| handle(hwnd))
        }

        fn set_foreground_window(&self, window: WindowHandle) -> bool {
            unsafe { SetForegroundWindow(hwnd(window)) != 0 }
        }

        fn restore_from_minimized(&self, window: WindowHandle) -> bool {
            unsafe {
                if IsIconic(hwnd(window)) != 0 {
                    ShowWindow(hwnd(window), SW_RESTORE);
                }
            }
            true
        }

        fn attach_input_queues(&self, thread: u32, target_thread: u32, attach: bool) -> bool {
            let flag = if attach { TRUE } else { FALSE };
            unsafe { AttachThreadInput(thread, target_thread, flag) != 0 }
        }
    }

    fn key_input(vk: u16, scan: u16, flags: DWORD) -> INPUT {
        unsafe {
            let mut input: INPUT = std::mem::zeroed();
            input.type_ = INPUT_KEYBOARD;
            let ki = input.u.ki_mut();
            ki.wVk = vk;
            ki.wScan = scan;
            ki.dwFlags = flags;
            input
        }
    }

    fn named_vk(key: NamedKey) -> u16 {
        let vk = match key {
            NamedKey::Enter => VK_RETURN,
            NamedKey::Tab => VK_TAB,
            NamedKey::Escape => VK_ESCAPE,
            NamedKey::Backspace => VK_BACK,
            NamedKey::Delete => VK_DELETE,
            NamedKey::Insert => VK_INSERT,
            NamedKey::Home => VK_HOME,
            NamedKey::End => VK_END,
            NamedKey::PageUp => VK_PRIOR,
            NamedKey::PageDown => VK_NEXT,
            NamedKey::Up => VK_UP,
            NamedKey::Down => VK_DOWN,
            NamedKey::Left => VK_LEFT,
            NamedKey::Right => VK_RIGHT,
            NamedKey::Space => VK_SPACE,
            NamedKey::F(n) => VK_F1 + i32::from(n) - 1,
        };
        vk as u16
    }

    fn tap(vk: u16, inputs: &mut Vec<INPUT>) {
        inputs.push(key_input(vk, 0, 0));
        inputs.push(key_input(vk, 0, KEYEVENTF_KEYUP));
    }

    /// Expand one stroke into key-down/key-up events.
    fn stroke_inputs(stroke: &KeyStroke, inputs: &mut Vec<INPUT>) {
        let mut held = Vec::new();
        if stroke.modifiers.ctrl {
            held.push(VK_CONTROL as u16);
        }
        if stroke.modifiers.alt {
            held.push(VK_MENU as u16);
        }
        if stroke.modifiers.shift {
            held.push(VK_SHIFT as u16);
        }
        for &vk in &held {
            inputs.push(key_input(vk, 0, 0));
        }

        match stroke.key {
            KeyCode::Named(key) => tap(named_vk(key), inputs),
            KeyCode::Char(c) => {
                let mut buffer = [0u16; 2];
                let units = c.encode_utf16(&mut buffer);
                // Chords need a virtual key; plain text goes in as Unicode.
                let scan = if held.is_empty() || units.len() != 1 {
                    -1
                } else {
                    unsafe { VkKeyScanW(units[0]) }
                };
                if scan != -1 {
                    tap((scan & 0xff) as u16, inputs);
                } else {
                    for &unit in units.iter() {
                        inputs.push(key_input(0, unit, KEYEVENTF_UNICODE));
                        inputs.push(key_input(0, unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP));
                    }
                }
            }
        }

        for &vk in held.iter().rev() {
            inputs.push(key_input(vk, 0, KEYEVENTF_KEYUP));
        }
    }

    fn send_inputs(step: &str, mut inputs: Vec<INPUT>) -> Result<()> {
        if inputs.is_empty() {
            return Ok(());
        }
        let sent = unsafe {
            SendInput(
                inputs.len() as UINT,
                inputs.as_mut_ptr(),
                std::mem::size_of::<INPUT>() as i32,
            )
        };
        if sent as usize != inputs.len() {
            return Err(PtsError::delivery_failed(
                step,
                format!(
                    "SendInput accepted {} of {} events: {}",
                    sent,
                    inputs.len(),
                    std::io::Error::last_os_error()
                ),
            ));
        }
        Ok(())
    }

    /// Plays markup key sequences through `SendInput`.
    pub struct Win32Injector;

    impl KeyInjector for Win32Injector {
        fn send_key_sequence(&self, text: &str) -> Result<()> {
            let strokes = markup_keys::parse(text)?;
            let mut inputs = Vec::with_capacity(strokes.len() * 2);
            for stroke in &strokes {
                stroke_inputs(stroke, &mut inputs);
            }
            debug!("Sending {} key stroke(s)", strokes.len());
            send_inputs("SendInput", inputs)
        }

        fn send_line_break(&self) -> Result<()> {
            let mut inputs = Vec::new();
            stroke_inputs(&KeyStroke::named(NamedKey::Enter), &mut inputs);
            send_inputs("SendInput enter", inputs)
        }

        fn send_paste_combo(&self) -> Result<()> {
            // " " then {BACKSPACE} then ^v
            let strokes = markup_keys::parse(" {BACKSPACE}^v")?;
            let mut inputs = Vec::new();
            for stroke in &strokes {
                stroke_inputs(stroke, &mut inputs);
            }
            send_inputs("SendInput paste", inputs)
        }
    }
}
