//! Process discovery.
//!
//! This module finds running processes by name. Window handles are resolved
//! separately by the platform's [`WindowSystem`](crate::desktop::WindowSystem).

use std::cell::RefCell;

use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// A process that matched a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundProcess {
    pub pid: u32,
    pub name: String,
}

/// Finds processes by name.
///
/// Uses the `sysinfo` crate to enumerate running processes. Names are
/// compared case-insensitively and a trailing `.exe` is ignored on both
/// sides, so `notepad` and `Notepad.exe` match the same process.
///
/// # Example
///
/// ```
/// use process_text_sender::ProcessFinder;
///
/// let finder = ProcessFinder::new();
/// let found = finder.find_by_name("notepad");
/// println!("{} matching process(es)", found.len());
/// ```
pub struct ProcessFinder {
    system: RefCell<System>,
}

impl Clone for ProcessFinder {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Default for ProcessFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessFinder {
    pub fn new() -> Self {
        Self {
            system: RefCell::new(System::new()),
        }
    }

    /// All running processes whose name matches `process_name`, ordered by PID.
    pub fn find_by_name(&self, process_name: &str) -> Vec<FoundProcess> {
        let mut system = self.system.borrow_mut();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let wanted = normalize_name(process_name);
        let mut found: Vec<FoundProcess> = system
            .processes()
            .iter()
            .filter_map(|(pid, process)| {
                let name = process.name().to_string_lossy().into_owned();
                (normalize_name(&name) == wanted).then(|| FoundProcess {
                    pid: pid.as_u32(),
                    name,
                })
            })
            .collect();
        found.sort_by_key(|process| process.pid);

        debug!(
            "Process lookup for '{}' matched {} process(es)",
            process_name,
            found.len()
        );
        found
    }
}

/// Lowercase and strip a trailing `.exe`.
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}
