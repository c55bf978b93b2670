//! System clipboard through `clipboard-rs`, shared by every backend.
//!
//! One [`ClipboardContext`] lives as long as the [`SystemClipboard`]. On X11
//! and Wayland the context owns the selection, so text set for a paste and a
//! restored snapshot stay available to other applications until the next
//! write.

use std::sync::{Mutex, MutexGuard};

use clipboard_rs::common::RustImage;
use clipboard_rs::{Clipboard, ClipboardContent, ClipboardContext, ContentFormat, RustImageData};
use tracing::{debug, warn};

use super::{ClipboardAccess, ClipboardFormat, ClipboardSnapshot};
use crate::error::{PtsError, Result};

/// Selection targets that describe the clipboard rather than hold content.
const META_TARGETS: &[&str] = &[
    "TARGETS",
    "TIMESTAMP",
    "MULTIPLE",
    "SAVE_TARGETS",
    "DELETE",
    "INSERT_PROPERTY",
    "INSERT_SELECTION",
];

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

fn clipboard_err<T>(action: &str, result: std::result::Result<T, BoxedError>) -> Result<T> {
    result.map_err(|e| PtsError::clipboard(format!("failed to {action}: {e}")))
}

pub struct SystemClipboard {
    context: Mutex<ClipboardContext>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let context = clipboard_err("open clipboard", ClipboardContext::new())?;
        Ok(Self {
            context: Mutex::new(context),
        })
    }

    fn context(&self) -> Result<MutexGuard<'_, ClipboardContext>> {
        self.context
            .lock()
            .map_err(|_| PtsError::clipboard("clipboard context poisoned"))
    }
}

impl ClipboardAccess for SystemClipboard {
    fn snapshot(&self) -> Result<ClipboardSnapshot> {
        let ctx = self.context()?;
        let available = clipboard_err("list clipboard formats", ctx.available_formats())?;
        let mut snapshot = ClipboardSnapshot::new();

        if ctx.has(ContentFormat::Text) {
            if let Ok(text) = ctx.get_text() {
                snapshot.insert(ClipboardFormat::Text, text.into_bytes());
            }
        }
        if ctx.has(ContentFormat::Rtf) {
            if let Ok(rtf) = ctx.get_rich_text() {
                snapshot.insert(ClipboardFormat::Rtf, rtf.into_bytes());
            }
        }
        if ctx.has(ContentFormat::Html) {
            if let Ok(html) = ctx.get_html() {
                snapshot.insert(ClipboardFormat::Html, html.into_bytes());
            }
        }
        if ctx.has(ContentFormat::Files) {
            if let Ok(files) = ctx.get_files() {
                snapshot.insert(ClipboardFormat::Files, files.join("\n").into_bytes());
            }
        }
        if ctx.has(ContentFormat::Image) {
            match ctx.get_image().and_then(|image| image.to_png()) {
                Ok(png) => snapshot.insert(ClipboardFormat::Png, png.get_bytes().to_vec()),
                Err(e) => warn!("Could not capture clipboard image: {}", e),
            }
        }

        for format in available {
            if META_TARGETS.contains(&format.as_str()) {
                continue;
            }
            match ctx.get_buffer(&format) {
                Ok(data) => snapshot.insert(ClipboardFormat::Other(format), data),
                Err(e) => debug!("Skipping clipboard format {}: {}", format, e),
            }
        }

        debug!("Captured {} clipboard format(s)", snapshot.len());
        Ok(snapshot)
    }

    fn set_text(&self, text: &str) -> Result<()> {
        let ctx = self.context()?;
        clipboard_err("set clipboard text", ctx.set_text(text.to_string()))
    }

    fn restore(&self, snapshot: &ClipboardSnapshot) -> Result<()> {
        let ctx = self.context()?;
        if snapshot.is_empty() {
            return clipboard_err("clear clipboard", ctx.clear());
        }
        clipboard_err("restore clipboard", ctx.set(to_contents(snapshot)))
    }
}

/// Every captured format as one write, so no representation replaces another.
fn to_contents(snapshot: &ClipboardSnapshot) -> Vec<ClipboardContent> {
    let text = |data: &[u8]| String::from_utf8_lossy(data).into_owned();
    let mut contents = Vec::with_capacity(snapshot.len());

    for (format, data) in snapshot.entries() {
        let content = match format {
            ClipboardFormat::Text => ClipboardContent::Text(text(data)),
            ClipboardFormat::Rtf => ClipboardContent::Rtf(text(data)),
            ClipboardFormat::Html => ClipboardContent::Html(text(data)),
            ClipboardFormat::Files => {
                ClipboardContent::Files(text(data).lines().map(str::to_string).collect())
            }
            ClipboardFormat::Png => match RustImageData::from_bytes(data) {
                Ok(image) => ClipboardContent::Image(image),
                Err(e) => {
                    warn!("Dropping unreadable clipboard image: {}", e);
                    continue;
                }
            },
            ClipboardFormat::Other(name) => ClipboardContent::Other(name.clone(), data.to_vec()),
        };
        contents.push(content);
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_writes_every_format() {
        let mut snapshot = ClipboardSnapshot::new();
        snapshot.insert(ClipboardFormat::Text, b"plain".to_vec());
        snapshot.insert(ClipboardFormat::Html, b"<b>bold</b>".to_vec());
        snapshot.insert(ClipboardFormat::Rtf, b"{\\rtf1 x}".to_vec());
        snapshot.insert(ClipboardFormat::Files, b"/tmp/a\n/tmp/b".to_vec());
        snapshot.insert(
            ClipboardFormat::Other("application/x-editor".to_string()),
            vec![0, 1, 2],
        );

        let contents = to_contents(&snapshot);

        assert_eq!(contents.len(), 5);
        assert!(matches!(&contents[0], ClipboardContent::Text(t) if t == "plain"));
        assert!(matches!(&contents[1], ClipboardContent::Html(h) if h == "<b>bold</b>"));
        assert!(matches!(&contents[2], ClipboardContent::Rtf(r) if r == "{\\rtf1 x}"));
        assert!(matches!(
            &contents[3],
            ClipboardContent::Files(files) if files == &["/tmp/a", "/tmp/b"]
        ));
        assert!(matches!(
            &contents[4],
            ClipboardContent::Other(name, data)
                if name == "application/x-editor" && data == &[0, 1, 2]
        ));
    }

    #[test]
    fn test_unreadable_image_is_dropped() {
        let mut snapshot = ClipboardSnapshot::new();
        snapshot.insert(ClipboardFormat::Png, b"not a png".to_vec());
        snapshot.insert(ClipboardFormat::Text, b"kept".to_vec());

        let contents = to_contents(&snapshot);

        assert_eq!(contents.len(), 1);
        assert!(matches!(&contents[0], ClipboardContent::Text(t) if t == "kept"));
    }
}
